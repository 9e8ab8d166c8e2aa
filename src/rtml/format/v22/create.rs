//! RTML 2.2 creator.
//!
//! Fields RTML 2.2 cannot carry (history, agent URI, telescope location,
//! airmass, extinction, sky flux, detector gain, gratings, half-wave plates)
//! are logged and left out.

use log::debug;

use super::DIALECT;
use crate::rtml::codec::timestamp;
use crate::rtml::format::common::{
    aperture_element, dropped, fixed, length_element, moon_element, object_list_element,
    push_error_text, push_text, scores_element, seeing_element, shortest,
};
use crate::rtml::types::device::Device;
use crate::rtml::types::error::{Result, ResultExt, RtmlError};
use crate::rtml::types::models::{Contact, RtmlDocument, RtmlVersion, Telescope};
use crate::rtml::types::observation::{ImageData, Observation, Target};
use crate::rtml::types::schedule::{Exposure, ExposureKind, Schedule, SeriesConstraint, SkyConstraint};
use crate::rtml::xml::{Element, text_element};

/// Builds the RTML 2.2 root element for `document`.
///
/// # Errors
/// [`RtmlError::UnitMismatch`] for a moon distance not in degrees or an
/// unknown exposure time unit; [`RtmlError::Format`] for a zero exposure count.
pub fn create_document(document: &RtmlDocument) -> Result<Element> {
    report_dropped(document);

    let mut root = Element::new("RTML")
        .with_attr("version", RtmlVersion::V22.as_str())
        .with_attr("type", document.kind.as_str());

    root.push_opt(document.contact.as_ref().map(contact_element));
    root.push_opt(
        document
            .project
            .as_ref()
            .map(|project| text_element("Project", project.id.as_str())),
    );
    root.push_opt(document.telescope.as_ref().map(telescope_element));
    root.push_opt(agent_element(document));
    root.push_opt(document.device.as_ref().map(device_element));

    for (index, observation) in document.observations.iter().enumerate() {
        let element = observation_element(observation)
            .context_with(|| format!("in observation #{}", index + 1))?;
        root.push(element);
    }

    if let Some(score) = document.score {
        root.push(text_element("Score", fixed(score, 6)));
    }
    root.push_opt(scores_element(&document.scores));
    if let Some(completion) = &document.completion_time {
        root.push(text_element("CompletionTime", timestamp::format(Some(completion))));
    }
    push_error_text(&mut root, document, DIALECT);

    debug!(
        "Created {} {} document with {} observation(s)",
        DIALECT,
        document.kind,
        document.observations.len()
    );
    Ok(root)
}

fn report_dropped(document: &RtmlDocument) {
    if document.history.as_ref().is_some_and(|h| !h.entries.is_empty()) {
        dropped(DIALECT, "a document history");
    }
    if document.target.is_some() {
        dropped(DIALECT, "a document default target");
    }
}

fn contact_element(contact: &Contact) -> Element {
    let mut element =
        Element::new("Contact").with_attr("PI", if contact.pi { "true" } else { "false" });
    push_text(&mut element, "Name", contact.name.as_ref());
    push_text(&mut element, "User", contact.user.as_ref());
    push_text(&mut element, "Institution", contact.institution.as_ref());
    push_text(&mut element, "Address", contact.address.as_ref());
    push_text(&mut element, "Telephone", contact.telephone.as_ref());
    push_text(&mut element, "Fax", contact.fax.as_ref());
    push_text(&mut element, "Email", contact.email.as_ref());
    push_text(&mut element, "Url", contact.url.as_ref());
    element
}

fn telescope_element(telescope: &Telescope) -> Element {
    let mut element = Element::new("Telescope");
    push_text(&mut element, "Name", telescope.name.as_ref());
    element.push_opt(telescope.aperture.as_ref().and_then(aperture_element));
    element.push_opt(
        telescope
            .focal_length
            .as_ref()
            .and_then(|length| length_element("FocalLength", length)),
    );
    push_text(&mut element, "FocalRatio", telescope.focal_ratio.as_ref());
    if telescope.location.is_some() {
        dropped(DIALECT, "a telescope location");
    }
    element
}

/// The agent element carries the document id as its text.
fn agent_element(document: &RtmlDocument) -> Option<Element> {
    let agent = document.agent.as_ref();
    let id = agent
        .and_then(|agent| agent.id.as_deref())
        .or(document.uid.as_deref());
    if agent.is_none() && id.is_none() {
        return None;
    }

    let mut element = Element::new("IntelligentAgent");
    if let Some(agent) = agent {
        element = element
            .with_opt_attr("host", agent.hostname.as_deref())
            .with_opt_attr("port", agent.port.map(|port| port.to_string()));
        if agent.uri.is_some() && agent.hostname.is_none() {
            dropped(DIALECT, "an agent URI without host and port");
        }
    }
    if let Some(id) = id {
        element.push_text(id);
    }
    Some(element)
}

fn device_element(device: &Device) -> Element {
    let mut element = Element::new("Device")
        .with_opt_attr("type", device.kind.as_deref())
        .with_opt_attr("region", device.spectral_region.as_deref())
        .with_opt_attr("name", device.name.as_deref());

    if let Some(filter) = &device.filter {
        element.push(Element::new("Filter").with_child(text_element("FilterType", filter.as_str())));
    }
    if let Some(detector) = &device.detector {
        element.push(
            Element::new("Detector").with_child(
                Element::new("Binning")
                    .with_attr("rows", detector.row_binning.to_string())
                    .with_attr("columns", detector.column_binning.to_string())
                    .with_attr("units", "pixels"),
            ),
        );
        if detector.gain.is_some() {
            dropped(DIALECT, "a detector gain");
        }
    }
    if device.grating.is_some() {
        dropped(DIALECT, "a grating");
    }
    if device.half_wave_plate.is_some() {
        dropped(DIALECT, "a half-wave plate");
    }
    element
}

fn observation_element(observation: &Observation) -> Result<Element> {
    let mut element = Element::new("Observation");
    element.push(target_element(&observation.target));
    element.push_opt(observation.device.as_ref().map(device_element));
    element.push(schedule_element(&observation.schedule)?);
    for image in &observation.image_data {
        element.push(image_data_element(image));
    }
    Ok(element)
}

fn target_element(target: &Target) -> Element {
    let mut element = Element::new("Target")
        .with_attr("type", target.kind.as_str())
        .with_opt_attr("ident", target.ident.as_deref());
    push_text(&mut element, "TargetName", target.name.as_ref());

    if target.has_coordinates() {
        let mut coordinates = Element::new("Coordinates");
        if let Some(ra) = &target.ra {
            coordinates.push(
                Element::new("RightAscension")
                    .with_attr("format", "hh mm ss.ss")
                    .with_attr("units", "hms")
                    .with_opt_attr("offset", ra.offset.map(|offset| fixed(offset, 2)))
                    .with_opt_attr("offsetUnits", ra.offset.map(|_| "arcseconds"))
                    .with_text(ra.to_string()),
            );
        }
        if let Some(dec) = &target.dec {
            coordinates.push(
                Element::new("Declination")
                    .with_attr("format", "sdd mm ss.ss")
                    .with_attr("units", "dms")
                    .with_opt_attr("offset", dec.offset.map(|offset| fixed(offset, 2)))
                    .with_opt_attr("offsetUnits", dec.offset.map(|_| "arcseconds"))
                    .with_text(dec.to_string()),
            );
        }
        push_text(&mut coordinates, "Equinox", target.equinox.as_ref());
        element.push(coordinates);
    }

    if let Some(magnitude) = &target.magnitude {
        element.push(
            Element::new("Magnitude")
                .with_opt_attr("type", magnitude.filter.as_deref())
                .with_opt_attr("error", magnitude.error.map(|error| fixed(error, 2)))
                .with_text(fixed(magnitude.value, 2)),
        );
    }
    element
}

fn schedule_element(schedule: &Schedule) -> Result<Element> {
    let mut element = Element::new("Schedule").with_attr("priority", schedule.priority.to_string());
    element.push(exposure_element(&schedule.exposure)?);

    if let Some(window) = &schedule.time_window {
        element.push(
            Element::new("TimeConstraint")
                .with_child(text_element("StartDateTime", timestamp::format(window.start.as_ref())))
                .with_child(text_element("EndDateTime", timestamp::format(window.end.as_ref()))),
        );
    }
    element.push_opt(schedule.series.as_ref().map(series_element));
    element.push_opt(schedule.seeing.as_ref().map(|seeing| seeing_element(seeing, None)));
    if let Some(moon) = &schedule.moon {
        element.push(moon_element(moon)?);
    }
    match &schedule.sky {
        Some(SkyConstraint::Brightness(brightness)) => element.push(
            Element::new("SkyConstraint").with_child(text_element("Sky", brightness.as_str())),
        ),
        Some(SkyConstraint::Flux { .. }) => dropped(DIALECT, "a sky flux constraint"),
        None => {}
    }
    if schedule.airmass.is_some() {
        dropped(DIALECT, "an airmass constraint");
    }
    if schedule.extinction.is_some() {
        dropped(DIALECT, "an extinction constraint");
    }
    Ok(element)
}

/// The count child is written only for repeated exposures.
fn exposure_element(exposure: &Exposure) -> Result<Element> {
    if exposure.kind == ExposureKind::Time {
        Exposure::check_time_units(&exposure.units)?;
    }
    if exposure.count == 0 {
        return Err(RtmlError::format("exposure count", "0", "count must be at least 1"));
    }

    let mut element = Element::new("Exposure").with_attr("type", exposure.kind.as_str());
    if !exposure.units.is_empty() {
        element.set_attr("units", exposure.units.as_str());
    }
    if exposure.count != 1 {
        element.push(text_element("Count", exposure.count.to_string()));
    }
    element.push_text(shortest(exposure.length));
    Ok(element)
}

fn series_element(series: &SeriesConstraint) -> Element {
    let mut element = Element::new("SeriesConstraint");
    if series.count > 0 {
        element.push(text_element("Count", series.count.to_string()));
    }
    if let Some(interval) = &series.interval {
        element.push(text_element("Interval", interval.to_string()));
    }
    if let Some(tolerance) = &series.tolerance {
        element.push(text_element("Tolerance", tolerance.to_string()));
    }
    element
}

fn image_data_element(image: &ImageData) -> Element {
    let mut element = Element::new("ImageData")
        .with_attr("type", image.image_type.as_str())
        .with_attr("delivery", "url")
        .with_attr("reduced", "true");
    if let Some(header) = &image.fits_header {
        element.push(
            Element::new("FITSHeader")
                .with_attr("type", "all")
                .with_text(header.as_str()),
        );
    }
    if let Some(list) = &image.object_list {
        element.push(object_list_element("ObjectList", list));
    }
    if let Some(url) = &image.url {
        element.push_text(url.as_str());
    }
    element
}
