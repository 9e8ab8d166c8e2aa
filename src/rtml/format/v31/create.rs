//! RTML 3.1a creator.

use log::{debug, warn};

use super::DIALECT;
use crate::rtml::codec::timestamp;
use crate::rtml::config::{RTML31_NAMESPACE, XSI_NAMESPACE};
use crate::rtml::format::common::{
    aperture_element, dropped, fixed, length_element, moon_element, object_list_element,
    push_error_text, push_text, scores_element, seeing_element, shortest,
};
use crate::rtml::types::device::Device;
use crate::rtml::types::error::{Result, ResultExt, RtmlError};
use crate::rtml::types::models::{
    Contact, History, IntelligentAgent, Location, RtmlDocument, RtmlVersion, Telescope,
};
use crate::rtml::types::observation::{ImageData, Observation, Target, TargetKind};
use crate::rtml::types::schedule::{
    Exposure, ExposureKind, Schedule, SeriesConstraint, SkyConstraint,
};
use crate::rtml::xml::{Element, text_element};

/// Builds the RTML 3.1a root element for `document`.
///
/// The schedule priority is forced to 0 for targets of opportunity, which is
/// how RTML 3.1a expresses the target type.
///
/// # Errors
/// [`RtmlError::UnitMismatch`] for a moon distance not in degrees or an
/// unknown exposure time unit; [`RtmlError::Format`] for a zero exposure count.
pub fn create_document(document: &RtmlDocument, schema_location: &str) -> Result<Element> {
    if document.completion_time.is_some() {
        dropped(DIALECT, "a completion time");
    }

    let mut root = Element::new("RTML")
        .with_attr("xmlns", RTML31_NAMESPACE)
        .with_attr("xmlns:xsi", XSI_NAMESPACE)
        .with_attr("version", RtmlVersion::V31.as_str())
        .with_attr("mode", document.kind.as_str())
        .with_opt_attr("uid", document.uid())
        .with_attr("xsi:schemaLocation", schema_location);

    root.push_opt(document.history.as_ref().and_then(history_element));
    root.push_opt(document.contact.as_ref().map(contact_element));
    root.push_opt(
        document
            .project
            .as_ref()
            .map(|project| Element::new("Project").with_attr("ProjectID", project.id.as_str())),
    );
    root.push_opt(document.telescope.as_ref().map(telescope_element));
    root.push_opt(document.agent.as_ref().map(agent_element));
    root.push_opt(document.device.as_ref().map(device_element));
    root.push_opt(document.target.as_ref().map(target_element));

    for (index, observation) in document.observations.iter().enumerate() {
        let element = schedule_element(observation)
            .context_with(|| format!("in observation #{}", index + 1))?;
        root.push(element);
    }

    root.push_opt(scoring_element(document));
    push_error_text(&mut root, document, DIALECT);

    debug!(
        "Created {} {} document with {} schedule(s)",
        DIALECT,
        document.kind,
        document.observations.len()
    );
    Ok(root)
}

/// `None` for an empty history.
fn history_element(history: &History) -> Option<Element> {
    if history.entries.is_empty() {
        return None;
    }

    let mut element = Element::new("History");
    for entry in &history.entries {
        let mut item = Element::new("Entry").with_opt_attr(
            "timeStamp",
            entry
                .timestamp
                .as_ref()
                .map(|ts| timestamp::format(Some(ts))),
        );
        if entry.agent_name.is_some() || entry.agent_uri.is_some() {
            item.push(
                Element::new("Agent")
                    .with_opt_attr("name", entry.agent_name.as_deref())
                    .with_opt_attr("uri", entry.agent_uri.as_deref()),
            );
        }
        push_text(&mut item, "Description", entry.description.as_ref());
        if let Some(reason) = &entry.rejection_reason {
            item.push(Element::new("Rejection").with_attr("reason", reason.as_str()));
        }
        push_text(&mut item, "Error", entry.error.as_ref());
        element.push(item);
    }
    Some(element)
}

fn contact_element(contact: &Contact) -> Element {
    if contact.pi {
        dropped(DIALECT, "the contact PI flag");
    }
    let mut element = Element::new("Contact");
    push_text(&mut element, "Name", contact.name.as_ref());
    push_text(&mut element, "Username", contact.user.as_ref());
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
    element.push_opt(telescope.location.as_ref().map(location_element));
    element
}

fn location_element(location: &Location) -> Element {
    let mut element = Element::new("Location");
    push_text(&mut element, "Name", location.name.as_ref());
    element.push(
        Element::new("Latitude")
            .with_attr("units", "degrees")
            .with_text(shortest(location.latitude)),
    );
    element.push(
        Element::new("Longitude")
            .with_attr("units", "degrees")
            .with_text(shortest(location.longitude)),
    );
    element.push(
        Element::new("Height")
            .with_attr("units", "meters")
            .with_text(shortest(location.altitude)),
    );
    element
}

/// Host and port collapse into the agent URI.
fn agent_element(agent: &IntelligentAgent) -> Element {
    if agent.uri.is_none() && agent.hostname.is_some() {
        debug!("Deriving agent URI from host and port");
    }
    Element::new("IntelligentAgent").with_opt_attr("uri", agent.uri())
}

fn device_element(device: &Device) -> Element {
    let mut element = Element::new("Device")
        .with_opt_attr("type", device.kind.as_deref())
        .with_opt_attr("region", device.spectral_region.as_deref());
    push_text(&mut element, "Name", device.name.as_ref());

    if let Some(filter) = &device.filter {
        element.push(Element::new("Filter").with_child(text_element("Type", filter.as_str())));
    }
    if let Some(detector) = &device.detector {
        let mut item = Element::new("Detector").with_child(
            Element::new("Binning")
                .with_child(
                    Element::new("X")
                        .with_attr("units", "pixels")
                        .with_text(detector.column_binning.to_string()),
                )
                .with_child(
                    Element::new("Y")
                        .with_attr("units", "pixels")
                        .with_text(detector.row_binning.to_string()),
                ),
        );
        if let Some(gain) = detector.gain {
            item.push(text_element("Gain", fixed(gain, 2)));
        }
        element.push(item);
    }
    if let Some(grating) = &device.grating {
        let mut item = Element::new("Grating").with_opt_attr("name", grating.name.as_deref());
        if let Some(wavelength) = &grating.wavelength {
            item.push(
                Element::new("Wavelength")
                    .with_attr("units", wavelength.units.as_str())
                    .with_text(shortest(wavelength.value)),
            );
        }
        if let Some(resolution) = grating.resolution {
            item.push(text_element("Resolution", shortest(resolution)));
        }
        if let Some(angle) = grating.angle {
            item.push(
                Element::new("Angle")
                    .with_attr("units", "degrees")
                    .with_text(fixed(angle, 2)),
            );
        }
        element.push(item);
    }
    if let Some(plate) = &device.half_wave_plate {
        element.push(
            Element::new("HalfWavePlate")
                .with_child(text_element("RotorSpeed", plate.rotor_speed.as_str())),
        );
    }
    element
}

fn target_element(target: &Target) -> Element {
    let mut element = Element::new("Target").with_opt_attr("id", target.ident.as_deref());
    push_text(&mut element, "TargetName", target.name.as_ref());

    if target.has_coordinates() {
        let mut coordinates = Element::new("Coordinates");
        if let Some(ra) = &target.ra {
            coordinates.push(coordinate_element("RightAscension", "hms", ra.to_string(), ra.offset));
        }
        if let Some(dec) = &target.dec {
            coordinates.push(coordinate_element("Declination", "dms", dec.to_string(), dec.offset));
        }
        push_text(&mut coordinates, "Equinox", target.equinox.as_ref());
        element.push(coordinates);
    }

    if let Some(magnitude) = &target.magnitude {
        element.push(
            Element::new("Magnitude")
                .with_opt_attr("filter", magnitude.filter.as_deref())
                .with_opt_attr("error", magnitude.error.map(|error| fixed(error, 2)))
                .with_text(fixed(magnitude.value, 2)),
        );
    }
    element
}

fn coordinate_element(name: &str, units: &str, value: String, offset: Option<f64>) -> Element {
    let mut element =
        Element::new(name).with_child(Element::new("Value").with_attr("units", units).with_text(value));
    if let Some(offset) = offset {
        element.push(
            Element::new("Offset")
                .with_attr("units", "arcseconds")
                .with_text(fixed(offset, 2)),
        );
    }
    element
}

/// One `<Schedule>` holding the observation's constraints, device, target and
/// results.
fn schedule_element(observation: &Observation) -> Result<Element> {
    let schedule = &observation.schedule;
    let priority = match observation.target.kind {
        TargetKind::Toop => 0,
        TargetKind::Normal => {
            if schedule.priority == 0 {
                warn!("Priority 0 will be read back as a target of opportunity");
            }
            schedule.priority
        }
    };

    let mut element = Element::new("Schedule").with_attr("priority", priority.to_string());
    element.push(exposure_element(&schedule.exposure)?);
    push_constraints(&mut element, schedule)?;
    element.push_opt(observation.device.as_ref().map(device_element));
    element.push(target_element(&observation.target));
    if !observation.image_data.is_empty() {
        element.push(results_element(&observation.image_data));
    }
    Ok(element)
}

fn exposure_element(exposure: &Exposure) -> Result<Element> {
    if exposure.count == 0 {
        return Err(RtmlError::format("exposure count", "0", "count must be at least 1"));
    }

    let mut element = Element::new("Exposure");
    if exposure.count != 1 {
        element.set_attr("count", exposure.count.to_string());
    }
    match exposure.kind {
        ExposureKind::Time => {
            Exposure::check_time_units(&exposure.units)?;
            element.push(
                Element::new("ExposureTime")
                    .with_attr("units", exposure.units.as_str())
                    .with_text(shortest(exposure.length)),
            );
        }
        ExposureKind::Snr => element.push(text_element("SignalToNoise", shortest(exposure.length))),
    }
    Ok(element)
}

fn push_constraints(element: &mut Element, schedule: &Schedule) -> Result<()> {
    if let Some(window) = &schedule.time_window {
        element.push(
            Element::new("DateTimeConstraint")
                .with_attr("type", "include")
                .with_child(
                    Element::new("DateTimeStart")
                        .with_attr("system", "UT")
                        .with_attr("value", timestamp::format(window.start.as_ref())),
                )
                .with_child(
                    Element::new("DateTimeEnd")
                        .with_attr("system", "UT")
                        .with_attr("value", timestamp::format(window.end.as_ref())),
                ),
        );
    }
    element.push_opt(schedule.series.as_ref().map(series_element));
    element.push_opt(
        schedule
            .seeing
            .as_ref()
            .map(|seeing| seeing_element(seeing, Some("arcseconds"))),
    );
    if let Some(moon) = &schedule.moon {
        element.push(moon_element(moon)?);
    }
    match &schedule.sky {
        Some(SkyConstraint::Brightness(brightness)) => element.push(
            Element::new("SkyConstraint").with_child(text_element("Sky", brightness.as_str())),
        ),
        Some(SkyConstraint::Flux { value, units }) => element.push(
            Element::new("SkyConstraint").with_child(
                Element::new("Flux")
                    .with_opt_attr("units", Some(units.as_str()).filter(|u| !u.is_empty()))
                    .with_text(shortest(*value)),
            ),
        ),
        None => {}
    }
    if let Some(airmass) = &schedule.airmass {
        element.push(
            Element::new("AirmassConstraint")
                .with_opt_attr("minimum", airmass.minimum.map(|v| fixed(v, 2)))
                .with_opt_attr("maximum", airmass.maximum.map(|v| fixed(v, 2))),
        );
    }
    if let Some(extinction) = &schedule.extinction {
        element.push(
            Element::new("ExtinctionConstraint")
                .with_child(text_element("Clouds", extinction.clouds.as_str())),
        );
    }
    Ok(())
}

fn series_element(series: &SeriesConstraint) -> Element {
    let mut element = Element::new("SeriesConstraint");
    if series.count > 0 {
        element.push(text_element("Count", series.count.to_string()));
    }
    if let Some(interval) = &series.interval {
        element.push(
            Element::new("Interval").with_child(text_element("Period", interval.to_string())),
        );
    }
    if let Some(tolerance) = &series.tolerance {
        element.push(
            Element::new("Tolerance").with_child(text_element("Period", tolerance.to_string())),
        );
    }
    element
}

/// Each image is written as an `<ImageData>` followed by its
/// `<SourceCatalogue>` when it has an object list.
fn results_element(images: &[ImageData]) -> Element {
    let mut element = Element::new("Observation");
    for image in images {
        let mut data = Element::new("ImageData")
            .with_attr("type", image.image_type.as_str())
            .with_attr("delivery", "url")
            .with_attr("reduced", "true");
        if let Some(header) = &image.fits_header {
            data.push(
                Element::new("FITSHeader")
                    .with_attr("type", "all")
                    .with_text(header.as_str()),
            );
        }
        push_text(&mut data, "URL", image.url.as_ref());
        element.push(data);

        if let Some(list) = &image.object_list {
            element.push(object_list_element("SourceCatalogue", list));
        }
    }
    element
}

/// `None` when the document carries no score at all.
fn scoring_element(document: &RtmlDocument) -> Option<Element> {
    if document.score.is_none() && document.scores.is_empty() {
        return None;
    }
    let mut element = Element::new("Scoring");
    if let Some(score) = document.score {
        element.push(text_element("Score", fixed(score, 6)));
    }
    element.push_opt(scores_element(&document.scores));
    Some(element)
}
