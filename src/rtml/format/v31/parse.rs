//! RTML 3.1a parser.
//!
//! Every `<Schedule>` becomes one [`Observation`]. A schedule without its own
//! `<Target>` takes a copy of the document's default target, and the target
//! kind is decided by the schedule priority once the whole schedule is read.

use std::mem;

use log::{debug, trace};

use super::DIALECT;
use crate::rtml::codec::coords::{self, Declination, RightAscension};
use crate::rtml::codec::period::Period;
use crate::rtml::codec::timestamp;
use crate::rtml::config::RTML31_NAMESPACE;
use crate::rtml::format::common::{
    attr_f64, check_units, duplicate_child, expect_name, missing_child, optional_attr,
    parse_aperture, parse_count, parse_i32, parse_length, parse_moon, parse_object_list,
    parse_scores, parse_seeing, required_attr, required_text, root_error_text, text, text_f64,
    unknown_child,
};
use crate::rtml::types::device::{
    Detector, Device, Grating, HalfWavePlate, RotorSpeed, Wavelength, WavelengthUnits,
};
use crate::rtml::types::error::{Result, ResultExt, RtmlError};
use crate::rtml::types::models::{
    Contact, History, HistoryEntry, IntelligentAgent, Location, Project, RequestKind,
    RtmlDocument, RtmlVersion, Telescope,
};
use crate::rtml::types::observation::{
    ImageData, ImageType, Magnitude, ObjectList, Observation, Target, TargetKind,
};
use crate::rtml::types::schedule::{
    AirmassConstraint, CloudCover, Exposure, ExtinctionConstraint, Schedule, SeriesConstraint,
    SkyBrightness, SkyConstraint, TimeWindow,
};
use crate::rtml::xml::{Element, ErrorHandler};

/// Units accepted for site latitude and longitude.
const SITE_ANGLE_UNITS: [&str; 1] = ["degrees"];

/// Units accepted for site height.
const SITE_HEIGHT_UNITS: [&str; 1] = ["meters"];

/// Time systems accepted on date constraints.
const TIME_SYSTEMS: [&str; 1] = ["UT"];

/// Builds a document from an RTML 3.1a root element.
///
/// # Errors
/// - [`RtmlError::Structural`] if the root is not `<RTML>`, a schedule has no
///   target and there is no default one, or a schedule repeats its Target or
///   Observation
/// - [`RtmlError::MissingRequiredAttribute`] if `version` or `mode` is absent
/// - [`RtmlError::UnsupportedVersion`] if `version` is not `3.1a`
/// - Any codec, unit or enumeration error raised by a child
pub fn parse_document(root: &Element, handler: &mut dyn ErrorHandler) -> Result<RtmlDocument> {
    // Step 1: Root element, namespace and required attributes
    expect_name(root, "RTML")?;
    if root.namespace.as_deref() != Some(RTML31_NAMESPACE) {
        handler.warning(format!(
            "Root element is in namespace {:?}, expected {}",
            root.namespace, RTML31_NAMESPACE
        ));
    }
    let version = required_attr(root, "version")?;
    if version.parse::<RtmlVersion>()? != RtmlVersion::V31 {
        return Err(RtmlError::UnsupportedVersion(version.to_string()));
    }
    let kind: RequestKind = required_attr(root, "mode")?.parse()?;
    let mut document = RtmlDocument::new(RtmlVersion::V31, kind);
    document.uid = optional_attr(root, "uid").map(str::to_string);

    // Step 2: Children in document order. Schedules see the default target
    // only if it was declared before them.
    for child in root.elements() {
        trace!("{}: reading <{}>", DIALECT, child.name);
        match child.name.as_str() {
            "History" => document.history = Some(parse_history(child, handler)?),
            "Contact" => document.contact = Some(parse_contact(child, handler)),
            "Project" => {
                let id = optional_attr(child, "ProjectID")
                    .map(str::to_string)
                    .or_else(|| text(child));
                document.project = Some(Project::new(id.unwrap_or_default()));
            }
            "Telescope" => document.telescope = Some(parse_telescope(child, handler)?),
            "IntelligentAgent" => {
                document.agent = Some(IntelligentAgent {
                    uri: optional_attr(child, "uri").map(str::to_string),
                    ..IntelligentAgent::default()
                })
            }
            "Device" => document.device = Some(parse_device(child, handler)?),
            "Target" => document.target = Some(parse_target(child, handler)?),
            "Schedule" => {
                let number = document.observations.len() + 1;
                let observation = parse_schedule(child, document.target.as_ref(), handler)
                    .context_with(|| format!("in <Schedule> #{}", number))?;
                document.observations.push(observation);
            }
            "Scoring" => parse_scoring(child, &mut document, handler)?,
            _ => unknown_child(handler, root, child),
        }
    }

    // Step 3: Free text on the root is the error string
    document.error_string = root_error_text(root, kind, handler);

    debug!(
        "Parsed {} {} document with {} schedule(s)",
        DIALECT,
        kind,
        document.observations.len()
    );
    Ok(document)
}

fn parse_history(element: &Element, handler: &mut dyn ErrorHandler) -> Result<History> {
    let mut history = History::default();
    for child in element.elements() {
        if child.name != "Entry" {
            unknown_child(handler, element, child);
            continue;
        }

        let mut entry = HistoryEntry {
            timestamp: optional_attr(child, "timeStamp")
                .map(|value| timestamp::parse(value, "history time stamp"))
                .transpose()?
                .flatten(),
            ..HistoryEntry::default()
        };
        for part in child.elements() {
            match part.name.as_str() {
                "Agent" => {
                    entry.agent_name = optional_attr(part, "name").map(str::to_string);
                    entry.agent_uri = optional_attr(part, "uri").map(str::to_string);
                }
                "Description" => entry.description = text(part),
                "Rejection" => {
                    entry.rejection_reason = optional_attr(part, "reason")
                        .map(str::to_string)
                        .or_else(|| text(part))
                }
                "Error" => entry.error = text(part),
                _ => unknown_child(handler, child, part),
            }
        }
        history.entries.push(entry);
    }
    Ok(history)
}

fn parse_contact(element: &Element, handler: &mut dyn ErrorHandler) -> Contact {
    let mut contact = Contact::default();
    for child in element.elements() {
        let slot = match child.name.as_str() {
            "Name" => &mut contact.name,
            "Username" => &mut contact.user,
            "Institution" => &mut contact.institution,
            "Address" => &mut contact.address,
            "Telephone" => &mut contact.telephone,
            "Fax" => &mut contact.fax,
            "Email" => &mut contact.email,
            "Url" => &mut contact.url,
            _ => {
                unknown_child(handler, element, child);
                continue;
            }
        };
        *slot = text(child);
    }
    contact
}

fn parse_telescope(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Telescope> {
    let mut telescope = Telescope::default();
    for child in element.elements() {
        match child.name.as_str() {
            "Name" => telescope.name = text(child),
            "Aperture" => telescope.aperture = Some(parse_aperture(child)?),
            "FocalLength" => telescope.focal_length = Some(parse_length(child, "focal length")?),
            "FocalRatio" => telescope.focal_ratio = text(child),
            "Location" => telescope.location = Some(parse_location(child, handler)?),
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(telescope)
}

fn parse_location(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Location> {
    let mut location = Location::default();
    for child in element.elements() {
        match child.name.as_str() {
            "Name" => location.name = text(child),
            "Latitude" => location.latitude = site_value(child, &SITE_ANGLE_UNITS, "latitude")?,
            "Longitude" => location.longitude = site_value(child, &SITE_ANGLE_UNITS, "longitude")?,
            "Height" => location.altitude = site_value(child, &SITE_HEIGHT_UNITS, "height")?,
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(location)
}

fn site_value(element: &Element, units: &[&str], field: &'static str) -> Result<f64> {
    if let Some(found) = optional_attr(element, "units") {
        check_units(found, units, field)?;
    }
    text_f64(element, field)
}

fn parse_device(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Device> {
    let mut device = Device {
        kind: optional_attr(element, "type").map(str::to_string),
        spectral_region: optional_attr(element, "region").map(str::to_string),
        ..Device::default()
    };
    for child in element.elements() {
        match child.name.as_str() {
            "Name" => device.name = text(child),
            "Filter" => device.filter = child.child("Type").and_then(text),
            "Detector" => device.detector = Some(parse_detector(child, handler)?),
            "Grating" => device.grating = Some(parse_grating(child, handler)?),
            "HalfWavePlate" => {
                let speed = child
                    .child("RotorSpeed")
                    .ok_or_else(|| missing_child(child, "RotorSpeed"))?;
                let rotor_speed: RotorSpeed = required_text(speed, "rotor speed")?.parse()?;
                device.half_wave_plate = Some(HalfWavePlate { rotor_speed });
            }
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(device)
}

/// `<Detector><Binning><X units="pixels">n</X><Y units="pixels">n</Y></Binning><Gain/></Detector>`
fn parse_detector(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Detector> {
    let mut detector = Detector::default();
    for child in element.elements() {
        match child.name.as_str() {
            "Binning" => {
                for axis in child.elements() {
                    let slot = match axis.name.as_str() {
                        "X" => &mut detector.column_binning,
                        "Y" => &mut detector.row_binning,
                        _ => {
                            unknown_child(handler, child, axis);
                            continue;
                        }
                    };
                    if let Some(units) = optional_attr(axis, "units") {
                        Detector::check_binning_units(units)?;
                    }
                    *slot = parse_count(&required_text(axis, "binning")?, "binning")?;
                }
            }
            "Gain" => detector.gain = Some(text_f64(child, "gain")?),
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(detector)
}

fn parse_grating(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Grating> {
    let mut grating = Grating {
        name: optional_attr(element, "name").map(str::to_string),
        ..Grating::default()
    };
    for child in element.elements() {
        match child.name.as_str() {
            "Wavelength" => {
                let units: WavelengthUnits = required_attr(child, "units")?.parse()?;
                grating.wavelength = Some(Wavelength {
                    value: text_f64(child, "wavelength")?,
                    units,
                });
            }
            "Resolution" => grating.resolution = Some(text_f64(child, "resolution")?),
            "Angle" => {
                if let Some(units) = optional_attr(child, "units") {
                    check_units(units, &SITE_ANGLE_UNITS, "grating angle")?;
                }
                grating.angle = Some(text_f64(child, "grating angle")?);
            }
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(grating)
}

fn parse_target(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Target> {
    let mut target = Target {
        ident: optional_attr(element, "id").map(str::to_string),
        ..Target::default()
    };
    for child in element.elements() {
        match child.name.as_str() {
            "TargetName" => target.name = text(child),
            "Coordinates" => parse_coordinates(child, &mut target, handler)?,
            "Magnitude" => {
                target.magnitude = Some(Magnitude {
                    value: text_f64(child, "magnitude")?,
                    filter: optional_attr(child, "filter").map(str::to_string),
                    error: attr_f64(child, "error", "magnitude error")?,
                })
            }
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(target)
}

fn parse_coordinates(
    element: &Element,
    target: &mut Target,
    handler: &mut dyn ErrorHandler,
) -> Result<()> {
    for child in element.elements() {
        match child.name.as_str() {
            "RightAscension" => {
                let (value, units) = coordinate_value(child, "hms", "right ascension")?;
                let mut ra = RightAscension::parse(&value, units)?;
                ra.offset = coordinate_offset(child)?;
                target.ra = Some(ra);
            }
            "Declination" => {
                let (value, units) = coordinate_value(child, "dms", "declination")?;
                let mut dec = Declination::parse(&value, units)?;
                dec.offset = coordinate_offset(child)?;
                target.dec = Some(dec);
            }
            "Equinox" => target.equinox = text(child),
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(())
}

/// The `<Value units>` of a coordinate, or the coordinate's own text.
fn coordinate_value<'a>(
    element: &'a Element,
    default_units: &'a str,
    field: &'static str,
) -> Result<(String, &'a str)> {
    let holder = element.child("Value").unwrap_or(element);
    let units = optional_attr(holder, "units").unwrap_or(default_units);
    Ok((required_text(holder, field)?, units))
}

fn coordinate_offset(element: &Element) -> Result<Option<f64>> {
    let Some(offset) = element.child("Offset") else {
        return Ok(None);
    };
    let units = optional_attr(offset, "units").unwrap_or("arcseconds");
    coords::parse_offset(&required_text(offset, "offset")?, units).map(Some)
}

/// Reads one `<Schedule>` into a complete observation.
fn parse_schedule(
    element: &Element,
    default_target: Option<&Target>,
    handler: &mut dyn ErrorHandler,
) -> Result<Observation> {
    let mut schedule = Schedule::default();
    if let Some(priority) = optional_attr(element, "priority") {
        schedule.priority = parse_i32(priority, "priority")?;
    }

    let mut target = None;
    let mut device = None;
    let mut image_data = None;

    for child in element.elements() {
        match child.name.as_str() {
            "Exposure" => schedule.exposure = parse_exposure(child, handler)?,
            "DateTimeConstraint" => {
                schedule.time_window = Some(parse_date_time_constraint(child, handler)?)
            }
            "SeriesConstraint" => schedule.series = Some(parse_series(child, handler)?),
            "SeeingConstraint" => schedule.seeing = Some(parse_seeing(child)?),
            "MoonConstraint" => schedule.moon = Some(parse_moon(child, handler)?),
            "SkyConstraint" => schedule.sky = parse_sky(child, handler)?,
            "AirmassConstraint" => {
                schedule.airmass = Some(AirmassConstraint {
                    minimum: attr_f64(child, "minimum", "airmass minimum")?,
                    maximum: attr_f64(child, "maximum", "airmass maximum")?,
                })
            }
            "ExtinctionConstraint" => schedule.extinction = parse_extinction(child, handler)?,
            "Device" => {
                if device.is_some() {
                    return Err(duplicate_child(element, "Device"));
                }
                device = Some(parse_device(child, handler)?);
            }
            "Target" => {
                if target.is_some() {
                    return Err(duplicate_child(element, "Target"));
                }
                target = Some(parse_target(child, handler)?);
            }
            "Observation" => {
                if image_data.is_some() {
                    return Err(duplicate_child(element, "Observation"));
                }
                image_data = Some(parse_results(child, handler)?);
            }
            _ => unknown_child(handler, element, child),
        }
    }

    let mut target = target
        .or_else(|| default_target.cloned())
        .ok_or_else(|| missing_child(element, "Target"))?;
    target.kind = TargetKind::from_priority(schedule.priority);
    trace!(
        "Schedule at priority {} observes a {} target",
        schedule.priority,
        target.kind.as_str()
    );

    Ok(Observation {
        device,
        target,
        schedule,
        image_data: image_data.unwrap_or_default(),
    })
}

/// `<Exposure count><ExposureTime units>n</ExposureTime></Exposure>` or a
/// `<SignalToNoise>` child in place of the time.
fn parse_exposure(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Exposure> {
    let count = optional_attr(element, "count")
        .map(|count| parse_count(count, "exposure count"))
        .transpose()?
        .unwrap_or(1);

    for child in element.elements() {
        match child.name.as_str() {
            "ExposureTime" => {
                let units = required_attr(child, "units")?;
                Exposure::check_time_units(units)?;
                return Ok(Exposure::time(text_f64(child, "exposure length")?, units, count));
            }
            "SignalToNoise" => {
                return Ok(Exposure {
                    count,
                    ..Exposure::snr(text_f64(child, "signal to noise")?)
                });
            }
            _ => unknown_child(handler, element, child),
        }
    }
    Err(missing_child(element, "ExposureTime"))
}

fn parse_date_time_constraint(
    element: &Element,
    handler: &mut dyn ErrorHandler,
) -> Result<TimeWindow> {
    if let Some(kind) = optional_attr(element, "type") {
        if kind != "include" {
            return Err(RtmlError::illegal("date constraint type", kind));
        }
    }

    let mut window = TimeWindow::default();
    for child in element.elements() {
        let slot = match child.name.as_str() {
            "DateTimeStart" => &mut window.start,
            "DateTimeEnd" => &mut window.end,
            _ => {
                unknown_child(handler, element, child);
                continue;
            }
        };
        if let Some(system) = optional_attr(child, "system") {
            check_units(system, &TIME_SYSTEMS, "time system")?;
        }
        *slot = timestamp::parse(required_attr(child, "value")?, "date constraint")?;
    }
    Ok(window)
}

fn parse_series(element: &Element, handler: &mut dyn ErrorHandler) -> Result<SeriesConstraint> {
    let mut series = SeriesConstraint::default();
    for child in element.elements() {
        match child.name.as_str() {
            "Count" => {
                series.count = parse_count(&required_text(child, "series count")?, "series count")?
            }
            "Interval" => series.interval = Some(nested_period(child, "series interval")?),
            "Tolerance" => series.tolerance = Some(nested_period(child, "series tolerance")?),
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(series)
}

/// `<Interval><Period>PT1H</Period></Interval>`
fn nested_period(element: &Element, field: &'static str) -> Result<Period> {
    let period = element
        .child("Period")
        .ok_or_else(|| missing_child(element, "Period"))?;
    Period::parse(&required_text(period, field)?, field)
}

fn parse_sky(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Option<SkyConstraint>> {
    let mut sky = None;
    for child in element.elements() {
        match child.name.as_str() {
            "Sky" => {
                let brightness: SkyBrightness = required_text(child, "sky brightness")?.parse()?;
                sky = Some(SkyConstraint::Brightness(brightness));
            }
            "Flux" => {
                sky = Some(SkyConstraint::Flux {
                    value: text_f64(child, "sky flux")?,
                    units: optional_attr(child, "units").unwrap_or_default().to_string(),
                })
            }
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(sky)
}

fn parse_extinction(
    element: &Element,
    handler: &mut dyn ErrorHandler,
) -> Result<Option<ExtinctionConstraint>> {
    let mut extinction = None;
    for child in element.elements() {
        match child.name.as_str() {
            "Clouds" => {
                let clouds: CloudCover = required_text(child, "cloud cover")?.parse()?;
                extinction = Some(ExtinctionConstraint { clouds });
            }
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(extinction)
}

/// Halves of one image collected from sibling `<ImageData>` and
/// `<SourceCatalogue>` elements.
#[derive(Debug, Default)]
struct PendingImage {
    image_type: Option<ImageType>,
    fits_header: Option<String>,
    url: Option<String>,
    object_list: Option<ObjectList>,
    has_image: bool,
    has_catalogue: bool,
}

impl PendingImage {
    fn is_empty(&self) -> bool {
        !self.has_image && !self.has_catalogue
    }

    fn is_complete(&self) -> bool {
        self.has_image && self.has_catalogue
    }

    fn finish(self) -> ImageData {
        let image_type = self.image_type.unwrap_or_else(|| {
            self.url
                .as_deref()
                .map(ImageType::infer_from_url)
                .unwrap_or_default()
        });
        ImageData {
            image_type,
            fits_header: self.fits_header,
            object_list: self.object_list,
            url: self.url,
        }
    }
}

/// Reads `<Observation>` results, pairing each ImageData with the
/// SourceCatalogue next to it.
///
/// A pending image is flushed once both halves are present, when a half it
/// already has shows up again, and at the end of the element.
fn parse_results(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Vec<ImageData>> {
    let mut images = Vec::new();
    let mut pending = PendingImage::default();

    for child in element.elements() {
        match child.name.as_str() {
            "ImageData" => {
                if pending.has_image {
                    images.push(mem::take(&mut pending).finish());
                }
                pending.has_image = true;
                pending.image_type = optional_attr(child, "type")
                    .map(str::parse::<ImageType>)
                    .transpose()?;
                for part in child.elements() {
                    match part.name.as_str() {
                        "FITSHeader" => pending.fits_header = text(part),
                        "URL" => pending.url = text(part),
                        _ => unknown_child(handler, child, part),
                    }
                }
            }
            "SourceCatalogue" => {
                if pending.has_catalogue {
                    images.push(mem::take(&mut pending).finish());
                }
                pending.has_catalogue = true;
                pending.object_list = parse_object_list(child)?;
            }
            _ => {
                unknown_child(handler, element, child);
                continue;
            }
        }

        if pending.is_complete() {
            images.push(mem::take(&mut pending).finish());
        }
    }

    if !pending.is_empty() {
        images.push(pending.finish());
    }
    Ok(images)
}

fn parse_scoring(
    element: &Element,
    document: &mut RtmlDocument,
    handler: &mut dyn ErrorHandler,
) -> Result<()> {
    for child in element.elements() {
        match child.name.as_str() {
            "Score" => document.score = Some(text_f64(child, "score")?),
            "Scores" => document.scores = parse_scores(child, handler)?,
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(())
}
