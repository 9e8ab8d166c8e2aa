//! RTML 2.2 parser.

use log::{debug, trace};

use super::DIALECT;
use crate::rtml::codec::coords::{self, Declination, RightAscension};
use crate::rtml::codec::period::Period;
use crate::rtml::codec::timestamp;
use crate::rtml::format::common::{
    duplicate_child, expect_name, missing_child, optional_attr, parse_aperture, parse_count,
    parse_i32, parse_length, parse_moon, parse_object_list, parse_scores, parse_seeing,
    parse_u16, attr_f64, required_attr, required_text, root_error_text, text, text_f64,
    unknown_child,
};
use crate::rtml::types::device::{Detector, Device};
use crate::rtml::types::error::{Result, ResultExt, RtmlError};
use crate::rtml::types::models::{
    Contact, IntelligentAgent, Project, RequestKind, RtmlDocument, RtmlVersion, Telescope,
};
use crate::rtml::types::observation::{
    ImageData, ImageType, Magnitude, Observation, Target, TargetKind,
};
use crate::rtml::types::schedule::{
    Exposure, ExposureKind, Schedule, SeriesConstraint, SkyBrightness, SkyConstraint, TimeWindow,
};
use crate::rtml::xml::{Element, ErrorHandler};

/// Builds a document from an RTML 2.2 root element.
///
/// # Errors
/// - [`RtmlError::Structural`] if the root is not `<RTML>`, or an Observation
///   lacks its Target or Schedule, or has more than one of either
/// - [`RtmlError::MissingRequiredAttribute`] if `version` or `type` is absent
/// - [`RtmlError::UnsupportedVersion`] if `version` is not `2.2`
/// - Any codec, unit or enumeration error raised by a child
pub fn parse_document(root: &Element, handler: &mut dyn ErrorHandler) -> Result<RtmlDocument> {
    // Step 1: Root element and its required attributes
    expect_name(root, "RTML")?;
    let version = required_attr(root, "version")?;
    if version.parse::<RtmlVersion>()? != RtmlVersion::V22 {
        return Err(RtmlError::UnsupportedVersion(version.to_string()));
    }
    let kind: RequestKind = required_attr(root, "type")?.parse()?;
    let mut document = RtmlDocument::new(RtmlVersion::V22, kind);

    // Step 2: Children in document order
    for child in root.elements() {
        trace!("{}: reading <{}>", DIALECT, child.name);
        match child.name.as_str() {
            "Contact" => document.contact = Some(parse_contact(child, handler)),
            "Project" => document.project = Some(Project::new(text(child).unwrap_or_default())),
            "Telescope" => document.telescope = Some(parse_telescope(child, handler)?),
            "IntelligentAgent" => document.agent = Some(parse_agent(child)?),
            "Device" => document.device = Some(parse_device(child, handler)?),
            "Observation" => {
                let number = document.observations.len() + 1;
                let observation = parse_observation(child, handler)
                    .context_with(|| format!("in <Observation> #{}", number))?;
                document.observations.push(observation);
            }
            "Score" => document.score = Some(text_f64(child, "score")?),
            "Scores" => document.scores = parse_scores(child, handler)?,
            "CompletionTime" => {
                let value = required_text(child, "completion time")?;
                document.completion_time = timestamp::parse(&value, "completion time")?;
            }
            _ => unknown_child(handler, root, child),
        }
    }

    // Step 3: Free text on the root is the error string
    document.error_string = root_error_text(root, kind, handler);

    debug!(
        "Parsed {} {} document with {} observation(s)",
        DIALECT,
        kind,
        document.observations.len()
    );
    Ok(document)
}

fn parse_contact(element: &Element, handler: &mut dyn ErrorHandler) -> Contact {
    let mut contact = Contact {
        pi: optional_attr(element, "PI") == Some("true"),
        ..Contact::default()
    };
    for child in element.elements() {
        let slot = match child.name.as_str() {
            "Name" => &mut contact.name,
            "User" => &mut contact.user,
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
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(telescope)
}

/// `<IntelligentAgent host port>id</IntelligentAgent>`
fn parse_agent(element: &Element) -> Result<IntelligentAgent> {
    Ok(IntelligentAgent {
        id: text(element),
        hostname: optional_attr(element, "host").map(str::to_string),
        port: optional_attr(element, "port")
            .map(|port| parse_u16(port, "agent port"))
            .transpose()?,
        uri: None,
    })
}

fn parse_device(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Device> {
    let mut device = Device {
        kind: optional_attr(element, "type").map(str::to_string),
        name: optional_attr(element, "name").map(str::to_string),
        spectral_region: optional_attr(element, "region").map(str::to_string),
        ..Device::default()
    };
    for child in element.elements() {
        match child.name.as_str() {
            "Filter" => device.filter = child.child("FilterType").and_then(text),
            "Detector" => device.detector = Some(parse_detector(child, handler)?),
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(device)
}

/// `<Detector><Binning rows columns units="pixels"/></Detector>`
fn parse_detector(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Detector> {
    let mut detector = Detector::default();
    for child in element.elements() {
        if child.name != "Binning" {
            unknown_child(handler, element, child);
            continue;
        }
        if let Some(units) = optional_attr(child, "units") {
            Detector::check_binning_units(units)?;
        }
        if let Some(rows) = optional_attr(child, "rows") {
            detector.row_binning = parse_count(rows, "row binning")?;
        }
        if let Some(columns) = optional_attr(child, "columns") {
            detector.column_binning = parse_count(columns, "column binning")?;
        }
    }
    Ok(detector)
}

fn parse_observation(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Observation> {
    let mut target = None;
    let mut schedule = None;
    let mut device = None;
    let mut image_data = Vec::new();

    for child in element.elements() {
        match child.name.as_str() {
            "Target" => {
                if target.is_some() {
                    return Err(duplicate_child(element, "Target"));
                }
                target = Some(parse_target(child, handler)?);
            }
            "Device" => device = Some(parse_device(child, handler)?),
            "Schedule" => {
                if schedule.is_some() {
                    return Err(duplicate_child(element, "Schedule"));
                }
                schedule = Some(parse_schedule(child, handler)?);
            }
            "ImageData" => image_data.push(parse_image_data(child, handler)?),
            _ => unknown_child(handler, element, child),
        }
    }

    Ok(Observation {
        device,
        target: target.ok_or_else(|| missing_child(element, "Target"))?,
        schedule: schedule.ok_or_else(|| missing_child(element, "Schedule"))?,
        image_data,
    })
}

fn parse_target(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Target> {
    let mut target = Target {
        kind: optional_attr(element, "type")
            .map(str::parse::<TargetKind>)
            .transpose()?
            .unwrap_or_default(),
        ident: optional_attr(element, "ident").map(str::to_string),
        ..Target::default()
    };
    for child in element.elements() {
        match child.name.as_str() {
            "TargetName" => target.name = text(child),
            "Coordinates" => parse_coordinates(child, &mut target, handler)?,
            "Magnitude" => {
                target.magnitude = Some(Magnitude {
                    value: text_f64(child, "magnitude")?,
                    filter: optional_attr(child, "type").map(str::to_string),
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
                let units = optional_attr(child, "units").unwrap_or("hms");
                let mut ra = RightAscension::parse(&required_text(child, "right ascension")?, units)?;
                ra.offset = offset_attr(child)?;
                target.ra = Some(ra);
            }
            "Declination" => {
                let units = optional_attr(child, "units").unwrap_or("dms");
                let mut dec = Declination::parse(&required_text(child, "declination")?, units)?;
                dec.offset = offset_attr(child)?;
                target.dec = Some(dec);
            }
            "Equinox" => target.equinox = text(child),
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(())
}

/// The `offset` attribute in `offsetUnits`, defaulting to arcseconds.
fn offset_attr(element: &Element) -> Result<Option<f64>> {
    let Some(offset) = optional_attr(element, "offset") else {
        return Ok(None);
    };
    let units = optional_attr(element, "offsetUnits").unwrap_or("arcseconds");
    coords::parse_offset(offset, units).map(Some)
}

fn parse_schedule(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Schedule> {
    let mut schedule = Schedule::default();
    if let Some(priority) = optional_attr(element, "priority") {
        schedule.priority = parse_i32(priority, "priority")?;
    }

    for child in element.elements() {
        match child.name.as_str() {
            "Exposure" => schedule.exposure = parse_exposure(child)?,
            "TimeConstraint" => schedule.time_window = Some(parse_time_constraint(child, handler)?),
            "SeriesConstraint" => schedule.series = Some(parse_series(child, handler)?),
            "SeeingConstraint" => schedule.seeing = Some(parse_seeing(child)?),
            "MoonConstraint" => schedule.moon = Some(parse_moon(child, handler)?),
            "SkyConstraint" => schedule.sky = parse_sky(child, handler)?,
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(schedule)
}

/// `<Exposure type units><Count>n</Count>length</Exposure>`
fn parse_exposure(element: &Element) -> Result<Exposure> {
    let kind = optional_attr(element, "type")
        .map(str::parse::<ExposureKind>)
        .transpose()?
        .unwrap_or_default();
    let units = match kind {
        ExposureKind::Time => {
            let units = required_attr(element, "units")?;
            Exposure::check_time_units(units)?;
            units.to_string()
        }
        ExposureKind::Snr => optional_attr(element, "units").unwrap_or_default().to_string(),
    };
    let count = match element.child("Count") {
        Some(count) => parse_count(&required_text(count, "exposure count")?, "exposure count")?,
        None => 1,
    };

    Ok(Exposure {
        kind,
        units,
        count,
        length: text_f64(element, "exposure length")?,
    })
}

fn parse_time_constraint(element: &Element, handler: &mut dyn ErrorHandler) -> Result<TimeWindow> {
    let mut window = TimeWindow::default();
    for child in element.elements() {
        match child.name.as_str() {
            "StartDateTime" => {
                window.start = timestamp::parse(&required_text(child, "start time")?, "start time")?
            }
            "EndDateTime" => {
                window.end = timestamp::parse(&required_text(child, "end time")?, "end time")?
            }
            _ => unknown_child(handler, element, child),
        }
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
            "Interval" => {
                let value = required_text(child, "series interval")?;
                series.interval = Some(Period::parse(&value, "series interval")?);
            }
            "Tolerance" => {
                let value = required_text(child, "series tolerance")?;
                series.tolerance = Some(Period::parse(&value, "series tolerance")?);
            }
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(series)
}

fn parse_sky(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Option<SkyConstraint>> {
    let mut sky = None;
    for child in element.elements() {
        match child.name.as_str() {
            "Sky" => {
                let brightness: SkyBrightness = required_text(child, "sky brightness")?.parse()?;
                sky = Some(SkyConstraint::Brightness(brightness));
            }
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(sky)
}

/// `<ImageData type delivery reduced>` with the image URL as text.
fn parse_image_data(element: &Element, handler: &mut dyn ErrorHandler) -> Result<ImageData> {
    let url = text(element);
    let image_type = match optional_attr(element, "type") {
        Some(image_type) => image_type.parse()?,
        None => url.as_deref().map(ImageType::infer_from_url).unwrap_or_default(),
    };
    let mut image = ImageData {
        image_type,
        url,
        ..ImageData::default()
    };

    for child in element.elements() {
        match child.name.as_str() {
            "FITSHeader" => image.fits_header = text(child),
            "ObjectList" => image.object_list = parse_object_list(child)?,
            _ => unknown_child(handler, element, child),
        }
    }
    Ok(image)
}
