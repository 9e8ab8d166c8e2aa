//! Helpers shared by both dialect parsers and creators.
//!
//! Walking: element/attribute/text access with the structural and unit checks
//! every dialect applies. Writing: the fixed numeric formats used on output.

use log::{trace, warn};

use crate::rtml::codec::coords;
use crate::rtml::codec::period::Period;
use crate::rtml::types::error::{Result, RtmlError};
use crate::rtml::types::models::{Aperture, Length, RtmlDocument, RequestKind, Score};
use crate::rtml::types::observation::{ObjectList, ObjectListKind};
use crate::rtml::types::schedule::{MoonConstraint, SeeingConstraint};
use crate::rtml::xml::{Element, ErrorHandler, text_element};

/// Unit strings accepted for seeing limits.
pub const SEEING_UNITS: [&str; 3] = coords::OFFSET_UNITS;

pub fn expect_name(element: &Element, name: &str) -> Result<()> {
    if element.name == name {
        Ok(())
    } else {
        Err(RtmlError::Structural {
            expected: name.to_string(),
            found: format!("element <{}>", element.name),
        })
    }
}

/// Error for a mandatory child that never appeared.
pub fn missing_child(parent: &Element, name: &str) -> RtmlError {
    RtmlError::Structural {
        expected: name.to_string(),
        found: format!("end of <{}>", parent.name),
    }
}

/// Error for a child that may appear at most once.
pub fn duplicate_child(parent: &Element, name: &str) -> RtmlError {
    RtmlError::Structural {
        expected: format!("at most one {} in <{}>", name, parent.name),
        found: format!("a second element <{}>", name),
    }
}

pub fn required_attr<'a>(element: &'a Element, name: &'static str) -> Result<&'a str> {
    element
        .attr(name)
        .map(str::trim)
        .ok_or_else(|| RtmlError::MissingRequiredAttribute {
            element: element.name.clone(),
            attribute: name,
        })
}

/// An attribute value, trimmed; empty values count as absent.
pub fn optional_attr<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.attr(name).map(str::trim).filter(|v| !v.is_empty())
}

/// Trimmed text content; whitespace-only text is absent.
pub fn text(element: &Element) -> Option<String> {
    element.text()
}

pub fn required_text(element: &Element, field: &'static str) -> Result<String> {
    element
        .text()
        .ok_or_else(|| RtmlError::format(field, "", format!("<{}> has no text content", element.name)))
}

pub fn parse_f64(text: &str, field: &'static str) -> Result<f64> {
    let text = text.trim();
    text.parse::<f64>().map_err(|e| RtmlError::format(field, text, e))
}

pub fn parse_u32(text: &str, field: &'static str) -> Result<u32> {
    let text = text.trim();
    text.parse::<u32>().map_err(|e| RtmlError::format(field, text, e))
}

pub fn parse_i32(text: &str, field: &'static str) -> Result<i32> {
    let text = text.trim();
    text.parse::<i32>().map_err(|e| RtmlError::format(field, text, e))
}

pub fn parse_u16(text: &str, field: &'static str) -> Result<u16> {
    let text = text.trim();
    text.parse::<u16>().map_err(|e| RtmlError::format(field, text, e))
}

/// Numeric text content of an element.
pub fn text_f64(element: &Element, field: &'static str) -> Result<f64> {
    parse_f64(&required_text(element, field)?, field)
}

/// Optional numeric attribute.
pub fn attr_f64(element: &Element, name: &str, field: &'static str) -> Result<Option<f64>> {
    optional_attr(element, name)
        .map(|v| parse_f64(v, field))
        .transpose()
}

/// A repeat or exposure count, which must be at least 1.
pub fn parse_count(text: &str, field: &'static str) -> Result<u32> {
    let count = parse_u32(text, field)?;
    if count == 0 {
        return Err(RtmlError::format(field, text, "count must be at least 1"));
    }
    Ok(count)
}

pub fn check_units(found: &str, allowed: &[&str], field: &'static str) -> Result<()> {
    if allowed.contains(&found) {
        Ok(())
    } else {
        Err(RtmlError::unit_mismatch(field, found, allowed))
    }
}

/// Reports an element child nobody handles. Never fatal.
pub fn unknown_child(handler: &mut dyn ErrorHandler, parent: &Element, child: &Element) {
    handler.warning(format!(
        "Ignoring unknown element <{}> inside <{}>",
        child.name, parent.name
    ));
}

/// Logs a field that the target dialect cannot carry.
pub fn dropped(dialect: &str, what: &str) {
    warn!("{} cannot represent {}; it is not written", dialect, what);
}

/// Fixed decimal places, with NaN written as the literal `NaN`.
pub fn fixed(value: f64, places: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.*}", places, value)
    }
}

/// Shortest text that reads back as the same value.
pub fn shortest(value: f64) -> String {
    value.to_string()
}

/// Appends `<name>text</name>` when `value` is present.
pub fn push_text(parent: &mut Element, name: &str, value: Option<&String>) {
    if let Some(value) = value {
        trace!("Writing <{}> text", name);
        parent.push(text_element(name, value.as_str()));
    }
}

/// Root-level free text, kept only for kinds that carry an error string.
pub fn root_error_text(
    root: &Element,
    kind: RequestKind,
    handler: &mut dyn ErrorHandler,
) -> Option<String> {
    let text = root.text()?;
    if kind.is_error() {
        Some(text)
    } else {
        handler.warning(format!(
            "Ignoring text on a document of kind '{}': {}",
            kind, text
        ));
        None
    }
}

/// Writes the error string as root text when the document kind allows it.
pub fn push_error_text(root: &mut Element, document: &RtmlDocument, dialect: &str) {
    let Some(error) = &document.error_string else {
        return;
    };
    if document.kind.is_error() {
        root.push_text(error.as_str());
    } else {
        dropped(dialect, "an error string on a non-error document");
    }
}

pub fn parse_aperture(element: &Element) -> Result<Aperture> {
    Ok(Aperture {
        value: text_f64(element, "aperture")?,
        units: optional_attr(element, "units").unwrap_or("meters").to_string(),
        kind: optional_attr(element, "type").map(str::to_string),
    })
}

pub fn parse_length(element: &Element, field: &'static str) -> Result<Length> {
    Ok(Length {
        value: text_f64(element, field)?,
        units: optional_attr(element, "units").unwrap_or("meters").to_string(),
    })
}

/// `None` for a zero aperture, which is treated as unknown.
pub fn aperture_element(aperture: &Aperture) -> Option<Element> {
    if aperture.value == 0.0 {
        return None;
    }
    Some(
        Element::new("Aperture")
            .with_opt_attr("type", aperture.kind.as_deref())
            .with_attr("units", aperture.units.as_str())
            .with_text(shortest(aperture.value)),
    )
}

/// `None` for a zero length, which is treated as unknown.
pub fn length_element(name: &str, length: &Length) -> Option<Element> {
    if length.value == 0.0 {
        return None;
    }
    Some(
        Element::new(name)
            .with_attr("units", length.units.as_str())
            .with_text(shortest(length.value)),
    )
}

pub fn parse_seeing(element: &Element) -> Result<SeeingConstraint> {
    if let Some(units) = optional_attr(element, "units") {
        check_units(units, &SEEING_UNITS, "seeing units")?;
    }
    Ok(SeeingConstraint {
        minimum: attr_f64(element, "minimum", "seeing minimum")?,
        maximum: attr_f64(element, "maximum", "seeing maximum")?,
    })
}

pub fn seeing_element(seeing: &SeeingConstraint, units: Option<&str>) -> Element {
    Element::new("SeeingConstraint")
        .with_opt_attr("minimum", seeing.minimum.map(|v| fixed(v, 2)))
        .with_opt_attr("maximum", seeing.maximum.map(|v| fixed(v, 2)))
        .with_opt_attr("units", units)
}

/// Reads `<MoonConstraint><Distance units="degrees">n</Distance></MoonConstraint>`.
pub fn parse_moon(element: &Element, handler: &mut dyn ErrorHandler) -> Result<MoonConstraint> {
    let mut moon = None;
    for child in element.elements() {
        match child.name.as_str() {
            "Distance" => {
                let units = optional_attr(child, "units").unwrap_or("degrees");
                MoonConstraint::check_units(units)?;
                moon = Some(MoonConstraint {
                    distance: text_f64(child, "moon distance")?,
                    units: units.to_string(),
                });
            }
            _ => unknown_child(handler, element, child),
        }
    }
    moon.ok_or_else(|| missing_child(element, "Distance"))
}

pub fn moon_element(moon: &MoonConstraint) -> Result<Element> {
    MoonConstraint::check_units(&moon.units)?;
    Ok(Element::new("MoonConstraint").with_child(
        Element::new("Distance")
            .with_attr("units", moon.units.as_str())
            .with_text(fixed(moon.distance, 2)),
    ))
}

/// Reads the `<Score delay probability cumulative/>` children of `<Scores>`.
pub fn parse_scores(element: &Element, handler: &mut dyn ErrorHandler) -> Result<Vec<Score>> {
    let mut scores = Vec::new();
    for child in element.elements() {
        if child.name != "Score" {
            unknown_child(handler, element, child);
            continue;
        }
        scores.push(Score {
            delay: Period::parse(required_attr(child, "delay")?, "score delay")?,
            probability: parse_f64(required_attr(child, "probability")?, "score probability")?,
            cumulative: parse_f64(required_attr(child, "cumulative")?, "score cumulative")?,
        });
    }
    Ok(scores)
}

/// `None` for an empty curve.
pub fn scores_element(scores: &[Score]) -> Option<Element> {
    if scores.is_empty() {
        return None;
    }
    let mut element = Element::new("Scores");
    for score in scores {
        element.push(
            Element::new("Score")
                .with_attr("delay", score.delay.to_string())
                .with_attr("probability", fixed(score.probability, 5))
                .with_attr("cumulative", fixed(score.cumulative, 5)),
        );
    }
    Some(element)
}

/// An object list element (`ObjectList` or `SourceCatalogue`); empty text is absent.
pub fn parse_object_list(element: &Element) -> Result<Option<ObjectList>> {
    let kind: ObjectListKind = match optional_attr(element, "type") {
        Some(kind) => kind.parse()?,
        None => ObjectListKind::Cluster,
    };
    Ok(text(element).map(|content| ObjectList { kind, content }))
}

pub fn object_list_element(name: &str, list: &ObjectList) -> Element {
    Element::new(name)
        .with_attr("type", list.kind.as_str())
        .with_text(list.content.as_str())
}
