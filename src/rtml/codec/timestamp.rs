//! Timestamp codec with the `never` sentinel.
//!
//! RTML timestamps follow the `yyyy-MM-dd'T'HH:mm:ssZ` profile where the zone
//! is written as `+HHMM`. The literal `never` means "no bound" and maps to
//! `None` in both directions.

use chrono::{DateTime, FixedOffset};

use crate::rtml::types::error::{Result, RtmlError};

/// A point in time with the zone offset it was written with.
pub type Timestamp = DateTime<FixedOffset>;

/// Sentinel text for an absent timestamp.
pub const NEVER: &str = "never";

const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Input formats tried in order after RFC 3339.
const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Parses timestamp text, returning `None` for `never`.
///
/// Accepts `+HHMM`, `+HH:MM` and `Z` zone designators and optional fractional
/// seconds.
pub fn parse(text: &str, field: &'static str) -> Result<Option<Timestamp>> {
    let text = text.trim();
    if text == NEVER {
        return Ok(None);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(ts));
    }

    let mut last_error = None;
    for format in INPUT_FORMATS {
        match DateTime::parse_from_str(text, format) {
            Ok(ts) => return Ok(Some(ts)),
            Err(e) => last_error = Some(e),
        }
    }

    Err(RtmlError::format(
        field,
        text,
        last_error.map_or_else(|| "unrecognised timestamp".to_string(), |e| e.to_string()),
    ))
}

/// Formats a timestamp, writing `never` for `None`.
pub fn format(timestamp: Option<&Timestamp>) -> String {
    match timestamp {
        Some(ts) => ts.format(OUTPUT_FORMAT).to_string(),
        None => NEVER.to_string(),
    }
}
