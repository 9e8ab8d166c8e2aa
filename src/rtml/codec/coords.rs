//! Right ascension and declination codecs.
//!
//! RTML carries target coordinates as text whose grammar is selected by a
//! `units` attribute:
//!
//! - `hms` / `dms`: whitespace-separated sexagesimal triples such as
//!   `00 43 56.61` and `+41 15 25.80`
//! - `radians`: a single floating point radian value
//!
//! Values are stored in sexagesimal fields and converted through radians for
//! arithmetic. Formatting always uses two decimal places for the seconds field.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::rtml::types::error::{Result, RtmlError};

/// Unit strings accepted for an arcsecond offset.
pub const OFFSET_UNITS: [&str; 3] = ["arcsec", "arcsecs", "arcseconds"];

/// Units accepted for right ascension text.
pub const RA_UNITS: [&str; 2] = ["hms", "radians"];

/// Units accepted for declination text.
pub const DEC_UNITS: [&str; 2] = ["dms", "radians"];

const CENTISECONDS_PER_DAY: i64 = 24 * 60 * 60 * 100;
const CENTIARCSECONDS_PER_DEGREE: i64 = 60 * 60 * 100;

/// A right ascension in hours, minutes and seconds of time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RightAscension {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
    /// Optional pointing offset in arcseconds.
    pub offset: Option<f64>,
}

impl RightAscension {
    pub fn new(hours: u32, minutes: u32, seconds: f64) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            offset: None,
        }
    }

    /// Parses right ascension text under the given `units` attribute value.
    ///
    /// # Errors
    /// - [`RtmlError::UnitMismatch`] if `units` is neither `hms` nor `radians`
    /// - [`RtmlError::Format`] if the text does not match the unit's grammar
    pub fn parse(text: &str, units: &str) -> Result<Self> {
        match units {
            "hms" => text.parse(),
            "radians" => {
                let radians = parse_float(text, "right ascension")?;
                Ok(Self::from_radians(radians))
            }
            other => Err(RtmlError::unit_mismatch("right ascension units", other, &RA_UNITS)),
        }
    }

    /// Builds a right ascension from an angle in radians, normalised into `[0, 2π)`.
    pub fn from_radians(radians: f64) -> Self {
        let hours = (radians * 12.0 / PI).rem_euclid(24.0);
        let whole_hours = hours.trunc();
        let minutes = (hours - whole_hours) * 60.0;
        let whole_minutes = minutes.trunc();
        Self {
            hours: whole_hours as u32,
            minutes: whole_minutes as u32,
            seconds: (minutes - whole_minutes) * 60.0,
            offset: None,
        }
    }

    pub fn to_radians(&self) -> f64 {
        self.to_hours() * PI / 12.0
    }

    pub fn to_hours(&self) -> f64 {
        f64::from(self.hours) + f64::from(self.minutes) / 60.0 + self.seconds / 3600.0
    }

    /// Returns the same position with an arcsecond offset attached.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl FromStr for RightAscension {
    type Err = RtmlError;

    fn from_str(text: &str) -> Result<Self> {
        let [h, m, s] = split_triple(text, "right ascension")?;
        let hours = parse_int(h, text, "right ascension")?;
        let minutes = parse_int(m, text, "right ascension")?;
        let seconds = parse_float(s, "right ascension").map_err(|_| {
            RtmlError::format("right ascension", text, "seconds are not a number")
        })?;

        if hours >= 24 || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
            return Err(RtmlError::format("right ascension", text, "field out of range"));
        }

        Ok(Self::new(hours, minutes, seconds))
    }
}

impl fmt::Display for RightAscension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Carry is resolved in integer centiseconds so 59.999 never prints as 60.00
        let total = i64::from(self.hours) * 360_000
            + i64::from(self.minutes) * 6_000
            + (self.seconds * 100.0).round() as i64;
        let total = total.rem_euclid(CENTISECONDS_PER_DAY);
        let (h, m, cs) = split_centis(total);
        write!(f, "{:02} {:02} {:02}.{:02}", h, m, cs / 100, cs % 100)
    }
}

/// A declination in signed degrees, arcminutes and arcseconds.
///
/// The sign is held separately so that `-00 30 00` keeps its hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Declination {
    pub negative: bool,
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
    /// Optional pointing offset in arcseconds.
    pub offset: Option<f64>,
}

impl Declination {
    pub fn new(negative: bool, degrees: u32, minutes: u32, seconds: f64) -> Self {
        Self {
            negative,
            degrees,
            minutes,
            seconds,
            offset: None,
        }
    }

    /// Parses declination text under the given `units` attribute value.
    ///
    /// The sexagesimal form requires an explicit `+` or `-` on the degrees token.
    pub fn parse(text: &str, units: &str) -> Result<Self> {
        match units {
            "dms" => text.parse(),
            "radians" => {
                let radians = parse_float(text, "declination")?;
                Self::from_radians(radians)
            }
            other => Err(RtmlError::unit_mismatch("declination units", other, &DEC_UNITS)),
        }
    }

    /// Builds a declination from an angle in radians; the angle must lie in `[-π/2, π/2]`.
    pub fn from_radians(radians: f64) -> Result<Self> {
        let degrees = radians.to_degrees();
        if !degrees.is_finite() || degrees.abs() > 90.0 + 1e-9 {
            return Err(RtmlError::format(
                "declination",
                &radians.to_string(),
                "angle outside [-90, +90] degrees",
            ));
        }
        let magnitude = degrees.abs();
        let whole_degrees = magnitude.trunc();
        let minutes = (magnitude - whole_degrees) * 60.0;
        let whole_minutes = minutes.trunc();
        Ok(Self {
            negative: degrees < 0.0,
            degrees: whole_degrees as u32,
            minutes: whole_minutes as u32,
            seconds: (minutes - whole_minutes) * 60.0,
            offset: None,
        })
    }

    pub fn to_radians(&self) -> f64 {
        self.to_degrees().to_radians()
    }

    pub fn to_degrees(&self) -> f64 {
        let magnitude =
            f64::from(self.degrees) + f64::from(self.minutes) / 60.0 + self.seconds / 3600.0;
        if self.negative { -magnitude } else { magnitude }
    }

    /// Returns the same position with an arcsecond offset attached.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl FromStr for Declination {
    type Err = RtmlError;

    fn from_str(text: &str) -> Result<Self> {
        let [d, m, s] = split_triple(text, "declination")?;

        // U+2212 shows up in documents produced from typeset sources
        let (negative, digits) = if let Some(rest) = d.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = d.strip_prefix('\u{2212}') {
            (true, rest)
        } else if let Some(rest) = d.strip_prefix('+') {
            (false, rest)
        } else {
            return Err(RtmlError::format(
                "declination",
                text,
                "degrees must start with '+' or '-'",
            ));
        };

        let degrees = parse_int(digits, text, "declination")?;
        let minutes = parse_int(m, text, "declination")?;
        let seconds = parse_float(s, "declination")
            .map_err(|_| RtmlError::format("declination", text, "seconds are not a number"))?;

        if degrees > 90 || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
            return Err(RtmlError::format("declination", text, "field out of range"));
        }

        let dec = Self::new(negative, degrees, minutes, seconds);
        if dec.to_degrees().abs() > 90.0 {
            return Err(RtmlError::format("declination", text, "beyond the pole"));
        }
        Ok(dec)
    }
}

impl fmt::Display for Declination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = i64::from(self.degrees) * CENTIARCSECONDS_PER_DEGREE
            + i64::from(self.minutes) * 6_000
            + (self.seconds * 100.0).round() as i64;
        let (d, m, cs) = split_centis(total);
        let sign = if self.negative { '-' } else { '+' };
        write!(f, "{}{:02} {:02} {:02}.{:02}", sign, d, m, cs / 100, cs % 100)
    }
}

/// Parses an arcsecond offset, validating its unit string.
///
/// # Errors
/// [`RtmlError::UnitMismatch`] for any unit other than `arcsec`, `arcsecs`, `arcseconds`.
pub fn parse_offset(text: &str, units: &str) -> Result<f64> {
    if !OFFSET_UNITS.contains(&units) {
        return Err(RtmlError::unit_mismatch("offset units", units, &OFFSET_UNITS));
    }
    parse_float(text, "offset")
}

/// Splits a count of hundredths into (major, minutes, hundredths-of-a-minute).
fn split_centis(total: i64) -> (i64, i64, i64) {
    (total / 360_000, (total % 360_000) / 6_000, total % 6_000)
}

fn split_triple<'a>(text: &'a str, field: &'static str) -> Result<[&'a str; 3]> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(RtmlError::format(
            field,
            text,
            format!("expected 3 whitespace-separated fields, found {}", tokens.len()),
        )),
    }
}

fn parse_int(token: &str, text: &str, field: &'static str) -> Result<u32> {
    token
        .parse::<u32>()
        .map_err(|e| RtmlError::format(field, text, e))
}

fn parse_float(text: &str, field: &'static str) -> Result<f64> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .map_err(|e| RtmlError::format(field, trimmed, e))
}
