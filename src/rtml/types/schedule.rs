//! Scheduling: exposure specification and observing constraints.

use std::fmt;
use std::str::FromStr;

use super::error::{Result, RtmlError};
use crate::rtml::codec::period::Period;
use crate::rtml::codec::timestamp::Timestamp;

/// Unit strings accepted for a time exposure, with their length in milliseconds.
const TIME_UNITS: [(&str, f64); 10] = [
    ("ms", 1.0),
    ("milliseconds", 1.0),
    ("s", 1_000.0),
    ("sec", 1_000.0),
    ("secs", 1_000.0),
    ("seconds", 1_000.0),
    ("min", 60_000.0),
    ("minutes", 60_000.0),
    ("h", 3_600_000.0),
    ("hours", 3_600_000.0),
];

/// Priority assumed when a schedule does not state one.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Units accepted for the moon distance.
pub const MOON_DISTANCE_UNITS: [&str; 1] = ["degrees"];

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Lower is more urgent. RTML 3.1a uses 0 for time-critical targets.
    pub priority: i32,
    pub exposure: Exposure,
    pub time_window: Option<TimeWindow>,
    pub series: Option<SeriesConstraint>,
    pub seeing: Option<SeeingConstraint>,
    pub moon: Option<MoonConstraint>,
    pub sky: Option<SkyConstraint>,
    pub airmass: Option<AirmassConstraint>,
    pub extinction: Option<ExtinctionConstraint>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            exposure: Exposure::default(),
            time_window: None,
            series: None,
            seeing: None,
            moon: None,
            sky: None,
            airmass: None,
            extinction: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExposureKind {
    #[default]
    Time,
    /// Expose until a signal-to-noise ratio is reached.
    Snr,
}

impl ExposureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureKind::Time => "time",
            ExposureKind::Snr => "snr",
        }
    }
}

impl FromStr for ExposureKind {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "time" => Ok(Self::Time),
            "snr" => Ok(Self::Snr),
            other => Err(RtmlError::illegal("exposure type", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    pub kind: ExposureKind,
    /// Time unit for time exposures; empty for signal-to-noise exposures.
    pub units: String,
    /// Number of exposures, at least 1.
    pub count: u32,
    /// Exposure length in `units`, or the target signal-to-noise ratio.
    pub length: f64,
}

impl Default for Exposure {
    fn default() -> Self {
        Self {
            kind: ExposureKind::Time,
            units: "ms".to_string(),
            count: 1,
            length: 0.0,
        }
    }
}

impl Exposure {
    pub fn time(length: f64, units: impl Into<String>, count: u32) -> Self {
        Self {
            kind: ExposureKind::Time,
            units: units.into(),
            count,
            length,
        }
    }

    pub fn snr(ratio: f64) -> Self {
        Self {
            kind: ExposureKind::Snr,
            units: String::new(),
            count: 1,
            length: ratio,
        }
    }

    /// Length of one time exposure in milliseconds.
    ///
    /// `None` for signal-to-noise exposures and unknown units.
    pub fn length_millis(&self) -> Option<f64> {
        if self.kind != ExposureKind::Time {
            return None;
        }
        TIME_UNITS
            .iter()
            .find(|(unit, _)| *unit == self.units)
            .map(|(_, factor)| self.length * factor)
    }

    /// Validates a time-exposure unit string.
    pub fn check_time_units(units: &str) -> Result<()> {
        if TIME_UNITS.iter().any(|(unit, _)| *unit == units) {
            Ok(())
        } else {
            let allowed: Vec<&str> = TIME_UNITS.iter().map(|(unit, _)| *unit).collect();
            Err(RtmlError::unit_mismatch("exposure units", units, &allowed))
        }
    }
}

/// Absolute observing window. `None` on either side means unbounded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeWindow {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

/// Repeat the observation `count` times, `interval` apart, within `tolerance`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesConstraint {
    pub count: u32,
    pub interval: Option<Period>,
    pub tolerance: Option<Period>,
}

/// Acceptable seeing in arcseconds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeeingConstraint {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

/// Minimum distance from the moon.
#[derive(Debug, Clone, PartialEq)]
pub struct MoonConstraint {
    pub distance: f64,
    /// Always `degrees`.
    pub units: String,
}

impl MoonConstraint {
    pub fn degrees(distance: f64) -> Self {
        Self {
            distance,
            units: "degrees".to_string(),
        }
    }

    /// Rejects any unit other than `degrees`.
    pub fn check_units(units: &str) -> Result<()> {
        if MOON_DISTANCE_UNITS.contains(&units) {
            Ok(())
        } else {
            Err(RtmlError::unit_mismatch("moon distance units", units, &MOON_DISTANCE_UNITS))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyBrightness {
    Dark,
    Grey,
    Bright,
}

impl SkyBrightness {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkyBrightness::Dark => "dark",
            SkyBrightness::Grey => "grey",
            SkyBrightness::Bright => "bright",
        }
    }
}

impl fmt::Display for SkyBrightness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkyBrightness {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dark" => Ok(Self::Dark),
            "grey" | "gray" => Ok(Self::Grey),
            "bright" => Ok(Self::Bright),
            other => Err(RtmlError::illegal("sky brightness", other)),
        }
    }
}

/// Sky background requirement, either a qualitative class or a flux limit.
#[derive(Debug, Clone, PartialEq)]
pub enum SkyConstraint {
    Brightness(SkyBrightness),
    /// Flux limit. RTML 3.1a only.
    Flux { value: f64, units: String },
}

/// Acceptable airmass range. RTML 3.1a only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AirmassConstraint {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudCover {
    Clear,
    Light,
    Heavy,
}

impl CloudCover {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudCover::Clear => "clear",
            CloudCover::Light => "light",
            CloudCover::Heavy => "heavy",
        }
    }
}

impl FromStr for CloudCover {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clear" | "photometric" => Ok(Self::Clear),
            "light" => Ok(Self::Light),
            "heavy" => Ok(Self::Heavy),
            other => Err(RtmlError::illegal("cloud cover", other)),
        }
    }
}

/// Tolerated extinction, expressed as cloud cover. RTML 3.1a only.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtinctionConstraint {
    pub clouds: CloudCover,
}
