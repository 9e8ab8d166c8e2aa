//! Instrument description.

use std::fmt;
use std::str::FromStr;

use super::error::{Result, RtmlError};

/// Units accepted for detector binning.
pub const BINNING_UNITS: [&str; 1] = ["pixels"];

/// An instrument and its configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Device {
    /// Instrument class, e.g. `camera`, `spectrograph`, `polarimeter`.
    pub kind: Option<String>,
    pub name: Option<String>,
    /// Spectral region, e.g. `optical`, `infrared`.
    pub spectral_region: Option<String>,
    pub filter: Option<String>,
    pub detector: Option<Detector>,
    /// RTML 3.1a only.
    pub grating: Option<Grating>,
    /// RTML 3.1a only.
    pub half_wave_plate: Option<HalfWavePlate>,
}

impl Device {
    pub fn camera(filter: impl Into<String>) -> Self {
        Self {
            kind: Some("camera".to_string()),
            filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    /// Row binning in pixels.
    pub row_binning: u32,
    /// Column binning in pixels.
    pub column_binning: u32,
    /// RTML 3.1a only.
    pub gain: Option<f64>,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            row_binning: 1,
            column_binning: 1,
            gain: None,
        }
    }
}

impl Detector {
    pub fn binned(rows: u32, columns: u32) -> Self {
        Self {
            row_binning: rows,
            column_binning: columns,
            gain: None,
        }
    }

    pub fn check_binning_units(units: &str) -> Result<()> {
        if BINNING_UNITS.contains(&units) {
            Ok(())
        } else {
            Err(RtmlError::unit_mismatch("binning units", units, &BINNING_UNITS))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavelengthUnits {
    Nanometers,
    Micrometers,
    Angstroms,
    Meters,
}

impl WavelengthUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            WavelengthUnits::Nanometers => "nanometers",
            WavelengthUnits::Micrometers => "micrometers",
            WavelengthUnits::Angstroms => "angstroms",
            WavelengthUnits::Meters => "meters",
        }
    }
}

impl fmt::Display for WavelengthUnits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WavelengthUnits {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nanometers" => Ok(Self::Nanometers),
            "micrometers" => Ok(Self::Micrometers),
            "angstroms" => Ok(Self::Angstroms),
            "meters" => Ok(Self::Meters),
            other => Err(RtmlError::illegal("wavelength units", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wavelength {
    pub value: f64,
    pub units: WavelengthUnits,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grating {
    pub name: Option<String>,
    /// Central wavelength.
    pub wavelength: Option<Wavelength>,
    pub resolution: Option<f64>,
    /// Grating angle in degrees.
    pub angle: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotorSpeed {
    Slow,
    Fast,
}

impl RotorSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotorSpeed::Slow => "slow",
            RotorSpeed::Fast => "fast",
        }
    }
}

impl FromStr for RotorSpeed {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "slow" => Ok(Self::Slow),
            "fast" => Ok(Self::Fast),
            other => Err(RtmlError::illegal("rotor speed", other)),
        }
    }
}

/// Polarimeter half-wave plate.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfWavePlate {
    pub rotor_speed: RotorSpeed,
}
