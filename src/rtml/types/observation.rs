//! Observations, targets and returned image data.

use std::fmt;
use std::str::FromStr;

use super::device::Device;
use super::error::{Result, RtmlError};
use super::schedule::Schedule;
use crate::rtml::codec::coords::{Declination, RightAscension};

/// One requested observation: what to point at, when, and what came back.
///
/// There is always exactly one schedule per observation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Observation {
    /// Overrides the document's default device.
    pub device: Option<Device>,
    pub target: Target,
    pub schedule: Schedule,
    pub image_data: Vec<ImageData>,
}

impl Observation {
    pub fn new(target: Target, schedule: Schedule) -> Self {
        Self {
            target,
            schedule,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetKind {
    #[default]
    Normal,
    /// Target of opportunity.
    Toop,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Normal => "normal",
            TargetKind::Toop => "toop",
        }
    }

    /// RTML 3.1a has no target type; priority 0 marks a target of opportunity.
    pub fn from_priority(priority: i32) -> Self {
        if priority == 0 { TargetKind::Toop } else { TargetKind::Normal }
    }
}

impl FromStr for TargetKind {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "toop" => Ok(Self::Toop),
            other => Err(RtmlError::illegal("target type", other)),
        }
    }
}

/// Catalogue brightness of a target.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Magnitude {
    pub value: f64,
    pub filter: Option<String>,
    pub error: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Target {
    pub kind: TargetKind,
    pub ident: Option<String>,
    pub name: Option<String>,
    pub ra: Option<RightAscension>,
    pub dec: Option<Declination>,
    pub equinox: Option<String>,
    pub magnitude: Option<Magnitude>,
}

impl Target {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.ra.is_some() || self.dec.is_some() || self.equinox.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageType {
    #[default]
    Fits16,
    Jpg,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Fits16 => "FITS16",
            ImageType::Jpg => "jpg",
        }
    }

    /// Guesses the type from a URL suffix; anything that is not a JPEG is FITS.
    pub fn infer_from_url(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            ImageType::Jpg
        } else {
            ImageType::Fits16
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "FITS16" => Ok(Self::Fits16),
            "jpg" | "jpeg" | "JPEG" => Ok(Self::Jpg),
            other => Err(RtmlError::illegal("image type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectListKind {
    /// Inline object list in cluster format.
    Cluster,
    /// URL of an external VOTable.
    VotableUrl,
}

impl ObjectListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectListKind::Cluster => "cluster",
            ObjectListKind::VotableUrl => "votable-url",
        }
    }
}

impl FromStr for ObjectListKind {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cluster" => Ok(Self::Cluster),
            "votable-url" | "votable" => Ok(Self::VotableUrl),
            other => Err(RtmlError::illegal("object list type", other)),
        }
    }
}

/// Either inline cluster text or a VOTable URL; never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectList {
    pub kind: ObjectListKind,
    pub content: String,
}

impl ObjectList {
    pub fn cluster(text: impl Into<String>) -> Self {
        Self {
            kind: ObjectListKind::Cluster,
            content: text.into(),
        }
    }

    pub fn votable_url(url: impl Into<String>) -> Self {
        Self {
            kind: ObjectListKind::VotableUrl,
            content: url.into(),
        }
    }
}

/// One reduced frame returned for an observation.
///
/// Delivery is always by URL and frames are always reduced; the wire markers
/// for both are fixed and not modelled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageData {
    pub image_type: ImageType,
    pub fits_header: Option<String>,
    pub object_list: Option<ObjectList>,
    pub url: Option<String>,
}

impl ImageData {
    /// Image data for a URL with the type inferred from its suffix.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            image_type: ImageType::infer_from_url(&url),
            url: Some(url),
            ..Self::default()
        }
    }
}
