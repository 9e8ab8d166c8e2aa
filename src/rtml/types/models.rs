//! Core document model.
//!
//! This module defines the dialect-independent representation of one RTML
//! document: the version and request kind, the requester's identity, and the
//! ordered observations with their results.
//!
//! Every sub-entity is owned by its parent. Graphs are built with struct
//! literals (most types implement `Default`) and handed whole to a creator.

use std::fmt;
use std::str::FromStr;

use super::device::Device;
use super::error::{Result, RtmlError};
use super::observation::{Observation, Target, TargetKind};
use super::schedule::DEFAULT_PRIORITY;
use crate::rtml::codec::period::Period;
use crate::rtml::codec::timestamp::Timestamp;

/// The RTML schema generation a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RtmlVersion {
    /// RTML 2.2, DTD based.
    V22,
    /// RTML 3.1a, XML Schema based.
    #[default]
    V31,
}

impl RtmlVersion {
    /// The identifier carried in the root `version` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            RtmlVersion::V22 => "2.2",
            RtmlVersion::V31 => "3.1a",
        }
    }
}

impl fmt::Display for RtmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RtmlVersion {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "2.2" => Ok(Self::V22),
            "3.1a" => Ok(Self::V31),
            other => Err(RtmlError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// What a document asks for or reports.
///
/// RTML 2.2 carries this in the `type` attribute, RTML 3.1a in `mode`; both
/// use the same wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestKind {
    #[default]
    Request,
    ScoreInquiry,
    ScoreOffer,
    Confirmation,
    Update,
    Complete,
    Incomplete,
    Reject,
    Fail,
    Abort,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Request => "request",
            RequestKind::ScoreInquiry => "inquiry",
            RequestKind::ScoreOffer => "offer",
            RequestKind::Confirmation => "confirmation",
            RequestKind::Update => "update",
            RequestKind::Complete => "observation",
            RequestKind::Incomplete => "incomplete",
            RequestKind::Reject => "reject",
            RequestKind::Fail => "failed",
            RequestKind::Abort => "abort",
        }
    }

    /// Kinds whose documents may carry a free-text error string.
    pub fn is_error(&self) -> bool {
        matches!(self, RequestKind::Reject | RequestKind::Fail | RequestKind::Abort)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "request" => Ok(Self::Request),
            "inquiry" | "score-inquiry" | "score" => Ok(Self::ScoreInquiry),
            "offer" | "score-offer" => Ok(Self::ScoreOffer),
            "confirmation" => Ok(Self::Confirmation),
            "update" => Ok(Self::Update),
            "observation" | "complete" => Ok(Self::Complete),
            "incomplete" => Ok(Self::Incomplete),
            "reject" => Ok(Self::Reject),
            "failed" | "fail" => Ok(Self::Fail),
            "abort" => Ok(Self::Abort),
            other => Err(RtmlError::illegal("request kind", other)),
        }
    }
}

/// Principal investigator / user contact details.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contact {
    /// Whether this contact is the PI. Only RTML 2.2 carries the flag.
    pub pi: bool,
    pub name: Option<String>,
    pub user: Option<String>,
    pub institution: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Project {
    pub id: String,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A length with its unit string, e.g. a focal length in meters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Length {
    pub value: f64,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aperture {
    pub value: f64,
    pub units: String,
    /// `geometric` or `effective`.
    pub kind: Option<String>,
}

/// Telescope site. RTML 3.1a only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
    pub name: Option<String>,
    /// Degrees, north positive.
    pub latitude: f64,
    /// Degrees, east positive.
    pub longitude: f64,
    /// Meters above sea level.
    pub altitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Telescope {
    pub name: Option<String>,
    /// A zero-valued aperture is treated as absent when writing.
    pub aperture: Option<Aperture>,
    /// A zero-valued focal length is treated as absent when writing.
    pub focal_length: Option<Length>,
    pub focal_ratio: Option<String>,
    pub location: Option<Location>,
}

/// The agent that sent (or should receive) the document.
///
/// RTML 2.2 identifies it by host and port and stores the document id on it;
/// RTML 3.1a identifies it by URI and keeps the id on the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntelligentAgent {
    pub id: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub uri: Option<String>,
}

impl IntelligentAgent {
    /// The agent URI, derived from host and port when no URI was given.
    pub fn uri(&self) -> Option<String> {
        if let Some(uri) = &self.uri {
            return Some(uri.clone());
        }
        match (&self.hostname, self.port) {
            (Some(host), Some(port)) => Some(format!("http://{}:{}/", host, port)),
            (Some(host), None) => Some(format!("http://{}/", host)),
            _ => None,
        }
    }
}

/// One point of a scoring curve: the chance of success after a delay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score {
    pub delay: Period,
    pub probability: f64,
    pub cumulative: f64,
}

/// One step in a document's life. RTML 3.1a only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryEntry {
    pub timestamp: Option<Timestamp>,
    pub agent_name: Option<String>,
    pub agent_uri: Option<String>,
    pub description: Option<String>,
    pub rejection_reason: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct History {
    pub entries: Vec<HistoryEntry>,
}

/// A complete RTML document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RtmlDocument {
    pub version: RtmlVersion,
    pub kind: RequestKind,
    /// Document id. RTML 3.1a only; RTML 2.2 keeps it on the agent.
    pub uid: Option<String>,
    pub contact: Option<Contact>,
    pub project: Option<Project>,
    pub telescope: Option<Telescope>,
    pub agent: Option<IntelligentAgent>,
    /// Default device for observations without their own.
    pub device: Option<Device>,
    /// Default target. RTML 3.1a only.
    pub target: Option<Target>,
    pub observations: Vec<Observation>,
    pub score: Option<f64>,
    pub scores: Vec<Score>,
    pub completion_time: Option<Timestamp>,
    pub history: Option<History>,
    /// Free text explaining a reject, fail or abort.
    pub error_string: Option<String>,
}

impl RtmlDocument {
    pub fn new(version: RtmlVersion, kind: RequestKind) -> Self {
        Self {
            version,
            kind,
            ..Self::default()
        }
    }

    /// The document id wherever the dialect put it.
    pub fn uid(&self) -> Option<&str> {
        self.uid
            .as_deref()
            .or_else(|| self.agent.as_ref().and_then(|a| a.id.as_deref()))
    }

    /// The device an observation actually uses: its own, else the document default.
    pub fn effective_device<'a>(&'a self, observation: &'a Observation) -> Option<&'a Device> {
        observation.device.as_ref().or(self.device.as_ref())
    }

    /// Rewrites the document for another dialect.
    ///
    /// Moves the id between the root and the agent, derives the agent URI from
    /// host and port, and for RTML 3.1a sets priority 0 on schedules whose
    /// target is a target of opportunity and moves other priority-0 schedules
    /// to [`DEFAULT_PRIORITY`].
    pub fn to_version(mut self, version: RtmlVersion) -> Self {
        if self.version == version {
            return self;
        }

        match version {
            RtmlVersion::V31 => {
                if let Some(agent) = self.agent.as_mut() {
                    if self.uid.is_none() {
                        self.uid = agent.id.take();
                    }
                    agent.uri = agent.uri();
                }
                for observation in &mut self.observations {
                    let schedule = &mut observation.schedule;
                    match observation.target.kind {
                        TargetKind::Toop => schedule.priority = 0,
                        TargetKind::Normal if schedule.priority == 0 => {
                            schedule.priority = DEFAULT_PRIORITY;
                        }
                        TargetKind::Normal => {}
                    }
                }
            }
            RtmlVersion::V22 => {
                if let Some(uid) = self.uid.take() {
                    self.agent.get_or_insert_with(IntelligentAgent::default).id = Some(uid);
                }
            }
        }

        self.version = version;
        self
    }
}
