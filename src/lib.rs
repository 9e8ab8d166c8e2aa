//! # rtml
//!
//! A reader and writer for RTML (Remote Telescope Markup Language) documents,
//! the XML requests and replies exchanged between observing agents and
//! robotic telescopes.
//!
//! Two dialects are supported: RTML 2.2 (DTD based) and RTML 3.1a (XML Schema
//! based). Both map onto one document model; the dialect is picked from the
//! root `version` attribute when reading and from
//! [`RtmlDocument::version`] when writing.
pub mod rtml;

// Re-export the main types for convenience
pub use rtml::{
    ErrorKind, Result, RtmlConfig, RtmlEngine, RtmlError, create, parse,
    codec::{
        coords::{Declination, RightAscension},
        period::Period,
        timestamp::Timestamp,
    },
    models::{RequestKind, RtmlDocument, RtmlVersion},
    observation::{ImageData, Observation, Target, TargetKind},
    schedule::{Exposure, Schedule},
};
