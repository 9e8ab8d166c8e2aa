//! Codec layer for the textual micro-formats embedded in RTML content.
//!
//! # Submodules
//!
//! - [`coords`][]: Right ascension, declination and arcsecond offsets
//! - [`period`][]: ISO-8601-like durations
//! - [`timestamp`][]: Timestamps with the `never` sentinel

pub mod coords;
pub mod period;
pub mod timestamp;
