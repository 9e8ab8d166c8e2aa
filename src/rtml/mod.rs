//! Core RTML module.
//!
//! # Module Organization
//!
//! - [`types`]: The document model, errors, and the dialect trait
//! - [`codec`]: Coordinate, period and timestamp text formats
//! - [`xml`]: Owned XML tree, reader, writer and diagnostics sink
//! - [`format`]: Dialect parsers and creators plus the version dispatcher
//! - [`config`]: Per-engine settings
//! - [`engine`]: [`RtmlEngine`], the public entry point

pub mod codec;
pub mod config;
pub mod engine;
pub mod format;
pub mod types;
pub mod xml;

pub use config::RtmlConfig;
pub use engine::RtmlEngine;
pub use types::error::{self, ErrorKind, Result, RtmlError};
pub use types::{device, models, observation, schedule};

/// Parses a document with the default configuration.
pub fn parse(bytes: &[u8]) -> Result<models::RtmlDocument> {
    RtmlEngine::default().parse_bytes(bytes)
}

/// Serialises a document with the default configuration.
pub fn create(document: &models::RtmlDocument) -> Result<Vec<u8>> {
    RtmlEngine::default().create(document)
}
