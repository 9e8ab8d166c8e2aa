//! # Dialect Dispatcher
//!
//! Routes a parsed tree (or a document about to be written) to the dialect
//! named by its version. The version is resolved once; nothing below this
//! point branches on it again.

use log::debug;

use crate::rtml::config::RtmlConfig;
use crate::rtml::types::dialects::{Dialect, Rtml22, Rtml31};
use crate::rtml::types::error::Result;
use crate::rtml::types::models::{RtmlDocument, RtmlVersion};
use crate::rtml::xml::{Element, ErrorHandler, Prolog};

/// Builds the document model from a root element written in `version`.
pub fn parse_tree(
    root: &Element,
    version: RtmlVersion,
    handler: &mut dyn ErrorHandler,
) -> Result<RtmlDocument> {
    match version {
        RtmlVersion::V22 => parse_with::<Rtml22>(root, handler),
        RtmlVersion::V31 => parse_with::<Rtml31>(root, handler),
    }
}

/// Builds the root element and prolog for a document in its own version.
pub fn create_tree(document: &RtmlDocument, config: &RtmlConfig) -> Result<(Element, Prolog)> {
    match document.version {
        RtmlVersion::V22 => create_with::<Rtml22>(document, config),
        RtmlVersion::V31 => create_with::<Rtml31>(document, config),
    }
}

fn parse_with<D: Dialect>(root: &Element, handler: &mut dyn ErrorHandler) -> Result<RtmlDocument> {
    debug!("Parsing document as {} (version {})", D::DEBUG_NAME, D::VERSION);
    D::parse(root, handler)
}

fn create_with<D: Dialect>(
    document: &RtmlDocument,
    config: &RtmlConfig,
) -> Result<(Element, Prolog)> {
    debug!("Creating document as {} (version {})", D::DEBUG_NAME, D::VERSION);
    let root = D::create(document, config)?;
    Ok((root, D::prolog(config)))
}
