//! Dialect strategies for RTML 2.2 and RTML 3.1a.

use super::error::Result;
use super::models::{RtmlDocument, RtmlVersion};
use crate::rtml::config::RtmlConfig;
use crate::rtml::format::{v22, v31};
use crate::rtml::xml::{Element, ErrorHandler, Prolog};

/// A trait that defines how one RTML schema generation maps to and from the
/// document model.
pub trait Dialect {
    /// A short name used for debugging and logging.
    const DEBUG_NAME: &'static str;

    /// The version this dialect reads and writes.
    const VERSION: RtmlVersion;

    /// Walks a root `<RTML>` element and builds the document it describes.
    ///
    /// Problems that do not abort the parse (unknown elements, ignored text)
    /// go to `handler`.
    fn parse(root: &Element, handler: &mut dyn ErrorHandler) -> Result<RtmlDocument>;

    /// Builds the root `<RTML>` element for a document.
    fn create(document: &RtmlDocument, config: &RtmlConfig) -> Result<Element>;

    /// What to write before the root element.
    fn prolog(config: &RtmlConfig) -> Prolog;
}

/// Zero-cost marker struct for RTML 2.2.
#[derive(Debug)]
pub struct Rtml22;

impl Dialect for Rtml22 {
    const DEBUG_NAME: &'static str = "RTML 2.2";
    const VERSION: RtmlVersion = RtmlVersion::V22;

    fn parse(root: &Element, handler: &mut dyn ErrorHandler) -> Result<RtmlDocument> {
        v22::parse::parse_document(root, handler)
    }

    fn create(document: &RtmlDocument, _config: &RtmlConfig) -> Result<Element> {
        v22::create::create_document(document)
    }

    fn prolog(config: &RtmlConfig) -> Prolog {
        Prolog {
            doctype_system_id: Some(config.doctype_system_id.clone()),
        }
    }
}

/// Zero-cost marker struct for RTML 3.1a.
#[derive(Debug)]
pub struct Rtml31;

impl Dialect for Rtml31 {
    const DEBUG_NAME: &'static str = "RTML 3.1a";
    const VERSION: RtmlVersion = RtmlVersion::V31;

    fn parse(root: &Element, handler: &mut dyn ErrorHandler) -> Result<RtmlDocument> {
        v31::parse::parse_document(root, handler)
    }

    fn create(document: &RtmlDocument, config: &RtmlConfig) -> Result<Element> {
        v31::create::create_document(document, &config.schema_location)
    }

    fn prolog(_config: &RtmlConfig) -> Prolog {
        Prolog::default()
    }
}
