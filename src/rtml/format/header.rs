//! Input decoding and root-element inspection.
//!
//! This module handles:
//! - Detecting the input's text encoding (BOM or XML declaration)
//! - Reading the root element's attributes without building a tree
//! - Resolving the document version from the root `version` attribute
//! - Reading the `targetNamespace` of a local XML Schema file

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, trace};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::bytes::Regex;

use crate::rtml::types::error::{Result, RtmlError};
use crate::rtml::types::models::RtmlVersion;
use crate::rtml::xml::ErrorHandler;

/// Only the start of the input is searched for the XML declaration.
const DECLARATION_SNIFF_LEN: usize = 256;

/// The root element name in both dialects.
pub const ROOT_ELEMENT: &str = "RTML";

static ENCODING_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Returns the cached regex for the declaration's `encoding` pseudo-attribute.
fn encoding_regex() -> &'static Regex {
    ENCODING_PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*<\?xml[^>]*\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
            .expect("Invalid XML declaration regex pattern")
    })
}

/// Decodes raw input bytes to text.
///
/// # Priority for determining the encoding
/// 1. A byte order mark
/// 2. The `encoding` named in the XML declaration
/// 3. UTF-8
///
/// Malformed sequences are replaced and reported to `handler` as a warning.
pub fn decode_input(bytes: &[u8], handler: &mut dyn ErrorHandler) -> Result<String> {
    let (encoding, payload) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => {
            debug!("Byte order mark found, decoding as {}", encoding.name());
            (encoding, &bytes[bom_len..])
        }
        None => (declared_encoding(bytes, handler), bytes),
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(payload);
    if had_errors {
        handler.warning(format!(
            "Input contains byte sequences that are not valid {}; they were replaced",
            encoding.name()
        ));
    }
    Ok(text.into_owned())
}

fn declared_encoding(bytes: &[u8], handler: &mut dyn ErrorHandler) -> &'static Encoding {
    let prefix = &bytes[..bytes.len().min(DECLARATION_SNIFF_LEN)];
    let Some(caps) = encoding_regex().captures(prefix) else {
        trace!("No encoding declared, assuming UTF-8");
        return UTF_8;
    };

    let label = &caps[1];
    match Encoding::for_label(label) {
        Some(encoding) => {
            debug!("Declared encoding: {}", encoding.name());
            encoding
        }
        None => {
            handler.warning(format!(
                "Unknown declared encoding '{}', decoding as UTF-8",
                String::from_utf8_lossy(label)
            ));
            UTF_8
        }
    }
}

/// Extracts all attributes from the root XML element.
///
/// Only the start of the document is read; nothing after the root start tag
/// is inspected. Returns the root element's name and its attributes.
pub fn read_root_attributes(xml: &str) -> Result<(String, HashMap<String, String>)> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attrs = e
                    .attributes()
                    .map(|attr_result| {
                        let attr = attr_result
                            .map_err(|e| RtmlError::Xml(format!("Failed to parse XML attribute: {}", e)))?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                        let raw = String::from_utf8_lossy(&attr.value);
                        let value = quick_xml::escape::unescape(&raw)
                            .map_err(|e| RtmlError::Xml(format!("Failed to decode XML value: {}", e)))?
                            .into_owned();
                        Ok((key, value))
                    })
                    .collect::<Result<HashMap<_, _>>>()?;
                return Ok((name, attrs));
            }
            Ok(Event::Eof) => return Err(RtmlError::Xml("No root element found".to_string())),
            Err(e) => return Err(RtmlError::Xml(format!("Failed to read XML: {}", e))),
            _ => {}
        }
    }
}

/// Resolves the dialect of a document from its root `version` attribute.
///
/// # Errors
/// - [`RtmlError::Structural`] if the root element is not `<RTML>`
/// - [`RtmlError::MissingRequiredAttribute`] if there is no `version`
/// - [`RtmlError::UnsupportedVersion`] for any value other than `2.2` or `3.1a`
pub fn peek_version(xml: &str) -> Result<RtmlVersion> {
    let (root, attrs) = read_root_attributes(xml)?;
    let local_name = root.rsplit(':').next().unwrap_or(&root);
    if local_name != ROOT_ELEMENT {
        return Err(RtmlError::Structural {
            expected: ROOT_ELEMENT.to_string(),
            found: format!("element <{}>", root),
        });
    }

    let version = attrs
        .get("version")
        .ok_or_else(|| RtmlError::MissingRequiredAttribute {
            element: root.clone(),
            attribute: "version",
        })?;
    let version: RtmlVersion = version.parse()?;
    info!("Document declares RTML version {}", version);
    Ok(version)
}

/// Reads the `targetNamespace` declared by a local XML Schema file.
pub fn schema_target_namespace(path: &Path) -> Result<Option<String>> {
    let schema = fs::read_to_string(path)?;
    let (_, attrs) = read_root_attributes(&schema)?;
    Ok(attrs.get("targetNamespace").cloned())
}
