use std::fs;
use std::io::Read;
use std::path::Path;

use log::{debug, info};

use super::config::RtmlConfig;
use super::format::{dispatch, header};
use super::types::error::{Result, RtmlError};
use super::types::models::{RtmlDocument, RtmlVersion};
use super::xml::{Diagnostics, Element, ErrorHandler, parse_to_tree, write_document, write_document_text};

/// Reads and writes RTML documents in either dialect.
///
/// The engine owns its configuration and nothing else; every call builds its
/// own tree and model, so one engine can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct RtmlEngine {
    config: RtmlConfig,
}

impl RtmlEngine {
    pub fn new(config: RtmlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RtmlConfig {
        &self.config
    }

    /// Parses a document from raw bytes in any supported encoding.
    ///
    /// The dialect is chosen from the root `version` attribute before the
    /// document is fully parsed.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The input is not well-formed XML
    /// - The root `version` attribute is missing or names an unsupported dialect
    /// - Any element violates the dialect's structure, units or enumerations
    /// - `warnings_as_errors` is set and anything was reported to the diagnostics sink
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<RtmlDocument> {
        self.parse_bytes_with_diagnostics(bytes)
            .map(|(document, _)| document)
    }

    /// Parses a document that is already text.
    pub fn parse_str(&self, xml: &str) -> Result<RtmlDocument> {
        self.parse_str_with_diagnostics(xml)
            .map(|(document, _)| document)
    }

    /// Reads the whole of `reader` and parses it.
    pub fn parse_reader(&self, mut reader: impl Read) -> Result<RtmlDocument> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.parse_bytes(&bytes)
    }

    /// Parses the document stored at `path`.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<RtmlDocument> {
        let path = path.as_ref();
        info!("Reading RTML document: {}", path.display());
        let bytes = fs::read(path)?;
        self.parse_bytes(&bytes)
    }

    /// Like [`parse_bytes`](Self::parse_bytes), but also returns the
    /// warnings collected along the way.
    pub fn parse_bytes_with_diagnostics(&self, bytes: &[u8]) -> Result<(RtmlDocument, Diagnostics)> {
        let mut diagnostics = Diagnostics::new();
        let xml = header::decode_input(bytes, &mut diagnostics)?;
        let document = self.parse_text(&xml, &mut diagnostics)?;
        self.finish(document, diagnostics)
    }

    pub fn parse_str_with_diagnostics(&self, xml: &str) -> Result<(RtmlDocument, Diagnostics)> {
        let mut diagnostics = Diagnostics::new();
        let document = self.parse_text(xml, &mut diagnostics)?;
        self.finish(document, diagnostics)
    }

    fn parse_text(&self, xml: &str, diagnostics: &mut Diagnostics) -> Result<RtmlDocument> {
        // Step 1: Resolve the dialect from the root start tag alone
        let version = header::peek_version(xml)?;

        // Step 2: Build the full tree
        let root = parse_to_tree(xml, diagnostics)?;

        // Step 3: Check the namespace against a local schema, if configured
        if version == RtmlVersion::V31 {
            if let Some(path) = &self.config.schema_path {
                check_schema_namespace(path, &root, diagnostics)?;
            }
        }

        // Step 4: Walk the tree with the matching dialect
        let document = dispatch::parse_tree(&root, version, diagnostics)?;
        info!(
            "Parsed RTML {} {} document ({} observation(s))",
            document.version,
            document.kind,
            document.observations.len()
        );
        Ok(document)
    }

    fn finish(
        &self,
        document: RtmlDocument,
        diagnostics: Diagnostics,
    ) -> Result<(RtmlDocument, Diagnostics)> {
        if self.config.warnings_as_errors {
            if let Some(problem) = diagnostics.first_problem() {
                return Err(RtmlError::Validation(problem.to_string()));
            }
        }
        Ok((document, diagnostics))
    }

    /// Serialises `document` in the dialect named by its `version`.
    ///
    /// Output is ISO-8859-1 with two-space indentation. RTML 2.2 output
    /// carries the configured DOCTYPE; RTML 3.1a output carries the
    /// configured schema location.
    pub fn create(&self, document: &RtmlDocument) -> Result<Vec<u8>> {
        let (root, prolog) = dispatch::create_tree(document, &self.config)?;
        let bytes = write_document(&root, &prolog)?;
        info!(
            "Created RTML {} {} document ({} bytes)",
            document.version,
            document.kind,
            bytes.len()
        );
        Ok(bytes)
    }

    /// Serialises `document` to text. The declaration still names ISO-8859-1.
    pub fn create_string(&self, document: &RtmlDocument) -> Result<String> {
        let (root, prolog) = dispatch::create_tree(document, &self.config)?;
        write_document_text(&root, &prolog)
    }

    /// Reads a document in either dialect and writes it in `version`.
    pub fn translate(&self, bytes: &[u8], version: RtmlVersion) -> Result<Vec<u8>> {
        let document = self.parse_bytes(bytes)?;
        info!("Translating RTML {} document to RTML {}", document.version, version);
        self.create(&document.to_version(version))
    }
}

/// Reports a root namespace that differs from the schema's `targetNamespace`.
fn check_schema_namespace(
    path: &Path,
    root: &Element,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    match header::schema_target_namespace(path)? {
        Some(expected) if root.namespace.as_deref() == Some(expected.as_str()) => {
            debug!("Root namespace matches schema {}", path.display());
        }
        Some(expected) => diagnostics.error(format!(
            "Root namespace {:?} does not match targetNamespace {} of schema {}",
            root.namespace,
            expected,
            path.display()
        )),
        None => diagnostics.warning(format!(
            "Schema {} declares no targetNamespace",
            path.display()
        )),
    }
    Ok(())
}
