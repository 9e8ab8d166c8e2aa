//! Per-engine configuration.
//!
//! Every value here is passed explicitly to the engine that uses it; there is
//! no process-wide setting to race on.

use std::path::PathBuf;

/// Default DOCTYPE system identifier written on RTML 2.2 output.
pub const DEFAULT_DOCTYPE_SYSTEM_ID: &str = "http://www.estar.org.uk/documents/rtml2.2.dtd";

/// Namespace of RTML 3.1a documents.
pub const RTML31_NAMESPACE: &str = "http://www.rtml.org/v3.1a";

/// XML Schema instance namespace.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Default `xsi:schemaLocation` written on RTML 3.1a output.
pub const DEFAULT_SCHEMA_LOCATION: &str =
    "http://www.rtml.org/v3.1a http://telescope.livjm.ac.uk/rtml/RTML-nightly.xsd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmlConfig {
    /// DOCTYPE system identifier for RTML 2.2 output.
    pub doctype_system_id: String,
    /// `xsi:schemaLocation` value for RTML 3.1a output.
    pub schema_location: String,
    /// Local XML Schema file. When set, RTML 3.1a input whose root namespace
    /// differs from the schema's `targetNamespace` is reported as an error.
    pub schema_path: Option<PathBuf>,
    /// Fail a parse if the diagnostics sink collected anything.
    pub warnings_as_errors: bool,
}

impl Default for RtmlConfig {
    fn default() -> Self {
        Self {
            doctype_system_id: DEFAULT_DOCTYPE_SYSTEM_ID.to_string(),
            schema_location: DEFAULT_SCHEMA_LOCATION.to_string(),
            schema_path: None,
            warnings_as_errors: false,
        }
    }
}

impl RtmlConfig {
    pub fn with_doctype_system_id(mut self, id: impl Into<String>) -> Self {
        self.doctype_system_id = id.into();
        self
    }

    pub fn with_schema_location(mut self, location: impl Into<String>) -> Self {
        self.schema_location = location.into();
        self
    }

    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    pub fn with_warnings_as_errors(mut self, strict: bool) -> Self {
        self.warnings_as_errors = strict;
        self
    }
}
