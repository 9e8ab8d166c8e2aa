//! Custom error types for the rtml crate.

use thiserror::Error;

/// Coarse classification of an [`RtmlError`].
///
/// Callers that only care about the category of a failure (for example to map
/// it onto a reply document) match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structural,
    MissingRequiredAttribute,
    UnitMismatch,
    Format,
    UnsupportedVersion,
    IllegalEnumValue,
    Xml,
    Io,
    Validation,
}

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum RtmlError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The XML collaborator could not read or write the document.
    #[error("XML error: {0}")]
    Xml(String),

    /// An element of the wrong kind or name was found at a traversal point.
    #[error("Expected element <{expected}>, found {found}")]
    Structural { expected: String, found: String },

    /// A mandatory attribute is absent.
    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingRequiredAttribute {
        element: String,
        attribute: &'static str,
    },

    /// A unit string is present but not one of the values the field allows.
    #[error("Unit mismatch for {field}: '{found}' is not one of [{allowed}]")]
    UnitMismatch {
        field: &'static str,
        found: String,
        allowed: String,
    },

    /// Numeric, coordinate, period or timestamp text could not be parsed.
    #[error("Invalid {field} value '{value}': {reason}")]
    Format {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The document's version attribute names a dialect this crate does not speak.
    #[error("Unsupported RTML version: '{0}'. Only 2.2 and 3.1a are supported.")]
    UnsupportedVersion(String),

    /// An enumerated value is not recognised.
    #[error("Illegal value '{value}' for {field}")]
    IllegalEnumValue { field: &'static str, value: String },

    /// Warnings or errors collected by the diagnostics sink were escalated.
    #[error("Document failed validation: {0}")]
    Validation(String),

    /// Wraps an inner error with the location it was raised from.
    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<RtmlError>,
    },
}

impl RtmlError {
    /// Returns the category of this error, looking through any context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RtmlError::Io(_) => ErrorKind::Io,
            RtmlError::Xml(_) => ErrorKind::Xml,
            RtmlError::Structural { .. } => ErrorKind::Structural,
            RtmlError::MissingRequiredAttribute { .. } => ErrorKind::MissingRequiredAttribute,
            RtmlError::UnitMismatch { .. } => ErrorKind::UnitMismatch,
            RtmlError::Format { .. } => ErrorKind::Format,
            RtmlError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            RtmlError::IllegalEnumValue { .. } => ErrorKind::IllegalEnumValue,
            RtmlError::Validation(_) => ErrorKind::Validation,
            RtmlError::Context { source, .. } => source.kind(),
        }
    }

    /// Wraps this error in a [`RtmlError::Context`] naming where it was raised.
    pub fn context(self, message: impl Into<String>) -> Self {
        RtmlError::Context {
            message: message.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn format(field: &'static str, value: &str, reason: impl ToString) -> Self {
        RtmlError::Format {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unit_mismatch(field: &'static str, found: &str, allowed: &[&str]) -> Self {
        RtmlError::UnitMismatch {
            field,
            found: found.to_string(),
            allowed: allowed.join(", "),
        }
    }

    pub(crate) fn illegal(field: &'static str, value: &str) -> Self {
        RtmlError::IllegalEnumValue {
            field,
            value: value.to_string(),
        }
    }
}

impl From<roxmltree::Error> for RtmlError {
    fn from(err: roxmltree::Error) -> Self {
        RtmlError::Xml(err.to_string())
    }
}

impl From<quick_xml::Error> for RtmlError {
    fn from(err: quick_xml::Error) -> Self {
        RtmlError::Xml(err.to_string())
    }
}

/// Attaches a context message to the error side of a [`Result`].
pub(crate) trait ResultExt<T> {
    fn context_with<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context_with<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.context(f()))
    }
}

/// A convenience `Result` type alias using the crate's `RtmlError` type.
pub type Result<T> = std::result::Result<T, RtmlError>;
