//! Side channel for non-fatal problems found while reading a document.

use log::{error, warn};

/// Receives problems that do not abort parsing on their own.
///
/// The three levels mirror the classic SAX error handler: a `warning` is
/// informational, an `error` is a recoverable violation, a `fatal_error`
/// means the input could not be trusted. None of them stop the parse; the
/// caller decides afterwards whether to escalate.
pub trait ErrorHandler {
    fn warning(&mut self, message: String);
    fn error(&mut self, message: String);
    fn fatal_error(&mut self, message: String);
}

/// An [`ErrorHandler`] that logs and collects every message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub fatal_errors: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when nothing was reported at any level.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty() && self.fatal_errors.is_empty()
    }

    /// The most severe message collected, if any.
    pub fn first_problem(&self) -> Option<&str> {
        self.fatal_errors
            .first()
            .or_else(|| self.errors.first())
            .or_else(|| self.warnings.first())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.warnings.len() + self.errors.len() + self.fatal_errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }
}

impl ErrorHandler for Diagnostics {
    fn warning(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    fn error(&mut self, message: String) {
        error!("{}", message);
        self.errors.push(message);
    }

    fn fatal_error(&mut self, message: String) {
        error!("fatal: {}", message);
        self.fatal_errors.push(message);
    }
}
