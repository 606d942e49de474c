//! Error types for sitespec.
//!
//! This module defines the error types returned by rule loading, selector
//! compilation, extraction and the expectation runner.

use std::path::PathBuf;

/// Error type for extraction operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No rule file exists (or could be read) for the exact hostname key.
    ///
    /// Recoverable: drives the superdomain walk and never reaches a
    /// [`Cascade`](crate::Cascade) caller.
    #[error("No rule set for hostname: {hostname}")]
    RuleSetNotFound { hostname: String },

    /// A tree-selector expression failed to compile or evaluate.
    #[error("Invalid selector `{expression}`: {message}")]
    Selector { expression: String, message: String },

    /// A `test_contains` line appeared before any `test_url` line.
    #[error("Invalid rule file {}: test_contains before test_url on line {line}", path.display())]
    MalformedExpectationFile { path: PathBuf, line: usize },

    /// Fetching page content failed.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn selector(expression: &str, message: impl Into<String>) -> Self {
        Self::Selector {
            expression: expression.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
