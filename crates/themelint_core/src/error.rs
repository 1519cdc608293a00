//! Engine error types.

use thiserror::Error;

/// Errors that can occur while preparing or running checks.
#[derive(Debug, Error)]
pub enum LinterError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File error.
    #[error("File error: {0}")]
    File(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] themelint_parser::ParseError),

    /// Catalog error.
    #[error("Docset error: {0}")]
    Docset(#[from] DocsetError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LinterError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a file error.
    pub fn file(message: impl Into<String>) -> Self {
        Self::File(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Failure raised by a check handler.
///
/// The runner catches it at the check boundary: the failing check's
/// diagnostics for the document are discarded and other checks keep running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The check could not complete.
    #[error("{0}")]
    Failed(String),

    /// A setting has a value the check cannot use.
    #[error("Invalid setting '{key}': {message}")]
    InvalidSetting { key: String, message: String },
}

impl CheckError {
    /// Creates a generic check failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates an invalid setting error.
    pub fn invalid_setting(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors loading a theme docset.
#[derive(Debug, Error)]
pub enum DocsetError {
    /// The docset file could not be read.
    #[error("Failed to read docset {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The docset is not valid JSON of the expected shape.
    #[error("Invalid docset: {0}")]
    Invalid(#[from] serde_json::Error),
}
