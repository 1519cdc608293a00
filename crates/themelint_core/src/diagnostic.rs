//! Diagnostic types for check results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use themelint_ast::Span;

/// Severity level for diagnostics.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - must be fixed.
    #[default]
    Error,
    /// Warning - should be reviewed.
    Warning,
    /// Info - informational message.
    Info,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// A problem found by a check.
///
/// Offsets are bytes into the text of the document version the check ran
/// on. Conversion to line/column happens when the diagnostic is published.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Code of the check that produced this diagnostic.
    pub code: String,

    /// Severity after configuration overrides.
    #[serde(default)]
    pub severity: Severity,

    /// The diagnostic message.
    pub message: String,

    /// Byte span in the source.
    pub span: Span,

    /// Document the diagnostic belongs to.
    pub uri: String,
}

impl Diagnostic {
    /// Creates a new diagnostic with error severity.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        span: Span,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity: Severity::Error,
            message: message.into(),
            span,
            uri: uri.into(),
        }
    }

    /// Sets the severity level.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
