//! Parse error types.

use serde::Serialize;
use thiserror::Error;

use themelint_ast::Span;

/// Errors that prevent a tree from being built at all.
///
/// Malformed markup is not an error: parsers recover and report it as a
/// [`SyntaxError`] on the parsed document instead.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Spans are `u32` byte offsets, which bounds the document size.
    #[error("Document of {size} bytes exceeds the {} byte limit", u32::MAX)]
    TooLarge { size: usize },
}

impl ParseError {
    /// Fails if `source` is too large to be addressed by a [`Span`].
    pub fn check_size(source: &str) -> Result<(), ParseError> {
        match u32::try_from(source.len()) {
            Ok(_) => Ok(()),
            Err(_) => Err(ParseError::TooLarge { size: source.len() }),
        }
    }
}

/// A problem the parser recovered from, such as an unclosed tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}
