//! Parser trait definition.

use themelint_ast::LiquidNode;

use crate::{ParseError, SyntaxError};

/// Output of a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Root of the tree. Always a `Document` node, even for garbled input.
    pub tree: LiquidNode,
    /// Problems the parser recovered from.
    pub errors: Vec<SyntaxError>,
}

impl ParsedDocument {
    pub fn new(tree: LiquidNode, errors: Vec<SyntaxError>) -> Self {
        Self { tree, errors }
    }

    /// True when the tree contains recovered syntax errors and checks must
    /// expect partial markup.
    pub fn is_tolerant(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Trait for parsing source text into a syntax tree.
///
/// # Example
///
/// ```rust
/// use themelint_parser::{LiquidParser, Parser};
///
/// let parser = LiquidParser::new();
/// let parsed = parser.parse("{% assign x = 1 %}{{ x }}").unwrap();
/// assert!(!parsed.is_tolerant());
/// ```
pub trait Parser: Send + Sync {
    /// Returns the name of this parser.
    fn name(&self) -> &str;

    /// Returns the file extensions this parser handles.
    ///
    /// Extensions should not include the leading dot (e.g., `["liquid"]`).
    fn extensions(&self) -> &[&str];

    /// Parses the source text.
    fn parse(&self, source: &str) -> Result<ParsedDocument, ParseError>;

    /// Returns true if this parser can handle the given file extension.
    fn can_parse(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
