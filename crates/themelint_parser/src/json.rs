//! JSON theme files (templates, section groups, locales).
//!
//! JSON documents carry no Liquid, so the tree is an empty `Document`.
//! Malformed JSON is reported as a syntax error rather than a failure.

use themelint_ast::{LiquidNode, Span};

use crate::{ParseError, ParsedDocument, Parser, SyntaxError};

/// Parser for `.json` theme files.
#[derive(Debug, Default)]
pub struct JsonParser;

impl JsonParser {
    /// Creates a new JSON parser.
    pub fn new() -> Self {
        Self
    }
}

impl Parser for JsonParser {
    fn name(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn parse(&self, source: &str) -> Result<ParsedDocument, ParseError> {
        ParseError::check_size(source)?;

        let errors = match serde_json::from_str::<serde_json::Value>(source) {
            Ok(_) => Vec::new(),
            Err(e) => {
                let offset = line_column_to_offset(source, e.line(), e.column());
                vec![SyntaxError::new(e.to_string(), Span::new(offset, offset))]
            }
        };

        Ok(ParsedDocument::new(
            LiquidNode::empty_document(source.len()),
            errors,
        ))
    }
}

/// Converts serde_json's 1-based line and column to a byte offset.
fn line_column_to_offset(source: &str, line: usize, column: usize) -> u32 {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len()) as u32
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_valid_json_has_empty_tree() {
        let source = r#"{"sections": {}, "order": []}"#;
        let parsed = JsonParser::new().parse(source).unwrap();
        assert!(!parsed.is_tolerant());
        assert_eq!(parsed.tree, LiquidNode::empty_document(source.len()));
    }

    #[test]
    fn test_invalid_json_is_tolerated() {
        let parsed = JsonParser::new().parse("{\n  \"a\": ,\n}").unwrap();
        assert!(parsed.is_tolerant());
        assert_eq!(parsed.errors.len(), 1);
        // Reported on the second line.
        assert!((2..11).contains(&parsed.errors[0].span.start));
    }

    #[test]
    fn test_can_parse() {
        let parser = JsonParser::new();
        assert!(parser.can_parse("JSON"));
        assert!(!parser.can_parse("liquid"));
    }
}
