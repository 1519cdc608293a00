//! # themelint_parser
//!
//! Parsers that turn theme files into [`themelint_ast::LiquidNode`] trees.
//!
//! This crate provides:
//! - A `Parser` trait shared by all file formats
//! - A tolerant Liquid parser that recovers from unclosed tags and blocks
//! - A JSON parser for template and section-group files
//!
//! ## Example
//!
//! ```rust
//! use themelint_parser::{LiquidParser, Parser};
//!
//! let parsed = LiquidParser::new().parse("{% if a %}{{ b }}").unwrap();
//! assert!(parsed.is_tolerant());
//! assert_eq!(parsed.tree.children.len(), 1);
//! ```

mod error;
mod expression;
mod json;
mod liquid;
mod traits;

pub use error::{ParseError, SyntaxError};
pub use json::JsonParser;
pub use liquid::LiquidParser;
pub use traits::{ParsedDocument, Parser};
