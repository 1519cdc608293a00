//! # themelint_ast
//!
//! Syntax tree definitions and traversal for themelint.
//!
//! This crate provides:
//! - [`LiquidNode`], an owned, immutable tree produced by a parser
//! - [`NodeType`], the closed set of node kinds checks dispatch on
//! - [`Span`], byte-offset ranges into the source text
//! - [`walk`], a pre/post-order walker that tracks ancestors
//!
//! ## Example
//!
//! ```rust
//! use themelint_ast::{LiquidNode, NodeType, Span};
//!
//! let doc = LiquidNode::new_parent(
//!     NodeType::Document,
//!     Span::new(0, 5),
//!     vec![LiquidNode::new_leaf(NodeType::RawText, Span::new(0, 5))],
//! );
//! assert_eq!(doc.count_nodes(), 2);
//! ```

mod node;
mod node_type;
mod span;
pub mod walk;

pub use node::{LiquidNode, NodeData, TagData, TagMarkup};
pub use node_type::NodeType;
pub use span::Span;

pub use walk::{VisitResult, Visitor};
