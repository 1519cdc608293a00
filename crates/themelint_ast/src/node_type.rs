//! Node type tags for the Liquid syntax tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of node kinds produced by the parser.
///
/// Visitor tables are keyed by this tag, so adding a variant only requires
/// extending [`NodeType::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    /// Root of a parsed document.
    Document,
    /// Text outside of any Liquid or HTML construct.
    RawText,
    /// `{% name markup %}`, with its body as children for block tags.
    LiquidTag,
    /// `{{ expression | filter }}`.
    LiquidVariableOutput,
    /// An expression together with its filter chain.
    LiquidVariable,
    /// A single `| name: args` filter application.
    LiquidFilter,
    /// A reference to a named variable, e.g. `product.title`.
    VariableLookup,
    /// String literal.
    String,
    /// Number literal.
    Number,
    /// Range literal, e.g. `(1..3)`.
    Range,
    /// An HTML element.
    HtmlElement,
    /// An attribute of an HTML element.
    HtmlAttribute,
    /// `{% comment %}` or `{% # inline %}` contents.
    LiquidComment,
}

impl NodeType {
    /// Number of node types.
    pub const COUNT: usize = Self::ALL.len();

    /// Every node type, in declaration order.
    pub const ALL: [NodeType; 13] = [
        NodeType::Document,
        NodeType::RawText,
        NodeType::LiquidTag,
        NodeType::LiquidVariableOutput,
        NodeType::LiquidVariable,
        NodeType::LiquidFilter,
        NodeType::VariableLookup,
        NodeType::String,
        NodeType::Number,
        NodeType::Range,
        NodeType::HtmlElement,
        NodeType::HtmlAttribute,
        NodeType::LiquidComment,
    ];

    /// Index of this type in dispatch tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true if nodes of this type may carry children.
    #[inline]
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            NodeType::Document
                | NodeType::LiquidTag
                | NodeType::LiquidVariableOutput
                | NodeType::LiquidVariable
                | NodeType::LiquidFilter
                | NodeType::Range
                | NodeType::HtmlElement
                | NodeType::HtmlAttribute
        )
    }

    /// Returns the type name used in logs and serialized trees.
    pub const fn as_str(&self) -> &'static str {
        match self {
            NodeType::Document => "Document",
            NodeType::RawText => "RawText",
            NodeType::LiquidTag => "LiquidTag",
            NodeType::LiquidVariableOutput => "LiquidVariableOutput",
            NodeType::LiquidVariable => "LiquidVariable",
            NodeType::LiquidFilter => "LiquidFilter",
            NodeType::VariableLookup => "VariableLookup",
            NodeType::String => "String",
            NodeType::Number => "Number",
            NodeType::Range => "Range",
            NodeType::HtmlElement => "HtmlElement",
            NodeType::HtmlAttribute => "HtmlAttribute",
            NodeType::LiquidComment => "LiquidComment",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
