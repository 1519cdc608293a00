//! LiquidNode definition.
//!
//! The syntax tree node handed to checks. Trees are built once by a parser
//! and never mutated afterwards.

use serde::Serialize;

use crate::{NodeType, Span};

/// A node in the Liquid syntax tree.
///
/// Container nodes own their children in source order. For tags, the markup
/// nodes (e.g. the value of an `assign`, the collection of a `for`) come
/// first, followed by the block body.
///
/// # Example
///
/// ```rust
/// use themelint_ast::{LiquidNode, NodeData, NodeType, Span};
///
/// let lookup = LiquidNode::new_leaf(NodeType::VariableLookup, Span::new(3, 4))
///     .with_data(NodeData::lookup("x"));
/// let output = LiquidNode::new_parent(
///     NodeType::LiquidVariableOutput,
///     Span::new(0, 7),
///     vec![lookup],
/// );
/// assert_eq!(output.children[0].lookup_name(), Some("x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidNode {
    /// The type of this node.
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Byte span in the source text.
    #[serde(rename = "range")]
    pub span: Span,

    /// Child nodes in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LiquidNode>,

    /// Additional node-specific data.
    #[serde(skip_serializing_if = "NodeData::is_none")]
    pub data: NodeData,
}

/// Node-specific payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeData {
    #[default]
    None,
    /// Payload of a `LiquidTag`.
    Tag(TagData),
    /// Name of a `VariableLookup`. `None` for bracket lookups like `['x']`.
    Lookup { name: Option<String> },
    /// Name of a filter, HTML element or attribute.
    Name(String),
    /// Unquoted value of a string or number literal.
    Literal(String),
}

/// Tag name, parsed markup and block boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagData {
    pub name: String,
    pub markup: TagMarkup,
    /// Span of the opening `{% ... %}`.
    pub block_start: Span,
    /// Span of the closing `{% end... %}`, if the tag is a closed block.
    pub block_end: Option<Span>,
}

/// Structured markup for the tags checks care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TagMarkup {
    Assign { name: String },
    Capture { name: String },
    For { variable_name: String },
    Tablerow { variable_name: String },
    /// `render` / `include`. `snippet` is set when the target is a string literal.
    Render { snippet: Option<String> },
    Section { name: String },
    Sections { name: String },
    /// Anything else, or markup the parser could not make sense of.
    Raw { markup: String },
}

impl LiquidNode {
    /// Creates a new parent node with children.
    pub fn new_parent(node_type: NodeType, span: Span, children: Vec<LiquidNode>) -> Self {
        Self {
            node_type,
            span,
            children,
            data: NodeData::None,
        }
    }

    /// Creates a new leaf node.
    pub fn new_leaf(node_type: NodeType, span: Span) -> Self {
        Self::new_parent(node_type, span, Vec::new())
    }

    /// Creates an empty document spanning `len` bytes.
    pub fn empty_document(len: usize) -> Self {
        Self::new_leaf(NodeType::Document, Span::new(0, len as u32))
    }

    /// Sets the node data.
    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    /// Returns true if this node has children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns the tag payload for `LiquidTag` nodes.
    pub fn tag(&self) -> Option<&TagData> {
        match &self.data {
            NodeData::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Returns true if this node is a tag with the given name.
    pub fn is_tag_named(&self, name: &str) -> bool {
        self.tag().is_some_and(|tag| tag.name == name)
    }

    /// Returns the variable name of a `VariableLookup`.
    pub fn lookup_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Lookup { name } => name.as_deref(),
            _ => None,
        }
    }

    /// Returns the name of a filter, element or attribute.
    pub fn name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the value of a string or number literal.
    pub fn literal(&self) -> Option<&str> {
        match &self.data {
            NodeData::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Counts this node and all of its descendants.
    pub fn count_nodes(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }
}

/// Trees built from malformed input can be very deep, so children are
/// released from a heap stack instead of recursively.
impl Drop for LiquidNode {
    fn drop(&mut self) {
        if self.children.iter().all(|child| child.children.is_empty()) {
            return;
        }
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

impl NodeData {
    /// Creates lookup data for a named variable.
    pub fn lookup(name: impl Into<String>) -> Self {
        NodeData::Lookup {
            name: Some(name.into()),
        }
    }

    /// Creates name data.
    pub fn name(name: impl Into<String>) -> Self {
        NodeData::Name(name.into())
    }

    /// Creates literal data.
    pub fn literal(value: impl Into<String>) -> Self {
        NodeData::Literal(value.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, NodeData::None)
    }
}

impl TagData {
    pub fn new(name: impl Into<String>, markup: TagMarkup, block_start: Span) -> Self {
        Self {
            name: name.into(),
            markup,
            block_start,
            block_end: None,
        }
    }

    pub fn with_block_end(mut self, block_end: Span) -> Self {
        self.block_end = Some(block_end);
        self
    }
}
