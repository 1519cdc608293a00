//! Files a document depends on, derived from its tree.
//!
//! Handlers hand these back to the runner as derived nodes; the runner does
//! not interpret them.

use std::convert::Infallible;

use serde::Serialize;
use themelint_ast::walk::{VisitResult, Visitor, walk};
use themelint_ast::{LiquidNode, NodeType, Span, TagMarkup};

/// A theme file referenced by a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedNode {
    /// `'file.css' | asset_url`
    Asset { name: String, span: Span },
    /// `{% render 'name' %}` or `{% include 'name' %}`
    Snippet { name: String, span: Span },
    /// `{% section 'name' %}`
    Section { name: String, span: Span },
    /// `{% sections 'name' %}`
    SectionGroup { name: String, span: Span },
}

impl DerivedNode {
    /// Path of the referenced file relative to the theme root.
    pub fn relative_path(&self) -> String {
        match self {
            DerivedNode::Asset { name, .. } => format!("assets/{name}"),
            DerivedNode::Snippet { name, .. } => format!("snippets/{name}.liquid"),
            DerivedNode::Section { name, .. } => format!("sections/{name}.liquid"),
            DerivedNode::SectionGroup { name, .. } => format!("sections/{name}.json"),
        }
    }

    /// Span of the reference in the referencing document.
    pub fn span(&self) -> Span {
        match self {
            DerivedNode::Asset { span, .. }
            | DerivedNode::Snippet { span, .. }
            | DerivedNode::Section { span, .. }
            | DerivedNode::SectionGroup { span, .. } => *span,
        }
    }
}

/// Returns the file `node` references, if any.
pub fn derive_dependency(node: &LiquidNode, ancestors: &[&LiquidNode]) -> Option<DerivedNode> {
    match node.node_type {
        NodeType::LiquidFilter if node.name() == Some("asset_url") => {
            // The filtered expression is the first child of the variable.
            let expression = ancestors.last()?.children.first()?;
            if expression.node_type != NodeType::String {
                return None;
            }
            Some(DerivedNode::Asset {
                name: expression.literal()?.to_string(),
                span: expression.span,
            })
        }
        NodeType::LiquidTag => {
            let tag = node.tag()?;
            let span = node.children.first().map_or(tag.block_start, |c| c.span);
            match &tag.markup {
                TagMarkup::Render {
                    snippet: Some(name),
                } => Some(DerivedNode::Snippet {
                    name: name.clone(),
                    span,
                }),
                TagMarkup::Section { name } => Some(DerivedNode::Section {
                    name: name.clone(),
                    span,
                }),
                TagMarkup::Sections { name } => Some(DerivedNode::SectionGroup {
                    name: name.clone(),
                    span,
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Tree visitor yielding every dependency in source order.
#[derive(Debug, Default)]
pub struct DependencyCollector;

impl<'t> Visitor<'t> for DependencyCollector {
    type Derived = DerivedNode;
    type Error = Infallible;

    fn enter(
        &mut self,
        node: &'t LiquidNode,
        ancestors: &[&'t LiquidNode],
    ) -> VisitResult<DerivedNode, Infallible> {
        Ok(derive_dependency(node, ancestors).into_iter().collect())
    }
}

/// Collects the files `tree` references.
pub fn collect_dependencies(tree: &LiquidNode) -> Vec<DerivedNode> {
    match walk(tree, &mut DependencyCollector) {
        Ok(derived) => derived,
        Err(never) => match never {},
    }
}
