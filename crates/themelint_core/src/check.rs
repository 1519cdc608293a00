//! The check contract.
//!
//! A [`Check`] is static metadata plus a factory. For every document and
//! every run the runner calls [`Check::create`], which returns a fresh
//! [`CheckVisitor`]; all mutable state for that document lives inside it and
//! is dropped after the run.
//!
//! Most checks build their visitor from a [`VisitorTable`]: a per-run
//! scratch value plus plain function handlers keyed by node type. A table
//! with no handlers means the check does not apply to the document.

use themelint_ast::{LiquidNode, NodeType};

use crate::context::CheckContext;
use crate::dependencies::DerivedNode;
use crate::{CheckError, Severity, SourceCodeType};

/// Result of a check handler: derived nodes, or a failure that disables the
/// check for the current document.
pub type HandlerResult = Result<Vec<DerivedNode>, CheckError>;

/// Handler called on entering or exiting a node.
pub type NodeHandler<S> =
    fn(&mut S, &LiquidNode, &[&LiquidNode], &mut CheckContext<'_>) -> HandlerResult;

/// Handler called once after the whole tree was visited.
pub type EndHandler<S> = fn(&mut S, &mut CheckContext<'_>) -> HandlerResult;

/// Type of value a setting accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Boolean,
    Number,
    String,
    Array,
}

/// A setting a check accepts from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaProperty {
    pub key: &'static str,
    pub kind: SettingKind,
    pub description: &'static str,
}

/// Static description of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckMeta {
    /// Stable identifier used in configuration and diagnostics.
    pub code: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    pub description: &'static str,
    /// Severity unless overridden by configuration.
    pub severity: Severity,
    /// Source types the check runs on.
    pub targets: &'static [SourceCodeType],
    /// Settings the check accepts.
    pub schema: &'static [SchemaProperty],
    /// Enabled when configuration does not mention the check.
    pub recommended: bool,
}

impl CheckMeta {
    /// Returns true if the check runs on documents of `source_type`.
    pub fn targets(&self, source_type: SourceCodeType) -> bool {
        self.targets.contains(&source_type)
    }

    pub fn setting(&self, key: &str) -> Option<&SchemaProperty> {
        self.schema.iter().find(|property| property.key == key)
    }
}

/// A registered check.
pub trait Check: Send + Sync {
    fn meta(&self) -> &CheckMeta;

    /// Creates the visitor for one document in one run.
    fn create(&self, ctx: &CheckContext<'_>) -> Box<dyn CheckVisitor>;
}

/// Object-safe view of a visitor the runner can drive.
pub trait CheckVisitor: Send {
    fn enter(
        &mut self,
        node: &LiquidNode,
        ancestors: &[&LiquidNode],
        ctx: &mut CheckContext<'_>,
    ) -> HandlerResult;

    fn exit(
        &mut self,
        node: &LiquidNode,
        ancestors: &[&LiquidNode],
        ctx: &mut CheckContext<'_>,
    ) -> HandlerResult;

    fn on_traversal_end(&mut self, ctx: &mut CheckContext<'_>) -> HandlerResult;

    /// True when the visitor has no handlers and can be skipped.
    fn is_empty(&self) -> bool;
}

/// Partial dispatch table over a scratch state `S`.
///
/// # Example
///
/// ```rust
/// use themelint_ast::{LiquidNode, NodeType};
/// use themelint_core::{CheckContext, CheckVisitor, HandlerResult, VisitorTable};
///
/// fn count(
///     seen: &mut usize,
///     _node: &LiquidNode,
///     _ancestors: &[&LiquidNode],
///     _ctx: &mut CheckContext<'_>,
/// ) -> HandlerResult {
///     *seen += 1;
///     Ok(Vec::new())
/// }
///
/// let table = VisitorTable::new(0usize).on_enter(NodeType::VariableLookup, count);
/// assert!(!table.is_empty());
/// assert!(VisitorTable::new(()).is_empty());
/// ```
pub struct VisitorTable<S> {
    state: S,
    enter: [Option<NodeHandler<S>>; NodeType::COUNT],
    exit: [Option<NodeHandler<S>>; NodeType::COUNT],
    end: Option<EndHandler<S>>,
}

impl<S> VisitorTable<S> {
    /// Creates a table with no handlers.
    pub fn new(state: S) -> Self {
        Self {
            state,
            enter: [None; NodeType::COUNT],
            exit: [None; NodeType::COUNT],
            end: None,
        }
    }

    pub fn on_enter(mut self, node_type: NodeType, handler: NodeHandler<S>) -> Self {
        self.enter[node_type.index()] = Some(handler);
        self
    }

    pub fn on_exit(mut self, node_type: NodeType, handler: NodeHandler<S>) -> Self {
        self.exit[node_type.index()] = Some(handler);
        self
    }

    pub fn on_end(mut self, handler: EndHandler<S>) -> Self {
        self.end = Some(handler);
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl VisitorTable<()> {
    /// Visitor for a check that does not apply to the document.
    pub fn not_applicable() -> Box<dyn CheckVisitor> {
        Box::new(VisitorTable::new(()))
    }
}

impl<S: Send> CheckVisitor for VisitorTable<S> {
    fn enter(
        &mut self,
        node: &LiquidNode,
        ancestors: &[&LiquidNode],
        ctx: &mut CheckContext<'_>,
    ) -> HandlerResult {
        match self.enter[node.node_type.index()] {
            Some(handler) => handler(&mut self.state, node, ancestors, ctx),
            None => Ok(Vec::new()),
        }
    }

    fn exit(
        &mut self,
        node: &LiquidNode,
        ancestors: &[&LiquidNode],
        ctx: &mut CheckContext<'_>,
    ) -> HandlerResult {
        match self.exit[node.node_type.index()] {
            Some(handler) => handler(&mut self.state, node, ancestors, ctx),
            None => Ok(Vec::new()),
        }
    }

    fn on_traversal_end(&mut self, ctx: &mut CheckContext<'_>) -> HandlerResult {
        match self.end {
            Some(handler) => handler(&mut self.state, ctx),
            None => Ok(Vec::new()),
        }
    }

    fn is_empty(&self) -> bool {
        self.end.is_none()
            && self.enter.iter().all(Option::is_none)
            && self.exit.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use themelint_ast::{NodeData, Span};

    use super::*;
    use crate::SourceFile;

    fn file() -> SourceFile {
        SourceFile::parse("u", "/t/a.liquid", "/t", "{{ x }}", 1).unwrap()
    }

    fn record(
        seen: &mut Vec<String>,
        node: &LiquidNode,
        ancestors: &[&LiquidNode],
        _ctx: &mut CheckContext<'_>,
    ) -> HandlerResult {
        seen.push(format!("{} under {}", node.node_type, ancestors.len()));
        Ok(Vec::new())
    }

    fn fail(
        _seen: &mut Vec<String>,
        _node: &LiquidNode,
        _ancestors: &[&LiquidNode],
        _ctx: &mut CheckContext<'_>,
    ) -> HandlerResult {
        Err(CheckError::failed("nope"))
    }

    #[test]
    fn test_dispatch_by_node_type() {
        let file = file();
        let mut ctx = CheckContext::for_test(&file);
        let mut table = VisitorTable::new(Vec::new())
            .on_enter(NodeType::VariableLookup, record)
            .on_exit(NodeType::LiquidTag, fail);

        let lookup = LiquidNode::new_leaf(NodeType::VariableLookup, Span::new(3, 4))
            .with_data(NodeData::lookup("x"));
        let text = LiquidNode::new_leaf(NodeType::RawText, Span::new(0, 1));

        table.enter(&lookup, &[], &mut ctx).unwrap();
        table.enter(&text, &[], &mut ctx).unwrap();
        table.exit(&lookup, &[], &mut ctx).unwrap();

        assert_eq!(table.state(), &vec!["VariableLookup under 0".to_string()]);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_empty_table() {
        assert!(VisitorTable::not_applicable().is_empty());
        let only_end = VisitorTable::new(()).on_end(|_, _| Ok(Vec::new()));
        assert!(!only_end.is_empty());
    }

    #[test]
    fn test_meta_targets() {
        let meta = CheckMeta {
            code: "Example",
            name: "Example",
            description: "",
            severity: Severity::Info,
            targets: &[SourceCodeType::Json],
            schema: &[SchemaProperty {
                key: "max",
                kind: SettingKind::Number,
                description: "",
            }],
            recommended: false,
        };
        assert!(meta.targets(SourceCodeType::Json));
        assert!(!meta.targets(SourceCodeType::LiquidHtml));
        assert_eq!(meta.setting("max").map(|p| p.kind), Some(SettingKind::Number));
        assert!(meta.setting("min").is_none());
    }
}
