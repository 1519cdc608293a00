//! Tree walker with ancestor tracking.
//!
//! [`walk`] drives a [`Visitor`] over a tree in source order:
//!
//! 1. `enter` is called for the node, with its ancestors (innermost last)
//! 2. children are walked in order
//! 3. `exit` is called for container node types
//! 4. the node is popped from the ancestor stack
//!
//! After the whole tree has been visited, `on_traversal_end` is called once.
//! Values returned by any hook are collected and handed back to the caller
//! without interpretation.
//!
//! The walk is iterative, so deeply nested documents cannot overflow the stack.
//!
//! # Example
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use themelint_ast::walk::{Visitor, walk};
//! use themelint_ast::{LiquidNode, NodeData, NodeType, Span};
//!
//! struct LookupNames;
//!
//! impl<'t> Visitor<'t> for LookupNames {
//!     type Derived = String;
//!     type Error = Infallible;
//!
//!     fn enter(
//!         &mut self,
//!         node: &'t LiquidNode,
//!         _ancestors: &[&'t LiquidNode],
//!     ) -> Result<Vec<String>, Infallible> {
//!         Ok(node.lookup_name().map(str::to_string).into_iter().collect())
//!     }
//! }
//!
//! let lookup = LiquidNode::new_leaf(NodeType::VariableLookup, Span::new(3, 4))
//!     .with_data(NodeData::lookup("x"));
//! let doc = LiquidNode::new_parent(NodeType::Document, Span::new(0, 7), vec![lookup]);
//!
//! let names = walk(&doc, &mut LookupNames).unwrap();
//! assert_eq!(names, vec!["x".to_string()]);
//! ```

use crate::LiquidNode;

/// Result of a visitor hook: derived values, or an error that aborts the walk.
pub type VisitResult<D, E> = Result<Vec<D>, E>;

/// Hooks invoked by [`walk`].
///
/// All hooks default to doing nothing, so implementors override only what
/// they need. Node types without a matching branch in `enter` are still
/// traversed.
pub trait Visitor<'t> {
    /// Values a hook can hand back to the caller (e.g. referenced files).
    type Derived;
    /// Error that stops the walk.
    type Error;

    /// Called before the node's children are visited.
    fn enter(
        &mut self,
        _node: &'t LiquidNode,
        _ancestors: &[&'t LiquidNode],
    ) -> VisitResult<Self::Derived, Self::Error> {
        Ok(Vec::new())
    }

    /// Called after all children of a container node have been visited.
    fn exit(
        &mut self,
        _node: &'t LiquidNode,
        _ancestors: &[&'t LiquidNode],
    ) -> VisitResult<Self::Derived, Self::Error> {
        Ok(Vec::new())
    }

    /// Called once after the whole tree has been visited.
    fn on_traversal_end(&mut self) -> VisitResult<Self::Derived, Self::Error> {
        Ok(Vec::new())
    }
}

/// Walks `root` with `visitor`, returning every derived value in hook order.
pub fn walk<'t, V>(root: &'t LiquidNode, visitor: &mut V) -> VisitResult<V::Derived, V::Error>
where
    V: Visitor<'t>,
{
    let mut derived = Vec::new();
    let mut ancestors: Vec<&'t LiquidNode> = Vec::new();
    // Index of the next child to visit, one entry per node on `ancestors`.
    let mut cursors: Vec<usize> = Vec::new();

    derived.extend(visitor.enter(root, &ancestors)?);
    ancestors.push(root);
    cursors.push(0);

    loop {
        let Some(&node) = ancestors.last() else {
            break;
        };
        let Some(cursor) = cursors.last_mut() else {
            break;
        };
        if let Some(child) = node.children.get(*cursor) {
            *cursor += 1;
            derived.extend(visitor.enter(child, &ancestors)?);
            ancestors.push(child);
            cursors.push(0);
            continue;
        }

        ancestors.pop();
        cursors.pop();
        if node.node_type.is_container() {
            derived.extend(visitor.exit(node, &ancestors)?);
        }
    }

    derived.extend(visitor.on_traversal_end()?);
    Ok(derived)
}
