//! AST visitor pattern implementation.
//!
//! ## Architecture
//!
//! The visitor follows an arena-based approach:
//! 1. The [`crate::ast::AST`] owns all nodes in a contiguous arena.
//! 2. Visitors receive [`NodeID`]s rather than direct references.
//! 3. Generation counters reject stale ids rather than aliasing freed nodes.
//!
//! ## Core traits
//!
//! - [`Visitable`]: implemented by every node type (and by `AnyNode`),
//!   enabling double dispatch to the matching `visit_*` method.
//! - [`Visitor<T>`]: immutable visitor with generic return type `T`.
//! - [`MutVisitor<T>`]: mutable counterpart, used by passes that accumulate
//!   state (symbol tables, type environments) while traversing.
//!
//! Both traits provide `try_visit`, `try_visit_opt`, and `visit_list` helpers
//! so a pass implementation does not re-derive the same `Option`/`Vec`
//! plumbing at every call site.

use std::fmt::{self, Display, Formatter};

use crate::nodes::NodeID;

/// Trait for AST nodes that can be visited.
pub trait Visitable {
    /// Dispatches to the appropriate `visit_*` method on `visitor`.
    ///
    /// ## Errors
    ///
    /// Returns a [`VisitorError`] if `node_id` does not exist, or if the
    /// visitor does not implement the method for this node's kind.
    fn accept<T>(&self, visitor: &mut dyn Visitor<T>, node_id: NodeID) -> VisitorResult<T>;

    /// Mutable counterpart of [`Visitable::accept`].
    ///
    /// ## Errors
    ///
    /// Same as [`Visitable::accept`].
    fn accept_mut<T>(&self, visitor: &mut dyn MutVisitor<T>, node_id: NodeID) -> VisitorResult<T>;
}

/// Generates all `visit_*` methods with a default impl that reports
/// "not implemented" — a pass only overrides the node kinds it cares about.
macro_rules! visit_default {
    ($($method:ident),*$(,)?) => {
        $(
            /// Visits a node of the specified kind.
            ///
            /// ## Errors
            ///
            /// Returns an error if the node does not exist, is of a
            /// different kind, or this visitor does not implement this method.
            fn $method(&mut self, node_id: NodeID) -> VisitorResult<T> {
                Err(VisitorError::Custom(format!(
                    concat!(stringify!($method), " not implemented for node {}"), node_id,
                )))
            }
        )*
    };
}

/// Generic immutable visitor over AST nodes.
pub trait Visitor<T> {
    /// Visits a node, converting a `None` result into a [`VisitorError::Custom`].
    ///
    /// ## Errors
    ///
    /// See [`Visitable::accept`].
    fn try_visit(&mut self, node_id: NodeID) -> VisitorResult<T> {
        self.visit(node_id).ok_or_else(|| VisitorError::Custom(format!("failed to visit node {node_id}")))
    }

    /// `try_visit`, but `None` input maps to `Ok(None)` rather than erroring.
    ///
    /// ## Errors
    ///
    /// See [`Visitable::accept`].
    fn try_visit_opt(&mut self, node_id_opt: Option<NodeID>) -> VisitorResult<Option<T>> {
        node_id_opt.map_or_else(|| Ok(None), |node_id| self.try_visit(node_id).map(Some))
    }

    /// Visits every node in `node_ids`, failing fast on the first error.
    ///
    /// ## Errors
    ///
    /// See [`Visitable::accept`].
    fn visit_list(&mut self, node_ids: &[NodeID]) -> VisitorResult<Vec<T>> {
        node_ids.iter().map(|&id| self.try_visit(id)).collect()
    }

    /// Generic entry point: visits any node, dispatching on its kind.
    fn visit(&mut self, node_id: NodeID) -> Option<T>;

    visit_default!(
        visit_arg_expr,
        visit_array_type,
        visit_assign_stmt,
        visit_base_type,
        visit_bin_expr,
        visit_built_in,
        visit_call_stmt,
        visit_case_stmt,
        visit_const,
        visit_enumeration,
        visit_exit_stmt,
        visit_field,
        visit_for_loop_stmt,
        visit_generic_name,
        visit_ident_leaf_expr,
        visit_ident_sel_expr,
        visit_if_loop_stmt,
        visit_import,
        visit_literal_expr,
        visit_local_var,
        visit_module,
        visit_named_type,
        visit_parameter,
        visit_pointer,
        visit_proc_type,
        visit_procedure,
        visit_quali_type,
        visit_record_type,
        visit_return_stmt,
        visit_set_expr,
        visit_un_expr,
        visit_variable,
    );
}

/// Mutable counterpart of [`Visitor<T>`], used by passes that accumulate
/// state (symbol tables, type environments) while traversing.
pub trait MutVisitor<T> {
    /// See [`Visitor::try_visit`].
    ///
    /// ## Errors
    ///
    /// See [`Visitable::accept`].
    fn try_visit(&mut self, node_id: NodeID) -> VisitorResult<T> {
        self.visit(node_id).ok_or_else(|| VisitorError::Custom(format!("failed to visit node {node_id}")))
    }

    /// See [`Visitor::try_visit_opt`].
    ///
    /// ## Errors
    ///
    /// See [`Visitable::accept`].
    fn try_visit_opt(&mut self, node_id_opt: Option<NodeID>) -> VisitorResult<Option<T>> {
        node_id_opt.map_or_else(|| Ok(None), |node_id| self.try_visit(node_id).map(Some))
    }

    /// See [`Visitor::visit_list`].
    ///
    /// ## Errors
    ///
    /// See [`Visitable::accept`].
    fn visit_list(&mut self, node_ids: &[NodeID]) -> VisitorResult<Vec<T>> {
        node_ids.iter().map(|&id| self.try_visit(id)).collect()
    }

    /// Generic entry point: visits any node, dispatching on its kind.
    fn visit(&mut self, node_id: NodeID) -> Option<T>;

    visit_default!(
        visit_arg_expr,
        visit_array_type,
        visit_assign_stmt,
        visit_base_type,
        visit_bin_expr,
        visit_built_in,
        visit_call_stmt,
        visit_case_stmt,
        visit_const,
        visit_enumeration,
        visit_exit_stmt,
        visit_field,
        visit_for_loop_stmt,
        visit_generic_name,
        visit_ident_leaf_expr,
        visit_ident_sel_expr,
        visit_if_loop_stmt,
        visit_import,
        visit_literal_expr,
        visit_local_var,
        visit_module,
        visit_named_type,
        visit_parameter,
        visit_pointer,
        visit_proc_type,
        visit_procedure,
        visit_quali_type,
        visit_record_type,
        visit_return_stmt,
        visit_set_expr,
        visit_un_expr,
        visit_variable,
    );
}

/// Error type for visitor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitorError {
    /// The node does not exist in the arena (wrong index, or stale generation).
    NodeNotFound(NodeID),
    /// The node exists but is not of the kind the caller expected.
    TypeMismatch {
        node_id: NodeID,
        expected: String,
        actual: String,
    },
    /// Any other visitor failure, with a human-readable message.
    Custom(String),
}

impl Display for VisitorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::TypeMismatch { node_id, expected, actual } => {
                write!(f, "type mismatch for node {node_id}: expected {expected}, got {actual}")
            }
            Self::Custom(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for VisitorError {}

/// Result type for visitor operations.
pub type VisitorResult<T> = Result<T, VisitorError>;
