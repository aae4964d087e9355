//! Side tables holding everything the resolver/checker attach to nodes
//! without mutating the (otherwise immutable post-parse) AST.

use oberonc_ast::nodes::NodeID;
use rustc_hash::{FxHashMap, FxHashSet};

use super::ty::Type;

/// The syntactic role an identifier occurrence plays, attached by the
/// checker during traversal (spec §3, "Role annotations").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Decl,
    Lhs,
    VarArg,
    Rhs,
    Super,
    Sub,
    Call,
    Import,
    This,
    Method,
    Str,
}

/// Type/name-resolution side tables keyed by [`NodeID`].
///
/// Kept separate from the AST crate so `oberonc-ast` has no dependency on
/// semantic analysis, mirroring the teacher's `TypeEnvironment`/`SymbolTable`
/// split from its immutable arena.
#[derive(Debug, Clone, Default)]
pub struct TypeEnvironment {
    /// Every expression's resolved type (spec §3: "every expression has
    /// `type != nil` after checking").
    node_types: FxHashMap<NodeID, Type>,
    /// `IdentLeafExpr`/`IdentSelExpr` -> the entity they resolve to.
    resolution_targets: FxHashMap<NodeID, NodeID>,
    /// Every identifier occurrence's syntactic role.
    roles: FxHashMap<NodeID, Role>,
    /// Generic instantiation memoization: (template, structural key of
    /// actuals) -> the instantiated node, so identical instantiations share
    /// identity (spec §4.3 point 7, §9's memoization design note).
    instantiations: FxHashMap<(NodeID, String), NodeID>,
    /// Nodes whose type resolution is in progress, for the "reentrant calls
    /// during cycle walks observe the in-progress marker" rule of spec §5.
    in_progress: FxHashSet<NodeID>,
    /// Folded value of a `Const` declaration (or any other constant integer
    /// expression the checker evaluates), once known.
    const_values: FxHashMap<NodeID, i64>,
}

impl TypeEnvironment {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn set_type(&mut self, node: NodeID, ty: Type) { self.node_types.insert(node, ty); }

    #[must_use]
    pub fn get_type(&self, node: NodeID) -> Option<&Type> { self.node_types.get(&node) }

    /// Returns the node's resolved type, or [`Type::Error`] if unresolved —
    /// useful once every reachable node is expected to have one.
    #[must_use]
    pub fn type_of(&self, node: NodeID) -> Type { self.node_types.get(&node).cloned().unwrap_or(Type::Error) }

    pub fn set_target(&mut self, ident: NodeID, target: NodeID) { self.resolution_targets.insert(ident, target); }

    #[must_use]
    pub fn get_target(&self, ident: NodeID) -> Option<NodeID> { self.resolution_targets.get(&ident).copied() }

    pub fn set_role(&mut self, ident: NodeID, role: Role) { self.roles.insert(ident, role); }

    #[must_use]
    pub fn get_role(&self, ident: NodeID) -> Option<Role> { self.roles.get(&ident).copied() }

    /// Looks up a memoized generic instantiation.
    #[must_use]
    pub fn get_instantiation(&self, template: NodeID, actuals_key: &str) -> Option<NodeID> {
        self.instantiations.get(&(template, actuals_key.to_owned())).copied()
    }

    pub fn memoize_instantiation(&mut self, template: NodeID, actuals_key: String, instantiated: NodeID) {
        self.instantiations.insert((template, actuals_key), instantiated);
    }

    /// Marks `node` as having resolution in progress; returns `false` if it
    /// was already marked (the caller is re-entering its own resolution —
    /// treat as a self-reference rather than recursing again).
    pub fn begin_resolution(&mut self, node: NodeID) -> bool { self.in_progress.insert(node) }

    pub fn end_resolution(&mut self, node: NodeID) { self.in_progress.remove(&node); }

    #[must_use]
    pub fn is_in_progress(&self, node: NodeID) -> bool { self.in_progress.contains(&node) }

    pub fn set_const_value(&mut self, node: NodeID, value: i64) { self.const_values.insert(node, value); }

    #[must_use]
    pub fn get_const_value(&self, node: NodeID) -> Option<i64> { self.const_values.get(&node).copied() }
}
