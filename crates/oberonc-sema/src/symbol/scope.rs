//! Scope management for the symbol table.

use std::fmt;

use oberonc_ast::nodes::NodeID;
use rustc_hash::FxHashMap;

use crate::error::SemaError;

/// Unique identifier for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeID(u32);

impl ScopeID {
    #[must_use]
    pub const fn new(id: u32) -> Self { Self(id) }

    #[must_use]
    pub const fn value(self) -> u32 { self.0 }
}

impl fmt::Display for ScopeID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "scope:{}", self.0) }
}

/// The kind of scope, determining lookup order (record scopes walk the base
/// chain before the enclosing scope, per spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The top-level scope of a `Module`.
    Module,
    /// A `Procedure` body (also used for a receiver-bound method).
    Procedure,
    /// A `NamedType`'s own scope, holding its generic parameters.
    NamedType,
    /// A `RecordType`'s field/method namespace; looks up its base record's
    /// scope before falling back to its enclosing (declaring) scope.
    Record,
    /// The narrowed scope introduced by `WITH` or a type-case arm.
    With,
}

/// A lexical scope: an ordered name-keyed container of declared entities.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeID,
    pub kind: ScopeKind,
    pub parent: Option<ScopeID>,
    /// For `Record` scopes: the base record's scope, searched before `parent`.
    pub base: Option<ScopeID>,
    pub entities: FxHashMap<String, NodeID>,
    pub children: Vec<ScopeID>,
}

impl Scope {
    #[must_use]
    pub fn new(id: ScopeID, kind: ScopeKind, parent: Option<ScopeID>) -> Self {
        Self { id, kind, parent, base: None, entities: FxHashMap::default(), children: Vec::new() }
    }

    #[must_use]
    pub fn children(&self) -> &[ScopeID] { &self.children }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<NodeID> { self.entities.get(name).copied() }

    /// Inserts an entity by name.
    ///
    /// ## Errors
    ///
    /// Returns [`SemaError::DuplicateName`] if `name` already exists in this
    /// scope (spec §4.2's `add(entity)`).
    pub fn insert(&mut self, name: String, node: NodeID, span: oberonc_source::types::Span) -> Result<(), SemaError> {
        if let Some(&existing) = self.entities.get(&name) {
            return Err(SemaError::DuplicateName { name, original: existing, span });
        }
        self.entities.insert(name, node);
        Ok(())
    }
}
