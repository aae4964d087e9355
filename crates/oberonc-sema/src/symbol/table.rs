//! Symbol table: the scope tree plus node-to-scope associations.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::NodeID;
use oberonc_source::types::Span;
use rustc_hash::FxHashMap;

use super::scope::{Scope, ScopeID, ScopeKind};
use crate::error::SemaError;

/// The scope tree for a single module (and, via `base`, the scopes of its
/// imports' exported records — but never a second module's own scope stack).
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    scope_stack: Vec<ScopeID>,
    node_to_scope: FxHashMap<NodeID, ScopeID>,
    next_scope_id: u32,
}

impl SymbolTable {
    /// Creates a new symbol table with a module scope already pushed.
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            scopes: Vec::new(),
            scope_stack: Vec::new(),
            node_to_scope: FxHashMap::default(),
            next_scope_id: 0,
        };
        let module_scope = table.create_scope(ScopeKind::Module, None);
        table.scope_stack.push(module_scope);
        table
    }

    pub fn associate_node_with_scope(&mut self, node_id: NodeID, scope_id: ScopeID) {
        self.node_to_scope.insert(node_id, scope_id);
    }

    pub fn create_scope(&mut self, kind: ScopeKind, parent: Option<ScopeID>) -> ScopeID {
        let id = ScopeID::new(self.next_scope_id);
        self.next_scope_id += 1;

        let scope = Scope::new(id, kind, parent);
        if let Some(parent_id) = parent
            && let Some(parent_scope) = self.scopes.get_mut(parent_id.value() as usize)
        {
            parent_scope.children.push(id);
        }
        self.scopes.push(scope);
        id
    }

    /// Sets the base-record scope a `Record` scope should search before its
    /// enclosing scope (spec §4.2: "for Record scopes, it walks the base
    /// chain first, then to the enclosing scope").
    pub fn set_base_scope(&mut self, record_scope: ScopeID, base_scope: ScopeID) {
        if let Some(scope) = self.scopes.get_mut(record_scope.value() as usize) {
            scope.base = Some(base_scope);
        }
    }

    #[must_use]
    pub fn current_scope(&self) -> Option<ScopeID> { self.scope_stack.last().copied() }

    /// Declares `name` in the current scope.
    ///
    /// ## Errors
    ///
    /// Returns [`SemaError::DuplicateName`] if `name` is already declared at
    /// this scope level, or [`SemaError::NoActiveScope`] if the scope stack
    /// is empty (an internal-consistency bug, never reachable in practice).
    pub fn declare(&mut self, name: String, node: NodeID, span: Span) -> Result<(), SemaError> {
        let scope_id = self.current_scope().ok_or_else(|| SemaError::NoActiveScope { name: name.clone() })?;
        let scope =
            self.scopes.get_mut(scope_id.value() as usize).ok_or_else(|| SemaError::NoActiveScope { name: name.clone() })?;
        scope.insert(name, node, span)
    }

    pub fn enter_scope(&mut self, scope_id: ScopeID) { self.scope_stack.push(scope_id); }

    /// Pops the current scope, refusing to pop past the module scope.
    pub fn exit_scope(&mut self) -> Option<ScopeID> {
        if self.scope_stack.len() > 1 { self.scope_stack.pop() } else { None }
    }

    #[must_use]
    pub fn get_node_scope(&self, node_id: NodeID) -> Option<ScopeID> { self.node_to_scope.get(&node_id).copied() }

    #[must_use]
    pub fn get_scope(&self, scope_id: ScopeID) -> Option<&Scope> { self.scopes.get(scope_id.value() as usize) }

    pub fn get_scope_mut(&mut self, scope_id: ScopeID) -> Option<&mut Scope> {
        self.scopes.get_mut(scope_id.value() as usize)
    }

    #[must_use]
    pub fn module_scope(&self) -> Option<ScopeID> { self.scopes.first().map(|s| s.id) }

    /// Resolves `name` via the current scope's `find(name, recursive)`
    /// (spec §4.2): record scopes search their base chain before their
    /// enclosing scope; every other scope walks straight up to the module.
    #[must_use]
    pub fn lookup_in_scope_chain(&self, name: &str) -> Option<NodeID> {
        for &scope_id in self.scope_stack.iter().rev() {
            if let Some(found) = self.lookup_from(scope_id, name) {
                return Some(found);
            }
        }
        None
    }

    /// `find` starting from a specific scope rather than the live stack —
    /// used by qualified access (`m.x`) and record-base chains.
    #[must_use]
    pub fn lookup_from(&self, scope_id: ScopeID, name: &str) -> Option<NodeID> {
        let mut current = Some(scope_id);
        let mut visited_base = false;
        while let Some(id) = current {
            let Some(scope) = self.get_scope(id) else { break };

            if !visited_base
                && scope.kind == ScopeKind::Record
                && let Some(base) = scope.base
            {
                if let Some(found) = self.lookup_from(base, name) {
                    return Some(found);
                }
                visited_base = true;
            }

            if let Some(found) = scope.get(name) {
                return Some(found);
            }

            current = scope.parent;
        }
        None
    }

    #[must_use]
    pub fn scope_count(&self) -> usize { self.scopes.len() }

    /// Finds the scope a node's type/name expressions should resolve
    /// against: `node_id`'s own scope if the declaration pass associated one
    /// directly with it, else the nearest ancestor's (walking the arena's
    /// owning parent-child links), else the module scope.
    ///
    /// This is how a record field's or formal parameter's type expression
    /// sees a `NamedType`'s generic parameters or a `Procedure`'s own scope
    /// without the type resolver needing to thread scope context through
    /// every recursive call by hand.
    #[must_use]
    pub fn enclosing_scope(&self, ast: &AST, node_id: NodeID) -> ScopeID {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if let Some(scope) = self.get_node_scope(id) {
                return scope;
            }
            current = ast.get_parent(id);
        }
        self.module_scope().expect("module scope always exists")
    }
}

impl Default for SymbolTable {
    fn default() -> Self { Self::new() }
}
