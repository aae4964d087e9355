//! Scope tree and symbol table.

mod scope;
mod table;

pub use scope::{Scope, ScopeID, ScopeKind};
pub use table::SymbolTable;
