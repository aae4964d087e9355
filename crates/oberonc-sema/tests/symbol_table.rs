//! Tests for the scope tree and symbol table (spec §4.2).

use oberonc_ast::nodes::NodeID;
use oberonc_sema::symbol::{ScopeKind, SymbolTable};
use oberonc_source::types::Span;

fn fake_node(index: u32) -> NodeID { NodeID::new(index, 0) }

#[test]
fn new_table_starts_with_one_module_scope() {
    let table = SymbolTable::new();
    assert_eq!(table.scope_count(), 1);
    assert!(table.current_scope().is_some());
    assert_eq!(table.current_scope(), table.module_scope());
}

#[test]
fn exit_scope_refuses_to_pop_the_module_scope() {
    let mut table = SymbolTable::new();
    assert_eq!(table.exit_scope(), None);
    assert_eq!(table.current_scope(), table.module_scope());
}

#[test]
fn nested_scopes_track_parentage() {
    let mut table = SymbolTable::new();
    let module_scope = table.current_scope().unwrap();
    let proc_scope = table.create_scope(ScopeKind::Procedure, Some(module_scope));
    let with_scope = table.create_scope(ScopeKind::With, Some(proc_scope));

    assert_eq!(table.scope_count(), 3);
    assert_eq!(table.get_scope(with_scope).unwrap().parent, Some(proc_scope));
    assert_eq!(table.get_scope(proc_scope).unwrap().parent, Some(module_scope));
}

#[test]
fn duplicate_declaration_in_the_same_scope_is_an_error() {
    let mut table = SymbolTable::new();
    table.declare("x".to_owned(), fake_node(1), Span::default()).unwrap();
    let err = table.declare("x".to_owned(), fake_node(2), Span::default()).unwrap_err();
    assert!(matches!(err, oberonc_sema::error::SemaError::DuplicateName { name, .. } if name == "x"));
}

#[test]
fn lookup_in_scope_chain_walks_outward_from_the_innermost_pushed_scope() {
    let mut table = SymbolTable::new();
    table.declare("outer".to_owned(), fake_node(1), Span::default()).unwrap();

    let module_scope = table.current_scope().unwrap();
    let proc_scope = table.create_scope(ScopeKind::Procedure, Some(module_scope));
    table.enter_scope(proc_scope);
    table.declare("inner".to_owned(), fake_node(2), Span::default()).unwrap();

    assert_eq!(table.lookup_in_scope_chain("inner"), Some(fake_node(2)));
    assert_eq!(table.lookup_in_scope_chain("outer"), Some(fake_node(1)));
    assert_eq!(table.lookup_in_scope_chain("nonexistent"), None);

    table.exit_scope();
    assert_eq!(table.lookup_in_scope_chain("inner"), None);
}

#[test]
fn record_scope_searches_base_chain_before_its_own_parent() {
    let mut table = SymbolTable::new();
    let module_scope = table.current_scope().unwrap();

    let base_scope = table.create_scope(ScopeKind::Record, Some(module_scope));
    table.enter_scope(base_scope);
    table.declare("inherited".to_owned(), fake_node(1), Span::default()).unwrap();
    table.exit_scope();

    let derived_scope = table.create_scope(ScopeKind::Record, Some(module_scope));
    table.set_base_scope(derived_scope, base_scope);
    table.enter_scope(derived_scope);
    table.declare("own".to_owned(), fake_node(2), Span::default()).unwrap();
    table.exit_scope();

    assert_eq!(table.lookup_from(derived_scope, "own"), Some(fake_node(2)));
    assert_eq!(table.lookup_from(derived_scope, "inherited"), Some(fake_node(1)));
    assert_eq!(table.lookup_from(derived_scope, "nonexistent"), None);
}

#[test]
fn node_scope_association_is_independent_of_the_live_stack() {
    let mut table = SymbolTable::new();
    let module_scope = table.current_scope().unwrap();
    let record_scope = table.create_scope(ScopeKind::Record, Some(module_scope));
    let record_decl = fake_node(7);

    table.associate_node_with_scope(record_decl, record_scope);
    assert_eq!(table.get_node_scope(record_decl), Some(record_scope));
}
