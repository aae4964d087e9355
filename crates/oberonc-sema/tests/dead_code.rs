//! Tests for unreachable-statement and unused-import detection (spec §4.5).

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{AnyNode, ExitStmt, IdentLeafExpr, Import, Module, NodeID, ReturnStmt};
use oberonc_sema::analysis::{ControlFlowGraph, DeadCodeDetector, WarningSeverity};
use oberonc_source::types::Span;

fn link(ast: &mut AST, parent: NodeID, children: &[NodeID]) {
    for &child in children {
        ast.set_parent(child, parent);
    }
}

fn ident(ast: &mut AST, name: &str) -> NodeID {
    ast.alloc_node(AnyNode::IdentLeafExpr(IdentLeafExpr { id: NodeID::placeholder(), parent: None, span: Span::default(), name: name.to_owned() }))
}

fn module_with(ast: &mut AST, imports: Vec<NodeID>, body: Vec<NodeID>) -> NodeID {
    let id = ast.alloc_node(AnyNode::Module(Module::new("M".to_owned(), NodeID::placeholder(), Span::default())));
    if let Some(AnyNode::Module(m)) = ast.get_node_mut(id) {
        m.imports = imports.clone();
        m.body = body.clone();
    }
    let mut children = imports;
    children.extend(body);
    link(ast, id, &children);
    id
}

#[test]
fn unused_import_is_flagged() {
    let mut ast = AST::new();
    let import = ast.alloc_node(AnyNode::Import(Import::new("Unused".to_owned(), "Unused".to_owned(), NodeID::placeholder(), Span::default())));
    let m = module_with(&mut ast, vec![import], Vec::new());

    let mut detector = DeadCodeDetector::new(&ast);
    let module = ast.get_as::<Module>(m).unwrap().clone();
    detector.detect_unused_imports(&module);

    let warnings = detector.into_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, WarningSeverity::Info);
    assert!(warnings[0].message.contains("Unused"));
}

#[test]
fn import_referenced_via_selector_is_not_flagged() {
    let mut ast = AST::new();
    let import = ast.alloc_node(AnyNode::Import(Import::new("Used".to_owned(), "Used".to_owned(), NodeID::placeholder(), Span::default())));
    let used_ref = ident(&mut ast, "Used");
    let m = module_with(&mut ast, vec![import], vec![used_ref]);

    let mut detector = DeadCodeDetector::new(&ast);
    let module = ast.get_as::<Module>(m).unwrap().clone();
    detector.detect_unused_imports(&module);

    assert!(detector.into_warnings().is_empty());
}

#[test]
fn statement_after_return_is_unreachable_warning() {
    let mut ast = AST::new();
    let ret = ast.alloc_node(AnyNode::ReturnStmt(ReturnStmt { id: NodeID::placeholder(), parent: None, span: Span::default(), value: None }));
    let after = ast.alloc_node(AnyNode::ExitStmt(ExitStmt { id: NodeID::placeholder(), parent: None, span: Span::default() }));

    let proc_type = ast.alloc_node(AnyNode::ProcType(oberonc_ast::nodes::ProcType::new(Vec::new(), None, NodeID::placeholder(), Span::default())));
    let proc = ast.alloc_node(AnyNode::Procedure(oberonc_ast::nodes::Procedure {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: "Test".to_owned(),
        proc_type,
        receiver: None,
        locals: Vec::new(),
        body: vec![ret, after],
        visibility: oberonc_ast::nodes::Visibility::NotApplicable,
    }));
    link(&mut ast, proc, &[proc_type, ret, after]);

    let mut cfg = ControlFlowGraph::build_from_procedure(&ast, proc);
    let mut detector = DeadCodeDetector::new(&ast);
    detector.detect_unreachable(&mut cfg);

    let warnings = detector.into_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("unreachable"));
}
