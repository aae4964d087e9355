//! Tests for control flow graph construction (spec §4.5).

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{AnyNode, ExitStmt, IfLoopMode, IfLoopStmt, NodeID, Procedure, ReturnStmt, Visibility};
use oberonc_sema::analysis::ControlFlowGraph;
use oberonc_source::types::Span;

fn link(ast: &mut AST, parent: NodeID, children: &[NodeID]) {
    for &child in children {
        ast.set_parent(child, parent);
    }
}

fn return_stmt(ast: &mut AST, value: Option<NodeID>) -> NodeID {
    ast.alloc_node(AnyNode::ReturnStmt(ReturnStmt { id: NodeID::placeholder(), parent: None, span: Span::default(), value }))
}

fn exit_stmt(ast: &mut AST) -> NodeID {
    ast.alloc_node(AnyNode::ExitStmt(ExitStmt { id: NodeID::placeholder(), parent: None, span: Span::default() }))
}

fn if_stmt(ast: &mut AST, guard: NodeID, body: Vec<NodeID>, else_branch: Option<NodeID>) -> NodeID {
    let mut children = vec![guard];
    children.extend_from_slice(&body);
    children.extend(else_branch);
    let id = ast.alloc_node(AnyNode::IfLoopStmt(IfLoopStmt {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        mode: IfLoopMode::If,
        guard: Some(guard),
        with_var: None,
        with_type: None,
        body,
        else_branch,
    }));
    link(ast, id, &children);
    id
}

fn procedure_with_body(ast: &mut AST, body: Vec<NodeID>) -> NodeID {
    let proc_type = ast.alloc_node(AnyNode::ProcType(oberonc_ast::nodes::ProcType::new(Vec::new(), None, NodeID::placeholder(), Span::default())));
    let id = ast.alloc_node(AnyNode::Procedure(Procedure {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: "Test".to_owned(),
        proc_type,
        receiver: None,
        locals: Vec::new(),
        body: body.clone(),
        visibility: Visibility::NotApplicable,
    }));
    let mut children = vec![proc_type];
    children.extend_from_slice(&body);
    link(ast, id, &children);
    id
}

fn dummy_guard(ast: &mut AST) -> NodeID {
    ast.alloc_node(AnyNode::IdentLeafExpr(oberonc_ast::nodes::IdentLeafExpr {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: "b".to_owned(),
    }))
}

#[test]
fn straight_line_return_reaches_exit() {
    let mut ast = AST::new();
    let ret = return_stmt(&mut ast, Some(dummy_guard(&mut ast)));
    let proc = procedure_with_body(&mut ast, vec![ret]);

    let cfg = ControlFlowGraph::build_from_procedure(&ast, proc);
    assert!(cfg.all_paths_reach_exit());
}

#[test]
fn missing_return_after_body_is_incomplete() {
    let mut ast = AST::new();
    let guard = dummy_guard(&mut ast);
    let ret = return_stmt(&mut ast, Some(guard));
    let guard_if = dummy_guard(&mut ast);
    let only_then_returns = if_stmt(&mut ast, guard_if, vec![ret], None);
    let proc = procedure_with_body(&mut ast, vec![only_then_returns]);

    let cfg = ControlFlowGraph::build_from_procedure(&ast, proc);
    assert!(!cfg.all_paths_reach_exit(), "falling off the end of the IF with no ELSE is not a complete return");
}

#[test]
fn if_else_both_returning_is_complete() {
    let mut ast = AST::new();
    let guard = dummy_guard(&mut ast);
    let then_ret = return_stmt(&mut ast, Some(dummy_guard(&mut ast)));
    let else_ret = return_stmt(&mut ast, Some(dummy_guard(&mut ast)));
    let branch = if_stmt(&mut ast, guard, vec![then_ret], Some(else_ret));
    let proc = procedure_with_body(&mut ast, vec![branch]);

    let cfg = ControlFlowGraph::build_from_procedure(&ast, proc);
    assert!(cfg.all_paths_reach_exit());
}

#[test]
fn statement_after_return_is_unreachable() {
    let mut ast = AST::new();
    let ret = return_stmt(&mut ast, Some(dummy_guard(&mut ast)));
    let after = exit_stmt(&mut ast);
    let proc = procedure_with_body(&mut ast, vec![ret, after]);

    let mut cfg = ControlFlowGraph::build_from_procedure(&ast, proc);
    let reachable = cfg.compute_reachable().clone();
    let after_block = cfg.blocks().iter().find(|b| b.statements.contains(&after)).expect("after is in some block");
    assert!(!reachable.contains(&after_block.id));
}
