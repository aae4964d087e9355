//! Tests for the Visitable trait implementation and the arena it drives.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{
    AnyNode,
    BaseType,
    BaseTypeKind,
    BinExpr,
    BinOp,
    LiteralExpr,
    LiteralValue,
    Module,
    NodeID,
    NodeKind,
    Variable,
    Visibility,
};
use oberonc_ast::visitor::{Visitable, Visitor, VisitorResult};
use oberonc_source::types::Span;

struct TestVisitor {
    visited_nodes: Vec<&'static str>,
}

impl TestVisitor {
    const fn new() -> Self { Self { visited_nodes: Vec::new() } }
}

impl Visitor<()> for TestVisitor {
    fn visit(&mut self, _node_id: NodeID) -> Option<()> {
        self.visited_nodes.push("visit");
        None
    }

    fn visit_bin_expr(&mut self, _node_id: NodeID) -> VisitorResult<()> {
        self.visited_nodes.push("visit_bin_expr");
        Ok(())
    }

    fn visit_literal_expr(&mut self, _node_id: NodeID) -> VisitorResult<()> {
        self.visited_nodes.push("visit_literal_expr");
        Ok(())
    }

    fn visit_module(&mut self, _node_id: NodeID) -> VisitorResult<()> {
        self.visited_nodes.push("visit_module");
        Ok(())
    }

    fn visit_variable(&mut self, _node_id: NodeID) -> VisitorResult<()> {
        self.visited_nodes.push("visit_variable");
        Ok(())
    }
}

fn literal(ast: &mut AST, value: LiteralValue) -> NodeID {
    ast.alloc_node(AnyNode::LiteralExpr(LiteralExpr::new(value, NodeID::placeholder(), Span::default())))
}

#[test]
fn accept_dispatches_to_the_matching_visit_method() {
    let mut ast = AST::new();
    let lit = literal(&mut ast, LiteralValue::Integer(1));
    let node = ast.get_node(lit).unwrap().clone();

    let mut visitor = TestVisitor::new();
    node.accept(&mut visitor, lit).unwrap();

    assert_eq!(visitor.visited_nodes, vec!["visit_literal_expr"]);
}

#[test]
fn bin_expr_children_are_lhs_and_rhs_in_order() {
    let mut ast = AST::new();
    let lhs = literal(&mut ast, LiteralValue::Integer(1));
    let rhs = literal(&mut ast, LiteralValue::Integer(2));
    let bin = ast.alloc_node(AnyNode::BinExpr(BinExpr {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        op: BinOp::Add,
        lhs,
        rhs,
    }));

    let node = ast.get_node(bin).unwrap();
    assert_eq!(node.children(), vec![lhs, rhs]);
    assert_eq!(node.kind(), NodeKind::Expression);
}

#[test]
fn removed_slot_rejects_its_stale_node_id_after_reuse() {
    let mut ast = AST::new();
    let first = literal(&mut ast, LiteralValue::Integer(1));
    assert!(ast.remove(first));
    assert!(!ast.node_exists(first));

    let second = literal(&mut ast, LiteralValue::Integer(2));
    assert_eq!(second.index(), first.index());
    assert_ne!(second.generation(), first.generation());
    assert!(ast.node_exists(second));
    assert!(!ast.node_exists(first));
}

#[test]
fn set_parent_is_visible_through_get_parent() {
    let mut ast = AST::new();
    let module = ast.alloc_node(AnyNode::Module(Module::new("M".to_owned(), NodeID::placeholder(), Span::default())));
    let ty = ast.alloc_node(AnyNode::BaseType(BaseType::new(BaseTypeKind::Integer, NodeID::placeholder(), Span::default())));
    let var = ast.alloc_node(AnyNode::Variable(Variable {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: "x".to_owned(),
        declared_type: ty,
        visibility: Visibility::Private,
    }));

    assert!(ast.set_parent(var, module));
    assert_eq!(ast.get_parent(var), Some(module));
}

#[test]
fn find_nodes_of_kind_collects_every_expression_in_pre_order() {
    let mut ast = AST::new();
    let lhs = literal(&mut ast, LiteralValue::Integer(1));
    let rhs = literal(&mut ast, LiteralValue::Integer(2));
    let bin = ast.alloc_node(AnyNode::BinExpr(BinExpr {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        op: BinOp::Add,
        lhs,
        rhs,
    }));

    let found = ast.find_nodes_of_kind(bin, NodeKind::Expression);
    assert_eq!(found, vec![bin, lhs, rhs]);
}
