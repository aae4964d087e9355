//! Snapshot of [`Parameter`]'s mode-dependent `Display` rendering across all
//! four `ParamMode` variants, exercised together rather than one assertion
//! per mode.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{AnyNode, BaseType, BaseTypeKind, NodeID, ParamMode, Parameter};
use oberonc_source::types::Span;

fn param(ast: &mut AST, name: &str, mode: ParamMode) -> String {
    let ty = ast.alloc_node(AnyNode::BaseType(BaseType::new(BaseTypeKind::Integer, NodeID::placeholder(), Span::default())));
    let id = ast.alloc_node(AnyNode::Parameter(Parameter { id: NodeID::placeholder(), parent: None, span: Span::default(), name: name.to_owned(), declared_type: ty, mode }));
    ast.get_node(id).unwrap().to_string()
}

#[test]
fn parameter_display_varies_by_passing_mode() {
    let mut ast = AST::new();
    let rendered = vec![
        param(&mut ast, "x", ParamMode::Value),
        param(&mut ast, "x", ParamMode::ByRef),
        param(&mut ast, "x", ParamMode::ByConstRef),
        param(&mut ast, "self", ParamMode::Receiver),
    ];

    insta::assert_debug_snapshot!(rendered, @r###"
    [
        "x",
        "VAR x",
        "CONST x",
        "VAR self",
    ]
    "###);
}
