//! Snapshot test for `OberonCore::collect_diagnostics`'s rendering of a
//! readonly-violation (spec §6): locks down the sorted, human-facing shape
//! `report_to` produces, not just that *an* error fired.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{
    AnyNode, AssignStmt, BaseType, BaseTypeKind, IdentLeafExpr, IdentSelExpr, Import, LiteralExpr,
    LiteralValue, Module, NodeID, Variable, Visibility,
};
use oberonc_driver::{OberonCore, Parser, RawUnit};
use oberonc_sema::error::SemaError;
use oberonc_source::types::Span;
use rustc_hash::FxHashMap;

type Builder = Box<dyn Fn(&mut AST) -> NodeID>;

#[derive(Default)]
struct ScenarioParser {
    builders: FxHashMap<String, Builder>,
}

impl ScenarioParser {
    fn with(path: &str, builder: impl Fn(&mut AST) -> NodeID + 'static) -> Self {
        let mut parser = Self::default();
        parser.builders.insert(path.to_owned(), Box::new(builder));
        parser
    }

    fn and(mut self, path: &str, builder: impl Fn(&mut AST) -> NodeID + 'static) -> Self {
        self.builders.insert(path.to_owned(), Box::new(builder));
        self
    }
}

impl Parser for ScenarioParser {
    fn parse(&mut self, ast: &mut AST, _bytes: &[u8], path: &str) -> Result<RawUnit, SemaError> {
        let builder = self.builders.get(path).ok_or_else(|| SemaError::ParseError {
            message: format!("no scenario builder registered for '{path}'"),
            span: Span::default(),
        })?;
        Ok(builder(ast))
    }
}

fn link(ast: &mut AST, parent: NodeID, children: &[NodeID]) {
    for &child in children {
        ast.set_parent(child, parent);
    }
}

fn module(ast: &mut AST, name: &str) -> NodeID {
    ast.alloc_node(AnyNode::Module(Module::new(name.to_owned(), NodeID::placeholder(), Span::default())))
}

fn with_module(ast: &mut AST, id: NodeID, f: impl FnOnce(&mut Module)) {
    if let Some(AnyNode::Module(m)) = ast.get_node_mut(id) {
        f(m);
    }
}

fn build_module_a(ast: &mut AST) -> NodeID {
    let int_type = ast.alloc_node(AnyNode::BaseType(BaseType::new(BaseTypeKind::Integer, NodeID::placeholder(), Span::default())));
    let x_var = ast.alloc_node(AnyNode::Variable(Variable {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: "x".to_owned(),
        declared_type: int_type,
        visibility: Visibility::ReadOnly,
    }));
    link(ast, x_var, &[int_type]);

    let m = module(ast, "A");
    with_module(ast, m, |module| module.decls.push(x_var));
    link(ast, m, &[x_var]);
    m
}

fn build_module_b(ast: &mut AST) -> NodeID {
    let import = ast.alloc_node(AnyNode::Import(Import::new("A".to_owned(), "A".to_owned(), NodeID::placeholder(), Span::default())));

    let base = ast.alloc_node(AnyNode::IdentLeafExpr(IdentLeafExpr {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: "A".to_owned(),
    }));
    let lhs = ast.alloc_node(AnyNode::IdentSelExpr(IdentSelExpr {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        base,
        name: "x".to_owned(),
    }));
    link(ast, lhs, &[base]);
    let rhs = ast.alloc_node(AnyNode::LiteralExpr(LiteralExpr::new(LiteralValue::Integer(0), NodeID::placeholder(), Span::default())));
    let write = ast.alloc_node(AnyNode::AssignStmt(AssignStmt { id: NodeID::placeholder(), parent: None, span: Span::default(), lhs, rhs }));
    link(ast, write, &[lhs, rhs]);

    let m = module(ast, "B");
    with_module(ast, m, |module| {
        module.imports.push(import);
        module.body.push(write);
    });
    link(ast, m, &[import, write]);
    m
}

#[test]
fn readonly_violation_diagnostic_snapshot() {
    let mut core = OberonCore::new(ScenarioParser::with("A", build_module_a).and("B", build_module_b));
    core.add_file("A", b"").unwrap();
    core.add_file("B", b"").unwrap();
    core.parse_files(&["A".to_owned(), "B".to_owned()]).unwrap();

    let rendered: Vec<String> =
        core.collect_diagnostics().iter().map(|d| format!("{}: [{}] {}", d.level.as_str(), d.code, d.message)).collect();

    insta::assert_debug_snapshot!(rendered, @r###"
    [
        "error: [readonly-violation] 'x' is read-only and cannot be assigned from outside its module",
    ]
    "###);
}
