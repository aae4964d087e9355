//! Concrete end-to-end scenarios driving `OberonCore` through a hand-built
//! `AST`, in place of a real lexer/parser (out of scope for this crate).
//!
//! Each scenario registers a [`ScenarioParser`] builder under a module path,
//! so `add_file`/`parse_files` exercise the exact same module graph and
//! four-pass pipeline a real parser would feed.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{
    AnyNode, ArgExpr, ArgKind, AssignStmt, BaseType, BaseTypeKind, BinExpr, BinOp, CallStmt,
    CaseArm, CaseStmt, Const, Field, IdentLeafExpr, IdentSelExpr, Import, LiteralExpr,
    LiteralValue, LocalVar, Module, NamedType, NodeID, Parameter, ParamMode, Pointer, ProcType,
    Procedure, QualiType, RecordType, ReturnStmt, Variable, Visibility,
};
use oberonc_driver::{OberonCore, Parser, RawUnit};
use oberonc_sema::error::SemaError;
use oberonc_sema::types::Type;
use oberonc_source::types::Span;
use rustc_hash::FxHashMap;

type Builder = Box<dyn Fn(&mut AST) -> NodeID>;

/// A test double for the out-of-scope lexer/parser: each registered path
/// builds its `Module` straight into the shared arena instead of parsing
/// `bytes`, the way `oberonc-ast`'s own visitor tests hand-build nodes.
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

// --- Node-building helpers ---
//
// Each helper allocates a node and wires its children's parent back-links,
// mirroring the arena-construction order a real parser follows: children
// exist (and have `NodeID`s) before the parent that references them does.

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

fn lit_int(ast: &mut AST, v: i64) -> NodeID {
    ast.alloc_node(AnyNode::LiteralExpr(LiteralExpr::new(LiteralValue::Integer(v), NodeID::placeholder(), Span::default())))
}

fn base_type(ast: &mut AST, kind: BaseTypeKind) -> NodeID {
    ast.alloc_node(AnyNode::BaseType(BaseType::new(kind, NodeID::placeholder(), Span::default())))
}

fn ident(ast: &mut AST, name: &str) -> NodeID {
    ast.alloc_node(AnyNode::IdentLeafExpr(IdentLeafExpr {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: name.to_owned(),
    }))
}

fn ident_sel(ast: &mut AST, base_name: &str, field: &str) -> NodeID {
    let base = ident(ast, base_name);
    let sel = ast.alloc_node(AnyNode::IdentSelExpr(IdentSelExpr {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        base,
        name: field.to_owned(),
    }));
    link(ast, sel, &[base]);
    sel
}

fn quali_type(ast: &mut AST, target_name: &str) -> NodeID {
    let q = ident(ast, target_name);
    let qt = ast.alloc_node(AnyNode::QualiType(QualiType::new(q, Vec::new(), NodeID::placeholder(), Span::default())));
    link(ast, qt, &[q]);
    qt
}

fn bin(ast: &mut AST, op: BinOp, lhs: NodeID, rhs: NodeID) -> NodeID {
    let id = ast.alloc_node(AnyNode::BinExpr(BinExpr { id: NodeID::placeholder(), parent: None, span: Span::default(), op, lhs, rhs }));
    link(ast, id, &[lhs, rhs]);
    id
}

fn const_decl(ast: &mut AST, name: &str, value: NodeID) -> NodeID {
    let id = ast.alloc_node(AnyNode::Const(Const {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: name.to_owned(),
        value,
        visibility: Visibility::NotApplicable,
    }));
    link(ast, id, &[value]);
    id
}

fn variable(ast: &mut AST, name: &str, declared_type: NodeID, visibility: Visibility) -> NodeID {
    let id = ast.alloc_node(AnyNode::Variable(Variable {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: name.to_owned(),
        declared_type,
        visibility,
    }));
    link(ast, id, &[declared_type]);
    id
}

fn local_var(ast: &mut AST, name: &str, declared_type: NodeID) -> NodeID {
    let id = ast.alloc_node(AnyNode::LocalVar(LocalVar {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: name.to_owned(),
        declared_type,
    }));
    link(ast, id, &[declared_type]);
    id
}

fn named_type(ast: &mut AST, name: &str, declared_type: NodeID) -> NodeID {
    let id = ast.alloc_node(AnyNode::NamedType(NamedType {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: name.to_owned(),
        declared_type,
        generics: Vec::new(),
        visibility: Visibility::NotApplicable,
    }));
    link(ast, id, &[declared_type]);
    id
}

fn pointer_to(ast: &mut AST, to: NodeID) -> NodeID {
    let id = ast.alloc_node(AnyNode::Pointer(Pointer::new(to, NodeID::placeholder(), Span::default())));
    link(ast, id, &[to]);
    id
}

fn field(ast: &mut AST, name: &str, declared_type: NodeID) -> NodeID {
    let id = ast.alloc_node(AnyNode::Field(Field {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: name.to_owned(),
        declared_type,
        visibility: Visibility::NotApplicable,
    }));
    link(ast, id, &[declared_type]);
    id
}

fn record_type(ast: &mut AST, base: Option<NodeID>, fields: Vec<NodeID>, methods: Vec<NodeID>) -> NodeID {
    let mut children = fields.clone();
    children.extend_from_slice(&methods);
    children.extend(base);
    let id =
        ast.alloc_node(AnyNode::RecordType(RecordType::new(base, fields, methods, NodeID::placeholder(), Span::default())));
    link(ast, id, &children);
    id
}

fn param(ast: &mut AST, name: &str, declared_type: NodeID, mode: ParamMode) -> NodeID {
    let id = ast.alloc_node(AnyNode::Parameter(Parameter {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: name.to_owned(),
        declared_type,
        mode,
    }));
    link(ast, id, &[declared_type]);
    id
}

fn proc_type(ast: &mut AST, formals: Vec<NodeID>, return_type: Option<NodeID>) -> NodeID {
    let mut children = formals.clone();
    children.extend(return_type);
    let id = ast.alloc_node(AnyNode::ProcType(ProcType::new(formals, return_type, NodeID::placeholder(), Span::default())));
    link(ast, id, &children);
    id
}

#[allow(clippy::too_many_arguments)]
fn procedure(
    ast: &mut AST,
    name: &str,
    proc_type_id: NodeID,
    receiver: Option<NodeID>,
    locals: Vec<NodeID>,
    body: Vec<NodeID>,
) -> NodeID {
    let mut children = vec![proc_type_id];
    children.extend(receiver);
    children.extend_from_slice(&locals);
    children.extend_from_slice(&body);
    let id = ast.alloc_node(AnyNode::Procedure(Procedure {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        name: name.to_owned(),
        proc_type: proc_type_id,
        receiver,
        locals,
        body,
        visibility: Visibility::NotApplicable,
    }));
    link(ast, id, &children);
    id
}

fn return_stmt(ast: &mut AST, value: Option<NodeID>) -> NodeID {
    let id = ast.alloc_node(AnyNode::ReturnStmt(ReturnStmt { id: NodeID::placeholder(), parent: None, span: Span::default(), value }));
    if let Some(v) = value {
        link(ast, id, &[v]);
    }
    id
}

fn assign(ast: &mut AST, lhs: NodeID, rhs: NodeID) -> NodeID {
    let id = ast.alloc_node(AnyNode::AssignStmt(AssignStmt { id: NodeID::placeholder(), parent: None, span: Span::default(), lhs, rhs }));
    link(ast, id, &[lhs, rhs]);
    id
}

fn call_stmt(ast: &mut AST, callee_name: &str, args: Vec<NodeID>) -> NodeID {
    let callee = ident(ast, callee_name);
    let call = ast.alloc_node(AnyNode::ArgExpr(ArgExpr {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        kind_tag: ArgKind::Call,
        callee,
        args: args.clone(),
        guard_type: None,
    }));
    let mut call_children = vec![callee];
    call_children.extend_from_slice(&args);
    link(ast, call, &call_children);

    let stmt = ast.alloc_node(AnyNode::CallStmt(CallStmt { id: NodeID::placeholder(), parent: None, span: Span::default(), call }));
    link(ast, stmt, &[call]);
    stmt
}

fn import_decl(ast: &mut AST, alias: &str, path: &str) -> NodeID {
    ast.alloc_node(AnyNode::Import(Import::new(alias.to_owned(), path.to_owned(), NodeID::placeholder(), Span::default())))
}

fn module_id(ast: &AST, id: NodeID) -> &Module {
    ast.get_as::<Module>(id).expect("module node")
}

// --- Scenario 1: simple constant ---
//
// `CONST c = 1 + 2 * 3;` types as `INTEGER`.

fn build_simple_constant(ast: &mut AST) -> NodeID {
    let one = lit_int(ast, 1);
    let two = lit_int(ast, 2);
    let three = lit_int(ast, 3);
    let mul = bin(ast, BinOp::Mul, two, three);
    let sum = bin(ast, BinOp::Add, one, mul);
    let c = const_decl(ast, "c", sum);

    let m = module(ast, "M");
    with_module(ast, m, |module| module.decls.push(c));
    link(ast, m, &[c]);
    m
}

#[test]
fn simple_constant_types_as_integer() {
    let mut core = OberonCore::new(ScenarioParser::with("m", build_simple_constant));
    core.add_file("m", b"").unwrap();
    let order = core.parse_files(&["m".to_owned()]).unwrap();

    assert!(core.sema().errors().is_empty());

    let c_id = module_id(core.ast(), order[0]).decls[0];
    assert_eq!(core.sema().type_environment().type_of(c_id), Type::Base(BaseTypeKind::Integer));
    assert_eq!(core.sema().type_environment().get_const_value(c_id), Some(7));
}

// --- Scenario 2: forward pointer ---
//
// `TYPE P = POINTER TO R; R = RECORD next: P; val: INTEGER END;` — `P` and
// `R` resolve each other with no illegal self-reference.

fn build_forward_pointer(ast: &mut AST) -> NodeID {
    let to_r = quali_type(ast, "R");
    let pointer = pointer_to(ast, to_r);
    let p_named = named_type(ast, "P", pointer);

    let next_type = quali_type(ast, "P");
    let next_field = field(ast, "next", next_type);
    let int_type = base_type(ast, BaseTypeKind::Integer);
    let val_field = field(ast, "val", int_type);
    let record = record_type(ast, None, vec![next_field, val_field], Vec::new());
    let r_named = named_type(ast, "R", record);

    let m = module(ast, "M");
    with_module(ast, m, |module| {
        module.decls.push(p_named);
        module.decls.push(r_named);
    });
    link(ast, m, &[p_named, r_named]);
    m
}

#[test]
fn forward_pointer_resolves_both_directions() {
    let mut core = OberonCore::new(ScenarioParser::with("m", build_forward_pointer));
    core.add_file("m", b"").unwrap();
    let order = core.parse_files(&["m".to_owned()]).unwrap();

    assert!(core.sema().errors().is_empty(), "{:?}", core.sema().errors());

    let module = module_id(core.ast(), order[0]);
    let p_id = module.decls[0];
    let r_id = module.decls[1];
    let r_record_id = core.ast().get_as::<NamedType>(r_id).unwrap().declared_type;

    assert_eq!(core.sema().type_environment().type_of(p_id), Type::Pointer(Box::new(Type::Record(r_record_id))));

    let next_field_id = core.ast().get_as::<RecordType>(r_record_id).unwrap().fields[0];
    assert_eq!(core.sema().type_environment().type_of(next_field_id), core.sema().type_environment().type_of(p_id));
}

// --- Scenario 3: extension + override ---
//
// `TYPE A = RECORD x: INTEGER END; B = RECORD(A) y: INTEGER END;` with a
// method `p` on `A` overridden on `B`: no signature/visibility mismatch, and
// looking `p` up on `B` finds the override.

fn build_extension_override(ast: &mut AST) -> NodeID {
    let int_type_a = base_type(ast, BaseTypeKind::Integer);
    let x_field = field(ast, "x", int_type_a);
    let a_self_type = quali_type(ast, "A");
    let a_receiver = param(ast, "self", a_self_type, ParamMode::ByRef);
    let a_p_type = proc_type(ast, Vec::new(), None);
    let a_p = procedure(ast, "p", a_p_type, Some(a_receiver), Vec::new(), Vec::new());
    let a_record = record_type(ast, None, vec![x_field], vec![a_p]);
    let a_named = named_type(ast, "A", a_record);

    let int_type_b = base_type(ast, BaseTypeKind::Integer);
    let y_field = field(ast, "y", int_type_b);
    let b_self_type = quali_type(ast, "B");
    let b_receiver = param(ast, "self", b_self_type, ParamMode::ByRef);
    let b_p_type = proc_type(ast, Vec::new(), None);
    let b_p = procedure(ast, "p", b_p_type, Some(b_receiver), Vec::new(), Vec::new());
    let base_ref = quali_type(ast, "A");
    let b_record = record_type(ast, Some(base_ref), vec![y_field], vec![b_p]);
    let b_named = named_type(ast, "B", b_record);

    let m = module(ast, "M");
    with_module(ast, m, |module| {
        module.decls.push(a_named);
        module.decls.push(b_named);
    });
    link(ast, m, &[a_named, b_named]);
    m
}

#[test]
fn override_is_found_via_lookup_on_the_subclass() {
    let mut core = OberonCore::new(ScenarioParser::with("m", build_extension_override));
    core.add_file("m", b"").unwrap();
    let order = core.parse_files(&["m".to_owned()]).unwrap();

    assert!(core.sema().errors().is_empty(), "{:?}", core.sema().errors());

    let module = module_id(core.ast(), order[0]);
    let a_id = module.decls[0];
    let b_id = module.decls[1];
    let a_record_id = core.ast().get_as::<NamedType>(a_id).unwrap().declared_type;
    let b_record_id = core.ast().get_as::<NamedType>(b_id).unwrap().declared_type;
    let a_p_id = core.ast().get_as::<RecordType>(a_record_id).unwrap().methods[0];
    let b_p_id = core.ast().get_as::<RecordType>(b_record_id).unwrap().methods[0];

    let table = core.sema().symbol_table(order[0]).expect("module symbol table");
    let b_scope = table.get_node_scope(b_record_id).expect("B has a record scope");
    assert_eq!(table.lookup_from(b_scope, "p"), Some(b_p_id));

    let base_scope = table.get_scope(b_scope).and_then(|s| s.base).expect("B's scope has a base");
    assert_eq!(table.lookup_from(base_scope, "p"), Some(a_p_id));
}

// --- Scenario 4: type-case narrowing ---
//
// `a: POINTER TO A; CASE a OF B: a.y := 1 | C: a.z := 2 END` — inside the
// `B` arm, `a.y` resolves against `B`'s own field.

fn build_type_case_narrowing(ast: &mut AST) -> NodeID {
    let a_record = record_type(ast, None, Vec::new(), Vec::new());
    let a_named = named_type(ast, "A", a_record);

    let int_type_b = base_type(ast, BaseTypeKind::Integer);
    let y_field = field(ast, "y", int_type_b);
    let base_ref_b = quali_type(ast, "A");
    let b_record = record_type(ast, Some(base_ref_b), vec![y_field], Vec::new());
    let b_named = named_type(ast, "B", b_record);

    let int_type_c = base_type(ast, BaseTypeKind::Integer);
    let z_field = field(ast, "z", int_type_c);
    let base_ref_c = quali_type(ast, "A");
    let c_record = record_type(ast, Some(base_ref_c), vec![z_field], Vec::new());
    let c_named = named_type(ast, "C", c_record);

    let a_ptr_type = pointer_to(ast, quali_type(ast, "A"));
    let a_local = local_var(ast, "a", a_ptr_type);

    let scrutinee = ident(ast, "a");
    let b_label = quali_type(ast, "B");
    let b_assign = assign(ast, ident_sel(ast, "a", "y"), lit_int(ast, 1));
    let c_label = quali_type(ast, "C");
    let c_assign = assign(ast, ident_sel(ast, "a", "z"), lit_int(ast, 2));

    let case = ast.alloc_node(AnyNode::CaseStmt(CaseStmt {
        id: NodeID::placeholder(),
        parent: None,
        span: Span::default(),
        scrutinee,
        arms: vec![
            CaseArm { labels: vec![b_label], body: vec![b_assign] },
            CaseArm { labels: vec![c_label], body: vec![c_assign] },
        ],
        else_body: None,
    }));
    link(ast, case, &[scrutinee, b_label, b_assign, c_label, c_assign]);

    let test_proc_type = proc_type(ast, Vec::new(), None);
    let test_proc = procedure(ast, "Test", test_proc_type, None, vec![a_local], vec![case]);

    let m = module(ast, "M");
    with_module(ast, m, |module| {
        module.decls.push(a_named);
        module.decls.push(b_named);
        module.decls.push(c_named);
        module.decls.push(test_proc);
    });
    link(ast, m, &[a_named, b_named, c_named, test_proc]);
    m
}

#[test]
fn type_case_arm_narrows_to_the_arms_own_fields() {
    let mut core = OberonCore::new(ScenarioParser::with("m", build_type_case_narrowing));
    core.add_file("m", b"").unwrap();
    core.parse_files(&["m".to_owned()]).unwrap();

    assert!(core.sema().errors().is_empty(), "{:?}", core.sema().errors());
}

// --- Scenario 5: open-array parameter ---
//
// `PROC sum(VAR xs: ARRAY OF INTEGER): INTEGER` called as `sum(v)` where
// `v: ARRAY 10 OF INTEGER` is accepted regardless of the mismatched length.

fn build_open_array_parameter(ast: &mut AST) -> NodeID {
    let elem_type = base_type(ast, BaseTypeKind::Integer);
    let open_array = ast.alloc_node(AnyNode::ArrayType(oberonc_ast::nodes::ArrayType::new(
        None,
        elem_type,
        NodeID::placeholder(),
        Span::default(),
    )));
    link(ast, open_array, &[elem_type]);
    let xs_param = param(ast, "xs", open_array, ParamMode::ByRef);
    let return_type = base_type(ast, BaseTypeKind::Integer);
    let sum_type = proc_type(ast, vec![xs_param], Some(return_type));
    let zero = lit_int(ast, 0);
    let ret = return_stmt(ast, Some(zero));
    let sum_proc = procedure(ast, "sum", sum_type, None, Vec::new(), vec![ret]);

    let ten = lit_int(ast, 10);
    let v_elem_type = base_type(ast, BaseTypeKind::Integer);
    let v_array_type = ast.alloc_node(AnyNode::ArrayType(oberonc_ast::nodes::ArrayType::new(
        Some(ten),
        v_elem_type,
        NodeID::placeholder(),
        Span::default(),
    )));
    link(ast, v_array_type, &[ten, v_elem_type]);
    let v_var = variable(ast, "v", v_array_type, Visibility::NotApplicable);

    let call = call_stmt(ast, "sum", vec![ident(ast, "v")]);

    let m = module(ast, "M");
    with_module(ast, m, |module| {
        module.decls.push(sum_proc);
        module.decls.push(v_var);
        module.body.push(call);
    });
    link(ast, m, &[sum_proc, v_var, call]);
    m
}

#[test]
fn open_array_parameter_accepts_a_fixed_length_argument() {
    let mut core = OberonCore::new(ScenarioParser::with("m", build_open_array_parameter));
    core.add_file("m", b"").unwrap();
    core.parse_files(&["m".to_owned()]).unwrap();

    assert!(core.sema().errors().is_empty(), "{:?}", core.sema().errors());
}

// --- Scenario 6: visibility violation ---
//
// Module `A` exports `x` read-only; module `B` imports `A` and writes
// `A.x := 0`. Expected: a `readonly-violation` at the assignment, `B` marked
// has-errors, `A` unaffected.

fn build_module_a(ast: &mut AST) -> NodeID {
    let int_type = base_type(ast, BaseTypeKind::Integer);
    let x_var = variable(ast, "x", int_type, Visibility::ReadOnly);

    let m = module(ast, "A");
    with_module(ast, m, |module| module.decls.push(x_var));
    link(ast, m, &[x_var]);
    m
}

fn build_module_b(ast: &mut AST) -> NodeID {
    let import = import_decl(ast, "A", "A");
    let write = assign(ast, ident_sel(ast, "A", "x"), lit_int(ast, 0));

    let m = module(ast, "B");
    with_module(ast, m, |module| {
        module.imports.push(import);
        module.body.push(write);
    });
    link(ast, m, &[import, write]);
    m
}

#[test]
fn writing_a_read_only_import_is_a_violation_scoped_to_the_writer() {
    let mut core = OberonCore::new(ScenarioParser::with("A", build_module_a).and("B", build_module_b));
    core.add_file("A", b"").unwrap();
    core.add_file("B", b"").unwrap();
    core.parse_files(&["A".to_owned(), "B".to_owned()]).unwrap();

    let errors = core.sema().errors();
    assert!(
        errors.iter().any(|e| matches!(e, SemaError::ReadonlyViolation { name, .. } if name == "x")),
        "expected a readonly-violation, got {errors:?}"
    );

    let a_id = core.module_id("A").unwrap();
    let b_id = core.module_id("B").unwrap();
    assert!(!module_id(core.ast(), a_id).has_errors);
    assert!(module_id(core.ast(), b_id).has_errors);
}
