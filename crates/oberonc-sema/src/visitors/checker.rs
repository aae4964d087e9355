//! Expression/statement checker: types every expression, checks assignment
//! and parameter-passing compatibility, and enforces the statement rules of
//! spec §4.4.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{
    AnyNode, ASTNode, ArgExpr, ArgKind, AssignStmt, BaseTypeKind, BinExpr, BinOp, CaseStmt,
    ExitStmt, ForLoopStmt, IfLoopMode, IfLoopStmt, LiteralExpr, LiteralValue, LocalVar, Module,
    NamedType, NodeID, Parameter, ProcType, Procedure, RecordType, ReturnStmt, SetElement,
    UnExpr, UnOp, Visibility,
};
use rustc_hash::FxHashMap;

use crate::error::SemaError;
use crate::symbol::SymbolTable;
use crate::types::{Role, Type, TypeEnvironment};

/// Checks one module's declarations and body statements against every
/// already-resolved module's [`SymbolTable`], typing each expression as it
/// goes and recording roles/targets in the shared [`TypeEnvironment`].
pub struct Checker<'a> {
    ast: &'a AST,
    modules: &'a FxHashMap<NodeID, SymbolTable>,
    symbols: &'a mut SymbolTable,
    types: &'a mut TypeEnvironment,
    loop_depth: u32,
    return_type: Option<Type>,
    /// Entities narrowed by an enclosing `WITH` or type-case arm, most
    /// recent last; popped on leaving that arm's body.
    narrow_stack: Vec<(NodeID, Type)>,
    errors: Vec<SemaError>,
}

impl<'a> Checker<'a> {
    pub fn new(
        ast: &'a AST,
        modules: &'a FxHashMap<NodeID, SymbolTable>,
        symbols: &'a mut SymbolTable,
        types: &'a mut TypeEnvironment,
    ) -> Self {
        Self { ast, modules, symbols, types, loop_depth: 0, return_type: None, narrow_stack: Vec::new(), errors: Vec::new() }
    }

    /// ## Errors
    ///
    /// Returns the collected [`SemaError`]s found while checking.
    pub fn run(mut self, module_id: NodeID) -> Result<(), Vec<SemaError>> {
        let Ok(module) = self.ast.get_as::<Module>(module_id) else { return Ok(()) };
        let decls = module.decls.clone();
        let body = module.body.clone();

        for decl_id in decls {
            self.check_decl(decl_id);
        }
        for stmt_id in body {
            self.check_stmt(stmt_id);
        }

        if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
    }

    // --- Declarations ---

    fn check_decl(&mut self, decl_id: NodeID) {
        match self.ast.get_node(decl_id) {
            Some(AnyNode::Procedure(_)) => self.check_procedure(decl_id),
            Some(AnyNode::NamedType(_)) => self.check_named_type(decl_id),
            Some(AnyNode::Const(_)) => {
                self.const_type(decl_id);
            }
            _ => {}
        }
    }

    fn check_named_type(&mut self, named_type_id: NodeID) {
        let Ok(named_type) = self.ast.get_as::<NamedType>(named_type_id) else { return };
        let declared_type = named_type.declared_type;
        if let Ok(record) = self.ast.get_as::<RecordType>(declared_type) {
            let methods = record.methods.clone();
            for method_id in methods {
                self.check_procedure(method_id);
            }
            self.check_overrides(declared_type);
        }
    }

    fn check_overrides(&mut self, record_id: NodeID) {
        let Some(own_scope) = self.symbols.get_node_scope(record_id) else { return };
        let Some(base_scope) = self.symbols.get_scope(own_scope).and_then(|s| s.base) else { return };
        let Ok(record) = self.ast.get_as::<RecordType>(record_id) else { return };
        let methods = record.methods.clone();

        for method_id in methods {
            let Ok(method) = self.ast.get_as::<Procedure>(method_id) else { continue };
            let name = method.name.clone();
            let span = method.span;
            let visibility = method.visibility;

            let Some(base_method_id) = self.lookup_in_scope(base_scope, &name) else { continue };
            let Ok(base_method) = self.ast.get_as::<Procedure>(base_method_id) else { continue };
            let base_visibility = base_method.visibility;

            if self.types.type_of(method_id) != self.types.type_of(base_method_id) {
                self.errors.push(SemaError::OverrideSignatureMismatch { name: name.clone(), span });
            }
            if visibility.rank() < base_visibility.rank() {
                self.errors.push(SemaError::OverrideVisibilityNarrow { name, span });
            }
        }
    }

    fn lookup_in_scope(&self, scope: crate::symbol::ScopeID, name: &str) -> Option<NodeID> {
        if self.symbols.get_scope(scope).is_some() {
            return self.symbols.lookup_from(scope, name);
        }
        self.modules.values().find_map(|t| if t.get_scope(scope).is_some() { t.lookup_from(scope, name) } else { None })
    }

    fn const_type(&mut self, const_id: NodeID) -> Type {
        if let Some(ty) = self.types.get_type(const_id) {
            return ty.clone();
        }
        let Ok(c) = self.ast.get_as::<oberonc_ast::nodes::Const>(const_id) else { return Type::Error };
        let value = c.value;
        let ty = self.type_of_expr(value);
        if ty.is_integer() {
            if let Some(folded) = crate::consteval::eval_const_int(self.ast, value, &mut |n| self.resolve_ident_target_readonly(n)) {
                self.types.set_const_value(const_id, folded);
            }
        }
        self.types.set_type(const_id, ty.clone());
        ty
    }

    fn check_procedure(&mut self, proc_id: NodeID) {
        let Ok(proc) = self.ast.get_as::<Procedure>(proc_id) else { return };
        let body = proc.body.clone();
        let locals = proc.locals.clone();
        let Some(scope) = self.symbols.get_node_scope(proc_id) else { return };

        let return_type = match self.types.type_of(proc_id) {
            Type::Proc { return_type, .. } => return_type.map(|r| *r),
            _ => None,
        };
        let previous_return = std::mem::replace(&mut self.return_type, return_type);
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);

        self.symbols.enter_scope(scope);
        for local_id in locals {
            self.ensure_local_type(local_id);
        }
        for stmt_id in body {
            self.check_stmt(stmt_id);
        }
        let _ = self.symbols.exit_scope();

        self.loop_depth = saved_loop_depth;
        self.return_type = previous_return;
    }

    fn ensure_local_type(&mut self, local_id: NodeID) {
        if self.types.get_type(local_id).is_some() {
            return;
        }
        let Ok(local) = self.ast.get_as::<LocalVar>(local_id) else { return };
        let declared_type = local.declared_type;
        let ty = self.resolve_inline_type(declared_type);
        self.types.set_type(local_id, ty);
    }

    // --- Statements ---

    fn check_stmt(&mut self, stmt_id: NodeID) {
        let Some(node) = self.ast.get_node(stmt_id) else { return };
        match node {
            AnyNode::AssignStmt(_) => self.check_assign(stmt_id),
            AnyNode::CallStmt(call) => {
                let call = call.call;
                self.type_of_expr(call);
            }
            AnyNode::ReturnStmt(_) => self.check_return(stmt_id),
            AnyNode::ExitStmt(_) => self.check_exit(stmt_id),
            AnyNode::IfLoopStmt(_) => self.check_if_loop(stmt_id),
            AnyNode::ForLoopStmt(_) => self.check_for_loop(stmt_id),
            AnyNode::CaseStmt(_) => self.check_case(stmt_id),
            _ => {}
        }
    }

    fn check_assign(&mut self, stmt_id: NodeID) {
        let Ok(stmt) = self.ast.get_as::<AssignStmt>(stmt_id).cloned() else { return };
        let lhs_ty = self.type_of_expr(stmt.lhs);
        self.types.set_role(stmt.lhs, Role::Lhs);

        if self.is_foreign_readonly(stmt.lhs) {
            let name = self.display_name(stmt.lhs);
            self.errors.push(SemaError::ReadonlyViolation { name, span: stmt.span });
        }
        if self.is_const_ref_write(stmt.lhs) {
            let name = self.display_name(stmt.lhs);
            self.errors.push(SemaError::ConstRefWrite { name, span: stmt.span });
        }

        let rhs_ty = self.type_of_expr(stmt.rhs);
        self.types.set_role(stmt.rhs, Role::Rhs);

        if !self.assignment_compatible(&lhs_ty, &rhs_ty) {
            self.errors.push(SemaError::AssignIncompatible { expected: Box::new(lhs_ty), found: Box::new(rhs_ty), span: stmt.span });
        }
    }

    fn check_return(&mut self, stmt_id: NodeID) {
        let Ok(stmt) = self.ast.get_as::<ReturnStmt>(stmt_id).cloned() else { return };
        let expected = self.return_type.clone();
        match (stmt.value, expected) {
            (Some(value), Some(expected)) => {
                let found = self.type_of_expr(value);
                if !self.assignment_compatible(&expected, &found) {
                    self.errors.push(SemaError::AssignIncompatible { expected: Box::new(expected), found: Box::new(found), span: stmt.span });
                }
            }
            (Some(value), None) => {
                self.type_of_expr(value);
            }
            (None, _) => {}
        }
    }

    fn check_exit(&mut self, stmt_id: NodeID) {
        if self.loop_depth == 0 {
            let span = self.ast.get_as::<ExitStmt>(stmt_id).map_or_else(|_| oberonc_source::types::Span::default(), |e| e.span);
            self.errors.push(SemaError::ExitOutsideLoop { span });
        }
    }

    fn check_if_loop(&mut self, stmt_id: NodeID) {
        let Ok(stmt) = self.ast.get_as::<IfLoopStmt>(stmt_id).cloned() else { return };
        match stmt.mode {
            IfLoopMode::If | IfLoopMode::While => {
                if let Some(guard) = stmt.guard {
                    self.check_boolean_guard(guard);
                }
                for s in &stmt.body {
                    self.check_stmt(*s);
                }
            }
            IfLoopMode::Repeat => {
                for s in &stmt.body {
                    self.check_stmt(*s);
                }
                if let Some(guard) = stmt.guard {
                    self.check_boolean_guard(guard);
                }
            }
            IfLoopMode::Loop => {
                self.loop_depth += 1;
                for s in &stmt.body {
                    self.check_stmt(*s);
                }
                self.loop_depth -= 1;
            }
            IfLoopMode::With => self.check_with(&stmt),
        }
        if let Some(else_branch) = stmt.else_branch {
            self.check_stmt(else_branch);
        }
    }

    fn check_boolean_guard(&mut self, guard: NodeID) {
        let ty = self.type_of_expr(guard);
        if !matches!(ty, Type::Base(BaseTypeKind::Boolean) | Type::Error) {
            let span = self.ast.get_node(guard).map(AnyNode::span).unwrap_or_default();
            self.errors.push(SemaError::AssignIncompatible { expected: Box::new(Type::Base(BaseTypeKind::Boolean)), found: Box::new(ty), span });
        }
    }

    fn check_with(&mut self, stmt: &IfLoopStmt) {
        let (Some(with_var), Some(with_type)) = (stmt.with_var, stmt.with_type) else { return };
        let var_ty = self.type_of_expr(with_var);
        let guard_ty = self.resolve_inline_type(with_type);

        if !self.is_extension_or_eq(&guard_ty, &var_ty) {
            self.errors.push(SemaError::InvalidGuard { guard: guard_ty.to_string(), base: var_ty.to_string(), span: stmt.span });
        }

        let narrowed = self.types.get_target(with_var);
        if let Some(target) = narrowed {
            self.narrow_stack.push((target, guard_ty));
        }
        for s in &stmt.body {
            self.check_stmt(*s);
        }
        if narrowed.is_some() {
            self.narrow_stack.pop();
        }
    }

    fn check_for_loop(&mut self, stmt_id: NodeID) {
        let Ok(stmt) = self.ast.get_as::<ForLoopStmt>(stmt_id).cloned() else { return };
        let control_ty = self.type_of_expr(stmt.control);
        let from_ty = self.type_of_expr(stmt.from);
        let to_ty = self.type_of_expr(stmt.to);

        if !self.assignment_compatible(&control_ty, &from_ty) {
            self.errors.push(SemaError::AssignIncompatible { expected: Box::new(control_ty.clone()), found: Box::new(from_ty), span: stmt.span });
        }
        if !self.assignment_compatible(&control_ty, &to_ty) {
            self.errors.push(SemaError::AssignIncompatible { expected: Box::new(control_ty), found: Box::new(to_ty), span: stmt.span });
        }
        if let Some(by) = stmt.by {
            let by_ty = self.type_of_expr(by);
            if let Ok(LiteralExpr { value: LiteralValue::Integer(0), .. }) = self.ast.get_as::<LiteralExpr>(by) {
                self.errors.push(SemaError::ForStepZero { span: stmt.span });
            }
            let _ = by_ty;
        }

        for s in &stmt.body {
            self.check_stmt(*s);
        }
    }

    fn check_case(&mut self, stmt_id: NodeID) {
        let Ok(stmt) = self.ast.get_as::<CaseStmt>(stmt_id).cloned() else { return };
        let scrutinee_ty = self.type_of_expr(stmt.scrutinee);
        let is_type_case = scrutinee_ty.record_target().is_some();

        if is_type_case {
            let narrow_target = self.types.get_target(stmt.scrutinee);
            for arm in &stmt.arms {
                let guard_ty = arm.labels.first().map(|&l| self.resolve_inline_type(l)).unwrap_or(Type::Error);
                if !self.is_extension_or_eq(&guard_ty, &scrutinee_ty) {
                    self.errors.push(SemaError::InvalidGuard { guard: guard_ty.to_string(), base: scrutinee_ty.to_string(), span: stmt.span });
                }
                if let Some(target) = narrow_target {
                    self.narrow_stack.push((target, guard_ty));
                }
                for s in &arm.body {
                    self.check_stmt(*s);
                }
                if narrow_target.is_some() {
                    self.narrow_stack.pop();
                }
            }
        } else {
            let mut seen: Vec<(i64, i64)> = Vec::new();
            for arm in &stmt.arms {
                for &label in &arm.labels {
                    self.check_case_label(label, &mut seen, stmt.span);
                }
                for s in &arm.body {
                    self.check_stmt(*s);
                }
            }
        }

        if let Some(else_body) = &stmt.else_body {
            for s in else_body {
                self.check_stmt(*s);
            }
        }
    }

    fn check_case_label(&mut self, label: NodeID, seen: &mut Vec<(i64, i64)>, span: oberonc_source::types::Span) {
        let range = match self.ast.get_node(label) {
            Some(AnyNode::BinExpr(b)) if b.op == BinOp::Range => {
                let lo = self.const_int(b.lhs);
                let hi = self.const_int(b.rhs);
                (lo, hi)
            }
            _ => {
                let v = self.const_int(label);
                (v, v)
            }
        };
        let (lo, hi) = range;
        if seen.iter().any(|&(slo, shi)| lo <= shi && hi >= slo) {
            self.errors.push(SemaError::CaseLabelOverlap { span });
        }
        seen.push((lo, hi));
        self.type_of_expr(label);
    }

    /// Folds a `CASE` label to an `i64` for overlap detection (spec §4.4), via
    /// the shared constant evaluator. A label that doesn't fold to a constant
    /// (a malformed expression already reported elsewhere) falls back to its
    /// `NodeID` so it's treated as a singleton that never collides with a
    /// real label.
    fn const_int(&self, node_id: NodeID) -> i64 {
        crate::consteval::eval_const_int(self.ast, node_id, &mut |n| self.resolve_ident_target_readonly(n))
            .unwrap_or_else(|| i64::from(node_id.index()))
    }

    // --- Expressions ---

    fn type_of_expr(&mut self, node_id: NodeID) -> Type {
        if let Some(ty) = self.types.get_type(node_id) {
            return ty.clone();
        }
        let ty = self.compute_expr_type(node_id);
        self.types.set_type(node_id, ty.clone());
        ty
    }

    fn compute_expr_type(&mut self, node_id: NodeID) -> Type {
        let Some(node) = self.ast.get_node(node_id).cloned() else { return Type::Error };
        match node {
            AnyNode::LiteralExpr(lit) => self.literal_type(&lit),
            AnyNode::SetExpr(set) => {
                for el in &set.elements {
                    match *el {
                        SetElement::Single(e) => {
                            let t = self.type_of_expr(e);
                            if !t.is_integer() && !t.is_error() {
                                self.errors.push(type_mismatch(Type::Base(BaseTypeKind::Integer), t, set.span));
                            }
                        }
                        SetElement::Range(a, b) => {
                            self.type_of_expr(a);
                            self.type_of_expr(b);
                        }
                    }
                }
                Type::Set
            }
            AnyNode::IdentLeafExpr(leaf) => {
                let Some(target) = self.symbols.lookup_in_scope_chain(&leaf.name) else {
                    self.errors.push(SemaError::UnresolvedIdent { name: leaf.name, span: leaf.span });
                    return Type::Error;
                };
                self.types.set_target(node_id, target);
                self.narrowed(target).unwrap_or_else(|| self.entity_type(target))
            }
            AnyNode::IdentSelExpr(sel) => self.ident_sel_type(node_id, &sel),
            AnyNode::UnExpr(u) => self.un_expr_type(&u),
            AnyNode::ArgExpr(a) => self.arg_expr_type(&a),
            AnyNode::BinExpr(b) => self.bin_expr_type(&b),
            _ => Type::Error,
        }
    }

    fn literal_type(&self, lit: &LiteralExpr) -> Type {
        match &lit.value {
            LiteralValue::Integer(_) => Type::Base(BaseTypeKind::Integer),
            LiteralValue::Real(_) => Type::Base(BaseTypeKind::Real),
            LiteralValue::Boolean(_) => Type::Base(BaseTypeKind::Boolean),
            LiteralValue::Character(_) => Type::Base(BaseTypeKind::Char),
            LiteralValue::Nil => Type::Nil,
            LiteralValue::Str(_) => Type::Array { length: lit.str_len.map(|n| n as u64), elem: Box::new(Type::Base(BaseTypeKind::Char)) },
            LiteralValue::ByteStr(bytes) => Type::Array { length: Some(bytes.len() as u64), elem: Box::new(Type::Base(BaseTypeKind::Byte)) },
        }
    }

    fn ident_sel_type(&mut self, node_id: NodeID, sel: &oberonc_ast::nodes::IdentSelExpr) -> Type {
        let base_ty = self.type_of_expr(sel.base);
        match &base_ty {
            Type::ModuleRef(module_id) => {
                self.types.set_role(sel.base, Role::Import);
                let Some(table) = self.modules.get(module_id) else { return self.unresolved(node_id, &sel.name) };
                let Some(scope) = table.module_scope() else { return self.unresolved(node_id, &sel.name) };
                match table.lookup_from(scope, &sel.name) {
                    Some(target) => {
                        self.types.set_target(node_id, target);
                        self.entity_type(target)
                    }
                    None => self.unresolved(node_id, &sel.name),
                }
            }
            other => {
                let Some(record_id) = other.record_target() else { return self.unresolved(node_id, &sel.name) };
                match self.lookup_record_member(record_id, &sel.name) {
                    Some(target) => {
                        self.types.set_target(node_id, target);
                        if matches!(self.ast.get_node(target), Some(AnyNode::Procedure(_))) {
                            self.types.set_role(node_id, Role::Method);
                        }
                        self.entity_type(target)
                    }
                    None => self.unresolved(node_id, &sel.name),
                }
            }
        }
    }

    fn unresolved(&mut self, node_id: NodeID, name: &str) -> Type {
        let span = self.ast.get_node(node_id).map(AnyNode::span).unwrap_or_default();
        self.errors.push(SemaError::UnresolvedIdent { name: name.to_owned(), span });
        Type::Error
    }

    fn lookup_record_member(&self, record_id: NodeID, name: &str) -> Option<NodeID> {
        if let Some(scope) = self.symbols.get_node_scope(record_id) {
            return self.symbols.lookup_from(scope, name);
        }
        self.modules.values().find_map(|t| t.get_node_scope(record_id).and_then(|s| t.lookup_from(s, name)))
    }

    fn entity_type(&mut self, target: NodeID) -> Type {
        if let Some(ty) = self.types.get_type(target) {
            return ty.clone();
        }
        match self.ast.get_node(target).cloned() {
            Some(AnyNode::LocalVar(l)) => {
                let ty = self.resolve_inline_type(l.declared_type);
                self.types.set_type(target, ty.clone());
                ty
            }
            Some(AnyNode::Const(_)) => self.const_type(target),
            Some(AnyNode::Import(imp)) => imp.target.map_or(Type::Error, Type::ModuleRef),
            Some(AnyNode::GenericName(_)) => Type::Base(BaseTypeKind::Any),
            Some(AnyNode::BuiltIn(b)) => {
                let ty = self.resolve_inline_type(b.proc_type);
                self.types.set_type(target, ty.clone());
                ty
            }
            Some(AnyNode::Parameter(_) | AnyNode::Variable(_) | AnyNode::Field(_) | AnyNode::Procedure(_)) => self.types.type_of(target),
            _ => Type::Error,
        }
    }

    fn narrowed(&self, target: NodeID) -> Option<Type> {
        self.narrow_stack.iter().rev().find(|(id, _)| *id == target).map(|(_, ty)| ty.clone())
    }

    fn un_expr_type(&mut self, u: &UnExpr) -> Type {
        let operand_ty = self.type_of_expr(u.operand);
        match u.op {
            UnOp::Neg => {
                if operand_ty.is_numeric() || operand_ty.is_error() {
                    operand_ty
                } else {
                    self.errors.push(type_mismatch(Type::Base(BaseTypeKind::Integer), operand_ty, u.span));
                    Type::Error
                }
            }
            UnOp::Not => {
                if matches!(operand_ty, Type::Base(BaseTypeKind::Boolean) | Type::Error) {
                    operand_ty
                } else {
                    self.errors.push(type_mismatch(Type::Base(BaseTypeKind::Boolean), operand_ty, u.span));
                    Type::Error
                }
            }
            UnOp::Deref => match operand_ty {
                Type::Pointer(inner) => *inner,
                Type::Error => Type::Error,
                other => {
                    self.errors.push(type_mismatch(Type::Pointer(Box::new(Type::Error)), other, u.span));
                    Type::Error
                }
            },
            UnOp::AddrOf => Type::Pointer(Box::new(operand_ty)),
        }
    }

    fn arg_expr_type(&mut self, a: &ArgExpr) -> Type {
        match a.kind_tag {
            ArgKind::Call => {
                let callee_ty = self.type_of_expr(a.callee);
                self.types.set_role(a.callee, Role::Call);
                match callee_ty {
                    Type::Proc { params, param_modes, return_type } => {
                        self.check_call_args(&params, &param_modes, &a.args, a.span);
                        return_type.map_or(Type::Error, |r| *r)
                    }
                    Type::Error => Type::Error,
                    other => {
                        self.errors.push(type_mismatch(
                            Type::Proc { params: Vec::new(), param_modes: Vec::new(), return_type: None },
                            other,
                            a.span,
                        ));
                        Type::Error
                    }
                }
            }
            ArgKind::Index => {
                let callee_ty = self.type_of_expr(a.callee);
                for &arg in &a.args {
                    let idx_ty = self.type_of_expr(arg);
                    if !idx_ty.is_integer() && !idx_ty.is_error() {
                        self.errors.push(type_mismatch(Type::Base(BaseTypeKind::Integer), idx_ty, a.span));
                    }
                }
                match callee_ty {
                    Type::Array { elem, .. } => *elem,
                    Type::Error => Type::Error,
                    other => {
                        self.errors.push(type_mismatch(Type::Array { length: None, elem: Box::new(Type::Error) }, other, a.span));
                        Type::Error
                    }
                }
            }
            ArgKind::Guard => {
                let callee_ty = self.type_of_expr(a.callee);
                let Some(guard_id) = a.guard_type else { return Type::Error };
                let guard_ty = self.resolve_inline_type(guard_id);
                if !self.is_extension_or_eq(&guard_ty, &callee_ty) {
                    self.errors.push(SemaError::InvalidGuard { guard: guard_ty.to_string(), base: callee_ty.to_string(), span: a.span });
                    return Type::Error;
                }
                self.types.set_type(guard_id, guard_ty.clone());
                guard_ty
            }
        }
    }

    fn check_call_args(&mut self, params: &[Type], param_modes: &[oberonc_ast::nodes::ParamMode], args: &[NodeID], span: oberonc_source::types::Span) {
        for (i, &arg) in args.iter().enumerate() {
            let arg_ty = self.type_of_expr(arg);
            self.types.set_role(arg, Role::VarArg);
            let Some(param_ty) = params.get(i) else { continue };
            if !self.assignment_compatible(param_ty, &arg_ty) {
                self.errors.push(SemaError::AssignIncompatible { expected: Box::new(param_ty.clone()), found: Box::new(arg_ty), span });
            }
            let by_ref = matches!(
                param_modes.get(i),
                Some(oberonc_ast::nodes::ParamMode::ByRef | oberonc_ast::nodes::ParamMode::ByConstRef)
            );
            if by_ref && !self.is_lvalue_expr(arg) {
                self.errors.push(SemaError::VarArgNotLvalue { span });
            }
        }
    }

    fn bin_expr_type(&mut self, b: &BinExpr) -> Type {
        if b.op == BinOp::Range {
            self.errors.push(SemaError::RangeMisuse { span: b.span });
            return Type::Error;
        }

        let lhs = self.type_of_expr(b.lhs);
        let rhs = self.type_of_expr(b.rhs);

        if b.op.is_relational() {
            match b.op {
                BinOp::Is => {
                    self.types.set_role(b.lhs, Role::Sub);
                    self.types.set_role(b.rhs, Role::Super);
                    if !self.is_extension_or_eq(&rhs, &lhs) && !self.is_extension_or_eq(&lhs, &rhs) {
                        self.errors.push(type_mismatch(lhs, rhs, b.span));
                    }
                }
                BinOp::In => {
                    if (!lhs.is_integer() && !lhs.is_error()) || (!matches!(rhs, Type::Set) && !rhs.is_error()) {
                        self.errors.push(type_mismatch(Type::Set, rhs, b.span));
                    }
                }
                _ if !self.comparable(&lhs, &rhs) => {
                    self.errors.push(type_mismatch(lhs, rhs, b.span));
                }
                _ => {}
            }
            return Type::Base(BaseTypeKind::Boolean);
        }

        if matches!(lhs, Type::Set) && matches!(rhs, Type::Set) {
            return Type::Set;
        }
        if matches!(b.op, BinOp::And | BinOp::Or)
            && matches!(lhs, Type::Base(BaseTypeKind::Boolean))
            && matches!(rhs, Type::Base(BaseTypeKind::Boolean))
        {
            return Type::Base(BaseTypeKind::Boolean);
        }

        match b.op {
            BinOp::Div | BinOp::Mod => return self.int_only_arith(&lhs, &rhs, b.span),
            BinOp::FDiv => return self.real_promoting_arith(&lhs, &rhs, b.span),
            _ => {}
        }

        match self.promote(&lhs, &rhs) {
            Some(ty) => ty,
            None if lhs.is_error() || rhs.is_error() => Type::Error,
            None => {
                self.errors.push(type_mismatch(lhs, rhs, b.span));
                Type::Error
            }
        }
    }

    fn comparable(&self, a: &Type, b: &Type) -> bool {
        if a == b || a.is_error() || b.is_error() {
            return true;
        }
        if a.is_numeric() && b.is_numeric() {
            return true;
        }
        matches!((a, b), (Type::Nil, Type::Pointer(_)) | (Type::Pointer(_), Type::Nil))
    }

    fn promote(&self, a: &Type, b: &Type) -> Option<Type> {
        match (a.numeric_rank(), b.numeric_rank()) {
            (Some(ra), Some(rb)) => Some(if ra >= rb { a.clone() } else { b.clone() }),
            _ => None,
        }
    }

    /// `DIV`/`MOD` (spec §4.4.1): both operands must be integer; result is
    /// the wider integer type. Errors are attributed against `Integer`
    /// since that's the minimum either side must satisfy.
    fn int_only_arith(&mut self, lhs: &Type, rhs: &Type, span: oberonc_source::types::Span) -> Type {
        if lhs.is_error() || rhs.is_error() {
            return Type::Error;
        }
        if lhs.is_integer() && rhs.is_integer() {
            return self.promote(lhs, rhs).unwrap_or(Type::Error);
        }
        let offender = if lhs.is_integer() { rhs.clone() } else { lhs.clone() };
        self.errors.push(type_mismatch(Type::Base(BaseTypeKind::Integer), offender, span));
        Type::Error
    }

    /// `FDIV` (`/`) on numeric operands (spec §4.4.1): at least one operand
    /// real, both promoted to real — `LONGREAL` if either side is already
    /// `LONGREAL`, `REAL` otherwise.
    fn real_promoting_arith(&mut self, lhs: &Type, rhs: &Type, span: oberonc_source::types::Span) -> Type {
        if lhs.is_error() || rhs.is_error() {
            return Type::Error;
        }
        if !lhs.is_numeric() || !rhs.is_numeric() || !(lhs.is_real() || rhs.is_real()) {
            let offender = if lhs.is_real() { rhs.clone() } else { lhs.clone() };
            self.errors.push(type_mismatch(Type::Base(BaseTypeKind::Real), offender, span));
            return Type::Error;
        }
        if matches!(lhs, Type::Base(BaseTypeKind::LongReal)) || matches!(rhs, Type::Base(BaseTypeKind::LongReal)) {
            Type::Base(BaseTypeKind::LongReal)
        } else {
            Type::Base(BaseTypeKind::Real)
        }
    }

    // --- Compatibility rules (spec §4.4.2, §4.4.3) ---

    fn assignment_compatible(&self, target: &Type, value: &Type) -> bool {
        if target == value || target.is_error() || value.is_error() {
            return true;
        }
        match (target, value) {
            (Type::Base(t), Type::Base(v)) if t.is_integer() && v.is_integer() => {
                v.numeric_rank().zip(t.numeric_rank()).is_some_and(|(vr, tr)| vr <= tr)
            }
            (Type::Base(t), Type::Base(v)) if t.is_real() && v.is_integer() => true,
            (Type::Base(t), Type::Base(v)) if t.is_real() && v.is_real() => {
                v.numeric_rank().zip(t.numeric_rank()).is_some_and(|(vr, tr)| vr <= tr)
            }
            (Type::Pointer(_) | Type::Proc { .. }, Type::Nil) => true,
            (Type::Pointer(t), Type::Pointer(v)) => self.is_extension_or_eq(v, t),
            (Type::Record(_), Type::Record(_)) => self.is_extension_or_eq(value, target),
            (Type::Array { elem: te, length: None }, Type::Array { elem: ve, .. }) => te == ve,
            _ => false,
        }
    }

    /// Whether `value`'s record chain passes through `target`, i.e. `value`
    /// is `target` or one of its extensions — looking through one `Pointer`
    /// indirection on each side.
    fn is_extension_or_eq(&self, value: &Type, target: &Type) -> bool {
        match (value.record_target(), target.record_target()) {
            (Some(v), Some(t)) => self.is_record_extension_or_eq(v, t),
            _ => value == target,
        }
    }

    fn is_record_extension_or_eq(&self, value_id: NodeID, target_id: NodeID) -> bool {
        let mut current = Some(value_id);
        while let Some(id) = current {
            if id == target_id {
                return true;
            }
            let Ok(record) = self.ast.get_as::<RecordType>(id) else { break };
            current = record.base.and_then(|b| self.types.get_type(b)).and_then(|t| t.record_target());
        }
        false
    }

    // --- Inline (non-memoized-by-the-resolver) type expressions ---

    /// Resolves a type expression reached only from a procedure body or
    /// local declaration — never a module-level declaration, which the type
    /// resolver pass already covers and memoizes.
    fn resolve_inline_type(&mut self, node_id: NodeID) -> Type {
        if let Some(ty) = self.types.get_type(node_id) {
            return ty.clone();
        }
        let ty = match self.ast.get_node(node_id).cloned() {
            Some(AnyNode::BaseType(b)) => Type::Base(b.kind_tag),
            Some(AnyNode::ArrayType(a)) => {
                let length = a.length.map(|len_id| {
                    match crate::consteval::eval_const_int(self.ast, len_id, &mut |n| self.resolve_ident_target_readonly(n)) {
                        Some(n) if n >= 1 => n as u64,
                        _ => {
                            self.errors.push(SemaError::ArrayLengthError { span: a.span });
                            0
                        }
                    }
                });
                Type::Array { length, elem: Box::new(self.resolve_inline_type(a.elem)) }
            }
            Some(AnyNode::Pointer(p)) => Type::Pointer(Box::new(self.resolve_inline_type(p.to))),
            Some(AnyNode::RecordType(_)) => Type::Record(node_id),
            Some(AnyNode::ProcType(pt)) => self.resolve_inline_proc_type(&pt),
            Some(AnyNode::QualiType(qt)) => match self.resolve_ident_target(qt.quali) {
                Some(target) if self.ast.get_as::<NamedType>(target).is_ok() => self.types.type_of(target),
                Some(target) if matches!(self.ast.get_node(target), Some(AnyNode::GenericName(_))) => {
                    Type::Base(BaseTypeKind::Any)
                }
                _ => Type::Error,
            },
            _ => Type::Error,
        };
        self.types.set_type(node_id, ty.clone());
        ty
    }

    fn resolve_inline_proc_type(&mut self, pt: &ProcType) -> Type {
        let formals = pt.formals.clone();
        let return_type = pt.return_type;
        let formal_params: Vec<(oberonc_ast::nodes::ParamMode, NodeID)> = formals
            .iter()
            .filter_map(|&f| self.ast.get_as::<Parameter>(f).ok().map(|p| (p.mode, p.declared_type)))
            .collect();
        let param_modes = formal_params.iter().map(|(mode, _)| *mode).collect();
        let params = formal_params.iter().map(|&(_, d)| self.resolve_inline_type(d)).collect();
        Type::Proc { params, param_modes, return_type: return_type.map(|r| Box::new(self.resolve_inline_type(r))) }
    }

    /// Like [`Self::resolve_ident_target`] but `&self`-only, for use from
    /// inside a constant-folding closure that already holds `self.ast`
    /// borrowed. Only handles unqualified names — a qualified reference
    /// (`m.c`) would need `type_of_expr`'s caching, which needs `&mut self`.
    fn resolve_ident_target_readonly(&self, node_id: NodeID) -> Option<NodeID> {
        match self.ast.get_node(node_id)? {
            AnyNode::IdentLeafExpr(leaf) => self.symbols.lookup_in_scope_chain(&leaf.name),
            _ => None,
        }
    }

    fn resolve_ident_target(&mut self, node_id: NodeID) -> Option<NodeID> {
        match self.ast.get_node(node_id)?.clone() {
            AnyNode::IdentLeafExpr(leaf) => self.symbols.lookup_in_scope_chain(&leaf.name),
            AnyNode::IdentSelExpr(sel) => {
                let base_ty = self.type_of_expr(sel.base);
                let module_id = if let Type::ModuleRef(m) = base_ty { Some(m) } else { None }?;
                let table = self.modules.get(&module_id)?;
                table.lookup_from(table.module_scope()?, &sel.name)
            }
            _ => None,
        }
    }

    // --- Misc helpers ---

    fn is_foreign_readonly(&mut self, node_id: NodeID) -> bool {
        if !matches!(self.ast.get_node(node_id), Some(AnyNode::IdentSelExpr(_))) {
            return false;
        }
        let Some(target) = self.types.get_target(node_id) else { return false };
        match self.ast.get_node(target) {
            Some(AnyNode::Variable(v)) => v.visibility == Visibility::ReadOnly,
            Some(AnyNode::Field(f)) => f.visibility == Visibility::ReadOnly,
            _ => false,
        }
    }

    /// Whether `node_id` (an assignment's LHS) names a `CONST`-ref parameter
    /// (spec §4.4.2: "disallows writes inside the callee").
    fn is_const_ref_write(&mut self, node_id: NodeID) -> bool {
        if !matches!(self.ast.get_node(node_id), Some(AnyNode::IdentLeafExpr(_))) {
            return false;
        }
        let Some(target) = self.types.get_target(node_id) else { return false };
        matches!(self.ast.get_node(target), Some(AnyNode::Parameter(p)) if p.mode == oberonc_ast::nodes::ParamMode::ByConstRef)
    }

    /// Whether `node_id` denotes an assignable storage location — the caller
    /// side of the `VAR`/`CONST`-ref "requires an lvalue" rule (spec §4.4.2).
    fn is_lvalue_expr(&self, node_id: NodeID) -> bool {
        match self.ast.get_node(node_id) {
            Some(AnyNode::IdentLeafExpr(_) | AnyNode::IdentSelExpr(_)) => true,
            Some(AnyNode::UnExpr(u)) => u.op == UnOp::Deref,
            Some(AnyNode::ArgExpr(a)) => a.kind_tag == ArgKind::Index,
            _ => false,
        }
    }

    fn display_name(&self, node_id: NodeID) -> String {
        match self.ast.get_node(node_id) {
            Some(AnyNode::IdentLeafExpr(l)) => l.name.clone(),
            Some(AnyNode::IdentSelExpr(s)) => s.name.clone(),
            _ => "?".to_owned(),
        }
    }
}

fn type_mismatch(expected: Type, found: Type, span: oberonc_source::types::Span) -> SemaError {
    SemaError::AssignIncompatible { expected: Box::new(expected), found: Box::new(found), span }
}
