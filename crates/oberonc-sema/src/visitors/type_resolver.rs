//! Type resolver: turns `QualiType` placeholders and structural type
//! expressions into [`Type`] values, per spec §4.3's seven-step algorithm.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{
    AnyNode, ASTNode, ArrayType, BaseTypeKind, Enumeration, Field, Import, Module,
    NamedType, NodeID, Parameter, Pointer, ProcType, QualiType, RecordType, Variable,
};
use rustc_hash::FxHashMap;

use crate::error::SemaError;
use crate::symbol::{ScopeKind, SymbolTable};
use crate::types::{Type, TypeEnvironment};

/// Record-extension chains longer than this are rejected with
/// `extension-too-deep` rather than walked forever — an implementation cap,
/// not a value the language itself names.
const MAX_EXTENSION_DEPTH: u32 = 100;

/// Resolves every type expression reachable from one module's declarations.
///
/// Holds the current module's own (mutable) [`SymbolTable`] plus read access
/// to every already-resolved module's table, so a qualified reference
/// (`m.T`) can look the name up in the imported module's scope without the
/// two modules sharing one scope tree.
pub struct TypeResolver<'a> {
    ast: &'a mut AST,
    modules: &'a FxHashMap<NodeID, SymbolTable>,
    symbols: &'a mut SymbolTable,
    types: &'a mut TypeEnvironment,
    current_named_type: Option<NodeID>,
    /// Generic-parameter substitution active while instantiating a template
    /// (spec §4.3 point 7): `GenericName` node -> the actual `Type` it's
    /// bound to for the instantiation currently being built.
    current_generic_subst: Option<FxHashMap<NodeID, Type>>,
    /// `(template, actuals key)` pairs whose instantiation is in progress,
    /// so a generic that instantiates itself is caught as `generic-cycle`
    /// rather than recursing forever.
    generic_stack: Vec<(NodeID, String)>,
    errors: Vec<SemaError>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        ast: &'a mut AST,
        modules: &'a FxHashMap<NodeID, SymbolTable>,
        symbols: &'a mut SymbolTable,
        types: &'a mut TypeEnvironment,
    ) -> Self {
        Self {
            ast,
            modules,
            symbols,
            types,
            current_named_type: None,
            current_generic_subst: None,
            generic_stack: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Resolves every `NamedType`, top-level `Variable`, and `Procedure`
    /// signature declared directly in `module_id`.
    ///
    /// ## Errors
    ///
    /// Returns the collected [`SemaError`]s (cycles, illegal self-references,
    /// malformed pointer/array targets, ...) found while resolving.
    pub fn run(mut self, module_id: NodeID) -> Result<(), Vec<SemaError>> {
        let Ok(module) = self.ast.get_as::<Module>(module_id) else { return Ok(()) };
        let decls = module.decls.clone();

        for decl_id in decls {
            match self.ast.get_node(decl_id) {
                Some(AnyNode::NamedType(_)) => {
                    self.resolve_named_type(decl_id);
                }
                Some(AnyNode::Variable(_)) => self.resolve_variable(decl_id),
                Some(AnyNode::Procedure(_)) => self.resolve_procedure_signature(decl_id),
                _ => {}
            }
        }

        if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
    }

    fn resolve_variable(&mut self, var_id: NodeID) {
        let Ok(var) = self.ast.get_as::<Variable>(var_id) else { return };
        let declared_type = var.declared_type;
        let ty = self.resolve_type(declared_type, false);
        self.types.set_type(var_id, ty);
    }

    fn resolve_procedure_signature(&mut self, proc_id: NodeID) {
        let Ok(proc) = self.ast.get_as::<oberonc_ast::nodes::Procedure>(proc_id) else { return };
        let proc_type = proc.proc_type;
        let receiver = proc.receiver;
        let ty = self.resolve_type(proc_type, false);
        self.types.set_type(proc_id, ty);

        if let Some(receiver_id) = receiver
            && let Ok(r) = self.ast.get_as::<Parameter>(receiver_id)
        {
            let declared_type = r.declared_type;
            let receiver_ty = self.resolve_type(declared_type, false);
            self.types.set_type(receiver_id, receiver_ty);
        }
    }

    /// Resolves a `NamedType`'s own declared type, memoizing the result so a
    /// second reference (or a second call from [`Self::run`]) is a lookup.
    fn resolve_named_type(&mut self, named_type_id: NodeID) -> Type {
        if let Some(ty) = self.types.get_type(named_type_id) {
            return ty.clone();
        }
        let Ok(named_type) = self.ast.get_as::<NamedType>(named_type_id) else { return Type::Error };
        let name = named_type.name.clone();
        let declared_type = named_type.declared_type;

        if !self.types.begin_resolution(named_type_id) {
            self.errors.push(SemaError::IllegalSelfRef { name, span: named_type.span });
            return Type::Error;
        }

        let previous = self.current_named_type.replace(named_type_id);
        let ty = self.resolve_type(declared_type, false);
        self.current_named_type = previous;

        self.types.end_resolution(named_type_id);
        self.types.set_type(named_type_id, ty.clone());
        ty
    }

    /// Dispatches on the node's syntactic kind. `via_pointer` is `true` only
    /// while resolving a `Pointer`'s `to` — it is what tells a self-reference
    /// apart from an illegal unindirected cycle (spec §9).
    fn resolve_type(&mut self, node_id: NodeID, via_pointer: bool) -> Type {
        match self.ast.get_node(node_id) {
            Some(AnyNode::BaseType(b)) => Type::Base(b.kind_tag),
            Some(AnyNode::Pointer(_)) => self.resolve_pointer(node_id),
            Some(AnyNode::ArrayType(_)) => self.resolve_array_type(node_id),
            Some(AnyNode::RecordType(_)) => self.resolve_record_type(node_id, via_pointer),
            Some(AnyNode::ProcType(_)) => self.resolve_proc_type(node_id),
            Some(AnyNode::Enumeration(_)) => self.resolve_enumeration(node_id),
            Some(AnyNode::QualiType(_)) => self.resolve_quali_type(node_id, via_pointer),
            _ => Type::Error,
        }
    }

    fn resolve_pointer(&mut self, pointer_id: NodeID) -> Type {
        let Ok(pointer) = self.ast.get_as::<Pointer>(pointer_id) else { return Type::Error };
        let to = pointer.to;
        let span = pointer.span;

        let target = self.resolve_type(to, true);
        if target.record_target().is_none() && !matches!(target, Type::Array { .. }) {
            self.errors.push(SemaError::PointerBaseIllegal { span });
            return Type::Error;
        }
        Type::Pointer(Box::new(target))
    }

    fn resolve_array_type(&mut self, array_id: NodeID) -> Type {
        let Ok(array) = self.ast.get_as::<ArrayType>(array_id) else { return Type::Error };
        let length_node = array.length;
        let elem = array.elem;
        let span = array.span;

        let length = match length_node {
            None => None,
            Some(len_id) => match crate::consteval::eval_const_int(self.ast, len_id, &mut |n| self.resolve_identifier(n)) {
                Some(n) if n >= 1 => Some(n as u64),
                Some(_) => {
                    self.errors.push(SemaError::ArrayLengthError { span });
                    Some(0)
                }
                None => {
                    self.errors.push(SemaError::ArrayLengthError { span });
                    Some(0)
                }
            },
        };

        let elem_ty = self.resolve_type(elem, false);
        Type::Array { length, elem: Box::new(elem_ty) }
    }

    fn resolve_proc_type(&mut self, proc_type_id: NodeID) -> Type {
        let Ok(proc_type) = self.ast.get_as::<ProcType>(proc_type_id) else { return Type::Error };
        let formals = proc_type.formals.clone();
        let return_type = proc_type.return_type;

        let formal_info: Vec<(oberonc_ast::nodes::ParamMode, Option<NodeID>)> = formals
            .iter()
            .map(|&formal_id| {
                self.ast.get_as::<Parameter>(formal_id).map_or((oberonc_ast::nodes::ParamMode::Value, None), |p| (p.mode, Some(p.declared_type)))
            })
            .collect();
        let param_modes = formal_info.iter().map(|(mode, _)| *mode).collect();
        let params = formal_info
            .iter()
            .map(|&(_, declared)| declared.map_or(Type::Error, |declared| self.resolve_type(declared, false)))
            .collect();
        let return_type = return_type.map(|r| Box::new(self.resolve_type(r, false)));

        Type::Proc { params, param_modes, return_type }
    }

    fn resolve_enumeration(&mut self, enum_id: NodeID) -> Type {
        let Ok(e) = self.ast.get_as::<Enumeration>(enum_id) else { return Type::Error };
        let consts = e.consts.clone();
        for const_id in consts {
            self.types.set_type(const_id, Type::Enumeration(enum_id));
        }
        Type::Enumeration(enum_id)
    }

    fn resolve_record_type(&mut self, record_id: NodeID, via_pointer: bool) -> Type {
        if !via_pointer && self.types.is_in_progress(record_id) {
            self.errors.push(SemaError::IllegalSelfRef {
                name: format!("record {record_id}"),
                span: self.ast.get_node(record_id).map(AnyNode::span).unwrap_or_default(),
            });
            return Type::Error;
        }
        if let Some(ty) = self.types.get_type(record_id) {
            return ty.clone();
        }

        let Some(record) = self.ast.get_as::<RecordType>(record_id).ok().cloned() else { return Type::Error };
        self.types.begin_resolution(record_id);

        if let Some(base_id) = record.base {
            let base_ty = self.resolve_type(base_id, false);
            self.types.set_type(base_id, base_ty.clone());
            if let Some(base_record_id) = base_ty.record_target() {
                if self.extension_depth(base_record_id) + 1 > MAX_EXTENSION_DEPTH {
                    self.errors.push(SemaError::ExtensionTooDeep {
                        name: format!("record {record_id}"),
                        span: record.span,
                    });
                } else {
                    self.wire_base_scope(record_id, base_record_id);
                    self.link_subclass(base_record_id, record_id);
                }
            }
        }

        for &field_id in &record.fields {
            if let Ok(declared_type) = self.ast.get_as::<oberonc_ast::nodes::Field>(field_id).map(|f| f.declared_type) {
                let ty = self.resolve_type(declared_type, false);
                self.types.set_type(field_id, ty);
            }
        }
        for &method_id in &record.methods {
            self.resolve_procedure_signature(method_id);
        }

        self.types.end_resolution(record_id);
        let ty = Type::Record(record_id);
        self.types.set_type(record_id, ty.clone());
        ty
    }

    /// Links `record_id`'s scope to `base_record_id`'s scope (possibly in a
    /// different module's table) so name lookup walks the base chain first
    /// (spec §4.2).
    fn wire_base_scope(&mut self, record_id: NodeID, base_record_id: NodeID) {
        let Some(own_scope) = self.symbols.get_node_scope(record_id) else { return };
        let base_scope = self
            .symbols
            .get_node_scope(base_record_id)
            .or_else(|| self.modules.values().find_map(|table| table.get_node_scope(base_record_id)));
        if let Some(base_scope) = base_scope {
            self.symbols.set_base_scope(own_scope, base_scope);
        }
    }

    /// Appends `record_id` to its base's `sub_recs`, a same-arena link since
    /// a base record and its extensions can live in different modules but
    /// always share the one compilation-wide arena.
    fn link_subclass(&mut self, base_record_id: NodeID, record_id: NodeID) {
        if let Some(AnyNode::RecordType(mut base)) = self.ast.get_node(base_record_id).cloned() {
            base.sub_recs.push(record_id);
            if let Some(slot) = self.ast.get_node_mut(base_record_id) {
                *slot = AnyNode::RecordType(base);
            }
        }
    }

    fn extension_depth(&self, record_id: NodeID) -> u32 {
        let mut depth = 0;
        let mut current = Some(record_id);
        while let Some(id) = current {
            let Ok(record) = self.ast.get_as::<RecordType>(id) else { break };
            let Some(base_id) = record.base else { break };
            let Some(base_record_id) = self.types.get_type(base_id).and_then(Type::record_target) else { break };
            depth += 1;
            if depth > MAX_EXTENSION_DEPTH {
                break;
            }
            current = Some(base_record_id);
        }
        depth
    }

    fn resolve_quali_type(&mut self, quali_type_id: NodeID, via_pointer: bool) -> Type {
        let Some(qt) = self.ast.get_as::<QualiType>(quali_type_id).ok().cloned() else { return Type::Error };

        let Some(target) = self.resolve_identifier(qt.quali) else {
            self.errors.push(SemaError::UnresolvedIdent { name: self.identifier_name(qt.quali), span: qt.span });
            return Type::Error;
        };

        if self.current_named_type == Some(target) && self.types.is_in_progress(target) {
            if !via_pointer {
                let name = self.ast.get_as::<NamedType>(target).map_or_else(|_| "?".to_owned(), |n| n.name.clone());
                self.errors.push(SemaError::IllegalSelfRef { name, span: qt.span });
                return Type::Error;
            }
            self.mark_self_ref(quali_type_id);
            return self.identity_type_for(target);
        }

        if !qt.actuals.is_empty() {
            return self.resolve_generic_instantiation(target, &qt.actuals);
        }

        if self.ast.get_as::<NamedType>(target).is_ok() {
            self.resolve_named_type(target)
        } else if let Some(bound) = self.current_generic_subst.as_ref().and_then(|subst| subst.get(&target)) {
            // A generic parameter reference inside the template whose
            // instantiation is currently being built: substitute the actual
            // type bound to it (spec §4.3 point 7).
            bound.clone()
        } else {
            // A generic parameter (`GenericName`) referenced with no
            // instantiation context in scope: there is no concrete type to
            // report yet, so it behaves as the universal type.
            Type::Base(BaseTypeKind::Any)
        }
    }

    /// The type denoted by `target` without recursing into its own
    /// resolution again — used only for the in-progress self-reference case,
    /// where the declaring node's own `declared_type` kind already tells us
    /// the identity we need.
    fn identity_type_for(&self, target: NamedTypeRef) -> Type {
        let Ok(named_type) = self.ast.get_as::<NamedType>(target) else { return Type::Error };
        match self.ast.get_node(named_type.declared_type) {
            Some(AnyNode::RecordType(_)) => Type::Record(named_type.declared_type),
            Some(AnyNode::Enumeration(_)) => Type::Enumeration(named_type.declared_type),
            _ => Type::Error,
        }
    }

    /// Builds the instantiated type for `template(actuals)` (spec §4.3 point
    /// 7): a fresh record (or enumeration) with every field's declared type
    /// re-resolved under `actuals` substituted for `template`'s generic
    /// parameters. Two references with the same actual types share one
    /// instantiated identity, memoized under their structural signature
    /// (spec §9).
    fn resolve_generic_instantiation(&mut self, template: NodeID, actuals: &[NodeID]) -> Type {
        let actual_types: Vec<Type> = actuals.iter().map(|&a| self.resolve_type(a, false)).collect();
        let key = actual_types.iter().map(std::string::ToString::to_string).collect::<Vec<_>>().join(",");

        if let Some(existing) = self.types.get_instantiation(template, &key) {
            return self.types.type_of(existing);
        }

        if self.generic_stack.iter().any(|(t, k)| *t == template && *k == key) {
            let name = self.ast.get_as::<NamedType>(template).map_or_else(|_| "?".to_owned(), |n| n.name.clone());
            let span = self.ast.get_node(template).map(AnyNode::span).unwrap_or_default();
            self.errors.push(SemaError::GenericCycle { name, span });
            return Type::Error;
        }

        let Ok(named_type) = self.ast.get_as::<NamedType>(template).cloned() else { return Type::Error };
        let generics = named_type.generics.clone();
        let declared_type = named_type.declared_type;

        let subst: FxHashMap<NodeID, Type> = generics.iter().copied().zip(actual_types.iter().cloned()).collect();

        self.generic_stack.push((template, key.clone()));
        let previous_subst = self.current_generic_subst.replace(subst);

        let ty = match self.ast.get_node(declared_type) {
            Some(AnyNode::RecordType(_)) => self.instantiate_record(declared_type),
            _ => self.resolve_type(declared_type, false),
        };

        self.current_generic_subst = previous_subst;
        self.generic_stack.pop();

        let identity = ty.record_target().unwrap_or(template);
        self.types.memoize_instantiation(template, key, identity);
        self.types.set_type(identity, ty.clone());
        ty
    }

    /// Allocates a fresh `RecordType` node with fresh `Field` nodes carrying
    /// each field's substituted type, and a fresh `Record` scope so
    /// `lookup_record_member` resolves member names against this
    /// instantiation specifically (spec §4.3 point 7).
    fn instantiate_record(&mut self, record_id: NodeID) -> Type {
        let Ok(record) = self.ast.get_as::<RecordType>(record_id).cloned() else { return Type::Error };

        let fresh_record_id =
            self.ast.alloc_node(AnyNode::RecordType(RecordType::new(record.base, Vec::new(), Vec::new(), NodeID::placeholder(), record.span)));

        let enclosing = self.symbols.get_node_scope(record_id).and_then(|s| self.symbols.get_scope(s)).and_then(|s| s.parent);
        let scope = self.symbols.create_scope(ScopeKind::Record, enclosing);
        self.symbols.associate_node_with_scope(fresh_record_id, scope);

        if let Some(base_id) = record.base {
            let base_ty = self.types.get_type(base_id).cloned().unwrap_or(Type::Error);
            if let Some(base_record_id) = base_ty.record_target() {
                self.wire_base_scope_to(scope, base_record_id);
            }
        }

        self.symbols.enter_scope(scope);
        let mut fresh_fields = Vec::with_capacity(record.fields.len());
        for &field_id in &record.fields {
            if let Ok(field) = self.ast.get_as::<Field>(field_id).cloned() {
                let fresh_field_id = self.ast.alloc_node(AnyNode::Field(Field {
                    id: NodeID::placeholder(),
                    parent: Some(fresh_record_id),
                    span: field.span,
                    name: field.name.clone(),
                    declared_type: field.declared_type,
                    visibility: field.visibility,
                }));
                let _ = self.symbols.declare(field.name, fresh_field_id, field.span);
                let field_ty = self.resolve_type(field.declared_type, false);
                self.types.set_type(fresh_field_id, field_ty);
                fresh_fields.push(fresh_field_id);
            }
        }
        self.symbols.exit_scope();

        for &method_id in &record.methods {
            self.resolve_procedure_signature(method_id);
        }

        if let Some(AnyNode::RecordType(mut fresh)) = self.ast.get_node(fresh_record_id).cloned() {
            fresh.fields = fresh_fields;
            fresh.methods = record.methods;
            if let Some(slot) = self.ast.get_node_mut(fresh_record_id) {
                *slot = AnyNode::RecordType(fresh);
            }
        }

        let ty = Type::Record(fresh_record_id);
        self.types.set_type(fresh_record_id, ty.clone());
        ty
    }

    /// Like [`Self::wire_base_scope`] but from an already-known scope id
    /// rather than a record node — used for a fresh instantiation's scope,
    /// which has no node association of its own until after this call.
    fn wire_base_scope_to(&mut self, scope: crate::symbol::ScopeID, base_record_id: NodeID) {
        let base_scope = self
            .symbols
            .get_node_scope(base_record_id)
            .or_else(|| self.modules.values().find_map(|table| table.get_node_scope(base_record_id)));
        if let Some(base_scope) = base_scope {
            self.symbols.set_base_scope(scope, base_scope);
        }
    }

    fn resolve_identifier(&self, node_id: NodeID) -> Option<NodeID> {
        match self.ast.get_node(node_id)?.clone() {
            AnyNode::IdentLeafExpr(leaf) => {
                let scope = self.symbols.enclosing_scope(self.ast, node_id);
                self.symbols.lookup_from(scope, &leaf.name)
            }
            AnyNode::IdentSelExpr(sel) => {
                let import_id = self.resolve_identifier(sel.base)?;
                let import = self.ast.get_as::<Import>(import_id).ok()?;
                let module_id = import.target?;
                let table = self.modules.get(&module_id)?;
                let module_scope = table.module_scope()?;
                table.lookup_from(module_scope, &sel.name)
            }
            _ => None,
        }
    }

    fn identifier_name(&self, node_id: NodeID) -> String {
        match self.ast.get_node(node_id) {
            Some(AnyNode::IdentLeafExpr(leaf)) => leaf.name.clone(),
            Some(AnyNode::IdentSelExpr(sel)) => sel.name.clone(),
            _ => "?".to_owned(),
        }
    }

    fn mark_self_ref(&mut self, quali_type_id: NodeID) {
        if let Some(AnyNode::QualiType(mut q)) = self.ast.get_node(quali_type_id).cloned() {
            q.self_ref = true;
            if let Some(slot) = self.ast.get_node_mut(quali_type_id) {
                *slot = AnyNode::QualiType(q);
            }
        }
    }
}

/// Alias documenting that `identity_type_for`'s argument is always a
/// `NamedType` node, never a bare record.
type NamedTypeRef = NodeID;
