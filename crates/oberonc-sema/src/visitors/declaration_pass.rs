//! Declaration pass: introduces named entities into their enclosing scope,
//! building the lexical-scope tree (spec §4.1 component 4).

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{
    AnyNode,
    BuiltIn,
    Const,
    Enumeration,
    Field,
    GenericName,
    Import,
    Module,
    NamedType,
    NodeID,
    Parameter,
    Procedure,
    RecordType,
    Variable,
};

use crate::error::SemaError;
use crate::symbol::{ScopeID, ScopeKind, SymbolTable};

/// Walks a module's declarations and builds its scope tree, without yet
/// resolving any type expression or identifier use — that is the Type
/// Resolver's and Checker's job.
#[derive(Debug)]
pub struct DeclarationPassVisitor<'ast> {
    ast: &'ast AST,
    symbols: SymbolTable,
    errors: Vec<SemaError>,
}

impl<'ast> DeclarationPassVisitor<'ast> {
    #[must_use]
    pub fn new(ast: &'ast AST) -> Self { Self { ast, symbols: SymbolTable::new(), errors: Vec::new() } }

    /// Runs the pass over `module_id`, returning the populated symbol table.
    ///
    /// ## Errors
    ///
    /// Returns collected [`SemaError`]s (primarily `duplicate-name`) if any
    /// were found while declaring entities.
    pub fn run(mut self, module_id: NodeID) -> Result<SymbolTable, Vec<SemaError>> {
        self.visit_module(module_id);
        if self.errors.is_empty() { Ok(self.symbols) } else { Err(self.errors) }
    }

    fn declare(&mut self, name: &str, node: NodeID) {
        let span = self.ast.get_node(node).map(oberonc_ast::nodes::ASTNode::span).unwrap_or_default();
        if let Err(err) = self.symbols.declare(name.to_owned(), node, span) {
            self.errors.push(err);
        }
    }

    fn enter(&mut self, kind: ScopeKind) -> ScopeID {
        let parent = self.symbols.current_scope();
        let scope_id = self.symbols.create_scope(kind, parent);
        self.symbols.enter_scope(scope_id);
        scope_id
    }

    fn exit(&mut self) { let _ = self.symbols.exit_scope(); }

    fn visit_module(&mut self, module_id: NodeID) {
        let Ok(module) = self.ast.get_as::<Module>(module_id) else { return };
        let imports = module.imports.clone();
        let decls = module.decls.clone();

        for import_id in imports {
            self.visit_import(import_id);
        }
        for decl_id in decls {
            self.visit_decl(decl_id);
        }
    }

    fn visit_import(&mut self, import_id: NodeID) {
        if let Ok(import) = self.ast.get_as::<Import>(import_id) {
            let alias = import.alias.clone();
            self.declare(&alias, import_id);
        }
    }

    fn visit_decl(&mut self, decl_id: NodeID) {
        let Some(node) = self.ast.get_node(decl_id) else { return };
        match node {
            AnyNode::Const(_) => self.visit_const(decl_id),
            AnyNode::NamedType(_) => self.visit_named_type(decl_id),
            AnyNode::Variable(_) => self.visit_variable(decl_id),
            AnyNode::Procedure(_) => self.visit_procedure(decl_id),
            AnyNode::BuiltIn(_) => self.visit_builtin(decl_id),
            _ => {}
        }
    }

    fn visit_const(&mut self, const_id: NodeID) {
        if let Ok(c) = self.ast.get_as::<Const>(const_id) {
            let name = c.name.clone();
            self.declare(&name, const_id);
        }
    }

    fn visit_variable(&mut self, var_id: NodeID) {
        if let Ok(v) = self.ast.get_as::<Variable>(var_id) {
            let name = v.name.clone();
            self.declare(&name, var_id);
        }
    }

    fn visit_builtin(&mut self, builtin_id: NodeID) {
        if let Ok(b) = self.ast.get_as::<BuiltIn>(builtin_id) {
            let name = b.name.clone();
            self.declare(&name, builtin_id);
        }
    }

    /// Declares the type name, then its scope: generic parameters always,
    /// and — if the declared type is a `RecordType` or `Enumeration` — the
    /// members of that type too.
    fn visit_named_type(&mut self, named_type_id: NodeID) {
        let Ok(named_type) = self.ast.get_as::<NamedType>(named_type_id) else { return };
        let name = named_type.name.clone();
        let generics = named_type.generics.clone();
        let declared_type = named_type.declared_type;
        self.declare(&name, named_type_id);

        let has_generics = !generics.is_empty();
        if has_generics {
            let scope = self.enter(ScopeKind::NamedType);
            self.symbols.associate_node_with_scope(named_type_id, scope);
            for generic_id in generics {
                if let Ok(g) = self.ast.get_as::<GenericName>(generic_id) {
                    let gname = g.name.clone();
                    self.declare(&gname, generic_id);
                }
            }
        }

        // The generics scope (if any) stays on the stack across this dispatch so
        // a record's member scope, created below, chains to it as its parent —
        // exiting first would strand a field's `T` reference with no path back
        // to where `T` is declared.
        match self.ast.get_node(declared_type) {
            Some(AnyNode::RecordType(_)) => self.visit_record_type(declared_type),
            Some(AnyNode::Enumeration(_)) => self.visit_enumeration(declared_type, named_type_id),
            _ => {}
        }

        if has_generics {
            self.exit();
        }
    }

    /// Each enumeration constant is declared in the scope enclosing the
    /// `NamedType` itself (they behave as ordinary module-level constants,
    /// not as members of the type's own namespace).
    fn visit_enumeration(&mut self, enum_id: NodeID, _owning_named_type: NodeID) {
        let Ok(e) = self.ast.get_as::<Enumeration>(enum_id) else { return };
        let consts = e.consts.clone();
        for const_id in consts {
            self.visit_const(const_id);
        }
    }

    fn visit_record_type(&mut self, record_id: NodeID) {
        let Ok(record) = self.ast.get_as::<RecordType>(record_id) else { return };
        let fields = record.fields.clone();
        let methods = record.methods.clone();
        // Methods' own scopes enclose from the record's *declaring* scope, not
        // from the record's member namespace — a method body only sees its
        // receiver's fields through `self.field`, never unqualified (spec
        // §4.2 only grants qualified access `m.x` a path to another
        // namespace; field access an implicit unqualified fallback is not
        // one of the rules it lists).
        let declaring_scope = self.symbols.current_scope();

        let scope = self.enter(ScopeKind::Record);
        self.symbols.associate_node_with_scope(record_id, scope);

        for field_id in fields {
            if let Ok(f) = self.ast.get_as::<Field>(field_id) {
                let name = f.name.clone();
                self.declare(&name, field_id);
            }
        }
        for method_id in methods {
            if let Ok(m) = self.ast.get_as::<Procedure>(method_id) {
                let name = m.name.clone();
                self.declare(&name, method_id);
            }
            self.visit_procedure_scope(method_id, declaring_scope);
        }

        self.exit();
    }

    fn visit_procedure(&mut self, proc_id: NodeID) {
        if let Ok(p) = self.ast.get_as::<Procedure>(proc_id) {
            let name = p.name.clone();
            self.declare(&name, proc_id);
        }
        let parent = self.symbols.current_scope();
        self.visit_procedure_scope(proc_id, parent);
    }

    /// Builds a `Procedure`'s own scope (receiver, parameters, locals) under
    /// `parent`, without re-declaring the procedure's own name — callers
    /// that already declared it (a module-level `Procedure`, or a method
    /// already declared by its enclosing `Record`) invoke this directly.
    fn visit_procedure_scope(&mut self, proc_id: NodeID, parent: Option<ScopeID>) {
        let Ok(proc) = self.ast.get_as::<Procedure>(proc_id) else { return };
        let receiver = proc.receiver;
        let proc_type = proc.proc_type;
        let locals = proc.locals.clone();

        let scope = self.symbols.create_scope(ScopeKind::Procedure, parent);
        self.symbols.enter_scope(scope);
        self.symbols.associate_node_with_scope(proc_id, scope);

        if let Some(receiver_id) = receiver
            && let Ok(r) = self.ast.get_as::<Parameter>(receiver_id)
        {
            let name = r.name.clone();
            self.declare(&name, receiver_id);
        }

        if let Some(AnyNode::ProcType(proc_type_node)) = self.ast.get_node(proc_type) {
            let formals = proc_type_node.formals.clone();
            for formal_id in formals {
                if let Ok(f) = self.ast.get_as::<Parameter>(formal_id) {
                    let name = f.name.clone();
                    self.declare(&name, formal_id);
                }
            }
        }

        for local_id in locals {
            if let Ok(l) = self.ast.get_as::<oberonc_ast::nodes::LocalVar>(local_id) {
                let name = l.name.clone();
                self.declare(&name, local_id);
            }
        }

        self.exit();
    }
}
