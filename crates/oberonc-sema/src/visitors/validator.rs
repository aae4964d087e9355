//! Last-pass cross-cutting checks that need a whole procedure or a whole
//! module in view, rather than one expression or statement at a time
//! (spec §4.5). Everything method-override and CASE-label related is
//! already enforced by [`super::Checker`]; the validator covers what's left:
//! definite return and import liveness.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{AnyNode, Module, NamedType, Procedure};

use crate::analysis::{ControlFlowGraph, DeadCodeDetector, DeadCodeWarning};
use crate::error::SemaError;
use crate::types::{Type, TypeEnvironment};

/// Runs the whole-module checks that only make sense after the checker has
/// resolved every expression's type.
pub struct Validator<'a> {
    ast: &'a AST,
    types: &'a TypeEnvironment,
    errors: Vec<SemaError>,
    warnings: Vec<DeadCodeWarning>,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub const fn new(ast: &'a AST, types: &'a TypeEnvironment) -> Self {
        Self { ast, types, errors: Vec::new(), warnings: Vec::new() }
    }

    /// Runs every validator check over one module, returning the errors and
    /// dead-code warnings collected.
    pub fn run(mut self, module_id: oberonc_ast::nodes::NodeID) -> (Vec<SemaError>, Vec<DeadCodeWarning>) {
        let Ok(module) = self.ast.get_as::<Module>(module_id).cloned() else {
            return (self.errors, self.warnings);
        };

        for proc_id in collect_procedures(self.ast, &module) {
            self.check_definite_return(proc_id);
        }

        let mut detector = DeadCodeDetector::new(self.ast);
        detector.detect_unused_imports(&module);
        self.warnings.extend(detector.into_warnings());

        (self.errors, self.warnings)
    }

    /// Spec §4.5: "every value-returning procedure must end with a `Return`
    /// on all paths". Procedures with no declared return type are exempt:
    /// falling off the end is just `RETURN` with no value.
    fn check_definite_return(&mut self, proc_id: oberonc_ast::nodes::NodeID) {
        let Ok(proc) = self.ast.get_as::<Procedure>(proc_id) else { return };

        let has_return_type = matches!(self.types.type_of(proc_id), Type::Proc { return_type: Some(_), .. });
        if !has_return_type {
            return;
        }

        let cfg = ControlFlowGraph::build_from_procedure(self.ast, proc_id);
        if !cfg.all_paths_reach_exit() {
            self.errors.push(SemaError::MissingReturn { name: proc.name.clone(), span: proc.span });
        }
    }
}

/// Every `Procedure` in a module: top-level declarations plus the methods
/// bound to each record type declared in the module.
fn collect_procedures(ast: &AST, module: &Module) -> Vec<oberonc_ast::nodes::NodeID> {
    let mut procs = Vec::new();
    for &decl_id in &module.decls {
        match ast.get_node(decl_id) {
            Some(AnyNode::Procedure(_)) => procs.push(decl_id),
            Some(AnyNode::NamedType(_)) => {
                let Ok(named) = ast.get_as::<NamedType>(decl_id) else { continue };
                if let Some(AnyNode::RecordType(rec)) = ast.get_node(named.declared_type) {
                    procs.extend(rec.methods.iter().copied());
                }
            }
            _ => {}
        }
    }
    procs
}
