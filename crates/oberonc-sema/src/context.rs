//! Semantic analysis context: orchestrates the module graph builder and the
//! four per-module passes over a whole compilation (spec §5's ordering
//! guarantee — reverse topological import order; inside a module,
//! declaration pass, then type resolver, then checker, then validator).

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{AnyNode, Module, NodeID};
use rustc_hash::FxHashMap;

use crate::analysis::DeadCodeWarning;
use crate::error::SemaError;
use crate::module_graph::ModuleGraph;
use crate::symbol::SymbolTable;
use crate::types::TypeEnvironment;
use crate::visitors::{Checker, DeclarationPassVisitor, TypeResolver, Validator};

/// Diagnostics and state accumulated across every module of one compilation.
#[derive(Debug)]
pub struct SemaContext {
    symbols: FxHashMap<NodeID, SymbolTable>,
    types: TypeEnvironment,
    errors: Vec<SemaError>,
    /// The module each entry in `errors` was recorded against, same length
    /// and index alignment as `errors` — lets a diagnostic be sorted by its
    /// owning source file without `SemaError` itself carrying a `NodeID`.
    error_modules: Vec<NodeID>,
    warnings: Vec<DeadCodeWarning>,
    warning_modules: Vec<NodeID>,
}

impl SemaContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            symbols: FxHashMap::default(),
            types: TypeEnvironment::new(),
            errors: Vec::new(),
            error_modules: Vec::new(),
            warnings: Vec::new(),
            warning_modules: Vec::new(),
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[SemaError] { &self.errors }

    /// The owning module of each entry in [`Self::errors`], index-aligned.
    #[must_use]
    pub fn error_modules(&self) -> &[NodeID] { &self.error_modules }

    #[must_use]
    pub fn warnings(&self) -> &[DeadCodeWarning] { &self.warnings }

    /// The owning module of each entry in [`Self::warnings`], index-aligned.
    #[must_use]
    pub fn warning_modules(&self) -> &[NodeID] { &self.warning_modules }

    #[must_use]
    pub fn type_environment(&self) -> &TypeEnvironment { &self.types }

    #[must_use]
    pub fn symbol_table(&self, module_id: NodeID) -> Option<&SymbolTable> { self.symbols.get(&module_id) }

    /// Builds the import graph over `modules_by_path` and runs all four
    /// passes over every module in reverse topological order.
    ///
    /// ## Errors
    ///
    /// Returns the module graph's own errors (import cycles, broken imports)
    /// without running any pass if the graph itself cannot be built. Errors
    /// found while analyzing individual modules are instead collected into
    /// [`Self::errors`] and do not stop analysis of the remaining modules
    /// (spec §7: "no error short-circuits the pass").
    pub fn analyze(&mut self, ast: &mut AST, modules_by_path: &FxHashMap<String, NodeID>) -> Result<Vec<NodeID>, Vec<SemaError>> {
        let graph = ModuleGraph::build(ast, modules_by_path)?;
        let order = graph.reverse_topological_order(ast).map_err(|e| vec![e])?;

        for &module_id in &order {
            self.analyze_module(ast, module_id);
        }

        Ok(order)
    }

    fn analyze_module(&mut self, ast: &mut AST, module_id: NodeID) {
        if self.has_broken_import(ast, module_id) {
            self.mark_has_errors(ast, module_id);
            return;
        }

        let symbols = match DeclarationPassVisitor::new(ast).run(module_id) {
            Ok(symbols) => symbols,
            Err(errs) => {
                self.record(ast, module_id, errs);
                return;
            }
        };
        self.symbols.insert(module_id, symbols);

        let Some(mut own_symbols) = self.symbols.remove(&module_id) else { return };

        let resolve_result = TypeResolver::new(ast, &self.symbols, &mut own_symbols, &mut self.types).run(module_id);
        if let Err(errs) = resolve_result {
            let structural = errs.iter().any(SemaError::is_structural);
            self.symbols.insert(module_id, own_symbols);
            self.record(ast, module_id, errs);
            if structural {
                return;
            }
            let Some(resumed) = self.symbols.remove(&module_id) else { return };
            own_symbols = resumed;
        }

        let check_result = Checker::new(ast, &self.symbols, &mut own_symbols, &mut self.types).run(module_id);
        self.symbols.insert(module_id, own_symbols);
        if let Err(errs) = check_result {
            self.record(ast, module_id, errs);
        }

        let (validator_errors, validator_warnings) = Validator::new(ast, &self.types).run(module_id);
        self.warning_modules.extend(std::iter::repeat(module_id).take(validator_warnings.len()));
        self.warnings.extend(validator_warnings);
        if !validator_errors.is_empty() {
            // Validator errors are non-fatal but still mark the module
            // has-errors (spec §7), unlike the checker's locally-recovered
            // type errors above.
            self.mark_has_errors(ast, module_id);
            self.record(ast, module_id, validator_errors);
        }
    }

    fn has_broken_import(&self, ast: &AST, module_id: NodeID) -> bool {
        let Ok(module) = ast.get_as::<Module>(module_id) else { return false };
        module.imports.iter().any(|&import_id| match ast.get_node(import_id) {
            Some(AnyNode::Import(import)) => import.target.and_then(|t| ast.get_as::<Module>(t).ok()).is_none_or(|m| m.has_errors),
            _ => false,
        })
    }

    fn record(&mut self, ast: &mut AST, module_id: NodeID, errs: Vec<SemaError>) {
        let structural = errs.iter().any(SemaError::is_structural);
        self.error_modules.extend(std::iter::repeat(module_id).take(errs.len()));
        self.errors.extend(errs);
        if structural {
            self.mark_has_errors(ast, module_id);
        }
    }

    /// Spec §7: structural and validator errors mark the module `has-errors`
    /// so importers see `import-broken` rather than trusting a half-resolved
    /// graph.
    fn mark_has_errors(&self, ast: &mut AST, module_id: NodeID) {
        if let Some(AnyNode::Module(mut module)) = ast.get_node(module_id).cloned() {
            module.has_errors = true;
            if let Some(slot) = ast.get_node_mut(module_id) {
                *slot = AnyNode::Module(module);
            }
        }
    }
}

impl Default for SemaContext {
    fn default() -> Self { Self::new() }
}
