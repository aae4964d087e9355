//! Module graph construction: resolves `IMPORT` clauses into a dependency
//! graph, detects cycles, and orders modules for validation.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{ASTNode, Import, Module, NodeID};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use crate::error::SemaError;

/// The import graph over a set of already-parsed modules.
///
/// One `ModuleGraph` spans a whole compilation: every `Module` node sits in
/// the same arena, and an `Import.target` is a plain cross-reference into
/// that arena rather than into a separate module-owned graph (spec §3's
/// "pointers/refs cross module boundaries").
#[derive(Debug)]
pub struct ModuleGraph {
    graph: DiGraph<NodeID, ()>,
    by_path: FxHashMap<String, NodeIndex>,
    by_node: FxHashMap<NodeID, NodeIndex>,
}

impl ModuleGraph {
    /// Builds the graph from the given root modules, resolving each
    /// `Import.path` against `modules_by_path` and setting `Import.target`
    /// on the (cloned, then reinserted) node as it goes.
    ///
    /// Preload libraries are expected to already be present in
    /// `modules_by_path` alongside user modules — the builder does not
    /// distinguish the two (spec §4.1: "the builder admits them directly
    /// without source parsing").
    ///
    /// ## Errors
    ///
    /// Returns [`SemaError::ImportBroken`] if an `IMPORT` names a path not
    /// found in `modules_by_path`.
    pub fn build(
        ast: &mut AST,
        modules_by_path: &FxHashMap<String, NodeID>,
    ) -> Result<Self, Vec<SemaError>> {
        let mut graph = DiGraph::new();
        let mut by_path = FxHashMap::default();
        let mut by_node = FxHashMap::default();

        for (path, &module_id) in modules_by_path {
            let index = graph.add_node(module_id);
            by_path.insert(path.clone(), index);
            by_node.insert(module_id, index);
        }

        let mut errors = Vec::new();

        for (path, &module_id) in modules_by_path {
            let Some(&from_index) = by_path.get(path) else { continue };
            let Some(import_ids) = ast.get_as::<Module>(module_id).ok().map(|m| m.imports.clone()) else {
                continue;
            };

            for import_id in import_ids {
                let Ok(import) = ast.get_as::<Import>(import_id) else { continue };
                let import_path = import.path.clone();
                let import_span = import.span();

                let Some(&target_index) = by_path.get(&import_path) else {
                    errors.push(SemaError::ImportBroken { module: import_path, span: import_span });
                    continue;
                };
                let target_id = graph[target_index];

                graph.add_edge(from_index, target_index, ());

                if let Some(oberonc_ast::nodes::AnyNode::Import(mut updated)) =
                    ast.get_node(import_id).cloned()
                {
                    updated.target = Some(target_id);
                    if let Some(slot) = ast.get_node_mut(import_id) {
                        *slot = oberonc_ast::nodes::AnyNode::Import(updated);
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self { graph, by_path, by_node })
    }

    /// The reverse-topological module order: imports before importers
    /// (spec §4.1, §5).
    ///
    /// ## Errors
    ///
    /// Returns [`SemaError::ModuleCycle`] naming one module on the cycle if
    /// the import graph is not a DAG.
    pub fn reverse_topological_order(&self, ast: &AST) -> Result<Vec<NodeID>, SemaError> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let node_id = self.graph[cycle.node_id()];
            let module = ast.get_as::<Module>(node_id).map_or_else(|_| "<unknown>".to_owned(), |m| m.name.clone());
            SemaError::ModuleCycle { module, span: ast.get_node(node_id).map(oberonc_ast::nodes::AnyNode::span).unwrap_or_default() }
        })?;

        Ok(sorted.into_iter().rev().map(|index| self.graph[index]).collect())
    }

    #[must_use]
    pub fn module_count(&self) -> usize { self.graph.node_count() }

    #[must_use]
    pub fn node_for_path(&self, path: &str) -> Option<NodeID> { self.by_path.get(path).map(|&idx| self.graph[idx]) }

    #[must_use]
    pub fn contains_module(&self, module_id: NodeID) -> bool { self.by_node.contains_key(&module_id) }
}
