//! Unreachable-statement and unused-import detection.
//!
//! These are advisory (spec §4.5 calls them warnings, not errors): a module
//! with dead code or an unused import still compiles.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::{AnyNode, ASTNode, IdentLeafExpr, IdentSelExpr, Import, Module, NodeID};
use oberonc_source::types::Span;
use rustc_hash::FxHashSet;

use super::control_flow::ControlFlowGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
}

#[derive(Debug, Clone)]
pub struct DeadCodeWarning {
    pub message: String,
    pub span: Span,
    pub severity: WarningSeverity,
}

/// Walks a procedure's control flow graph and a module's import list looking
/// for statements with no reaching path and imports nothing ever references.
pub struct DeadCodeDetector<'a> {
    ast: &'a AST,
    warnings: Vec<DeadCodeWarning>,
}

impl<'a> DeadCodeDetector<'a> {
    #[must_use]
    pub const fn new(ast: &'a AST) -> Self { Self { ast, warnings: Vec::new() } }

    #[must_use]
    pub fn into_warnings(self) -> Vec<DeadCodeWarning> { self.warnings }

    /// Flags statements in blocks the CFG never reaches from the entry block.
    pub fn detect_unreachable(&mut self, cfg: &mut ControlFlowGraph) {
        let reachable = cfg.compute_reachable().clone();
        for block in cfg.blocks() {
            if reachable.contains(&block.id) {
                continue;
            }
            for &stmt_id in &block.statements {
                let Some(node) = self.ast.get_node(stmt_id) else { continue };
                self.warnings.push(DeadCodeWarning {
                    message: "statement is unreachable".to_string(),
                    span: node.span(),
                    severity: WarningSeverity::Warning,
                });
            }
        }
    }

    /// Flags imports whose alias is never referenced as a qualifier or
    /// standalone identifier anywhere in the module's declarations or body.
    pub fn detect_unused_imports(&mut self, module: &Module) {
        let mut used: FxHashSet<String> = FxHashSet::default();
        for &decl in &module.decls {
            self.collect_idents(decl, &mut used);
        }
        for &stmt in &module.body {
            self.collect_idents(stmt, &mut used);
        }

        for &import_id in &module.imports {
            let Ok(import) = self.ast.get_as::<Import>(import_id) else { continue };
            let name = import.alias.clone();
            if !used.contains(&name) {
                self.warnings.push(DeadCodeWarning {
                    message: format!("import `{name}` is never used"),
                    span: import.span,
                    severity: WarningSeverity::Info,
                });
            }
        }
    }

    fn collect_idents(&self, node_id: NodeID, used: &mut FxHashSet<String>) {
        let Some(node) = self.ast.get_node(node_id) else { return };
        match node {
            AnyNode::IdentLeafExpr(IdentLeafExpr { name, .. }) => {
                used.insert(name.clone());
            }
            AnyNode::IdentSelExpr(IdentSelExpr { base, .. }) => {
                self.collect_idents(*base, used);
                return;
            }
            _ => {}
        }
        for child in node.children() {
            self.collect_idents(child, used);
        }
    }
}
