//! [`OberonCore`]: the host-facing facade over the module graph builder and
//! the four semantic passes (spec §6's "Core API exposed to host").

use log::{debug, info};
use oberonc_ast::ast::AST;
use oberonc_ast::nodes::NodeID;
use oberonc_sema::diagnostics::{CollectingSink, Diagnostic, DiagnosticSink};
use oberonc_sema::error::SemaError;
use oberonc_sema::SemaContext;
use oberonc_source::types::{FileID, SourceManager};
use rustc_hash::FxHashMap;

use crate::parser::Parser;

/// `(owning file, line, column)` — diagnostics with no resolvable position
/// sort first via `None`/`0`, ahead of any resolved one.
type SortKey = (Option<FileID>, usize, usize);

/// Owns the shared AST arena, the source registry, and the accumulated
/// semantic state across repeated `addFile`/`parseFiles` calls.
pub struct OberonCore<P: Parser> {
    parser: P,
    ast: AST,
    sources: SourceManager,
    modules_by_path: FxHashMap<String, NodeID>,
    file_ids: FxHashMap<NodeID, FileID>,
    sema: SemaContext,
    last_order: Vec<NodeID>,
}

impl<P: Parser> OberonCore<P> {
    #[must_use]
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            ast: AST::new(),
            sources: SourceManager::new(),
            modules_by_path: FxHashMap::default(),
            file_ids: FxHashMap::default(),
            sema: SemaContext::new(),
            last_order: Vec::new(),
        }
    }

    /// Registers a user module's source (spec §6 `addFile`).
    ///
    /// ## Errors
    ///
    /// Returns [`SemaError::DuplicatePath`] if `path` was already registered,
    /// or [`SemaError::ParseError`] if the parser rejects `bytes`.
    pub fn add_file(&mut self, path: &str, bytes: &[u8]) -> Result<(), SemaError> {
        self.register(path, bytes)
    }

    /// Registers a preload (definition-only) library's source (spec §6
    /// `addPreload`). Shares the same path namespace as `addFile` — the
    /// module graph builder does not distinguish the two.
    ///
    /// ## Errors
    ///
    /// Returns [`SemaError::ParseError`] if the parser rejects `bytes`, or
    /// [`SemaError::DuplicatePath`] if `name` collides with an already
    /// registered module.
    pub fn add_preload(&mut self, name: &str, bytes: &[u8]) -> Result<(), SemaError> {
        self.register(name, bytes)
    }

    fn register(&mut self, path: &str, bytes: &[u8]) -> Result<(), SemaError> {
        if self.modules_by_path.contains_key(path) {
            return Err(SemaError::DuplicatePath { path: path.to_string() });
        }

        let module_id = self.parser.parse(&mut self.ast, bytes, path)?;
        let text = String::from_utf8_lossy(bytes).into_owned();
        let file_id = self.sources.add_file(path.to_string(), text);

        self.modules_by_path.insert(path.to_string(), module_id);
        self.file_ids.insert(module_id, file_id);
        debug!("registered module '{path}'");
        Ok(())
    }

    /// Builds the module graph over every registered module and runs the
    /// four semantic passes in reverse topological order (spec §6
    /// `parseFiles`). `paths` names the modules the host actually wants
    /// compiled; every module reachable from the full registry is still
    /// analyzed, since `ModuleGraph` spans the whole registry rather than
    /// a per-call subset.
    ///
    /// ## Errors
    ///
    /// Returns [`SemaError::ImportBroken`] for any requested path never
    /// registered via `add_file`/`add_preload`, or the module graph's own
    /// errors (import cycles) if the graph cannot be built at all.
    pub fn parse_files(&mut self, paths: &[String]) -> Result<Vec<NodeID>, Vec<SemaError>> {
        for path in paths {
            if !self.modules_by_path.contains_key(path) {
                return Err(vec![SemaError::ImportBroken { module: path.clone(), span: oberonc_source::types::Span::default() }]);
            }
        }

        info!("parsing {} requested module(s)", paths.len());
        let order = self.sema.analyze(&mut self.ast, &self.modules_by_path)?;
        self.last_order = order.clone();
        Ok(order)
    }

    /// The module order from the last successful `parseFiles` call (spec §6
    /// `getModules`).
    #[must_use]
    pub fn get_modules(&self) -> &[NodeID] { &self.last_order }

    /// Drops every registered module, source, and accumulated semantic
    /// state, as if this `OberonCore` were freshly constructed (spec §6
    /// `clear`).
    pub fn clear(&mut self) {
        self.ast = AST::new();
        self.sources.clear();
        self.modules_by_path.clear();
        self.file_ids.clear();
        self.sema = SemaContext::new();
        self.last_order.clear();
    }

    #[must_use]
    pub const fn ast(&self) -> &AST { &self.ast }

    #[must_use]
    pub const fn sema(&self) -> &SemaContext { &self.sema }

    #[must_use]
    pub fn module_id(&self, path: &str) -> Option<NodeID> { self.modules_by_path.get(path).copied() }

    /// Drains the context's accumulated errors and warnings into a sink,
    /// resolving each [`oberonc_source::types::Span`] against the owning
    /// module's registered source where a `FileID` is on record, and
    /// reporting them in deterministic `(file, row, column, insertion)`
    /// order (spec §6) rather than raw pass/module insertion order.
    pub fn report_to(&self, sink: &mut impl DiagnosticSink) {
        let mut entries: Vec<(SortKey, Diagnostic)> = self
            .sema
            .errors()
            .iter()
            .zip(self.sema.error_modules())
            .map(|(err, &module_id)| (self.sort_key(module_id, err.span().unwrap_or_default()), Diagnostic::from(err)))
            .chain(
                self.sema
                    .warnings()
                    .iter()
                    .zip(self.sema.warning_modules())
                    .map(|(warning, &module_id)| (self.sort_key(module_id, warning.span), Diagnostic::from(warning))),
            )
            .collect();

        entries.sort_by_key(|(key, _)| *key);
        for (_, diagnostic) in entries {
            sink.report(diagnostic);
        }
    }

    fn sort_key(&self, module_id: NodeID, span: oberonc_source::types::Span) -> SortKey {
        let position = self.file_ids.get(&module_id).and_then(|&file_id| self.sources.position_from_offset(file_id, span.start));
        (self.file_ids.get(&module_id).copied(), position.map_or(0, |p| p.line), position.map_or(0, |p| p.column))
    }

    /// Convenience wrapper around [`Self::report_to`] using an in-memory
    /// sink, for hosts that just want the collected list.
    #[must_use]
    pub fn collect_diagnostics(&self) -> Vec<Diagnostic> {
        let mut sink = CollectingSink::new();
        self.report_to(&mut sink);
        sink.into_diagnostics()
    }
}
