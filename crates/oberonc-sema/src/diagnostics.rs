//! Diagnostic reporting (spec §6): each diagnostic is a (severity, kind-code,
//! location, message) tuple handed to a host-provided sink.
//!
//! [`oberonc_source::types::Span`] carries only byte offsets; resolving a
//! diagnostic's file/row/column is the driver's job (spec §6: "location" is
//! meaningful only once the driver maps the owning module's source text),
//! not this crate's.

use oberonc_source::types::Span;

use crate::analysis::{DeadCodeWarning, WarningSeverity};
use crate::error::SemaError;

/// Severity of a single diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

impl DiagnosticLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// One reportable diagnostic: a kind-code (spec §7's stable strings, e.g.
/// `module-cycle`), a severity, a span, and the printable message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: &'static str,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    #[must_use]
    pub const fn new(level: DiagnosticLevel, code: &'static str, message: String, span: Span) -> Self {
        Self { level, code, message, span }
    }
}

impl From<&SemaError> for Diagnostic {
    fn from(err: &SemaError) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code: err.code(),
            message: err.to_string(),
            span: err.span().unwrap_or_default(),
        }
    }
}

impl From<&DeadCodeWarning> for Diagnostic {
    fn from(warning: &DeadCodeWarning) -> Self {
        let level = match warning.severity {
            WarningSeverity::Warning => DiagnosticLevel::Warning,
            // Info-level dead-code findings (e.g. unused imports) are still
            // surfaced as warnings; spec §6 only names `error`/`warning`.
            WarningSeverity::Info => DiagnosticLevel::Warning,
        };
        Self { level, code: "dead-code", message: warning.message.clone(), span: warning.span }
    }
}

/// Receives diagnostics as they're produced. The host implements this to
/// route diagnostics into its own reporting (spec §6: "emitted through a
/// host-provided sink").
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// A sink that just collects diagnostics in memory, in whatever order
/// [`DiagnosticSink::report`] is called — `oberonc-driver`'s `report_to`
/// sorts by `(file, row, column, insertion)` before feeding a sink (spec §6),
/// so diagnostics reach this sink already in that order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self { Self { diagnostics: Vec::new() } }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> { self.diagnostics }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) { self.diagnostics.push(diagnostic); }
}
