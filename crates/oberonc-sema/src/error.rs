//! Semantic error types and reporting.
//!
//! Every variant corresponds to one of the stable kind-codes named throughout
//! spec §4 (`module-cycle`, `duplicate-name`, ...); [`SemaError::code`] returns
//! that string so the diagnostic sink can key off it without re-deriving it
//! from the `Display` message.

use oberonc_ast::nodes::NodeID;
use oberonc_source::types::Span;
use thiserror::Error;

use crate::types::Type;

/// Semantic analysis errors produced by the four passes and the validator.
#[derive(Debug, Error, Clone)]
pub enum SemaError {
    #[error("import cycle involving module '{module}'")]
    ModuleCycle { module: String, span: Span },

    #[error("generic instantiation cycle involving '{name}'")]
    GenericCycle { name: String, span: Span },

    #[error("duplicate name '{name}'")]
    DuplicateName { name: String, original: NodeID, span: Span },

    #[error("'{name}' is read-only and cannot be assigned from outside its module")]
    ReadonlyViolation { name: String, span: Span },

    #[error("POINTER TO target must be a record or array type")]
    PointerBaseIllegal { span: Span },

    #[error("illegal self-reference in type '{name}'")]
    IllegalSelfRef { name: String, span: Span },

    #[error("array length must be a compile-time constant >= 1")]
    ArrayLengthError { span: Span },

    #[error("extension chain for '{name}' exceeds the maximum depth")]
    ExtensionTooDeep { name: String, span: Span },

    #[error("unresolved identifier '{name}'")]
    UnresolvedIdent { name: String, span: Span },

    #[error("invalid type guard: '{guard}' is not an extension of '{base}'")]
    InvalidGuard { guard: String, base: String, span: Span },

    #[error("type mismatch: expected {expected}, found {found}")]
    AssignIncompatible { expected: Box<Type>, found: Box<Type>, span: Span },

    #[error("RANGE expression is only legal inside a set literal or CASE label list")]
    RangeMisuse { span: Span },

    #[error("EXIT outside LOOP")]
    ExitOutsideLoop { span: Span },

    #[error("method override of '{name}' does not match the overridden signature")]
    OverrideSignatureMismatch { name: String, span: Span },

    #[error("method override of '{name}' narrows visibility")]
    OverrideVisibilityNarrow { name: String, span: Span },

    #[error("CASE label overlaps a previous label")]
    CaseLabelOverlap { span: Span },

    #[error("import of '{module}' is broken: the module has errors")]
    ImportBroken { module: String, span: Span },

    #[error("FOR loop step must not be zero")]
    ForStepZero { span: Span },

    #[error("procedure '{name}' does not return a value on all paths")]
    MissingReturn { name: String, span: Span },

    #[error("duplicate module path '{path}'")]
    DuplicatePath { path: String },

    #[error("parse error: {message}")]
    ParseError { message: String, span: Span },

    #[error("'{name}' is not declared in this scope chain (internal: no active scope)")]
    NoActiveScope { name: String },

    #[error("argument to a VAR or CONST-ref parameter must be an lvalue")]
    VarArgNotLvalue { span: Span },

    #[error("'{name}' is a CONST-ref parameter and cannot be assigned to")]
    ConstRefWrite { name: String, span: Span },
}

impl SemaError {
    /// The stable kind-code spec §7 refers errors by.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ModuleCycle { .. } => "module-cycle",
            Self::GenericCycle { .. } => "generic-cycle",
            Self::DuplicateName { .. } => "duplicate-name",
            Self::ReadonlyViolation { .. } => "readonly-violation",
            Self::PointerBaseIllegal { .. } => "pointer-base-illegal",
            Self::IllegalSelfRef { .. } => "illegal-self-ref",
            Self::ArrayLengthError { .. } => "array-length-error",
            Self::ExtensionTooDeep { .. } => "extension-too-deep",
            Self::UnresolvedIdent { .. } => "unresolved-ident",
            Self::InvalidGuard { .. } => "invalid-guard",
            Self::AssignIncompatible { .. } => "assign-incompatible",
            Self::RangeMisuse { .. } => "range-misuse",
            Self::ExitOutsideLoop { .. } => "exit-outside-loop",
            Self::OverrideSignatureMismatch { .. } => "override-signature-mismatch",
            Self::OverrideVisibilityNarrow { .. } => "override-visibility-narrow",
            Self::CaseLabelOverlap { .. } => "case-label-overlap",
            Self::ImportBroken { .. } => "import-broken",
            Self::ForStepZero { .. } => "for-step-zero",
            Self::MissingReturn { .. } => "missing-return",
            Self::DuplicatePath { .. } => "duplicate-path",
            Self::ParseError { .. } => "parse-error",
            Self::NoActiveScope { .. } => "no-active-scope",
            Self::VarArgNotLvalue { .. } => "var-arg-not-lvalue",
            Self::ConstRefWrite { .. } => "const-ref-write",
        }
    }

    /// The location to report, if this error carries one.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::ModuleCycle { span, .. }
            | Self::GenericCycle { span, .. }
            | Self::DuplicateName { span, .. }
            | Self::ReadonlyViolation { span, .. }
            | Self::PointerBaseIllegal { span }
            | Self::IllegalSelfRef { span, .. }
            | Self::ArrayLengthError { span }
            | Self::ExtensionTooDeep { span, .. }
            | Self::UnresolvedIdent { span, .. }
            | Self::InvalidGuard { span, .. }
            | Self::AssignIncompatible { span, .. }
            | Self::RangeMisuse { span }
            | Self::ExitOutsideLoop { span }
            | Self::OverrideSignatureMismatch { span, .. }
            | Self::OverrideVisibilityNarrow { span, .. }
            | Self::CaseLabelOverlap { span }
            | Self::ImportBroken { span, .. }
            | Self::ForStepZero { span }
            | Self::MissingReturn { span, .. }
            | Self::ParseError { span, .. }
            | Self::VarArgNotLvalue { span }
            | Self::ConstRefWrite { span, .. } => Some(*span),
            Self::DuplicatePath { .. } | Self::NoActiveScope { .. } => None,
        }
    }

    /// Whether this error is fatal for the whole module (spec §7: structural
    /// errors mark the module `has-errors` and poison importers), as opposed
    /// to a local error recovered via the `Type::Error` sentinel.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::ModuleCycle { .. }
                | Self::GenericCycle { .. }
                | Self::PointerBaseIllegal { .. }
                | Self::IllegalSelfRef { .. }
                | Self::ImportBroken { .. }
        )
    }
}
