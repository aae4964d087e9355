//! Type representation used by the resolver and checker.

use std::fmt;

use oberonc_ast::nodes::{BaseTypeKind, NodeID, ParamMode};

/// A resolved type.
///
/// `Record`/`Enumeration`/`Module` are nominal: identity is the declaring
/// (or instantiated) node's [`NodeID`], never a structural comparison — two
/// `RECORD` declarations with identical fields are still distinct types.
/// Everything else is structural.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// One of the primitive kinds (`INTEGER`, `BOOLEAN`, ...).
    Base(BaseTypeKind),
    /// `POINTER TO target`.
    Pointer(Box<Type>),
    /// A fixed-length (`Some(n)`) or open (`None`) array of `elem`.
    Array { length: Option<u64>, elem: Box<Type> },
    /// A record type, identified by its declaring (or instantiated) node.
    Record(NodeID),
    /// A procedure/method signature. `param_modes` is index-aligned with
    /// `params` (spec §4.4.2: `VAR`/`CONST`-ref parameter rules need each
    /// parameter's passing mode, not just its type).
    Proc { params: Vec<Type>, param_modes: Vec<ParamMode>, return_type: Option<Box<Type>> },
    /// An enumeration, identified by its declaring node.
    Enumeration(NodeID),
    /// The pseudo-type of a resolved `Import` — only legal as the left side
    /// of an `IdentSelExpr`.
    ModuleRef(NodeID),
    /// `SET`.
    Set,
    /// The untyped literal `NIL`, assignable to any pointer/procedure type.
    Nil,
    /// Sentinel for a node whose type could not be determined; checking
    /// continues past it so multiple diagnostics surface in one pass (spec
    /// §7's "local errors are recovered locally").
    Error,
}

impl Type {
    /// Position in the numeric promotion order, if this is a numeric base type.
    #[must_use]
    pub const fn numeric_rank(&self) -> Option<u8> {
        match self {
            Self::Base(kind) => kind.numeric_rank(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool { self.numeric_rank().is_some() }

    #[must_use]
    pub const fn is_integer(&self) -> bool { matches!(self, Self::Base(kind) if kind.is_integer()) }

    #[must_use]
    pub const fn is_real(&self) -> bool { matches!(self, Self::Base(kind) if kind.is_real()) }

    #[must_use]
    pub const fn is_pointer(&self) -> bool { matches!(self, Self::Pointer(_)) }

    #[must_use]
    pub const fn is_record(&self) -> bool { matches!(self, Self::Record(_)) }

    #[must_use]
    pub const fn is_error(&self) -> bool { matches!(self, Self::Error) }

    /// The record this type denotes, looking through one `Pointer` indirection
    /// (spec §4.4.1's "record member access through a pointer is implicit
    /// dereference").
    #[must_use]
    pub fn record_target(&self) -> Option<NodeID> {
        match self {
            Self::Record(id) => Some(*id),
            Self::Pointer(inner) => inner.record_target(),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(kind) => write!(f, "{kind}"),
            Self::Pointer(to) => write!(f, "POINTER TO {to}"),
            Self::Array { length: Some(n), elem } => write!(f, "ARRAY {n} OF {elem}"),
            Self::Array { length: None, elem } => write!(f, "ARRAY OF {elem}"),
            Self::Record(id) => write!(f, "RECORD<{id}>"),
            Self::Proc { params, param_modes, return_type } => {
                write!(f, "PROCEDURE(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match param_modes.get(i) {
                        Some(ParamMode::ByRef | ParamMode::Receiver) => write!(f, "VAR ")?,
                        Some(ParamMode::ByConstRef) => write!(f, "CONST ")?,
                        _ => {}
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")?;
                if let Some(ret) = return_type {
                    write!(f, ": {ret}")?;
                }
                Ok(())
            }
            Self::Enumeration(id) => write!(f, "ENUM<{id}>"),
            Self::ModuleRef(id) => write!(f, "MODULE<{id}>"),
            Self::Set => write!(f, "SET"),
            Self::Nil => write!(f, "NIL"),
            Self::Error => write!(f, "<error>"),
        }
    }
}
