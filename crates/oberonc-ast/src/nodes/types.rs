//! Type-expression and type-declaration node types.

use std::fmt;

use super::{ASTNode, NodeID, NodeKind, Span};

/// The primitive types built into the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseTypeKind {
    Boolean,
    Char,
    WChar,
    Byte,
    ShortInt,
    Integer,
    LongInt,
    Real,
    LongReal,
    Set,
    Str,
    WStr,
    Nil,
    Any,
}

impl BaseTypeKind {
    /// Position in the numeric promotion order (`BYTE < SHORTINT < INTEGER < LONGINT < REAL < LONGREAL`).
    ///
    /// Returns `None` for non-numeric kinds.
    #[must_use]
    pub const fn numeric_rank(self) -> Option<u8> {
        match self {
            Self::Byte => Some(0),
            Self::ShortInt => Some(1),
            Self::Integer => Some(2),
            Self::LongInt => Some(3),
            Self::Real => Some(4),
            Self::LongReal => Some(5),
            _ => None,
        }
    }

    /// Whether this kind is one of the integer kinds (as opposed to real or other).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Byte | Self::ShortInt | Self::Integer | Self::LongInt)
    }

    /// Whether this kind is one of the floating-point kinds.
    #[must_use]
    pub const fn is_real(self) -> bool { matches!(self, Self::Real | Self::LongReal) }
}

impl fmt::Display for BaseTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "BOOLEAN",
            Self::Char => "CHAR",
            Self::WChar => "WCHAR",
            Self::Byte => "BYTE",
            Self::ShortInt => "SHORTINT",
            Self::Integer => "INTEGER",
            Self::LongInt => "LONGINT",
            Self::Real => "REAL",
            Self::LongReal => "LONGREAL",
            Self::Set => "SET",
            Self::Str => "STRING",
            Self::WStr => "WSTRING",
            Self::Nil => "NIL",
            Self::Any => "ANY",
        };
        write!(f, "{name}")
    }
}

/// A primitive base type. Base types are process-wide singletons per kind,
/// so `kind` alone identifies the type — there is never more than one live
/// `BaseType` node of a given kind per arena.
#[derive(Debug, Clone)]
pub struct BaseType {
    pub kind_tag: BaseTypeKind,
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
}

impl BaseType {
    #[must_use]
    pub const fn new(kind_tag: BaseTypeKind, id: NodeID, span: Span) -> Self {
        Self { kind_tag, id, parent: None, span }
    }
}

impl ASTNode for BaseType {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Type }
    fn span(&self) -> Span { self.span }
}

impl_visitable!(BaseType, visit_base_type);

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.kind_tag) }
}

/// `POINTER TO to`. `to` must resolve to a `RecordType` or `ArrayType`; the
/// resolver checks this and reports `pointer-base-illegal` otherwise (the
/// syntactic `to` node here may itself be a `QualiType` placeholder prior to
/// resolution).
#[derive(Debug, Clone)]
pub struct Pointer {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub to: NodeID,
}

impl Pointer {
    #[must_use]
    pub const fn new(to: NodeID, id: NodeID, span: Span) -> Self { Self { id, parent: None, span, to } }
}

impl ASTNode for Pointer {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Type }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.to] }
}

impl_visitable!(Pointer, visit_pointer);

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "POINTER TO <{}>", self.to) }
}

/// An array type. `length` is `None` for an open array (`ARRAY OF elem`),
/// or the `NodeID` of a compile-time-constant length expression.
#[derive(Debug, Clone)]
pub struct ArrayType {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub length: Option<NodeID>,
    pub elem: NodeID,
}

impl ArrayType {
    #[must_use]
    pub const fn new(length: Option<NodeID>, elem: NodeID, id: NodeID, span: Span) -> Self {
        Self { id, parent: None, span, length, elem }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool { self.length.is_none() }
}

impl ASTNode for ArrayType {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Type }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = Vec::with_capacity(2);
        if let Some(len) = self.length {
            children.push(len);
        }
        children.push(self.elem);
        children
    }
}

impl_visitable!(ArrayType, visit_array_type);

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() { write!(f, "ARRAY OF <{}>", self.elem) } else { write!(f, "ARRAY <len> OF <{}>", self.elem) }
    }
}

/// A record type. `base`, if present, must resolve to another `RecordType`
/// (possibly through a `Pointer`); `binding` is a weak back-link to the
/// `Pointer` node this record is the anonymous target of, set by the type
/// resolver (see §9's "open question" on anonymous-record binding).
#[derive(Debug, Clone)]
pub struct RecordType {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub base: Option<NodeID>,
    pub fields: Vec<NodeID>,
    pub methods: Vec<NodeID>,
    pub sub_recs: Vec<NodeID>,
    pub binding: Option<NodeID>,
}

impl RecordType {
    #[must_use]
    pub fn new(base: Option<NodeID>, fields: Vec<NodeID>, methods: Vec<NodeID>, id: NodeID, span: Span) -> Self {
        Self { id, parent: None, span, base, fields, methods, sub_recs: Vec::new(), binding: None }
    }
}

impl ASTNode for RecordType {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Type }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = Vec::new();
        if let Some(base) = self.base {
            children.push(base);
        }
        children.extend_from_slice(&self.fields);
        children.extend_from_slice(&self.methods);
        children
    }
}

impl_visitable!(RecordType, visit_record_type);

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RECORD ({} fields, {} methods)", self.fields.len(), self.methods.len())
    }
}

/// A procedure/method signature: ordered formals plus an optional return type.
#[derive(Debug, Clone)]
pub struct ProcType {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub formals: Vec<NodeID>,
    pub return_type: Option<NodeID>,
}

impl ProcType {
    #[must_use]
    pub const fn new(formals: Vec<NodeID>, return_type: Option<NodeID>, id: NodeID, span: Span) -> Self {
        Self { id, parent: None, span, formals, return_type }
    }
}

impl ASTNode for ProcType {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Type }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = self.formals.clone();
        if let Some(ret) = self.return_type {
            children.push(ret);
        }
        children
    }
}

impl_visitable!(ProcType, visit_proc_type);

impl fmt::Display for ProcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PROCEDURE({} formals)", self.formals.len())
    }
}

/// A named-type reference, not yet (or already) resolved. `quali` is the
/// `IdentLeafExpr`/`IdentSelExpr` naming the target; `actuals` are generic
/// type arguments, if any. `self_ref` is set by the type resolver when the
/// lookup hits the very `NamedType` being resolved.
#[derive(Debug, Clone)]
pub struct QualiType {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub quali: NodeID,
    pub actuals: Vec<NodeID>,
    pub self_ref: bool,
}

impl QualiType {
    #[must_use]
    pub const fn new(quali: NodeID, actuals: Vec<NodeID>, id: NodeID, span: Span) -> Self {
        Self { id, parent: None, span, quali, actuals, self_ref: false }
    }
}

impl ASTNode for QualiType {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Type }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = vec![self.quali];
        children.extend_from_slice(&self.actuals);
        children
    }
}

impl_visitable!(QualiType, visit_quali_type);

impl fmt::Display for QualiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "<quali {}>", self.quali) }
}

/// An ordered enumeration of named constants.
#[derive(Debug, Clone)]
pub struct Enumeration {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub consts: Vec<NodeID>,
}

impl Enumeration {
    #[must_use]
    pub const fn new(consts: Vec<NodeID>, id: NodeID, span: Span) -> Self {
        Self { id, parent: None, span, consts }
    }
}

impl ASTNode for Enumeration {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Type }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { self.consts.clone() }
}

impl_visitable!(Enumeration, visit_enumeration);

impl fmt::Display for Enumeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ENUM ({} constants)", self.consts.len())
    }
}
