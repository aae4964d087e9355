//! Expression node types.

use std::fmt;

use super::{ASTNode, NodeID, NodeKind, Span};

/// The value carried by a [`LiteralExpr`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    /// UTF-8 string literal; the checker records its codepoint count as `strLen`.
    Str(String),
    ByteStr(Vec<u8>),
    Character(char),
    Nil,
}

/// A typed literal value. String literals type as `ARRAY n OF CHAR` where
/// `n` is the codepoint count plus one (for the trailing zero); `str_len`
/// caches that count so the checker need not re-scan the string.
#[derive(Debug, Clone)]
pub struct LiteralExpr {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub value: LiteralValue,
    pub str_len: Option<usize>,
}

impl LiteralExpr {
    #[must_use]
    pub fn new(value: LiteralValue, id: NodeID, span: Span) -> Self {
        let str_len = match &value {
            LiteralValue::Str(s) => Some(s.chars().count() + 1),
            _ => None,
        };
        Self { id, parent: None, span, value, str_len }
    }
}

impl ASTNode for LiteralExpr {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Expression }
    fn span(&self) -> Span { self.span }
}

impl_visitable!(LiteralExpr, visit_literal_expr);

impl fmt::Display for LiteralExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            LiteralValue::Integer(v) => write!(f, "{v}"),
            LiteralValue::Real(v) => write!(f, "{v}"),
            LiteralValue::Boolean(v) => write!(f, "{v}"),
            LiteralValue::Str(v) => write!(f, "{v:?}"),
            LiteralValue::ByteStr(v) => write!(f, "{v:?}"),
            LiteralValue::Character(v) => write!(f, "{v:?}"),
            LiteralValue::Nil => write!(f, "NIL"),
        }
    }
}

/// One element of a [`SetExpr`]: a single value or an inclusive range.
/// `Range` is only legal inside a `SetExpr` or `CaseStmt` label list.
#[derive(Debug, Clone)]
pub enum SetElement {
    Single(NodeID),
    Range(NodeID, NodeID),
}

/// `{ elem, lo..hi, ... }` of type `SET`.
#[derive(Debug, Clone)]
pub struct SetExpr {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub elements: Vec<SetElement>,
}

impl ASTNode for SetExpr {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Expression }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        self.elements
            .iter()
            .flat_map(|e| match e {
                SetElement::Single(a) => vec![*a],
                SetElement::Range(a, b) => vec![*a, *b],
            })
            .collect()
    }
}

impl_visitable!(SetExpr, visit_set_expr);

impl fmt::Display for SetExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{{ {} elements }}", self.elements.len()) }
}

/// An unqualified identifier use. Resolution attaches a target and a role
/// (`decl`, `lhs`, `rhs`, `call`, ...) in a side table keyed by this node's
/// `NodeID`, rather than mutating the node — see the semantic layer's
/// `TypeEnvironment`/resolution tables.
#[derive(Debug, Clone)]
pub struct IdentLeafExpr {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
}

impl ASTNode for IdentLeafExpr {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Expression }
    fn span(&self) -> Span { self.span }
}

impl_visitable!(IdentLeafExpr, visit_ident_leaf_expr);

impl fmt::Display for IdentLeafExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// A qualified selection `base.name` (field, method, or module member access;
/// record access through a pointer is an implicit dereference).
#[derive(Debug, Clone)]
pub struct IdentSelExpr {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub base: NodeID,
    pub name: String,
}

impl ASTNode for IdentSelExpr {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Expression }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.base] }
}

impl_visitable!(IdentSelExpr, visit_ident_sel_expr);

impl fmt::Display for IdentSelExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}.{}", self.base, self.name) }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Numeric negation.
    Neg,
    /// Boolean negation.
    Not,
    /// Pointer dereference (`p^`).
    Deref,
    /// Address-of (`@x`); the pointer created here is appended to the
    /// module's helper list so it shares the module's lifetime.
    AddrOf,
}

/// A unary operator application.
#[derive(Debug, Clone)]
pub struct UnExpr {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub op: UnOp,
    pub operand: NodeID,
}

impl ASTNode for UnExpr {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Expression }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.operand] }
}

impl_visitable!(UnExpr, visit_un_expr);

impl fmt::Display for UnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:?} <{}>", self.op, self.operand) }
}

/// Which form of application an [`ArgExpr`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A procedure call: `callee(args...)`.
    Call,
    /// An array/open-array index: `callee[args...]`.
    Index,
    /// A type-guard cast: `callee(T)`, the guard type carried in `guard_type`.
    Guard,
}

/// Call, index, or type-guard application. Carries an argument list for
/// `Call`/`Index`; `guard_type` is populated only for `Guard`.
#[derive(Debug, Clone)]
pub struct ArgExpr {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub kind_tag: ArgKind,
    pub callee: NodeID,
    pub args: Vec<NodeID>,
    pub guard_type: Option<NodeID>,
}

impl ASTNode for ArgExpr {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Expression }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = vec![self.callee];
        children.extend_from_slice(&self.args);
        children.extend(self.guard_type);
        children
    }
}

impl_visitable!(ArgExpr, visit_arg_expr);

impl fmt::Display for ArgExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} <{}>({} args)", self.kind_tag, self.callee, self.args.len())
    }
}

/// Binary operators: range, relations, set-containment/type-test, and the
/// arithmetic/boolean/set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Range,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Is,
    Add,
    Sub,
    Or,
    Mul,
    Div,
    Mod,
    And,
    FDiv,
}

impl BinOp {
    /// Whether this operator yields a boolean result regardless of operand types.
    #[must_use]
    pub const fn is_relational(self) -> bool {
        matches!(self, Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::In | Self::Is)
    }
}

/// A binary operator application.
#[derive(Debug, Clone)]
pub struct BinExpr {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub op: BinOp,
    pub lhs: NodeID,
    pub rhs: NodeID,
}

impl ASTNode for BinExpr {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Expression }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.lhs, self.rhs] }
}

impl_visitable!(BinExpr, visit_bin_expr);

impl fmt::Display for BinExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {:?} <{}>", self.lhs, self.op, self.rhs)
    }
}
