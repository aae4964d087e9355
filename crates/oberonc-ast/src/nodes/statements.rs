//! Statement node types.

use std::fmt;

use super::{ASTNode, NodeID, NodeKind, Span};

/// A procedure call used as a statement (the call itself is an `ArgExpr`).
#[derive(Debug, Clone)]
pub struct CallStmt {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub call: NodeID,
}

impl ASTNode for CallStmt {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Statement }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.call] }
}

impl_visitable!(CallStmt, visit_call_stmt);

impl fmt::Display for CallStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "<call {}>", self.call) }
}

/// `RETURN [value]`.
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub value: Option<NodeID>,
}

impl ASTNode for ReturnStmt {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Statement }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { self.value.into_iter().collect() }
}

impl_visitable!(ReturnStmt, visit_return_stmt);

impl fmt::Display for ReturnStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "RETURN") }
}

/// `EXIT`. Must be lexically inside a `LOOP`; checked by the statement checker.
#[derive(Debug, Clone)]
pub struct ExitStmt {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
}

impl ASTNode for ExitStmt {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Statement }
    fn span(&self) -> Span { self.span }
}

impl_visitable!(ExitStmt, visit_exit_stmt);

impl fmt::Display for ExitStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "EXIT") }
}

/// `lhs := rhs`.
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub lhs: NodeID,
    pub rhs: NodeID,
}

impl ASTNode for AssignStmt {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Statement }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.lhs, self.rhs] }
}

impl_visitable!(AssignStmt, visit_assign_stmt);

impl fmt::Display for AssignStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} := {}", self.lhs, self.rhs) }
}

/// Which of `IF`/`WHILE`/`REPEAT`/`WITH`/`LOOP` an [`IfLoopStmt`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfLoopMode {
    If,
    While,
    Repeat,
    With,
    Loop,
}

/// Covers `IF`/`WHILE`/`REPEAT`/`WITH`/`LOOP` via `mode`.
///
/// `guard` is the boolean condition for `If`/`While`/`Repeat` (for `Repeat`
/// it is the *until* condition, checked after the body). `LOOP` has no
/// guard. `WITH` uses `with_var`/`with_type` instead of `guard` to narrow
/// the named variable's static type within `body`; `else_branch` threads an
/// `ELSIF`/`ELSE` chain for `IF`.
#[derive(Debug, Clone)]
pub struct IfLoopStmt {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub mode: IfLoopMode,
    pub guard: Option<NodeID>,
    pub with_var: Option<NodeID>,
    pub with_type: Option<NodeID>,
    pub body: Vec<NodeID>,
    pub else_branch: Option<NodeID>,
}

impl IfLoopStmt {
    #[must_use]
    pub const fn new(mode: IfLoopMode, body: Vec<NodeID>, id: NodeID, span: Span) -> Self {
        Self { id, parent: None, span, mode, guard: None, with_var: None, with_type: None, body, else_branch: None }
    }
}

impl ASTNode for IfLoopStmt {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Statement }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = Vec::new();
        children.extend(self.guard);
        children.extend(self.with_var);
        children.extend(self.with_type);
        children.extend_from_slice(&self.body);
        children.extend(self.else_branch);
        children
    }
}

impl_visitable!(IfLoopStmt, visit_if_loop_stmt);

impl fmt::Display for IfLoopStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:?}", self.mode) }
}

/// `FOR ctrl := from TO to [BY by] DO body END`.
///
/// `ctrl` names a procedure-local integer variable; `by` defaults to `+1`
/// when absent and must otherwise be a nonzero compile-time constant —
/// `for-step-zero` is always an error, never silently treated as `+1`.
#[derive(Debug, Clone)]
pub struct ForLoopStmt {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub control: NodeID,
    pub from: NodeID,
    pub to: NodeID,
    pub by: Option<NodeID>,
    pub body: Vec<NodeID>,
}

impl ASTNode for ForLoopStmt {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Statement }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = vec![self.control, self.from, self.to];
        children.extend(self.by);
        children.extend_from_slice(&self.body);
        children
    }
}

impl_visitable!(ForLoopStmt, visit_for_loop_stmt);

impl fmt::Display for ForLoopStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "FOR <{}>", self.control) }
}

/// One label set plus its body within a [`CaseStmt`].
///
/// Not an arena-allocated node: labels and body are structural data owned by
/// the enclosing `CaseStmt`, the way `ParameterIdent`'s helper fields are
/// owned directly rather than boxed into their own arena slot.
#[derive(Debug, Clone)]
pub struct CaseArm {
    pub labels: Vec<NodeID>,
    pub body: Vec<NodeID>,
}

/// `CASE scrutinee OF arms [ELSE else_body] END`.
///
/// If `scrutinee`'s type is ordinal/string, each arm's labels are constants
/// or ranges (value-case); overlapping labels are `case-label-overlap`. If
/// `scrutinee` is a record/pointer type, each arm's single label is a type
/// extension of the scrutinee (type-case), narrowing `scrutinee`'s static
/// type within that arm's body.
#[derive(Debug, Clone)]
pub struct CaseStmt {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub scrutinee: NodeID,
    pub arms: Vec<CaseArm>,
    pub else_body: Option<Vec<NodeID>>,
}

impl ASTNode for CaseStmt {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Statement }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = vec![self.scrutinee];
        for arm in &self.arms {
            children.extend_from_slice(&arm.labels);
            children.extend_from_slice(&arm.body);
        }
        if let Some(else_body) = &self.else_body {
            children.extend_from_slice(else_body);
        }
        children
    }
}

impl_visitable!(CaseStmt, visit_case_stmt);

impl fmt::Display for CaseStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CASE <{}> OF ({} arms)", self.scrutinee, self.arms.len())
    }
}
