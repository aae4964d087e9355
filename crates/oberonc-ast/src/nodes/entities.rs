//! Named-entity node types: everything that lives in a scope and has a name.

use std::fmt;

use super::{ASTNode, NodeID, NodeKind, Span};

/// Accessibility of a named entity from outside its declaring module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Not meaningful for this entity kind (e.g. a local variable).
    NotApplicable,
    /// Not visible outside the declaring module.
    Private,
    /// Visible and assignable from other modules.
    ReadWrite,
    /// Visible but assignment from other modules is `readonly-violation`.
    ReadOnly,
}

impl Visibility {
    /// Monotonic visibility ordering used by the override-visibility check:
    /// an override must be `>=` the visibility it overrides.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::NotApplicable => 0,
            Self::Private => 1,
            Self::ReadOnly => 2,
            Self::ReadWrite => 3,
        }
    }
}

/// How a [`Parameter`] is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    /// Passed by value.
    Value,
    /// `VAR` — by reference, writable.
    ByRef,
    /// By reference, read-only inside the callee.
    ByConstRef,
    /// The implicit receiver parameter of a method.
    Receiver,
}

/// A module-level variable declaration.
#[derive(Debug, Clone)]
pub struct Variable {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub declared_type: NodeID,
    pub visibility: Visibility,
}

impl ASTNode for Variable {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.declared_type] }
}

impl_visitable!(Variable, visit_variable);

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// A procedure-local variable declaration.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub declared_type: NodeID,
}

impl ASTNode for LocalVar {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.declared_type] }
}

impl_visitable!(LocalVar, visit_local_var);

impl fmt::Display for LocalVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// A formal parameter of a procedure or method.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub declared_type: NodeID,
    pub mode: ParamMode,
}

impl ASTNode for Parameter {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.declared_type] }
}

impl_visitable!(Parameter, visit_parameter);

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.mode {
            ParamMode::ByRef | ParamMode::Receiver => "VAR ",
            ParamMode::ByConstRef => "CONST ",
            ParamMode::Value => "",
        };
        write!(f, "{prefix}{}", self.name)
    }
}

/// A record field.
#[derive(Debug, Clone)]
pub struct Field {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub declared_type: NodeID,
    pub visibility: Visibility,
}

impl ASTNode for Field {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.declared_type] }
}

impl_visitable!(Field, visit_field);

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// A compile-time constant declaration.
#[derive(Debug, Clone)]
pub struct Const {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub value: NodeID,
    pub visibility: Visibility,
}

impl ASTNode for Const {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.value] }
}

impl_visitable!(Const, visit_const);

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// A type declaration. Itself a scope, so it may own generic parameters.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub declared_type: NodeID,
    pub generics: Vec<NodeID>,
    pub visibility: Visibility,
}

impl ASTNode for NamedType {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = self.generics.clone();
        children.push(self.declared_type);
        children
    }
}

impl_visitable!(NamedType, visit_named_type);

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// A procedure, optionally bound to a record as a method via `receiver`.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub proc_type: NodeID,
    pub receiver: Option<NodeID>,
    pub locals: Vec<NodeID>,
    pub body: Vec<NodeID>,
    pub visibility: Visibility,
}

impl ASTNode for Procedure {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = vec![self.proc_type];
        if let Some(receiver) = self.receiver {
            children.push(receiver);
        }
        children.extend_from_slice(&self.locals);
        children.extend_from_slice(&self.body);
        children
    }
}

impl_visitable!(Procedure, visit_procedure);

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// An `IMPORT [alias :=] path` clause. `target` is the imported module's
/// `NodeID`, filled in by the module graph builder — it is a non-owning
/// cross-module reference, never the arena that owns the imported module.
#[derive(Debug, Clone)]
pub struct Import {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub alias: String,
    pub path: String,
    pub target: Option<NodeID>,
}

impl Import {
    #[must_use]
    pub const fn new(alias: String, path: String, id: NodeID, span: Span) -> Self {
        Self { id, parent: None, span, alias, path, target: None }
    }
}

impl ASTNode for Import {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
}

impl_visitable!(Import, visit_import);

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "IMPORT {} := {}", self.alias, self.path) }
}

/// A compiler-intrinsic procedure (`NEW`, `LEN`, `INC`, `ORD`, ...), admitted
/// without source parsing the way preload libraries are.
#[derive(Debug, Clone)]
pub struct BuiltIn {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub proc_type: NodeID,
}

impl ASTNode for BuiltIn {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> { vec![self.proc_type] }
}

impl_visitable!(BuiltIn, visit_built_in);

impl fmt::Display for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// A generic type parameter declared on a [`NamedType`].
#[derive(Debug, Clone)]
pub struct GenericName {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
}

impl ASTNode for GenericName {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
}

impl_visitable!(GenericName, visit_generic_name);

impl fmt::Display for GenericName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}

/// A module's top-level scope: its imports, declarations, and body statements.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: NodeID,
    pub parent: Option<NodeID>,
    pub span: Span,
    pub name: String,
    pub imports: Vec<NodeID>,
    pub decls: Vec<NodeID>,
    pub body: Vec<NodeID>,
    pub has_errors: bool,
}

impl Module {
    #[must_use]
    pub const fn new(name: String, id: NodeID, span: Span) -> Self {
        Self { id, parent: None, span, name, imports: Vec::new(), decls: Vec::new(), body: Vec::new(), has_errors: false }
    }
}

impl ASTNode for Module {
    fn id(&self) -> NodeID { self.id }
    fn parent(&self) -> Option<NodeID> { self.parent }
    fn with_parent(mut self, parent: NodeID) -> Self {
        self.parent = Some(parent);
        self
    }
    fn kind(&self) -> NodeKind { NodeKind::Entity }
    fn span(&self) -> Span { self.span }
    fn children(&self) -> Vec<NodeID> {
        let mut children = self.imports.clone();
        children.extend_from_slice(&self.decls);
        children.extend_from_slice(&self.body);
        children
    }
}

impl_visitable!(Module, visit_module);

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "MODULE {}", self.name) }
}
