//! AST node type definitions.
//!
//! This module provides the consolidated AST node types organized in a flat
//! structure: types, named entities, statements, expressions.

mod entities;
mod expressions;
mod statements;
mod types;

use std::fmt;

pub use entities::*;
pub use expressions::*;
pub use oberonc_source::types::Span;
pub use statements::*;
pub use types::*;

/// A type-safe identifier for nodes in the AST arena.
///
/// `NodeID` is a handle that uniquely identifies a node in the arena. It
/// includes a generation counter to prevent use-after-free bugs: reusing a
/// freed slot bumps the generation, so a stale `NodeID` is rejected rather
/// than silently aliasing a new node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeID {
    /// The index of the node in the arena.
    pub(crate) index: u32,
    /// The generation counter for this node.
    pub(crate) generation: u32,
}

impl NodeID {
    /// Creates a new `NodeID` with the given index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self { Self { index, generation } }

    /// Creates a placeholder `NodeID` for struct initialization.
    ///
    /// Used when constructing a node struct that needs an id field before
    /// being allocated. The actual `NodeID` returned by `alloc_node()` is
    /// the one other nodes should reference.
    #[must_use]
    pub const fn placeholder() -> Self { Self { index: 0, generation: 0 } }

    /// Returns the index of this node.
    #[must_use]
    pub const fn index(&self) -> u32 { self.index }

    /// Returns the generation of this node.
    #[must_use]
    pub const fn generation(&self) -> u32 { self.generation }
}

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeID({}, {})", self.index, self.generation)
    }
}

/// Main AST node type — a tagged sum type standing in for virtual dispatch.
///
/// Every variant is checked against its tag by `get_as::<T>()` rather than
/// downcast through `dyn Any`; the visitor dispatches on this same tag.
#[derive(Debug, Clone)]
pub enum AnyNode {
    // --- Types ---
    /// A primitive base type (`INTEGER`, `BOOLEAN`, ...).
    BaseType(BaseType),
    /// `POINTER TO` a record or array.
    Pointer(Pointer),
    /// A fixed-length or open array type.
    ArrayType(ArrayType),
    /// A record type: fields, methods, optional base.
    RecordType(RecordType),
    /// A procedure/method signature type.
    ProcType(ProcType),
    /// An unresolved (or already-resolved) named type reference.
    QualiType(QualiType),
    /// An ordered enumeration of named constants.
    Enumeration(Enumeration),

    // --- Named entities ---
    /// A module-level variable.
    Variable(Variable),
    /// A procedure-local variable.
    LocalVar(LocalVar),
    /// A formal parameter.
    Parameter(Parameter),
    /// A record field.
    Field(Field),
    /// A compile-time constant.
    Const(Const),
    /// A type declaration (itself a scope, for generic parameters).
    NamedType(NamedType),
    /// A procedure, optionally bound to a record as a method.
    Procedure(Procedure),
    /// An `IMPORT` clause.
    Import(Import),
    /// A compiler-intrinsic procedure (`NEW`, `LEN`, ...).
    BuiltIn(BuiltIn),
    /// A generic type parameter.
    GenericName(GenericName),
    /// A module's top-level scope.
    Module(Module),

    // --- Statements ---
    /// A procedure call used as a statement.
    CallStmt(CallStmt),
    /// `RETURN [expr]`.
    ReturnStmt(ReturnStmt),
    /// `EXIT`.
    ExitStmt(ExitStmt),
    /// `lhs := rhs`.
    AssignStmt(AssignStmt),
    /// `IF`/`WHILE`/`REPEAT`/`WITH`/`LOOP`, discriminated by `mode`.
    IfLoopStmt(IfLoopStmt),
    /// `FOR ctrl := from TO to [BY by] DO ... END`.
    ForLoopStmt(ForLoopStmt),
    /// `CASE scrutinee OF ... END`, value-case or type-case.
    CaseStmt(CaseStmt),

    // --- Expressions ---
    /// A typed literal value.
    LiteralExpr(LiteralExpr),
    /// `{ elem, lo..hi, ... }`.
    SetExpr(SetExpr),
    /// An unqualified identifier use.
    IdentLeafExpr(IdentLeafExpr),
    /// A qualified selection `base.name`.
    IdentSelExpr(IdentSelExpr),
    /// A unary operator application.
    UnExpr(UnExpr),
    /// A call, index, or type-guard application (has an argument list).
    ArgExpr(ArgExpr),
    /// A binary operator application.
    BinExpr(BinExpr),
}

// Generate get_as() using the master variant list in macros.rs.
for_each_node_variant!(impl_get_as_for_anynode);

/// A trait for AST nodes that can be stored in the arena.
pub trait ASTNode: fmt::Display {
    /// Returns the kind of this node.
    fn kind(&self) -> NodeKind;

    /// Returns the span of this node in the source code.
    fn span(&self) -> Span;

    /// Returns the direct children of this node, in source order.
    fn children(&self) -> Vec<NodeID> { vec![] }

    /// Returns the ID of this node.
    fn id(&self) -> NodeID;

    /// Returns the parent of this node, if it has one.
    fn parent(&self) -> Option<NodeID>;

    /// Builder-pattern method to set the parent of this node.
    #[must_use]
    fn with_parent(self, parent: NodeID) -> Self;
}

for_each_node_variant!(impl_astnode_for_anynode);
for_each_node_variant!(impl_visitable_for_anynode);
for_each_node_variant!(impl_display_for_anynode);

/// High-level node categorization for quick filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Type expressions and type declarations.
    Type,
    /// Named entities (variables, procedures, modules, ...).
    Entity,
    /// Statements.
    Statement,
    /// Expressions.
    Expression,
}
