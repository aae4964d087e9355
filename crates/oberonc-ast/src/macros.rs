//! Declarative macros for reducing boilerplate in AST node implementations.
//!
//! Rather than manually writing one match arm per node kind for each trait
//! implementation, we keep a master list of node variants and generate every
//! implementation from it.
//!
//! - **Single source of truth**: the variant list lives only in
//!   [`for_each_node_variant`].
//! - **Maintainability**: adding a node type means adding one line here.
//! - **Zero runtime cost**: everything expands at compile time.

/// Master list of all AST node variants.
///
/// Each line is `EnumVariant(Type) => visitor_method_name,`. To add a node
/// type: define its struct, add a line here, recompile.
#[macro_export]
macro_rules! for_each_node_variant {
    ($callback:ident) => {
        $callback! {
            ArgExpr(ArgExpr) => visit_arg_expr,
            ArrayType(ArrayType) => visit_array_type,
            AssignStmt(AssignStmt) => visit_assign_stmt,
            BaseType(BaseType) => visit_base_type,
            BinExpr(BinExpr) => visit_bin_expr,
            BuiltIn(BuiltIn) => visit_built_in,
            CallStmt(CallStmt) => visit_call_stmt,
            CaseStmt(CaseStmt) => visit_case_stmt,
            Const(Const) => visit_const,
            Enumeration(Enumeration) => visit_enumeration,
            ExitStmt(ExitStmt) => visit_exit_stmt,
            Field(Field) => visit_field,
            ForLoopStmt(ForLoopStmt) => visit_for_loop_stmt,
            GenericName(GenericName) => visit_generic_name,
            IdentLeafExpr(IdentLeafExpr) => visit_ident_leaf_expr,
            IdentSelExpr(IdentSelExpr) => visit_ident_sel_expr,
            IfLoopStmt(IfLoopStmt) => visit_if_loop_stmt,
            Import(Import) => visit_import,
            LiteralExpr(LiteralExpr) => visit_literal_expr,
            LocalVar(LocalVar) => visit_local_var,
            Module(Module) => visit_module,
            NamedType(NamedType) => visit_named_type,
            Parameter(Parameter) => visit_parameter,
            Pointer(Pointer) => visit_pointer,
            ProcType(ProcType) => visit_proc_type,
            Procedure(Procedure) => visit_procedure,
            QualiType(QualiType) => visit_quali_type,
            RecordType(RecordType) => visit_record_type,
            ReturnStmt(ReturnStmt) => visit_return_stmt,
            SetExpr(SetExpr) => visit_set_expr,
            UnExpr(UnExpr) => visit_un_expr,
            Variable(Variable) => visit_variable,
        }
    };
}

/// Generates the `ASTNode` trait implementation for `AnyNode`.
#[macro_export]
macro_rules! impl_astnode_for_anynode {
    ($($variant:ident($type:ty) => $visit:ident),* $(,)?) => {
        impl $crate::nodes::ASTNode for $crate::nodes::AnyNode {
            fn id(&self) -> $crate::nodes::NodeID {
                match self {
                    $(Self::$variant(node) => node.id(),)*
                }
            }

            fn parent(&self) -> Option<$crate::nodes::NodeID> {
                match self {
                    $(Self::$variant(node) => node.parent(),)*
                }
            }

            fn with_parent(self, parent: $crate::nodes::NodeID) -> Self {
                match self {
                    $(Self::$variant(node) => Self::$variant(node.with_parent(parent)),)*
                }
            }

            fn kind(&self) -> $crate::nodes::NodeKind {
                match self {
                    $(Self::$variant(node) => node.kind(),)*
                }
            }

            fn span(&self) -> oberonc_source::types::Span {
                match self {
                    $(Self::$variant(node) => node.span(),)*
                }
            }

            fn children(&self) -> Vec<$crate::nodes::NodeID> {
                match self {
                    $(Self::$variant(node) => node.children(),)*
                }
            }
        }
    };
}

/// Generates the `Visitable` trait implementation for `AnyNode`.
#[macro_export]
macro_rules! impl_visitable_for_anynode {
    ($($variant:ident($type:ty) => $visit:ident),* $(,)?) => {
        impl $crate::visitor::Visitable for $crate::nodes::AnyNode {
            fn accept<T>(
                &self,
                visitor: &mut dyn $crate::visitor::Visitor<T>,
                node_id: $crate::nodes::NodeID,
            ) -> $crate::visitor::VisitorResult<T> {
                match self {
                    $(Self::$variant(_) => visitor.$visit(node_id),)*
                }
            }

            fn accept_mut<T>(
                &self,
                visitor: &mut dyn $crate::visitor::MutVisitor<T>,
                node_id: $crate::nodes::NodeID,
            ) -> $crate::visitor::VisitorResult<T> {
                match self {
                    $(Self::$variant(_) => visitor.$visit(node_id),)*
                }
            }
        }
    };
}

/// Generates a complete `Visitable` impl for a single concrete node type.
///
/// ```ignore
/// impl_visitable!(Variable, visit_variable);
/// ```
#[macro_export]
macro_rules! impl_visitable {
    ($type:ty, $method:ident) => {
        impl $crate::visitor::Visitable for $type {
            fn accept<T>(
                &self,
                visitor: &mut dyn $crate::visitor::Visitor<T>,
                node_id: $crate::nodes::NodeID,
            ) -> $crate::visitor::VisitorResult<T> {
                visitor.$method(node_id)
            }

            fn accept_mut<T>(
                &self,
                visitor: &mut dyn $crate::visitor::MutVisitor<T>,
                node_id: $crate::nodes::NodeID,
            ) -> $crate::visitor::VisitorResult<T> {
                visitor.$method(node_id)
            }
        }
    };
}

/// Generates the `Display` trait implementation for `AnyNode`.
#[macro_export]
macro_rules! impl_display_for_anynode {
    ($($variant:ident($type:ty) => $visit:ident),* $(,)?) => {
        impl std::fmt::Display for $crate::nodes::AnyNode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant(node) => node.fmt(f),)*
                }
            }
        }
    };
}

/// Generates the complete `get_as<T>()` method for `AnyNode`.
///
/// ## Safety
///
/// The `unsafe` cast here is sound because the match arm already checked
/// `type_name::<T>()` against the variant's own type, and the pointer is
/// derived from a live reference with the same lifetime as the result.
#[macro_export]
macro_rules! impl_get_as_for_anynode {
    ($($variant:ident($type:ty) => $visit:ident),* $(,)?) => {
        impl $crate::nodes::AnyNode {
            /// Returns a strongly-typed reference to the inner node data if
            /// the variant's type matches `T`.
            ///
            /// ## Errors
            ///
            /// Returns an error message if the node is not of type `T`.
            #[allow(unsafe_code, clippy::undocumented_unsafe_blocks)]
            pub fn get_as<T: 'static>(&self) -> Result<&T, String> {
                let expected_type = std::any::type_name::<T>();

                match self {
                    $(
                        Self::$variant(inner) if std::any::type_name::<$type>() == expected_type => {
                            // SAFETY: type_name comparison above confirms $type == T;
                            // inner's lifetime matches &self's.
                            Ok(unsafe { &*std::ptr::from_ref::<$type>(inner).cast::<T>() })
                        }
                    )*
                    _ => Err(format!("type mismatch: expected {}, got {:?}", expected_type, self.kind())),
                }
            }
        }
    };
}
