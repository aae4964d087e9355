//! Abstract syntax tree definitions for the compiler front-end.
//!
//! The tree is a directed, mostly-acyclic graph of nodes living in a single
//! per-module arena (see [`ast::AST`]). Parent-to-child edges own their
//! target through the arena; every other edge (back-pointers, record base
//! links, override chains) is a bare [`nodes::NodeID`] copy with no
//! ownership implication.

#[macro_use]
pub mod macros;

pub mod ast;
pub mod nodes;
pub mod visitor;
