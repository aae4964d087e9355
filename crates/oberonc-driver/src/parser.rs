//! The parser boundary (spec §6): lexing and concrete parsing are explicitly
//! out of scope for this crate. A host supplies an implementation of
//! [`Parser`] that turns source bytes into a `Module` node already inserted
//! into the shared [`AST`] arena.

use oberonc_ast::ast::AST;
use oberonc_ast::nodes::NodeID;
use oberonc_sema::SemaError;

/// A parsed compilation unit: the `NodeID` of the `Module` the parser
/// allocated into the shared arena. Identifier references inside it still
/// carry only their lexical name and location (no resolved target); type
/// expressions still carry `QualiType` placeholders — resolving both is the
/// semantic layer's job, not the parser's.
pub type RawUnit = NodeID;

/// Turns source bytes into a [`RawUnit`] inside `ast`.
///
/// Implementations own lexing and grammar; this crate only consumes the
/// result. A host typically implements this once per concrete syntax and
/// reuses it across every [`crate::OberonCore`] it drives.
pub trait Parser {
    /// ## Errors
    ///
    /// Returns [`SemaError::ParseError`] on malformed input.
    fn parse(&mut self, ast: &mut AST, bytes: &[u8], path: &str) -> Result<RawUnit, SemaError>;
}
