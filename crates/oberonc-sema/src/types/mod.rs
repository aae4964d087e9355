//! The type system: resolved-type representation and its side tables.

mod environment;
mod ty;

pub use environment::{Role, TypeEnvironment};
pub use ty::Type;
