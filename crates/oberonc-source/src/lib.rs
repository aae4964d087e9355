//! Source file handling and position tracking for the compiler front-end.
//!
//! This crate provides the fundamental types for working with source code:
//! file registration, byte-offset-to-line/column tracking, and spans. It has
//! no dependency on the AST or the semantic layer, so it can be reused by a
//! parser, a pretty-printer, or the diagnostic sink alike.

pub mod types;
