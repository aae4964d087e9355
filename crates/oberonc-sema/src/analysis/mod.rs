//! Whole-procedure analyses built on top of a control flow graph: definite
//! return, unreachable code, unused imports.

mod control_flow;
mod dead_code;

pub use control_flow::{BasicBlock, ControlFlowGraph};
pub use dead_code::{DeadCodeDetector, DeadCodeWarning, WarningSeverity};
