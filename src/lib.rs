#![forbid(unsafe_code)]
//! sqlfront: statement compilation for a SQL front-end.
//!
//! Facade over the member crates; see `sqlfront_exec::Compiler` for the
//! entry point.

pub use sqlfront_core as core;
pub use sqlfront_exec as exec;
pub use sqlfront_planner as planner;
pub use sqlfront_session as session;

pub use sqlfront_exec::{statement_label, CompileError, CompiledStatement, Compiler};
