#![forbid(unsafe_code)]
//! sqlfront-exec: turns a parsed statement into a schema-bound
//! `CompiledStatement`.
//!
//! - `classify`: statement → observability label.
//! - `resolve`: pinned snapshot vs. live schema, binlog version recording.
//! - `compiler`: the pipeline (classify, flag scope, resolve, preprocess,
//!   validate, optimize, assemble).
//! - `metrics`: process-wide labeled statement counter.

pub mod classify;
pub mod compiler;
pub mod error;
pub mod metrics;
pub mod resolve;
pub mod statement;

pub use classify::{statement_label, UNKNOWN_LABEL};
pub use compiler::Compiler;
pub use error::{CompileError, Result, Stage};
pub use metrics::{
    statement_counts, GlobalStatementCounter, LabeledCounter, MetricsSink, NoopMetrics,
    STATEMENT_COUNTER,
};
pub use resolve::{resolve_schema, SchemaSource};
pub use statement::{CompiledStatement, StatementSummary};
