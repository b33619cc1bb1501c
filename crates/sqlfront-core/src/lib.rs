#![forbid(unsafe_code)]
//! sqlfront-core: shared vocabulary for the statement compiler.
//!
//! Contents:
//! - `ast`: parsed statement nodes (produced by an external parser)
//! - `schema`: immutable, versioned schema snapshots (`InfoSchema`)
//! - `plan`: logical/physical plan node enums
//! - `id`: typed identifiers
//! - `config`, `error`, `hash`
//!
//! No logging, locking, or I/O lives here.

pub mod ast;
pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod plan;
pub mod prelude;
pub mod schema;

/// Crate version, stamped into statement summaries.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
