#![forbid(unsafe_code)]
//! sqlfront-session: everything a compile call reads from or writes to
//! outside the statement itself.
//!
//! - `SessionState`: per-connection mutable state, owned by one session.
//! - `UpdateStmtScope`: RAII guard for the transient "in update statement" flag.
//! - `Domain`: publisher of immutable `InfoSchema` snapshots, with history
//!   for pinned (snapshot) reads.
//! - `binlog`: replication metadata the compiler records per statement.

pub mod binlog;
pub mod domain;
pub mod error;
pub mod guard;
pub mod session;

pub use binlog::{BinlogInfo, SchemaVersionRecorder, SessionBinlogRecorder};
pub use domain::{Domain, SchemaProvider};
pub use error::{Result, SessionError};
pub use guard::UpdateStmtScope;
pub use session::SessionState;
