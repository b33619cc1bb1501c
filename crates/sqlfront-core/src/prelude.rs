//! Convenient re-exports for downstream crates.

pub use crate::ast::{Statement, StatementNode};
pub use crate::config::CompilerConfig;
pub use crate::error::{Error, Result};
pub use crate::id::{ConnectionId, OpId, SchemaVersion, StatementId, TableId};
pub use crate::plan::{LogicalPlan, PhysicalPlan, TableRef};
pub use crate::schema::{DataType, Field, InfoSchema, InfoSchemaBuilder, Schema};
