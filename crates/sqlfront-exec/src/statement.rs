//! The compile artifact handed to the executor.

use std::sync::Arc;

use serde::Serialize;
use sqlfront_core::hash::Hash256;
use sqlfront_core::id::{SchemaVersion, StatementId};
use sqlfront_core::schema::InfoSchema;
use sqlfront_planner::Plan;

/// Immutable bundle of {schema snapshot, plan, source text, DDL flag}.
///
/// Only the compiler constructs one, after every stage succeeded, and
/// `plan` was always optimized against exactly `schema`.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    id: StatementId,
    schema: Arc<InfoSchema>,
    plan: Plan,
    text: String,
    is_ddl: bool,
    label: &'static str,
}

impl CompiledStatement {
    pub(crate) fn new(
        schema: Arc<InfoSchema>,
        plan: Plan,
        text: String,
        is_ddl: bool,
        label: &'static str,
    ) -> Self {
        Self {
            id: StatementId::new_v4(),
            schema,
            plan,
            text,
            is_ddl,
            label,
        }
    }

    pub fn id(&self) -> StatementId {
        self.id
    }

    pub fn schema(&self) -> &Arc<InfoSchema> {
        &self.schema
    }

    pub fn schema_version(&self) -> SchemaVersion {
        self.schema.schema_meta_version()
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Literal source text of the statement.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_ddl(&self) -> bool {
        self.is_ddl
    }

    /// Classification label the statement was counted under.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// True when executing the plan only reads data.
    pub fn is_read_only(&self) -> bool {
        self.plan.logical().is_query()
    }

    /// Stable digest of the physical program.
    pub fn plan_digest(&self) -> sqlfront_core::error::Result<Hash256> {
        self.plan.program().digest()
    }

    pub fn summary(&self) -> sqlfront_core::error::Result<StatementSummary> {
        Ok(StatementSummary {
            id: self.id,
            label: self.label,
            text: self.text.clone(),
            is_ddl: self.is_ddl,
            read_only: self.is_read_only(),
            schema_version: self.schema_version(),
            plan_digest: self.plan_digest()?.to_hex(),
            root_operator: self.plan.program().root_key().map(str::to_string),
            operators: self.plan.program().bindings.len(),
            compiler_version: sqlfront_core::VERSION,
        })
    }
}

/// Serializable view of a compiled statement (CLI output, logs).
#[derive(Debug, Clone, Serialize)]
pub struct StatementSummary {
    pub id: StatementId,
    pub label: &'static str,
    pub text: String,
    pub is_ddl: bool,
    pub read_only: bool,
    pub schema_version: SchemaVersion,
    pub plan_digest: String,
    pub root_operator: Option<String>,
    pub operators: usize,
    pub compiler_version: &'static str,
}
