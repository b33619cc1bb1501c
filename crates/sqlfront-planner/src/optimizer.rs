//! Reference `Optimizer`: build → rewrite → lower.

use sqlfront_core::ast::StatementNode;
use sqlfront_core::schema::InfoSchema;
use sqlfront_session::SessionState;
use tracing::debug;

use crate::error::Result;
use crate::logical;
use crate::lower::lower_to_physical;
use crate::physical::Plan;
use crate::rules;
use crate::traits::Optimizer;

#[derive(Debug, Clone, Copy)]
pub struct RuleOptimizer {
    rewrite: bool,
}

impl Default for RuleOptimizer {
    fn default() -> Self {
        Self { rewrite: true }
    }
}

impl RuleOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the logical rewrites (plans exactly as written).
    pub fn without_rewrites() -> Self {
        Self { rewrite: false }
    }
}

impl Optimizer for RuleOptimizer {
    fn optimize(
        &self,
        session: &SessionState,
        node: &StatementNode,
        schema: &InfoSchema,
    ) -> Result<Plan> {
        let mut plan = logical::build(node.stmt(), schema)?;
        if self.rewrite {
            plan = rules::optimize(plan);
        }
        let program = lower_to_physical(&plan);
        debug!(
            conn = session.connection_id().get(),
            version = schema.schema_meta_version().get(),
            operators = program.bindings.len(),
            root = program.root_key().unwrap_or("?"),
            "optimized statement"
        );
        Ok(Plan::new(schema.schema_meta_version(), plan, program))
    }
}
