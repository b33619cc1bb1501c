//! The compile pipeline.
//!
//! ```text
//! classify → count → [update flag raised] → resolve schema
//!   → preprocess → validate → optimize → assemble
//! ```
//! Any stage failure short-circuits the rest. The update flag is restored
//! by `UpdateStmtScope` on every exit path.

use std::sync::Arc;

use sqlfront_core::ast::StatementNode;
use sqlfront_core::config::CompilerConfig;
use sqlfront_planner::{
    NameResolver, Optimizer, PlanError, Preprocessor, RuleOptimizer, StatementValidator, Validator,
};
use sqlfront_session::{
    SchemaProvider, SchemaVersionRecorder, SessionBinlogRecorder, SessionState, UpdateStmtScope,
};
use tracing::{debug, debug_span, warn};

use crate::classify::statement_label;
use crate::error::{CompileError, Result, Stage};
use crate::metrics::{GlobalStatementCounter, MetricsSink, NoopMetrics};
use crate::resolve::resolve_schema;
use crate::statement::CompiledStatement;

/// Drives one statement through the stages. Holds no per-statement state,
/// so one compiler can serve every session concurrently.
pub struct Compiler {
    provider: Arc<dyn SchemaProvider>,
    preprocessor: Arc<dyn Preprocessor>,
    validator: Arc<dyn Validator>,
    optimizer: Arc<dyn Optimizer>,
    recorder: Arc<dyn SchemaVersionRecorder>,
    metrics: Arc<dyn MetricsSink>,
}

impl Compiler {
    /// Reference stages, binlog recording off, process-wide counter.
    pub fn new(provider: Arc<dyn SchemaProvider>) -> Self {
        Self {
            provider,
            preprocessor: Arc::new(NameResolver::new()),
            validator: Arc::new(StatementValidator::new()),
            optimizer: Arc::new(RuleOptimizer::new()),
            recorder: Arc::new(SessionBinlogRecorder::new(false)),
            metrics: Arc::new(GlobalStatementCounter),
        }
    }

    pub fn from_config(provider: Arc<dyn SchemaProvider>, cfg: &CompilerConfig) -> Self {
        let metrics: Arc<dyn MetricsSink> = if cfg.metrics_enabled {
            Arc::new(GlobalStatementCounter)
        } else {
            Arc::new(NoopMetrics)
        };
        Self::new(provider)
            .with_recorder(Arc::new(SessionBinlogRecorder::new(cfg.binlog_enabled)))
            .with_metrics(metrics)
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn Preprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_optimizer(mut self, optimizer: Arc<dyn Optimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn SchemaVersionRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Compile a statement for immediate execution.
    pub fn compile(
        &self,
        session: &mut SessionState,
        node: &mut StatementNode,
    ) -> Result<CompiledStatement> {
        self.run(session, node, false)
    }

    /// Compile the body of a PREPARE; parameter markers are allowed.
    pub fn compile_prepared(
        &self,
        session: &mut SessionState,
        node: &mut StatementNode,
    ) -> Result<CompiledStatement> {
        self.run(session, node, true)
    }

    fn run(
        &self,
        session: &mut SessionState,
        node: &mut StatementNode,
        in_prepare: bool,
    ) -> Result<CompiledStatement> {
        let label = statement_label(node.stmt());
        self.metrics.inc(label);

        let conn = session.connection_id();
        let _span = debug_span!("compile", conn = conn.get(), label).entered();

        let mut session = UpdateStmtScope::enter(session, node.stmt().is_update());

        let (schema, source) =
            resolve_schema(&mut session, self.provider.as_ref(), self.recorder.as_ref());
        debug!(?source, version = schema.schema_meta_version().get(), "schema resolved");

        let fail = |stage: Stage, e: PlanError| {
            warn!(%stage, error = %e, "compile failed");
            CompileError::at(stage, conn, e)
        };

        self.preprocessor
            .preprocess(node, &schema, &session)
            .map_err(|e| fail(Stage::Preprocess, e))?;
        debug!("preprocessed");

        // Validation rules depend on names resolved above.
        self.validator
            .validate(node, in_prepare)
            .map_err(|e| fail(Stage::Validate, e))?;
        debug!("validated");

        let plan = self
            .optimizer
            .optimize(&session, node, &schema)
            .map_err(|e| fail(Stage::Optimize, e))?;
        if plan.schema_version() != schema.schema_meta_version() {
            return Err(CompileError::Invariant {
                conn: conn.get(),
                schema: schema.schema_meta_version(),
                plan: plan.schema_version(),
            });
        }
        debug!(root = plan.program().root_key().unwrap_or("?"), "optimized");

        Ok(CompiledStatement::new(
            schema,
            plan,
            node.text().to_string(),
            node.is_ddl(),
            label,
        ))
    }
}
