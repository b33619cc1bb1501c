//! Shared fixtures: a small catalog, statement builders and stub stages.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sqlfront_core::ast::{
    ColumnDef, CreateTableStmt, Expr, SelectStmt, Statement, StatementNode, TableName,
    TableRefsClause, UpdateStmt,
};
use sqlfront_core::id::{ConnectionId, SchemaVersion};
use sqlfront_core::plan::LogicalPlan;
use sqlfront_core::schema::{DataType, InfoSchema, Schema};
use sqlfront_exec::MetricsSink;
use sqlfront_planner::{
    lower_to_physical, parse_yaml_catalog, Optimizer, Plan, PlanError, Preprocessor, Validator,
};
use sqlfront_session::{Domain, SchemaVersionRecorder, SessionState};

pub const CATALOG: &str = r#"
version: 1
databases:
  - name: test
    tables:
      - name: t
        columns:
          - { name: id, type: Int64, nullable: false }
          - { name: name, type: Utf8 }
          - { name: score, type: Float64 }
        indexes:
          - { name: PRIMARY, columns: [id], primary: true }
      - name: u
        columns:
          - { name: id, type: Int64, nullable: false }
          - { name: t_id, type: Int64 }
"#;

pub fn catalog() -> InfoSchema {
    parse_yaml_catalog(CATALOG).expect("fixture catalog")
}

pub fn domain() -> Arc<Domain> {
    Arc::new(Domain::with_schema(catalog(), 8))
}

pub fn session() -> SessionState {
    let mut s = SessionState::new(ConnectionId::new(42));
    s.set_current_db("test");
    s
}

pub fn select_star(table: &str) -> StatementNode {
    StatementNode::new(
        format!("SELECT * FROM {table}"),
        Statement::Select(SelectStmt::star_from(TableName::new(table))),
    )
}

pub fn update_t() -> StatementNode {
    StatementNode::new(
        "UPDATE t SET score = 1 WHERE id = 1",
        Statement::Update(UpdateStmt {
            table_refs: TableRefsClause::table(TableName::new("t")),
            set: vec![sqlfront_core::ast::Assignment {
                column: sqlfront_core::ast::ColumnRef::new(sqlfront_core::ast::ColumnName::new(
                    "score",
                )),
                expr: Expr::int(1),
            }],
            where_clause: Some(Expr::eq(Expr::col("id"), Expr::int(1))),
            order_by: vec![],
            limit: None,
        }),
    )
}

pub fn create_table(name: &str) -> StatementNode {
    let mut id = ColumnDef::new("id", DataType::Int64);
    id.primary_key = true;
    StatementNode::new(
        format!("CREATE TABLE {name} (id BIGINT PRIMARY KEY, v TEXT)"),
        Statement::CreateTable(CreateTableStmt {
            table: TableName::new(name),
            if_not_exists: false,
            columns: vec![id, ColumnDef::new("v", DataType::Utf8)],
            constraints: vec![],
        }),
    )
}

/// Counts calls and remembers the versions it was handed.
#[derive(Default)]
pub struct CountingRecorder {
    pub versions: Mutex<Vec<SchemaVersion>>,
}

impl CountingRecorder {
    pub fn calls(&self) -> usize {
        self.versions.lock().unwrap().len()
    }
}

impl SchemaVersionRecorder for CountingRecorder {
    fn record_schema_version(&self, _session: &mut SessionState, version: SchemaVersion) {
        self.versions.lock().unwrap().push(version);
    }
}

/// Records the labels it was asked to count.
#[derive(Default)]
pub struct RecordingMetrics {
    pub labels: Mutex<Vec<&'static str>>,
}

impl MetricsSink for RecordingMetrics {
    fn inc(&self, label: &'static str) {
        self.labels.lock().unwrap().push(label);
    }
}

/// Preprocessor that records the update flag it observed and optionally fails.
#[derive(Default)]
pub struct StubPreprocessor {
    pub calls: AtomicUsize,
    pub saw_update_flag: Mutex<Option<bool>>,
    pub fail: bool,
}

impl StubPreprocessor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

impl Preprocessor for StubPreprocessor {
    fn preprocess(
        &self,
        _node: &mut StatementNode,
        _schema: &InfoSchema,
        session: &SessionState,
    ) -> Result<(), PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.saw_update_flag.lock().unwrap() = Some(session.in_update_stmt());
        if self.fail {
            return Err(PlanError::UnknownTable {
                db: "test".into(),
                table: "missing".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct StubValidator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl Validator for StubValidator {
    fn validate(&self, _node: &StatementNode, _in_prepare: bool) -> Result<(), PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PlanError::Validation("stub".into()));
        }
        Ok(())
    }
}

/// Optimizer returning a one-node plan; `version_skew` binds it to the
/// wrong schema version.
#[derive(Default)]
pub struct StubOptimizer {
    pub calls: AtomicUsize,
    pub version_skew: u64,
}

impl Optimizer for StubOptimizer {
    fn optimize(
        &self,
        _session: &SessionState,
        _node: &StatementNode,
        schema: &InfoSchema,
    ) -> Result<Plan, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let logical = LogicalPlan::Dual {
            schema: Schema::empty(),
        };
        let program = lower_to_physical(&logical);
        let version = SchemaVersion::new(schema.schema_meta_version().get() + self.version_skew);
        Ok(Plan::new(version, logical, program))
    }
}
