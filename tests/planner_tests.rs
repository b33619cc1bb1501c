//! Reference stages end to end: name resolution, validation, optimization.

mod common;

use common::*;
use sqlfront_core::ast::*;
use sqlfront_core::id::SchemaVersion;
use sqlfront_core::schema::InfoSchema;
use sqlfront_planner::{
    NameResolver, Optimizer, Plan, PlanError, Preprocessor, RuleOptimizer, StatementValidator,
    Validator,
};

fn run(node: &mut StatementNode, optimizer: &RuleOptimizer) -> Result<Plan, PlanError> {
    let schema: InfoSchema = catalog();
    let session = session();
    NameResolver.preprocess(node, &schema, &session)?;
    StatementValidator::new().validate(node, false)?;
    optimizer.optimize(&session, node, &schema)
}

fn select(fields: Vec<SelectField>, from: TableRefsClause, where_clause: Option<Expr>) -> StatementNode {
    StatementNode::new(
        "SELECT ...",
        Statement::Select(SelectStmt {
            fields,
            from: Some(from),
            where_clause,
            ..Default::default()
        }),
    )
}

fn field(name: &str) -> SelectField {
    SelectField::Expr {
        expr: Expr::col(name),
        alias: None,
    }
}

fn join_t_u(on: Option<Expr>) -> TableRefsClause {
    let mut from = TableRefsClause::table(TableName::new("t"));
    from.table_refs.right = Some(ResultSetNode::TableSource(TableSource {
        source: TableSourceKind::Table(TableName::new("u")),
        as_name: None,
    }));
    from.table_refs.on = on;
    from
}

fn insert(columns: &[&str], rows: Vec<Vec<Expr>>) -> StatementNode {
    StatementNode::new(
        "INSERT ...",
        Statement::Insert(InsertStmt {
            is_replace: false,
            ignore: false,
            table: TableName::new("t"),
            columns: columns.iter().map(|c| ColumnName::new(*c)).collect(),
            source: InsertSource::Values(rows),
            on_duplicate: vec![],
        }),
    )
}

#[test]
fn test_unknown_column_is_reported() {
    let mut node = select(
        vec![field("nope")],
        TableRefsClause::table(TableName::new("t")),
        None,
    );
    let err = run(&mut node, &RuleOptimizer::new()).unwrap_err();
    assert!(matches!(err, PlanError::UnknownColumn { column, .. } if column == "nope"));
}

#[test]
fn test_unqualified_column_in_both_join_sides_is_ambiguous() {
    let mut node = select(vec![field("id")], join_t_u(None), None);
    let err = run(&mut node, &RuleOptimizer::new()).unwrap_err();
    assert!(matches!(err, PlanError::AmbiguousColumn(_)));
}

#[test]
fn test_self_join_without_alias_is_rejected() {
    let mut from = TableRefsClause::table(TableName::new("t"));
    from.table_refs.right = Some(ResultSetNode::TableSource(TableSource {
        source: TableSourceKind::Table(TableName::new("t")),
        as_name: None,
    }));
    let mut node = select(vec![SelectField::Wildcard { table: None }], from, None);
    let err = run(&mut node, &RuleOptimizer::new()).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateAlias(name) if name == "t"));
}

#[test]
fn test_drop_missing_table_honors_if_exists() {
    let drop = |if_exists| {
        StatementNode::new(
            "DROP TABLE gone",
            Statement::DropTable(DropTableStmt {
                tables: vec![TableName::new("gone")],
                if_exists,
            }),
        )
    };
    let err = run(&mut drop(false), &RuleOptimizer::new()).unwrap_err();
    assert!(matches!(err, PlanError::UnknownTable { .. }));

    let plan = run(&mut drop(true), &RuleOptimizer::new()).unwrap();
    assert_eq!(plan.program().root_key(), Some("ddl"));
}

#[test]
fn test_create_existing_database_fails() {
    let mut node = StatementNode::new(
        "CREATE DATABASE test",
        Statement::CreateDatabase(CreateDatabaseStmt {
            name: "test".into(),
            if_not_exists: false,
        }),
    );
    let err = run(&mut node, &RuleOptimizer::new()).unwrap_err();
    assert!(matches!(err, PlanError::DatabaseExists(db) if db == "test"));
}

#[test]
fn test_insert_row_width_must_match_columns() {
    let mut ok = insert(&["id", "name"], vec![vec![Expr::int(1), Expr::str("a")]]);
    let plan = run(&mut ok, &RuleOptimizer::new()).unwrap();
    assert_eq!(plan.program().root_key(), Some("insert"));

    let mut short = insert(&["id", "name"], vec![vec![Expr::int(1)]]);
    let err = run(&mut short, &RuleOptimizer::new()).unwrap_err();
    assert!(matches!(err, PlanError::Validation(msg) if msg.contains("column count")));

    // Without a column list every table column needs a value.
    let mut implicit = insert(&[], vec![vec![Expr::int(1), Expr::str("a")]]);
    assert!(run(&mut implicit, &RuleOptimizer::new()).is_err());
}

#[test]
fn test_aggregate_in_where_is_rejected() {
    let count = Expr::Func {
        name: "count".into(),
        args: vec![Expr::col("id")],
    };
    let mut node = select(
        vec![field("id")],
        TableRefsClause::table(TableName::new("t")),
        Some(Expr::binary(BinaryOp::Gt, count, Expr::int(1))),
    );
    let err = run(&mut node, &RuleOptimizer::new()).unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));
}

#[test]
fn test_filter_moves_into_scan() {
    let pred = Some(Expr::eq(Expr::col("id"), Expr::int(1)));
    let mut a = select(vec![field("name")], TableRefsClause::table(TableName::new("t")), pred.clone());
    let mut b = a.clone();

    let pushed = run(&mut a, &RuleOptimizer::new()).unwrap();
    assert!(!pushed.explain().contains("selection"));
    assert!(pushed.explain().contains("table_scan"));

    let kept = run(&mut b, &RuleOptimizer::without_rewrites()).unwrap();
    assert!(kept.explain().contains("selection"));
    assert_eq!(pushed.schema_version(), SchemaVersion::new(1));
}

#[test]
fn test_join_strategy_follows_on_clause() {
    let equi = Some(Expr::eq(Expr::col("t.id"), Expr::col("u.t_id")));
    let mut node = select(vec![field("t.name")], join_t_u(equi), None);
    let plan = run(&mut node, &RuleOptimizer::new()).unwrap();
    assert!(plan.explain().contains("hash_join"));

    let mut cross = select(vec![field("t.name")], join_t_u(None), None);
    let plan = run(&mut cross, &RuleOptimizer::new()).unwrap();
    assert!(plan.explain().contains("nested_loop_join"));
}

#[test]
fn test_optimize_requires_resolution() {
    let node = select_star("t");
    let err = RuleOptimizer::new()
        .optimize(&session(), &node, &catalog())
        .unwrap_err();
    assert!(matches!(err, PlanError::Unresolved(_)));
}
