//! Classification labels for every statement kind.

use sqlfront_core::ast::*;
use sqlfront_core::schema::DataType;
use sqlfront_exec::{statement_label, UNKNOWN_LABEL};

fn table_source(source: TableSourceKind, alias: Option<&str>) -> ResultSetNode {
    ResultSetNode::TableSource(TableSource {
        source,
        as_name: alias.map(str::to_string),
    })
}

fn select_from(refs: Join) -> Statement {
    Statement::Select(SelectStmt {
        fields: vec![SelectField::Wildcard { table: None }],
        from: Some(TableRefsClause { table_refs: refs }),
        ..Default::default()
    })
}

fn single(source: ResultSetNode) -> Join {
    Join {
        left: source,
        right: None,
        join_type: JoinType::Inner,
        on: None,
    }
}

#[test]
fn test_ddl_labels() {
    let t = TableName::new("t");
    let cases = vec![
        (
            Statement::AlterTable(AlterTableStmt {
                table: t.clone(),
                specs: vec![AlterTableSpec::DropColumn { name: "a".into() }],
            }),
            "AlterTable",
        ),
        (
            Statement::CreateDatabase(CreateDatabaseStmt {
                name: "d".into(),
                if_not_exists: false,
            }),
            "CreateDatabase",
        ),
        (
            Statement::CreateIndex(CreateIndexStmt {
                name: "k".into(),
                table: t.clone(),
                columns: vec!["a".into()],
                unique: false,
            }),
            "CreateIndex",
        ),
        (
            Statement::CreateTable(CreateTableStmt {
                table: t.clone(),
                if_not_exists: false,
                columns: vec![ColumnDef::new("a", DataType::Int64)],
                constraints: vec![],
            }),
            "CreateTable",
        ),
        (
            Statement::DropDatabase(DropDatabaseStmt {
                name: "d".into(),
                if_exists: true,
            }),
            "DropDatabase",
        ),
        (
            Statement::DropIndex(DropIndexStmt {
                name: "k".into(),
                table: t.clone(),
                if_exists: false,
            }),
            "DropIndex",
        ),
        (
            Statement::DropTable(DropTableStmt {
                tables: vec![t.clone()],
                if_exists: false,
            }),
            "DropTable",
        ),
        (
            Statement::TruncateTable(TruncateTableStmt { table: t }),
            "TruncateTable",
        ),
    ];

    for (stmt, label) in cases {
        assert!(stmt.is_ddl(), "{label} should be DDL");
        assert_eq!(statement_label(&stmt), label);
    }
}

#[test]
fn test_admin_and_session_labels() {
    let user = UserIdentity {
        user: "bob".into(),
        host: "%".into(),
    };
    let cases = vec![
        (
            Statement::AnalyzeTable(AnalyzeTableStmt {
                tables: vec![TableName::new("t")],
            }),
            "AnalyzeTable",
        ),
        (Statement::Begin(BeginStmt::default()), "Begin"),
        (Statement::Commit, "Commit"),
        (Statement::Rollback, "Rollback"),
        (
            Statement::CreateUser(CreateUserStmt {
                if_not_exists: false,
                users: vec![UserSpec {
                    user: user.clone(),
                    password: None,
                }],
            }),
            "CreateUser",
        ),
        (
            Statement::DropUser(DropUserStmt {
                if_exists: false,
                users: vec![user.clone()],
            }),
            "DropUser",
        ),
        (
            Statement::Grant(GrantStmt {
                privileges: vec!["SELECT".into()],
                level: "test.*".into(),
                users: vec![],
            }),
            "Grant",
        ),
        (
            Statement::SetPassword(SetPwdStmt {
                user: Some(user),
                password: "secret".into(),
            }),
            "SetPwd",
        ),
        (
            Statement::FlushTable(FlushTableStmt {
                tables: vec![],
                no_write_to_binlog: false,
            }),
            "FlushTable",
        ),
        (
            Statement::Show(ShowStmt {
                target: ShowTarget::Tables,
                db: None,
                table: None,
                pattern: None,
                full: false,
            }),
            "Show",
        ),
        (
            Statement::Prepare(PrepareStmt {
                name: "s".into(),
                sql_text: Some("SELECT ?".into()),
                sql_var: None,
            }),
            "Prepare",
        ),
        (
            Statement::Execute(ExecuteStmt {
                name: "s".into(),
                using_vars: vec![],
            }),
            "Execute",
        ),
        (
            Statement::Deallocate(DeallocateStmt { name: "s".into() }),
            "Deallocate",
        ),
        (
            Statement::Do(DoStmt {
                exprs: vec![Expr::int(1)],
            }),
            "Do",
        ),
        (
            Statement::LoadData(LoadDataStmt {
                path: "/tmp/x.csv".into(),
                table: TableName::new("t"),
                columns: vec![],
                is_local: true,
            }),
            "LoadData",
        ),
        (
            Statement::Explain(ExplainStmt {
                stmt: Box::new(Statement::Commit),
            }),
            "Explain",
        ),
    ];

    for (stmt, label) in cases {
        assert_eq!(statement_label(&stmt), label);
    }
}

#[test]
fn test_dml_labels() {
    let insert = InsertStmt {
        is_replace: false,
        ignore: false,
        table: TableName::new("t"),
        columns: vec![],
        source: InsertSource::Values(vec![vec![Expr::int(1)]]),
        on_duplicate: vec![],
    };
    assert_eq!(statement_label(&Statement::Insert(insert.clone())), "Insert");
    assert_eq!(
        statement_label(&Statement::Insert(InsertStmt {
            is_replace: true,
            ..insert
        })),
        "Replace"
    );

    let refs = TableRefsClause::table(TableName::new("t"));
    assert_eq!(
        statement_label(&Statement::Delete(DeleteStmt {
            table_refs: refs.clone(),
            where_clause: None,
            order_by: vec![],
            limit: None,
        })),
        "Delete"
    );
    assert_eq!(
        statement_label(&Statement::Update(UpdateStmt {
            table_refs: refs,
            set: vec![],
            where_clause: None,
            order_by: vec![],
            limit: None,
        })),
        "Update"
    );
}

#[test]
fn test_select_simple_forms() {
    assert_eq!(
        statement_label(&Statement::Select(SelectStmt::default())),
        "Select-Simple"
    );

    let plain = select_from(single(table_source(
        TableSourceKind::Table(TableName::new("t")),
        None,
    )));
    assert_eq!(statement_label(&plain), "Select-Simple");

    let aliased = select_from(single(table_source(
        TableSourceKind::Table(TableName::qualified("test", "t")),
        Some("x"),
    )));
    assert_eq!(statement_label(&aliased), "Select-Simple");
}

#[test]
fn test_select_complex_forms() {
    let join = select_from(Join {
        left: table_source(TableSourceKind::Table(TableName::new("t")), None),
        right: Some(table_source(TableSourceKind::Table(TableName::new("u")), None)),
        join_type: JoinType::Left,
        on: Some(Expr::eq(Expr::col("t.id"), Expr::col("u.t_id"))),
    });
    assert_eq!(statement_label(&join), "Select-Complex");

    let derived = select_from(single(table_source(
        TableSourceKind::Select(Box::new(SelectStmt::default())),
        Some("d"),
    )));
    assert_eq!(statement_label(&derived), "Select-Complex");

    let nested = select_from(single(ResultSetNode::Join(Box::new(single(table_source(
        TableSourceKind::Table(TableName::new("t")),
        None,
    ))))));
    assert_eq!(statement_label(&nested), "Select-Complex");
}

#[test]
fn test_unlabeled_kinds_fall_back_to_unknown() {
    let union = Statement::Union(UnionStmt {
        selects: vec![SelectStmt::default(), SelectStmt::default()],
        ..Default::default()
    });
    let use_db = Statement::Use(UseStmt { db: "test".into() });
    let set = Statement::Set(SetStmt {
        variables: vec![VariableAssignment {
            name: "autocommit".into(),
            value: Expr::int(1),
            is_global: false,
        }],
    });

    for stmt in [union, use_db, set] {
        assert_eq!(statement_label(&stmt), UNKNOWN_LABEL);
    }
    assert_eq!(UNKNOWN_LABEL, "unknown");
}
