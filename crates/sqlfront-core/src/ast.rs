//! Parsed statement nodes.
//!
//! A `StatementNode` is produced by an external parser and handed to the
//! compiler read-only, except for the `resolved` annotations on
//! `TableName`/`ColumnRef` which the preprocessor fills in during name
//! resolution.
//!
//! The serde representation is what the YAML loaders accept:
//! `Statement` is tagged by `kind`, everything else uses serde's default
//! external tagging with snake_case variant names.

use serde::{Deserialize, Serialize};

use crate::id::TableId;
use crate::schema::{ColumnSpec, DataType};

/// One parsed SQL statement plus its literal source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementNode {
    pub text: String,
    pub stmt: Statement,
}

impl StatementNode {
    pub fn new(text: impl Into<String>, stmt: Statement) -> Self {
        Self {
            text: text.into(),
            stmt,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn stmt(&self) -> &Statement {
        &self.stmt
    }

    pub fn stmt_mut(&mut self) -> &mut Statement {
        &mut self.stmt
    }

    pub fn is_ddl(&self) -> bool {
        self.stmt.is_ddl()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    AlterTable(AlterTableStmt),
    AnalyzeTable(AnalyzeTableStmt),
    Begin(BeginStmt),
    Commit,
    CreateDatabase(CreateDatabaseStmt),
    CreateIndex(CreateIndexStmt),
    CreateTable(CreateTableStmt),
    CreateUser(CreateUserStmt),
    Deallocate(DeallocateStmt),
    Delete(DeleteStmt),
    Do(DoStmt),
    DropDatabase(DropDatabaseStmt),
    DropIndex(DropIndexStmt),
    DropTable(DropTableStmt),
    DropUser(DropUserStmt),
    Execute(ExecuteStmt),
    Explain(ExplainStmt),
    FlushTable(FlushTableStmt),
    Grant(GrantStmt),
    Insert(InsertStmt),
    LoadData(LoadDataStmt),
    Prepare(PrepareStmt),
    Rollback,
    Select(SelectStmt),
    SetPassword(SetPwdStmt),
    Show(ShowStmt),
    TruncateTable(TruncateTableStmt),
    Update(UpdateStmt),
    Union(UnionStmt),
    Use(UseStmt),
    Set(SetStmt),
}

impl Statement {
    /// Type-tag check for data-definition statements.
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            Statement::AlterTable(_)
                | Statement::CreateDatabase(_)
                | Statement::CreateIndex(_)
                | Statement::CreateTable(_)
                | Statement::DropDatabase(_)
                | Statement::DropIndex(_)
                | Statement::DropTable(_)
                | Statement::TruncateTable(_)
        )
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Statement::Update(_))
    }
}

// ----- names -----

/// Annotation written by name resolution on a table reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTable {
    pub db: String,
    pub table_id: TableId,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableName {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedTable>,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            resolved: None,
        }
    }

    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
            resolved: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnName {
    #[serde(default)]
    pub table: Option<String>,
    pub name: String,
}

impl ColumnName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ColumnName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{t}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Annotation written by name resolution on a column reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    /// Visible name of the source the column came from (alias or table name).
    pub source: String,
    pub offset: usize,
    pub data_type: DataType,
    pub nullable: bool,
    /// 0 for the innermost scope; >0 for a correlated outer reference.
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: ColumnName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedColumn>,
}

impl ColumnRef {
    pub fn new(name: ColumnName) -> Self {
        Self {
            name,
            resolved: None,
        }
    }
}

// ----- expressions -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Unknown,
            Value::Bool(_) => DataType::Boolean,
            Value::Int(_) => DataType::Int64,
            Value::Float(_) => DataType::Float64,
            Value::Str(_) => DataType::Utf8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Plus,
    Minus,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Column(ColumnRef),
    Literal(Value),
    /// `?` placeholder; only legal inside a prepared statement.
    ParamMarker(u32),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        #[serde(default)]
        negated: bool,
    },
    Func {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Subquery(Box<SelectStmt>),
    Exists(Box<SelectStmt>),
}

impl Expr {
    pub fn col(name: &str) -> Expr {
        match name.split_once('.') {
            Some((t, c)) => Expr::Column(ColumnRef::new(ColumnName::qualified(t, c))),
            None => Expr::Column(ColumnRef::new(ColumnName::new(name))),
        }
    }

    pub fn int(v: i64) -> Expr {
        Expr::Literal(Value::Int(v))
    }

    pub fn str(v: &str) -> Expr {
        Expr::Literal(Value::Str(v.to_string()))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::Eq, left, right)
    }

    /// True for aggregate function calls (`count`, `sum`, ...).
    pub fn is_aggregate_call(&self) -> bool {
        match self {
            Expr::Func { name, .. } => matches!(
                name.to_ascii_lowercase().as_str(),
                "count" | "sum" | "avg" | "min" | "max"
            ),
            _ => false,
        }
    }

    /// True if this expression or any child contains an aggregate call.
    /// Subqueries are opaque.
    pub fn contains_aggregate(&self) -> bool {
        if self.is_aggregate_call() {
            return true;
        }
        match self {
            Expr::Binary { left, right, .. } => left.contains_aggregate() || right.contains_aggregate(),
            Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => expr.contains_aggregate(),
            Expr::Func { args, .. } => args.iter().any(Expr::contains_aggregate),
            _ => false,
        }
    }
}

// ----- select -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectField {
    /// `*` or `t.*`.
    Wildcard {
        #[serde(default)]
        table: Option<String>,
    },
    Expr {
        expr: Expr,
        #[serde(default)]
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByItem {
    pub expr: Expr,
    #[serde(default)]
    pub desc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub count: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Cross,
}

/// The FROM clause: a (possibly nested) join tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRefsClause {
    pub table_refs: Join,
}

impl TableRefsClause {
    /// FROM a single base table.
    pub fn table(name: TableName) -> Self {
        Self {
            table_refs: Join {
                left: ResultSetNode::TableSource(TableSource {
                    source: TableSourceKind::Table(name),
                    as_name: None,
                }),
                right: None,
                join_type: JoinType::Inner,
                on: None,
            },
        }
    }
}

/// A binary join. `right == None` means the clause has a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub left: ResultSetNode,
    #[serde(default)]
    pub right: Option<ResultSetNode>,
    #[serde(default)]
    pub join_type: JoinType,
    #[serde(default)]
    pub on: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSetNode {
    TableSource(TableSource),
    Join(Box<Join>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSource {
    pub source: TableSourceKind,
    #[serde(default)]
    pub as_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSourceKind {
    Table(TableName),
    Select(Box<SelectStmt>),
    Union(Box<UnionStmt>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectStmt {
    pub distinct: bool,
    pub fields: Vec<SelectField>,
    pub from: Option<TableRefsClause>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<ByItem>,
    pub limit: Option<Limit>,
    pub for_update: bool,
}

impl SelectStmt {
    /// `SELECT * FROM <table>`.
    pub fn star_from(table: TableName) -> Self {
        Self {
            fields: vec![SelectField::Wildcard { table: None }],
            from: Some(TableRefsClause::table(table)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnionStmt {
    pub distinct: bool,
    pub selects: Vec<SelectStmt>,
    pub order_by: Vec<ByItem>,
    pub limit: Option<Limit>,
}

// ----- DML -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: ColumnRef,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Select(Box<SelectStmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStmt {
    #[serde(default)]
    pub is_replace: bool,
    #[serde(default)]
    pub ignore: bool,
    pub table: TableName,
    #[serde(default)]
    pub columns: Vec<ColumnName>,
    pub source: InsertSource,
    #[serde(default)]
    pub on_duplicate: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStmt {
    pub table_refs: TableRefsClause,
    pub set: Vec<Assignment>,
    #[serde(default)]
    pub where_clause: Option<Expr>,
    #[serde(default)]
    pub order_by: Vec<ByItem>,
    #[serde(default)]
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStmt {
    pub table_refs: TableRefsClause,
    #[serde(default)]
    pub where_clause: Option<Expr>,
    #[serde(default)]
    pub order_by: Vec<ByItem>,
    #[serde(default)]
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDataStmt {
    pub path: String,
    pub table: TableName,
    #[serde(default)]
    pub columns: Vec<ColumnName>,
    #[serde(default)]
    pub is_local: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoStmt {
    pub exprs: Vec<Expr>,
}

// ----- DDL -----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    #[serde(default = "yes")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
}

fn yes() -> bool {
    true
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            unique: false,
        }
    }

    pub fn to_spec(&self) -> ColumnSpec {
        ColumnSpec::new(
            self.name.clone(),
            self.data_type.clone(),
            self.nullable && !self.primary_key,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Index,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDatabaseStmt {
    pub name: String,
    #[serde(default)]
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropDatabaseStmt {
    pub name: String,
    #[serde(default)]
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableStmt {
    pub table: TableName,
    #[serde(default)]
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTableStmt {
    pub tables: Vec<TableName>,
    #[serde(default)]
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncateTableStmt {
    pub table: TableName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIndexStmt {
    pub name: String,
    pub table: TableName,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropIndexStmt {
    pub name: String,
    pub table: TableName,
    #[serde(default)]
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlterTableSpec {
    AddColumn(ColumnDef),
    DropColumn { name: String },
    RenameTable { new_name: TableName },
    AddConstraint(Constraint),
    DropIndex { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterTableStmt {
    pub table: TableName,
    pub specs: Vec<AlterTableSpec>,
}

// ----- admin / session -----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeTableStmt {
    pub tables: Vec<TableName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user: String,
    #[serde(default = "any_host")]
    pub host: String,
}

fn any_host() -> String {
    "%".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub user: UserIdentity,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserStmt {
    #[serde(default)]
    pub if_not_exists: bool,
    pub users: Vec<UserSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropUserStmt {
    #[serde(default)]
    pub if_exists: bool,
    pub users: Vec<UserIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantStmt {
    pub privileges: Vec<String>,
    /// `db.table`, `db.*` or `*.*`.
    pub level: String,
    pub users: Vec<UserSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPwdStmt {
    #[serde(default)]
    pub user: Option<UserIdentity>,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushTableStmt {
    #[serde(default)]
    pub tables: Vec<TableName>,
    #[serde(default)]
    pub no_write_to_binlog: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowTarget {
    Databases,
    Tables,
    Columns,
    Index,
    CreateTable,
    Variables,
    Status,
    Warnings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowStmt {
    pub target: ShowTarget,
    #[serde(default)]
    pub db: Option<String>,
    #[serde(default)]
    pub table: Option<TableName>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeginStmt {
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareStmt {
    pub name: String,
    #[serde(default)]
    pub sql_text: Option<String>,
    #[serde(default)]
    pub sql_var: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteStmt {
    pub name: String,
    #[serde(default)]
    pub using_vars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeallocateStmt {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainStmt {
    pub stmt: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseStmt {
    pub db: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableAssignment {
    pub name: String,
    pub value: Expr,
    #[serde(default)]
    pub is_global: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetStmt {
    pub variables: Vec<VariableAssignment>,
}
