//! Name resolution against a schema snapshot.
//!
//! `NameResolver` walks a statement and writes `ResolvedTable` /
//! `ResolvedColumn` annotations in place. Column lookups go through a chain
//! of scopes (outermost first) so correlated subqueries can see the columns
//! of enclosing SELECTs. DDL statements get their existence preconditions
//! checked here, honoring `IF [NOT] EXISTS`.

use sqlfront_core::ast::{
    AlterTableSpec, Assignment, ColumnRef, Expr, Join, ResolvedColumn, ResolvedTable,
    ResultSetNode, SelectField, SelectStmt, Statement, StatementNode, TableName,
    TableSourceKind, UnionStmt,
};
use sqlfront_core::schema::{DataType, InfoSchema, TableInfo};
use sqlfront_session::SessionState;
use tracing::trace;

use crate::error::{PlanError, Result};
use crate::traits::Preprocessor;

/// Reference `Preprocessor`: binds names, checks DDL preconditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl NameResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Preprocessor for NameResolver {
    fn preprocess(
        &self,
        node: &mut StatementNode,
        schema: &InfoSchema,
        session: &SessionState,
    ) -> Result<()> {
        let resolver = Resolver {
            schema,
            current_db: session.current_db(),
        };
        resolver.statement(node.stmt_mut())?;
        trace!(conn = %session.connection_id(), "names resolved");
        Ok(())
    }
}

/// One output column of a row source.
#[derive(Debug, Clone)]
struct OutCol {
    name: String,
    data_type: DataType,
    nullable: bool,
}

/// A named row source visible in a FROM scope.
#[derive(Debug, Clone)]
struct Source {
    name: String,
    columns: Vec<OutCol>,
}

type Scope = Vec<Source>;

struct Resolver<'a> {
    schema: &'a InfoSchema,
    current_db: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    fn statement(&self, stmt: &mut Statement) -> Result<()> {
        match stmt {
            Statement::Select(s) => self.select(s, &[]).map(|_| ()),
            Statement::Union(u) => self.union(u, &[]).map(|_| ()),
            Statement::Insert(ins) => {
                let info = self.table(&mut ins.table)?;
                for c in &ins.columns {
                    if info.column(&c.name).is_none() {
                        return Err(PlanError::UnknownColumn {
                            column: c.to_string(),
                            context: "field list",
                        });
                    }
                }
                match &mut ins.source {
                    sqlfront_core::ast::InsertSource::Values(rows) => {
                        for row in rows {
                            for e in row {
                                self.expr(e, &[], None, "field list")?;
                            }
                        }
                    }
                    sqlfront_core::ast::InsertSource::Select(sel) => {
                        self.select(sel, &[])?;
                    }
                }
                let scope = vec![vec![table_source(&ins.table.name, info)]];
                self.assignments(&mut ins.on_duplicate, &scope)
            }
            Statement::Update(up) => {
                let scope = vec![self.join(&mut up.table_refs.table_refs, &[])?];
                self.assignments(&mut up.set, &scope)?;
                if let Some(w) = &mut up.where_clause {
                    self.expr(w, &scope, None, "where clause")?;
                }
                for by in &mut up.order_by {
                    self.expr(&mut by.expr, &scope, None, "order clause")?;
                }
                Ok(())
            }
            Statement::Delete(del) => {
                let scope = vec![self.join(&mut del.table_refs.table_refs, &[])?];
                if let Some(w) = &mut del.where_clause {
                    self.expr(w, &scope, None, "where clause")?;
                }
                for by in &mut del.order_by {
                    self.expr(&mut by.expr, &scope, None, "order clause")?;
                }
                Ok(())
            }
            Statement::LoadData(load) => {
                let info = self.table(&mut load.table)?;
                match load.columns.iter().find(|c| info.column(&c.name).is_none()) {
                    Some(c) => Err(PlanError::UnknownColumn {
                        column: c.to_string(),
                        context: "field list",
                    }),
                    None => Ok(()),
                }
            }
            Statement::Do(d) => {
                for e in &mut d.exprs {
                    self.expr(e, &[], None, "field list")?;
                }
                Ok(())
            }
            Statement::Set(set) => {
                for v in &mut set.variables {
                    self.expr(&mut v.value, &[], None, "field list")?;
                }
                Ok(())
            }
            Statement::Explain(ex) => self.statement(&mut ex.stmt),

            Statement::CreateDatabase(c) => {
                if self.schema.database(&c.name).is_some() && !c.if_not_exists {
                    return Err(PlanError::DatabaseExists(c.name.clone()));
                }
                Ok(())
            }
            Statement::DropDatabase(d) => {
                if self.schema.database(&d.name).is_none() && !d.if_exists {
                    return Err(PlanError::UnknownDatabase(d.name.clone()));
                }
                Ok(())
            }
            Statement::Use(u) => match self.schema.database(&u.db) {
                Some(_) => Ok(()),
                None => Err(PlanError::UnknownDatabase(u.db.clone())),
            },
            Statement::CreateTable(c) => {
                let db = self.db_name(&c.table)?;
                let db_info = self
                    .schema
                    .database(db)
                    .ok_or_else(|| PlanError::UnknownDatabase(db.to_string()))?;
                if db_info.table(&c.table.name).is_some() && !c.if_not_exists {
                    return Err(PlanError::TableExists {
                        db: db_info.name.clone(),
                        table: c.table.name.clone(),
                    });
                }
                Ok(())
            }
            Statement::DropTable(d) => {
                for t in &mut d.tables {
                    match self.table(t) {
                        Ok(_) => {}
                        Err(PlanError::UnknownTable { .. }) if d.if_exists => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(())
            }
            Statement::TruncateTable(t) => self.table(&mut t.table).map(|_| ()),
            Statement::AlterTable(alter) => {
                let info = self.table(&mut alter.table)?;
                for spec in &alter.specs {
                    match spec {
                        AlterTableSpec::AddColumn(def) => {
                            if info.column(&def.name).is_some() {
                                return Err(PlanError::Validation(format!(
                                    "duplicate column name '{}'",
                                    def.name
                                )));
                            }
                        }
                        AlterTableSpec::DropColumn { name } => {
                            if info.column(name).is_none() {
                                return Err(PlanError::UnknownColumn {
                                    column: name.clone(),
                                    context: "table definition",
                                });
                            }
                        }
                        AlterTableSpec::DropIndex { name } => {
                            if info.index(name).is_none() {
                                return Err(PlanError::UnknownIndex {
                                    table: info.name.clone(),
                                    index: name.clone(),
                                });
                            }
                        }
                        AlterTableSpec::AddConstraint(cons) => {
                            if let Some(missing) =
                                cons.columns.iter().find(|c| info.column(c).is_none())
                            {
                                return Err(PlanError::UnknownColumn {
                                    column: missing.clone(),
                                    context: "table definition",
                                });
                            }
                        }
                        AlterTableSpec::RenameTable { new_name } => {
                            let db = self.db_name(new_name)?;
                            let db_info = self
                                .schema
                                .database(db)
                                .ok_or_else(|| PlanError::UnknownDatabase(db.to_string()))?;
                            if db_info.table(&new_name.name).is_some() {
                                return Err(PlanError::TableExists {
                                    db: db_info.name.clone(),
                                    table: new_name.name.clone(),
                                });
                            }
                        }
                    }
                }
                Ok(())
            }
            Statement::CreateIndex(ci) => {
                let info = self.table(&mut ci.table)?;
                if info.index(&ci.name).is_some() {
                    return Err(PlanError::Validation(format!(
                        "duplicate key name '{}'",
                        ci.name
                    )));
                }
                match ci.columns.iter().find(|c| info.column(c).is_none()) {
                    Some(c) => Err(PlanError::UnknownColumn {
                        column: c.clone(),
                        context: "key column",
                    }),
                    None => Ok(()),
                }
            }
            Statement::DropIndex(di) => {
                let info = self.table(&mut di.table)?;
                if info.index(&di.name).is_none() && !di.if_exists {
                    return Err(PlanError::UnknownIndex {
                        table: info.name.clone(),
                        index: di.name.clone(),
                    });
                }
                Ok(())
            }
            Statement::AnalyzeTable(a) => {
                for t in &mut a.tables {
                    self.table(t)?;
                }
                Ok(())
            }
            Statement::FlushTable(f) => {
                for t in &mut f.tables {
                    self.table(t)?;
                }
                Ok(())
            }
            Statement::Show(show) => {
                if let Some(db) = &show.db {
                    if self.schema.database(db).is_none() {
                        return Err(PlanError::UnknownDatabase(db.clone()));
                    }
                }
                if let Some(t) = &mut show.table {
                    self.table(t)?;
                }
                Ok(())
            }

            // Transaction control, accounts and prepared-statement plumbing
            // carry no schema names.
            Statement::Begin(_)
            | Statement::Commit
            | Statement::Rollback
            | Statement::CreateUser(_)
            | Statement::DropUser(_)
            | Statement::Grant(_)
            | Statement::SetPassword(_)
            | Statement::Prepare(_)
            | Statement::Execute(_)
            | Statement::Deallocate(_) => Ok(()),
        }
    }

    fn db_name<'n>(&self, t: &'n TableName) -> Result<&'n str>
    where
        'a: 'n,
    {
        t.schema
            .as_deref()
            .or(self.current_db)
            .ok_or(PlanError::NoDatabaseSelected)
    }

    /// Resolve a base table and annotate it.
    fn table(&self, t: &mut TableName) -> Result<&'a TableInfo> {
        let db = self.db_name(t)?.to_string();
        let db_info = self
            .schema
            .database(&db)
            .ok_or_else(|| PlanError::UnknownDatabase(db.clone()))?;
        let info = db_info.table(&t.name).ok_or_else(|| PlanError::UnknownTable {
            db: db_info.name.clone(),
            table: t.name.clone(),
        })?;
        t.resolved = Some(ResolvedTable {
            db: db_info.name.clone(),
            table_id: info.id,
            columns: info.columns.iter().map(|c| c.name.clone()).collect(),
        });
        Ok(info)
    }

    fn assignments(&self, list: &mut [Assignment], scope: &[Scope]) -> Result<()> {
        for a in list {
            self.column(&mut a.column, scope, None, "field list")?;
            self.expr(&mut a.expr, scope, None, "field list")?;
        }
        Ok(())
    }

    /// Resolve a FROM join tree into the scope it makes visible.
    fn join(&self, join: &mut Join, outer: &[Scope]) -> Result<Scope> {
        let mut scope = self.result_set(&mut join.left, outer)?;
        if let Some(right) = &mut join.right {
            for src in self.result_set(right, outer)? {
                if scope.iter().any(|s| s.name.eq_ignore_ascii_case(&src.name)) {
                    return Err(PlanError::DuplicateAlias(src.name));
                }
                scope.push(src);
            }
        }
        if let Some(on) = &mut join.on {
            let mut chain = outer.to_vec();
            chain.push(scope.clone());
            self.expr(on, &chain, None, "on clause")?;
        }
        Ok(scope)
    }

    fn result_set(&self, node: &mut ResultSetNode, outer: &[Scope]) -> Result<Scope> {
        match node {
            ResultSetNode::Join(j) => self.join(j, outer),
            ResultSetNode::TableSource(ts) => {
                let (default_name, columns) = match &mut ts.source {
                    TableSourceKind::Table(t) => {
                        let info = self.table(t)?;
                        (t.name.clone(), table_source(&t.name, info).columns)
                    }
                    // Derived tables cannot see the enclosing query.
                    TableSourceKind::Select(sel) => (String::new(), self.select(sel, &[])?),
                    TableSourceKind::Union(u) => (String::new(), self.union(u, &[])?),
                };
                let name = ts.as_name.clone().unwrap_or(default_name);
                Ok(vec![Source { name, columns }])
            }
        }
    }

    fn union(&self, u: &mut UnionStmt, outer: &[Scope]) -> Result<Vec<OutCol>> {
        let mut first: Option<Vec<OutCol>> = None;
        for s in &mut u.selects {
            let cols = self.select(s, outer)?;
            if first.is_none() {
                first = Some(cols);
            }
        }
        let cols = first.unwrap_or_default();
        let scope = vec![vec![Source {
            name: String::new(),
            columns: cols.clone(),
        }]];
        for by in &mut u.order_by {
            self.expr(&mut by.expr, &scope, None, "order clause")?;
        }
        Ok(cols)
    }

    /// Resolve a SELECT and return its output columns.
    fn select(&self, s: &mut SelectStmt, outer: &[Scope]) -> Result<Vec<OutCol>> {
        let scope = match &mut s.from {
            Some(from) => self.join(&mut from.table_refs, outer)?,
            None => Vec::new(),
        };
        let mut chain = outer.to_vec();
        chain.push(scope.clone());

        let mut out = Vec::new();
        for (i, field) in s.fields.iter_mut().enumerate() {
            match field {
                SelectField::Wildcard { table } => {
                    if scope.is_empty() {
                        return Err(PlanError::Validation("no tables used".into()));
                    }
                    let mut matched = false;
                    for src in &scope {
                        if table
                            .as_deref()
                            .map_or(true, |t| t.eq_ignore_ascii_case(&src.name))
                        {
                            matched = true;
                            out.extend(src.columns.iter().cloned());
                        }
                    }
                    if !matched {
                        return Err(PlanError::UnknownColumn {
                            column: format!("{}.*", table.as_deref().unwrap_or("")),
                            context: "field list",
                        });
                    }
                }
                SelectField::Expr { expr, alias } => {
                    self.expr(expr, &chain, None, "field list")?;
                    let name = alias.clone().unwrap_or_else(|| match &*expr {
                        Expr::Column(c) => c.name.name.clone(),
                        _ => format!("expr#{i}"),
                    });
                    out.push(OutCol {
                        name,
                        data_type: infer_type(expr),
                        nullable: true,
                    });
                }
            }
        }

        if let Some(w) = &mut s.where_clause {
            self.expr(w, &chain, None, "where clause")?;
        }
        for g in &mut s.group_by {
            self.expr(g, &chain, Some(out.as_slice()), "group statement")?;
        }
        if let Some(h) = &mut s.having {
            self.expr(h, &chain, Some(out.as_slice()), "having clause")?;
        }
        for by in &mut s.order_by {
            self.expr(&mut by.expr, &chain, Some(out.as_slice()), "order clause")?;
        }
        Ok(out)
    }

    fn expr(
        &self,
        e: &mut Expr,
        chain: &[Scope],
        aliases: Option<&[OutCol]>,
        context: &'static str,
    ) -> Result<()> {
        match e {
            Expr::Column(c) => self.column(c, chain, aliases, context),
            Expr::Literal(_) | Expr::ParamMarker(_) => Ok(()),
            Expr::Binary { left, right, .. } => {
                self.expr(left, chain, aliases, context)?;
                self.expr(right, chain, aliases, context)
            }
            Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => {
                self.expr(expr, chain, aliases, context)
            }
            Expr::Func { args, .. } => {
                for a in args {
                    self.expr(a, chain, aliases, context)?;
                }
                Ok(())
            }
            Expr::Subquery(sel) | Expr::Exists(sel) => self.select(sel, chain).map(|_| ()),
        }
    }

    fn column(
        &self,
        c: &mut ColumnRef,
        chain: &[Scope],
        aliases: Option<&[OutCol]>,
        context: &'static str,
    ) -> Result<()> {
        // Innermost scope first; depth counts how far out the match is.
        for (depth, scope) in chain.iter().rev().enumerate() {
            let mut found: Option<ResolvedColumn> = None;
            for src in scope {
                if let Some(q) = &c.name.table {
                    if !q.eq_ignore_ascii_case(&src.name) {
                        continue;
                    }
                }
                if let Some((offset, col)) = src
                    .columns
                    .iter()
                    .enumerate()
                    .find(|(_, col)| col.name.eq_ignore_ascii_case(&c.name.name))
                {
                    if found.is_some() {
                        return Err(PlanError::AmbiguousColumn(c.name.to_string()));
                    }
                    found = Some(ResolvedColumn {
                        source: src.name.clone(),
                        offset,
                        data_type: col.data_type.clone(),
                        nullable: col.nullable,
                        depth,
                    });
                }
            }
            if let Some(r) = found {
                c.resolved = Some(r);
                return Ok(());
            }
        }

        // GROUP BY / HAVING / ORDER BY may name a select-list alias.
        if c.name.table.is_none() {
            if let Some((offset, col)) = aliases.and_then(|list| {
                list.iter()
                    .enumerate()
                    .find(|(_, col)| col.name.eq_ignore_ascii_case(&c.name.name))
            }) {
                c.resolved = Some(ResolvedColumn {
                    source: String::new(),
                    offset,
                    data_type: col.data_type.clone(),
                    nullable: col.nullable,
                    depth: 0,
                });
                return Ok(());
            }
        }

        Err(PlanError::UnknownColumn {
            column: c.name.to_string(),
            context,
        })
    }
}

fn table_source(visible_name: &str, info: &TableInfo) -> Source {
    Source {
        name: visible_name.to_string(),
        columns: info
            .columns
            .iter()
            .map(|c| OutCol {
                name: c.name.clone(),
                data_type: c.data_type.clone(),
                nullable: c.nullable,
            })
            .collect(),
    }
}

/// Best-effort static type of a resolved expression.
pub(crate) fn infer_type(e: &Expr) -> DataType {
    match e {
        Expr::Column(c) => c
            .resolved
            .as_ref()
            .map_or(DataType::Unknown, |r| r.data_type.clone()),
        Expr::Literal(v) => v.data_type(),
        Expr::ParamMarker(_) | Expr::Subquery(_) => DataType::Unknown,
        Expr::Exists(_) | Expr::IsNull { .. } => DataType::Boolean,
        Expr::Binary { op, left, .. } => {
            if op.is_comparison() || op.is_logical() {
                DataType::Boolean
            } else {
                infer_type(left)
            }
        }
        Expr::Unary { op, expr } => match op {
            sqlfront_core::ast::UnaryOp::Not => DataType::Boolean,
            sqlfront_core::ast::UnaryOp::Neg => infer_type(expr),
        },
        Expr::Func { name, args } => match name.to_ascii_lowercase().as_str() {
            "count" => DataType::Int64,
            "avg" => DataType::Float64,
            _ => args.first().map_or(DataType::Unknown, infer_type),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfront_core::ast::{ColumnName, TableRefsClause};
    use sqlfront_core::id::{ConnectionId, SchemaVersion};
    use sqlfront_core::schema::{ColumnSpec, InfoSchemaBuilder};

    fn schema() -> InfoSchema {
        let mut b = InfoSchemaBuilder::new();
        b.add_database("test").unwrap();
        b.add_table(
            "test",
            "t",
            vec![
                ColumnSpec::new("id", DataType::Int64, false),
                ColumnSpec::new("v", DataType::Utf8, true),
            ],
        )
        .unwrap();
        b.build(SchemaVersion::new(1))
    }

    fn session() -> SessionState {
        let mut s = SessionState::new(ConnectionId::new(1));
        s.set_current_db("test");
        s
    }

    #[test]
    fn resolves_star_select_in_current_db() {
        let mut node = StatementNode::new(
            "SELECT * FROM t",
            Statement::Select(SelectStmt::star_from(TableName::new("t"))),
        );
        NameResolver.preprocess(&mut node, &schema(), &session()).unwrap();
        let Statement::Select(sel) = node.stmt() else { unreachable!() };
        let from = sel.from.as_ref().unwrap();
        let ResultSetNode::TableSource(ts) = &from.table_refs.left else { unreachable!() };
        let TableSourceKind::Table(t) = &ts.source else { unreachable!() };
        let resolved = t.resolved.as_ref().expect("annotated");
        assert_eq!(resolved.db, "test");
        assert_eq!(resolved.columns, vec!["id".to_string(), "v".to_string()]);
    }

    #[test]
    fn missing_current_db_is_reported() {
        let mut node = StatementNode::new(
            "SELECT * FROM t",
            Statement::Select(SelectStmt::star_from(TableName::new("t"))),
        );
        let err = NameResolver
            .preprocess(&mut node, &schema(), &SessionState::new(ConnectionId::new(2)))
            .unwrap_err();
        assert!(matches!(err, PlanError::NoDatabaseSelected));
    }

    #[test]
    fn order_by_may_use_select_alias() {
        let mut sel = SelectStmt {
            fields: vec![SelectField::Expr {
                expr: Expr::col("id"),
                alias: Some("k".into()),
            }],
            from: Some(TableRefsClause::table(TableName::new("t"))),
            ..Default::default()
        };
        sel.order_by.push(sqlfront_core::ast::ByItem {
            expr: Expr::Column(ColumnRef::new(ColumnName::new("k"))),
            desc: true,
        });
        let mut node = StatementNode::new("SELECT id AS k FROM t ORDER BY k DESC", Statement::Select(sel));
        NameResolver.preprocess(&mut node, &schema(), &session()).unwrap();
    }

    #[test]
    fn infer_type_follows_resolution() {
        let mut e = Expr::binary(sqlfront_core::ast::BinaryOp::Plus, Expr::col("id"), Expr::int(1));
        assert_eq!(infer_type(&e), DataType::Unknown);
        let chain = vec![vec![table_source("t", schema().table("test", "t").unwrap())]];
        let is = schema();
        let r = Resolver {
            schema: &is,
            current_db: Some("test"),
        };
        r.expr(&mut e, &chain, None, "field list").unwrap();
        assert_eq!(infer_type(&e), DataType::Int64);
    }
}
