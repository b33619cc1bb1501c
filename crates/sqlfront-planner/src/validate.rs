//! Statement shape validation.
//!
//! Runs after name resolution (INSERT arity needs the resolved column list)
//! and never mutates the node.

use std::collections::HashSet;

use sqlfront_core::ast::{
    ConstraintKind, Expr, InsertSource, Join, ResultSetNode, SelectField, SelectStmt, Statement,
    StatementNode, TableSourceKind, UnionStmt,
};

use crate::error::{PlanError, Result};
use crate::traits::Validator;

/// Reference `Validator`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementValidator;

impl StatementValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Validator for StatementValidator {
    fn validate(&self, node: &StatementNode, in_prepare: bool) -> Result<()> {
        Check { in_prepare }.statement(node.stmt())
    }
}

fn invalid(msg: impl Into<String>) -> PlanError {
    PlanError::Validation(msg.into())
}

struct Check {
    in_prepare: bool,
}

impl Check {
    fn statement(&self, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::Select(s) => self.select(s),
            Statement::Union(u) => self.union(u),
            Statement::Insert(ins) => {
                let target_width = if ins.columns.is_empty() {
                    ins.table.resolved.as_ref().map(|r| r.columns.len())
                } else {
                    let mut seen = HashSet::new();
                    for c in &ins.columns {
                        if !seen.insert(c.name.to_ascii_lowercase()) {
                            return Err(invalid(format!("column '{}' specified twice", c.name)));
                        }
                    }
                    Some(ins.columns.len())
                };
                match &ins.source {
                    InsertSource::Values(rows) => {
                        if rows.is_empty() {
                            return Err(invalid("INSERT without values"));
                        }
                        for (i, row) in rows.iter().enumerate() {
                            if let Some(width) = target_width {
                                if row.len() != width {
                                    return Err(invalid(format!(
                                        "column count doesn't match value count at row {}",
                                        i + 1
                                    )));
                                }
                            }
                            for e in row {
                                self.expr(e)?;
                            }
                        }
                    }
                    InsertSource::Select(sel) => {
                        self.select(sel)?;
                        if let (Some(width), Some(fields)) = (target_width, plain_field_count(sel)) {
                            if fields != width {
                                return Err(invalid("column count doesn't match value count"));
                            }
                        }
                    }
                }
                for a in &ins.on_duplicate {
                    self.expr(&a.expr)?;
                }
                Ok(())
            }
            Statement::Update(up) => {
                if up.set.is_empty() {
                    return Err(invalid("UPDATE without assignments"));
                }
                self.join(&up.table_refs.table_refs)?;
                for a in &up.set {
                    self.expr(&a.expr)?;
                }
                if let Some(w) = &up.where_clause {
                    self.expr(w)?;
                }
                Ok(())
            }
            Statement::Delete(del) => {
                self.join(&del.table_refs.table_refs)?;
                if let Some(w) = &del.where_clause {
                    self.expr(w)?;
                }
                Ok(())
            }
            Statement::CreateTable(c) => {
                if c.columns.is_empty() {
                    return Err(invalid("a table must have at least 1 column"));
                }
                let mut names = HashSet::new();
                for col in &c.columns {
                    if !names.insert(col.name.to_ascii_lowercase()) {
                        return Err(invalid(format!("duplicate column name '{}'", col.name)));
                    }
                }
                let inline_pk = c.columns.iter().filter(|col| col.primary_key).count();
                let constraint_pk = c
                    .constraints
                    .iter()
                    .filter(|k| k.kind == ConstraintKind::PrimaryKey)
                    .count();
                if inline_pk + constraint_pk > 1 {
                    return Err(invalid("multiple primary key defined"));
                }
                for k in &c.constraints {
                    if k.columns.is_empty() {
                        return Err(invalid("constraint without columns"));
                    }
                    if let Some(missing) = k
                        .columns
                        .iter()
                        .find(|name| !names.contains(&name.to_ascii_lowercase()))
                    {
                        return Err(invalid(format!(
                            "key column '{missing}' doesn't exist in table"
                        )));
                    }
                }
                Ok(())
            }
            Statement::CreateIndex(ci) => {
                if ci.columns.is_empty() {
                    return Err(invalid(format!("index '{}' has no columns", ci.name)));
                }
                let mut seen = HashSet::new();
                for c in &ci.columns {
                    if !seen.insert(c.to_ascii_lowercase()) {
                        return Err(invalid(format!("duplicate column name '{c}'")));
                    }
                }
                Ok(())
            }
            Statement::AlterTable(alter) => {
                if alter.specs.is_empty() {
                    return Err(invalid("ALTER TABLE without specifications"));
                }
                Ok(())
            }
            Statement::DropTable(d) if d.tables.is_empty() => Err(invalid("DROP TABLE without tables")),
            Statement::Do(d) => d.exprs.iter().try_for_each(|e| self.expr(e)),
            Statement::Set(set) => set.variables.iter().try_for_each(|v| self.expr(&v.value)),
            Statement::Explain(ex) => self.statement(&ex.stmt),
            Statement::Prepare(p) => {
                if p.sql_text.is_none() && p.sql_var.is_none() {
                    return Err(invalid("PREPARE needs a statement text or variable"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn union(&self, u: &UnionStmt) -> Result<()> {
        if u.selects.len() < 2 {
            return Err(invalid("UNION needs at least two selects"));
        }
        let mut width = None;
        for s in &u.selects {
            self.select(s)?;
            if let Some(n) = plain_field_count(s) {
                match width {
                    None => width = Some(n),
                    Some(w) if w != n => {
                        return Err(invalid(
                            "the used SELECT statements have a different number of columns",
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn select(&self, s: &SelectStmt) -> Result<()> {
        if s.fields.is_empty() {
            return Err(invalid("SELECT without fields"));
        }
        if let Some(from) = &s.from {
            self.join(&from.table_refs)?;
        }
        for f in &s.fields {
            if let SelectField::Expr { expr, .. } = f {
                self.expr(expr)?;
            }
        }
        if let Some(w) = &s.where_clause {
            if w.contains_aggregate() {
                return Err(invalid("invalid use of group function in WHERE"));
            }
            self.expr(w)?;
        }
        for g in &s.group_by {
            if g.contains_aggregate() {
                return Err(invalid("can't group on an aggregate"));
            }
            self.expr(g)?;
        }
        if let Some(h) = &s.having {
            self.expr(h)?;
        }
        for by in &s.order_by {
            self.expr(&by.expr)?;
        }
        Ok(())
    }

    fn join(&self, j: &Join) -> Result<()> {
        self.result_set(&j.left)?;
        if let Some(r) = &j.right {
            self.result_set(r)?;
        }
        if let Some(on) = &j.on {
            if j.right.is_none() {
                return Err(invalid("ON clause without a joined table"));
            }
            self.expr(on)?;
        }
        Ok(())
    }

    fn result_set(&self, node: &ResultSetNode) -> Result<()> {
        match node {
            ResultSetNode::Join(j) => self.join(j),
            ResultSetNode::TableSource(ts) => match &ts.source {
                TableSourceKind::Table(_) => Ok(()),
                TableSourceKind::Select(sel) => {
                    if ts.as_name.is_none() {
                        return Err(invalid("every derived table must have its own alias"));
                    }
                    self.select(sel)
                }
                TableSourceKind::Union(u) => {
                    if ts.as_name.is_none() {
                        return Err(invalid("every derived table must have its own alias"));
                    }
                    self.union(u)
                }
            },
        }
    }

    fn expr(&self, e: &Expr) -> Result<()> {
        match e {
            Expr::ParamMarker(_) if !self.in_prepare => Err(invalid(
                "parameter markers are only allowed in prepared statements",
            )),
            Expr::Binary { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => self.expr(expr),
            Expr::Func { args, .. } => args.iter().try_for_each(|a| self.expr(a)),
            Expr::Subquery(sel) | Expr::Exists(sel) => self.select(sel),
            _ => Ok(()),
        }
    }
}

/// Field count of a SELECT without wildcards.
fn plain_field_count(s: &SelectStmt) -> Option<usize> {
    if s
        .fields
        .iter()
        .any(|f| matches!(f, SelectField::Wildcard { .. }))
    {
        None
    } else {
        Some(s.fields.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfront_core::ast::{ColumnDef, CreateTableStmt, TableName};
    use sqlfront_core::schema::DataType;

    fn create(columns: Vec<ColumnDef>) -> StatementNode {
        StatementNode::new(
            "CREATE TABLE t (...)",
            Statement::CreateTable(CreateTableStmt {
                table: TableName::new("t"),
                if_not_exists: false,
                columns,
                constraints: vec![],
            }),
        )
    }

    #[test]
    fn create_table_rejects_duplicate_columns() {
        let node = create(vec![
            ColumnDef::new("a", DataType::Int64),
            ColumnDef::new("A", DataType::Utf8),
        ]);
        assert!(matches!(
            StatementValidator.validate(&node, false),
            Err(PlanError::Validation(_))
        ));
    }

    #[test]
    fn create_table_rejects_two_primary_keys() {
        let mut a = ColumnDef::new("a", DataType::Int64);
        a.primary_key = true;
        let mut b = ColumnDef::new("b", DataType::Int64);
        b.primary_key = true;
        assert!(StatementValidator.validate(&create(vec![a, b]), false).is_err());
    }

    #[test]
    fn param_marker_needs_prepare() {
        let mut sel = SelectStmt::star_from(TableName::new("t"));
        sel.where_clause = Some(Expr::eq(Expr::col("id"), Expr::ParamMarker(0)));
        let node = StatementNode::new("SELECT * FROM t WHERE id = ?", Statement::Select(sel));
        assert!(StatementValidator.validate(&node, false).is_err());
        assert!(StatementValidator.validate(&node, true).is_ok());
    }
}
