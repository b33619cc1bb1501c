//! Resolved statement → `LogicalPlan`.
//!
//! Expects a node that went through name resolution: every base table must
//! carry its `ResolvedTable` annotation and every column its
//! `ResolvedColumn`, otherwise the build fails with `PlanError::Unresolved`.

use sqlfront_core::ast::{
    ByItem, Expr, InsertSource, Join, Limit, ResultSetNode, SelectField, SelectStmt, Statement,
    TableName, TableSourceKind, UnionStmt,
};
pub use sqlfront_core::plan::{LogicalPlan, TableRef};
use sqlfront_core::schema::{DataType, Field, InfoSchema, Schema};

use crate::error::{PlanError, Result};
use crate::preprocess::infer_type;

/// Build the unoptimized logical plan for a resolved statement.
pub fn build(stmt: &Statement, schema: &InfoSchema) -> Result<LogicalPlan> {
    Builder { schema }.statement(stmt)
}

struct Builder<'a> {
    schema: &'a InfoSchema,
}

impl<'a> Builder<'a> {
    fn statement(&self, stmt: &Statement) -> Result<LogicalPlan> {
        match stmt {
            Statement::Select(s) => self.select(s).map(|(plan, _)| plan),
            Statement::Union(u) => self.union(u).map(|(plan, _)| plan),
            Statement::Insert(ins) => {
                let (table, row) = self.table(&ins.table)?;
                let columns: Vec<String> = if ins.columns.is_empty() {
                    row.fields.iter().map(|f| f.name.clone()).collect()
                } else {
                    ins.columns.iter().map(|c| c.name.clone()).collect()
                };
                let input = match &ins.source {
                    InsertSource::Values(rows) => {
                        for e in rows.iter().flatten() {
                            check_resolved(e)?;
                        }
                        let fields = columns
                            .iter()
                            .map(|c| {
                                row.fields
                                    .iter()
                                    .find(|f| f.name.eq_ignore_ascii_case(c))
                                    .cloned()
                                    .unwrap_or_else(|| Field::new(c.clone(), DataType::Unknown, true))
                            })
                            .collect();
                        LogicalPlan::Values {
                            rows: rows.clone(),
                            schema: Schema::new(fields),
                        }
                    }
                    InsertSource::Select(sel) => self.select(sel)?.0,
                };
                for a in &ins.on_duplicate {
                    check_resolved(&a.expr)?;
                }
                Ok(LogicalPlan::Insert {
                    table,
                    columns,
                    input: Box::new(input),
                    is_replace: ins.is_replace,
                })
            }
            Statement::Update(up) => {
                let (input, _) = self.join(&up.table_refs.table_refs)?;
                let target = first_table(&up.table_refs.table_refs)
                    .ok_or_else(|| PlanError::Unsupported("UPDATE without a base table".into()))?;
                let (table, _) = self.table(target)?;
                for a in &up.set {
                    if a.column.resolved.is_none() {
                        return Err(PlanError::Unresolved(a.column.name.to_string()));
                    }
                    check_resolved(&a.expr)?;
                }
                let input = self.filter_order_limit(input, &up.where_clause, &up.order_by, up.limit)?;
                Ok(LogicalPlan::Update {
                    table,
                    input: Box::new(input),
                    assignments: up.set.clone(),
                })
            }
            Statement::Delete(del) => {
                let (input, _) = self.join(&del.table_refs.table_refs)?;
                let target = first_table(&del.table_refs.table_refs)
                    .ok_or_else(|| PlanError::Unsupported("DELETE without a base table".into()))?;
                let (table, _) = self.table(target)?;
                let input =
                    self.filter_order_limit(input, &del.where_clause, &del.order_by, del.limit)?;
                Ok(LogicalPlan::Delete {
                    table,
                    input: Box::new(input),
                })
            }
            Statement::Do(d) => {
                for e in &d.exprs {
                    check_resolved(e)?;
                }
                Ok(LogicalPlan::Projection {
                    input: Box::new(LogicalPlan::Dual {
                        schema: Schema::empty(),
                    }),
                    exprs: d.exprs.clone(),
                    schema: Schema::new(
                        d.exprs
                            .iter()
                            .enumerate()
                            .map(|(i, e)| Field::new(format!("expr#{i}"), infer_type(e), true))
                            .collect(),
                    ),
                })
            }
            Statement::Explain(ex) => Ok(LogicalPlan::Explain {
                input: Box::new(self.statement(&ex.stmt)?),
            }),
            s if s.is_ddl() => Ok(LogicalPlan::Ddl {
                statement: s.clone(),
            }),
            other => Ok(LogicalPlan::Simple {
                statement: other.clone(),
            }),
        }
    }

    /// Look a resolved table back up in the snapshot.
    fn table(&self, t: &TableName) -> Result<(TableRef, Schema)> {
        let resolved = t
            .resolved
            .as_ref()
            .ok_or_else(|| PlanError::Unresolved(t.name.clone()))?;
        let info = self
            .schema
            .table(&resolved.db, &t.name)
            .filter(|info| info.id == resolved.table_id)
            .ok_or_else(|| PlanError::UnknownTable {
                db: resolved.db.clone(),
                table: t.name.clone(),
            })?;
        Ok((
            TableRef {
                db: resolved.db.clone(),
                name: info.name.clone(),
                id: info.id,
            },
            info.row_schema(),
        ))
    }

    fn join(&self, j: &Join) -> Result<(LogicalPlan, Vec<(String, Schema)>)> {
        let (left, mut sources) = self.result_set(&j.left)?;
        let Some(right) = &j.right else {
            return Ok((left, sources));
        };
        let (right, right_sources) = self.result_set(right)?;
        sources.extend(right_sources);
        if let Some(on) = &j.on {
            check_resolved(on)?;
        }
        Ok((
            LogicalPlan::Join {
                left: Box::new(left),
                right: Box::new(right),
                join_type: j.join_type,
                on: j.on.clone(),
            },
            sources,
        ))
    }

    fn result_set(&self, node: &ResultSetNode) -> Result<(LogicalPlan, Vec<(String, Schema)>)> {
        match node {
            ResultSetNode::Join(j) => self.join(j),
            ResultSetNode::TableSource(ts) => match &ts.source {
                TableSourceKind::Table(t) => {
                    let (table, row) = self.table(t)?;
                    let visible = ts.as_name.clone().unwrap_or_else(|| t.name.clone());
                    Ok((
                        LogicalPlan::TableScan {
                            table,
                            alias: ts.as_name.clone(),
                            schema: row.clone(),
                            filters: Vec::new(),
                        },
                        vec![(visible, row)],
                    ))
                }
                TableSourceKind::Select(sel) => {
                    let (plan, out) = self.select(sel)?;
                    Ok((plan, vec![(ts.as_name.clone().unwrap_or_default(), out)]))
                }
                TableSourceKind::Union(u) => {
                    let (plan, out) = self.union(u)?;
                    Ok((plan, vec![(ts.as_name.clone().unwrap_or_default(), out)]))
                }
            },
        }
    }

    fn union(&self, u: &UnionStmt) -> Result<(LogicalPlan, Schema)> {
        let mut inputs = Vec::with_capacity(u.selects.len());
        let mut out = None;
        for s in &u.selects {
            let (plan, schema) = self.select(s)?;
            out.get_or_insert(schema);
            inputs.push(plan);
        }
        let plan = LogicalPlan::Union {
            inputs,
            distinct: u.distinct,
        };
        let plan = self.filter_order_limit(plan, &None, &u.order_by, u.limit)?;
        Ok((plan, out.unwrap_or_default()))
    }

    /// Build a SELECT; returns the plan and its output schema.
    fn select(&self, s: &SelectStmt) -> Result<(LogicalPlan, Schema)> {
        let (mut plan, sources) = match &s.from {
            Some(from) => self.join(&from.table_refs)?,
            None => (
                LogicalPlan::Dual {
                    schema: Schema::empty(),
                },
                Vec::new(),
            ),
        };

        if let Some(w) = &s.where_clause {
            check_resolved(w)?;
            plan = LogicalPlan::Selection {
                input: Box::new(plan),
                predicate: w.clone(),
            };
        }

        let (exprs, fields) = expand_fields(&s.fields, &sources)?;

        let mut aggs = Vec::new();
        for e in exprs.iter().chain(s.having.iter()) {
            collect_aggregates(e, &mut aggs);
        }
        if !s.group_by.is_empty() || !aggs.is_empty() {
            for g in &s.group_by {
                check_resolved(g)?;
            }
            plan = LogicalPlan::Aggregate {
                input: Box::new(plan),
                group_by: s.group_by.clone(),
                aggs,
            };
        }
        if let Some(h) = &s.having {
            check_resolved(h)?;
            plan = LogicalPlan::Selection {
                input: Box::new(plan),
                predicate: h.clone(),
            };
        }
        if !s.order_by.is_empty() {
            for by in &s.order_by {
                check_resolved(&by.expr)?;
            }
            plan = LogicalPlan::Sort {
                input: Box::new(plan),
                by: s.order_by.clone(),
            };
        }

        let out = Schema::new(fields);
        plan = LogicalPlan::Projection {
            input: Box::new(plan),
            exprs,
            schema: out.clone(),
        };
        if s.distinct {
            plan = LogicalPlan::Distinct {
                input: Box::new(plan),
            };
        }
        if let Some(l) = s.limit {
            plan = LogicalPlan::Limit {
                input: Box::new(plan),
                count: l.count,
                offset: l.offset,
            };
        }
        Ok((plan, out))
    }

    fn filter_order_limit(
        &self,
        mut plan: LogicalPlan,
        predicate: &Option<Expr>,
        order_by: &[ByItem],
        limit: Option<Limit>,
    ) -> Result<LogicalPlan> {
        if let Some(p) = predicate {
            check_resolved(p)?;
            plan = LogicalPlan::Selection {
                input: Box::new(plan),
                predicate: p.clone(),
            };
        }
        if !order_by.is_empty() {
            for by in order_by {
                check_resolved(&by.expr)?;
            }
            plan = LogicalPlan::Sort {
                input: Box::new(plan),
                by: order_by.to_vec(),
            };
        }
        if let Some(l) = limit {
            plan = LogicalPlan::Limit {
                input: Box::new(plan),
                count: l.count,
                offset: l.offset,
            };
        }
        Ok(plan)
    }
}

/// Turn the select list into projection expressions, expanding wildcards
/// into resolved column references.
fn expand_fields(
    fields: &[SelectField],
    sources: &[(String, Schema)],
) -> Result<(Vec<Expr>, Vec<Field>)> {
    use sqlfront_core::ast::{ColumnName, ColumnRef, ResolvedColumn};

    let mut exprs = Vec::new();
    let mut out = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        match field {
            SelectField::Wildcard { table } => {
                for (name, schema) in sources {
                    if table
                        .as_deref()
                        .is_some_and(|t| !t.eq_ignore_ascii_case(name))
                    {
                        continue;
                    }
                    for (offset, f) in schema.fields.iter().enumerate() {
                        exprs.push(Expr::Column(ColumnRef {
                            name: ColumnName::qualified(name.clone(), f.name.clone()),
                            resolved: Some(ResolvedColumn {
                                source: name.clone(),
                                offset,
                                data_type: f.data_type.clone(),
                                nullable: f.nullable,
                                depth: 0,
                            }),
                        }));
                        out.push(f.clone());
                    }
                }
            }
            SelectField::Expr { expr, alias } => {
                check_resolved(expr)?;
                let name = alias.clone().unwrap_or_else(|| match expr {
                    Expr::Column(c) => c.name.name.clone(),
                    _ => format!("expr#{i}"),
                });
                let nullable = match expr {
                    Expr::Column(c) => c.resolved.as_ref().map_or(true, |r| r.nullable),
                    _ => true,
                };
                out.push(Field::new(name, infer_type(expr), nullable));
                exprs.push(expr.clone());
            }
        }
    }
    Ok((exprs, out))
}

/// Aggregate calls in `e`, outermost first. Subqueries are opaque.
fn collect_aggregates(e: &Expr, out: &mut Vec<Expr>) {
    if e.is_aggregate_call() {
        if !out.contains(e) {
            out.push(e.clone());
        }
        return;
    }
    match e {
        Expr::Binary { left, right, .. } => {
            collect_aggregates(left, out);
            collect_aggregates(right, out);
        }
        Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => collect_aggregates(expr, out),
        Expr::Func { args, .. } => args.iter().for_each(|a| collect_aggregates(a, out)),
        _ => {}
    }
}

/// Fail on the first column reference without a resolution annotation.
fn check_resolved(e: &Expr) -> Result<()> {
    match e {
        Expr::Column(c) if c.resolved.is_none() => Err(PlanError::Unresolved(c.name.to_string())),
        Expr::Binary { left, right, .. } => {
            check_resolved(left)?;
            check_resolved(right)
        }
        Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => check_resolved(expr),
        Expr::Func { args, .. } => args.iter().try_for_each(check_resolved),
        _ => Ok(()),
    }
}

fn first_table(j: &Join) -> Option<&TableName> {
    match &j.left {
        ResultSetNode::TableSource(ts) => match &ts.source {
            TableSourceKind::Table(t) => Some(t),
            _ => None,
        },
        ResultSetNode::Join(inner) => first_table(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfront_core::ast::{StatementNode, TableName};
    use sqlfront_core::id::{ConnectionId, SchemaVersion};
    use sqlfront_core::schema::{ColumnSpec, InfoSchemaBuilder};
    use sqlfront_session::SessionState;

    use crate::preprocess::NameResolver;
    use crate::traits::Preprocessor;

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

    fn resolved(stmt: Statement, schema: &InfoSchema) -> StatementNode {
        let mut session = SessionState::new(ConnectionId::new(1));
        session.set_current_db("test");
        let mut node = StatementNode::new("", stmt);
        NameResolver.preprocess(&mut node, schema, &session).unwrap();
        node
    }

    #[test]
    fn star_select_expands_to_projection_over_scan() {
        let is = schema();
        let node = resolved(Statement::Select(SelectStmt::star_from(TableName::new("t"))), &is);
        let plan = build(node.stmt(), &is).unwrap();
        let LogicalPlan::Projection { input, schema, exprs } = plan else {
            panic!("expected projection, got {plan:?}");
        };
        assert_eq!(exprs.len(), 2);
        assert_eq!(schema.fields[0].name, "id");
        assert!(matches!(*input, LogicalPlan::TableScan { .. }));
    }

    #[test]
    fn unresolved_table_is_rejected() {
        let is = schema();
        let stmt = Statement::Select(SelectStmt::star_from(TableName::new("t")));
        assert!(matches!(build(&stmt, &is), Err(PlanError::Unresolved(_))));
    }

    #[test]
    fn commit_is_simple() {
        let plan = build(&Statement::Commit, &schema()).unwrap();
        assert!(matches!(plan, LogicalPlan::Simple { .. }));
    }
}
