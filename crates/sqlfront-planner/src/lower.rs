//! Logical → physical lowering.
//!
//! Assigns a fresh `OpId` to every node (pre-order, root is 0) and picks the
//! operator key the executor instantiates it with.

use std::collections::BTreeMap;

use serde_json::json;
use sqlfront_core::ast::{BinaryOp, Expr};
use sqlfront_core::id::OpId;
use sqlfront_core::plan::{LogicalPlan, PhysicalPlan};
use sqlfront_core::schema::{Field, Schema};

use crate::physical::{OperatorBinding, PhysicalProgram};
use crate::preprocess::infer_type;

pub fn lower_to_physical(plan: &LogicalPlan) -> PhysicalProgram {
    let mut lowering = Lowering {
        next: 0,
        bindings: BTreeMap::new(),
    };
    let root = lowering.lower(plan);
    PhysicalProgram::new(root, lowering.bindings)
}

struct Lowering {
    next: u64,
    bindings: BTreeMap<OpId, OperatorBinding>,
}

impl Lowering {
    fn bind(&mut self, key: &str, config: serde_json::Value) -> OpId {
        let op = OpId::new(self.next);
        self.next += 1;
        self.bindings.insert(
            op,
            OperatorBinding {
                key: key.to_string(),
                config,
            },
        );
        op
    }

    fn unary(
        &mut self,
        key: &str,
        config: serde_json::Value,
        input: &LogicalPlan,
        schema: Schema,
    ) -> PhysicalPlan {
        let op = self.bind(key, config);
        PhysicalPlan::Unary {
            op,
            input: Box::new(self.lower(input)),
            schema,
        }
    }

    fn lower(&mut self, plan: &LogicalPlan) -> PhysicalPlan {
        use LogicalPlan as L;

        let schema = output_schema(plan);
        match plan {
            L::Dual { .. } => PhysicalPlan::Source {
                op: self.bind("dual", json!({})),
                schema,
            },
            L::TableScan {
                table,
                alias,
                filters,
                ..
            } => {
                let op = self.bind(
                    "table_scan",
                    json!({
                        "db": table.db,
                        "table": table.name,
                        "table_id": table.id,
                        "alias": alias,
                        "filters": filters.len(),
                    }),
                );
                PhysicalPlan::Source { op, schema }
            }
            L::Values { rows, .. } => PhysicalPlan::Source {
                op: self.bind("values", json!({ "rows": rows.len() })),
                schema,
            },
            L::Selection { input, .. } => self.unary("selection", json!({}), input, schema),
            L::Projection { input, exprs, .. } => {
                self.unary("projection", json!({ "exprs": exprs.len() }), input, schema)
            }
            L::Aggregate {
                input, group_by, ..
            } => {
                let key = if group_by.is_empty() { "stream_agg" } else { "hash_agg" };
                self.unary(key, json!({ "group_by": group_by.len() }), input, schema)
            }
            L::Distinct { input } => self.unary("hash_distinct", json!({}), input, schema),
            L::Sort { input, by } => {
                let desc: Vec<bool> = by.iter().map(|b| b.desc).collect();
                self.unary("sort", json!({ "desc": desc }), input, schema)
            }
            L::Limit {
                input,
                count,
                offset,
            } => self.unary("limit", json!({ "count": count, "offset": offset }), input, schema),
            L::Join {
                left,
                right,
                join_type,
                on,
            } => {
                let key = if on.as_ref().is_some_and(is_equi_join) {
                    "hash_join"
                } else {
                    "nested_loop_join"
                };
                let op = self.bind(key, json!({ "join_type": join_type }));
                let left = Box::new(self.lower(left));
                let right = Box::new(self.lower(right));
                PhysicalPlan::Binary {
                    op,
                    left,
                    right,
                    schema,
                }
            }
            L::Union { inputs, distinct } => {
                let key = if *distinct { "union_distinct" } else { "union_all" };
                let op = self.bind(key, json!({}));
                let inputs = inputs.iter().map(|i| self.lower(i)).collect();
                PhysicalPlan::Nary { op, inputs, schema }
            }
            L::Insert {
                table,
                columns,
                input,
                is_replace,
            } => {
                let key = if *is_replace { "replace" } else { "insert" };
                let op = self.bind(
                    key,
                    json!({ "db": table.db, "table": table.name, "columns": columns }),
                );
                PhysicalPlan::Sink {
                    op,
                    input: Some(Box::new(self.lower(input))),
                }
            }
            L::Update {
                table,
                input,
                assignments,
            } => {
                let op = self.bind(
                    "update",
                    json!({ "db": table.db, "table": table.name, "assignments": assignments.len() }),
                );
                PhysicalPlan::Sink {
                    op,
                    input: Some(Box::new(self.lower(input))),
                }
            }
            L::Delete { table, input } => {
                let op = self.bind("delete", json!({ "db": table.db, "table": table.name }));
                PhysicalPlan::Sink {
                    op,
                    input: Some(Box::new(self.lower(input))),
                }
            }
            L::Ddl { statement } => PhysicalPlan::Sink {
                op: self.bind("ddl", json!({ "statement": statement })),
                input: None,
            },
            L::Simple { statement } => PhysicalPlan::Sink {
                op: self.bind("simple", json!({ "statement": statement })),
                input: None,
            },
            L::Explain { input } => {
                let op = self.bind("explain", json!({}));
                PhysicalPlan::Sink {
                    op,
                    input: Some(Box::new(self.lower(input))),
                }
            }
        }
    }
}

/// Output row shape of a logical node.
pub fn output_schema(plan: &LogicalPlan) -> Schema {
    use LogicalPlan as L;
    match plan {
        L::Dual { schema }
        | L::TableScan { schema, .. }
        | L::Projection { schema, .. }
        | L::Values { schema, .. } => schema.clone(),
        L::Selection { input, .. }
        | L::Distinct { input }
        | L::Sort { input, .. }
        | L::Limit { input, .. } => output_schema(input),
        L::Join { left, right, .. } => output_schema(left).merge(&output_schema(right)),
        L::Aggregate { group_by, aggs, .. } => Schema::new(
            group_by
                .iter()
                .chain(aggs.iter())
                .enumerate()
                .map(|(i, e)| {
                    let name = match e {
                        Expr::Column(c) => c.name.name.clone(),
                        Expr::Func { name, .. } => format!("{}#{i}", name.to_ascii_lowercase()),
                        _ => format!("expr#{i}"),
                    };
                    Field::new(name, infer_type(e), true)
                })
                .collect(),
        ),
        L::Union { inputs, .. } => inputs.first().map(output_schema).unwrap_or_default(),
        L::Insert { .. }
        | L::Update { .. }
        | L::Delete { .. }
        | L::Ddl { .. }
        | L::Simple { .. }
        | L::Explain { .. } => Schema::empty(),
    }
}

/// True when some conjunct of `on` is a column = column comparison.
fn is_equi_join(on: &Expr) -> bool {
    match on {
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => is_equi_join(left) || is_equi_join(right),
        Expr::Binary {
            op: BinaryOp::Eq,
            left,
            right,
        } => matches!((&**left, &**right), (Expr::Column(_), Expr::Column(_))),
        _ => false,
    }
}
