//! Lightweight logical rewrites.
//!
//! - drop selections whose predicate is a constant true
//! - push selections sitting directly on a table scan into the scan's
//!   filter list (conjunct by conjunct, correlated/subquery predicates stay)

use sqlfront_core::ast::{BinaryOp, Expr, Value};

use crate::logical::LogicalPlan;

/// Apply the rewrites bottom-up.
pub fn optimize(plan: LogicalPlan) -> LogicalPlan {
    use LogicalPlan::*;

    match plan {
        Selection { input, predicate } => {
            let input = optimize(*input);
            if is_always_true(&predicate) {
                return input;
            }
            push_into_scan(input, predicate)
        }
        Projection {
            input,
            exprs,
            schema,
        } => Projection {
            input: Box::new(optimize(*input)),
            exprs,
            schema,
        },
        Join {
            left,
            right,
            join_type,
            on,
        } => Join {
            left: Box::new(optimize(*left)),
            right: Box::new(optimize(*right)),
            join_type,
            on: on.filter(|e| !is_always_true(e)),
        },
        Aggregate {
            input,
            group_by,
            aggs,
        } => Aggregate {
            input: Box::new(optimize(*input)),
            group_by,
            aggs,
        },
        Distinct { input } => Distinct {
            input: Box::new(optimize(*input)),
        },
        Sort { input, by } => Sort {
            input: Box::new(optimize(*input)),
            by,
        },
        Limit {
            input,
            count,
            offset,
        } => Limit {
            input: Box::new(optimize(*input)),
            count,
            offset,
        },
        Union { inputs, distinct } => Union {
            inputs: inputs.into_iter().map(optimize).collect(),
            distinct,
        },
        Insert {
            table,
            columns,
            input,
            is_replace,
        } => Insert {
            table,
            columns,
            input: Box::new(optimize(*input)),
            is_replace,
        },
        Update {
            table,
            input,
            assignments,
        } => Update {
            table,
            input: Box::new(optimize(*input)),
            assignments,
        },
        Delete { table, input } => Delete {
            table,
            input: Box::new(optimize(*input)),
        },
        Explain { input } => Explain {
            input: Box::new(optimize(*input)),
        },
        // Leaf nodes
        Dual { .. } | TableScan { .. } | Values { .. } | Ddl { .. } | Simple { .. } => plan,
    }
}

fn push_into_scan(input: LogicalPlan, predicate: Expr) -> LogicalPlan {
    let LogicalPlan::TableScan {
        table,
        alias,
        schema,
        mut filters,
    } = input
    else {
        return LogicalPlan::Selection {
            input: Box::new(input),
            predicate,
        };
    };

    let mut kept = Vec::new();
    for conjunct in split_conjuncts(predicate) {
        if is_always_true(&conjunct) {
            continue;
        }
        if is_local(&conjunct) {
            filters.push(conjunct);
        } else {
            kept.push(conjunct);
        }
    }

    let scan = LogicalPlan::TableScan {
        table,
        alias,
        schema,
        filters,
    };
    match kept.into_iter().reduce(|a, b| Expr::binary(BinaryOp::And, a, b)) {
        Some(predicate) => LogicalPlan::Selection {
            input: Box::new(scan),
            predicate,
        },
        None => scan,
    }
}

fn split_conjuncts(e: Expr) -> Vec<Expr> {
    match e {
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            let mut out = split_conjuncts(*left);
            out.extend(split_conjuncts(*right));
            out
        }
        other => vec![other],
    }
}

/// True when the predicate only reads columns of the innermost scope.
fn is_local(e: &Expr) -> bool {
    match e {
        Expr::Column(c) => c.resolved.as_ref().is_some_and(|r| r.depth == 0),
        Expr::Literal(_) | Expr::ParamMarker(_) => true,
        Expr::Binary { left, right, .. } => is_local(left) && is_local(right),
        Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => is_local(expr),
        Expr::Func { args, .. } => !e.is_aggregate_call() && args.iter().all(is_local),
        Expr::Subquery(_) | Expr::Exists(_) => false,
    }
}

fn is_always_true(e: &Expr) -> bool {
    match e {
        Expr::Literal(Value::Bool(b)) => *b,
        Expr::Literal(Value::Int(v)) => *v != 0,
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => is_always_true(left) && is_always_true(right),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfront_core::ast::{ColumnName, ColumnRef, ResolvedColumn};
    use sqlfront_core::id::TableId;
    use sqlfront_core::plan::TableRef;
    use sqlfront_core::schema::{DataType, Schema};

    fn scan() -> LogicalPlan {
        LogicalPlan::TableScan {
            table: TableRef {
                db: "test".into(),
                name: "t".into(),
                id: TableId::new(2),
            },
            alias: None,
            schema: Schema::empty(),
            filters: vec![],
        }
    }

    fn col(depth: usize) -> Expr {
        Expr::Column(ColumnRef {
            name: ColumnName::new("id"),
            resolved: Some(ResolvedColumn {
                source: "t".into(),
                offset: 0,
                data_type: DataType::Int64,
                nullable: false,
                depth,
            }),
        })
    }

    #[test]
    fn constant_true_selection_is_dropped() {
        let plan = LogicalPlan::Selection {
            input: Box::new(scan()),
            predicate: Expr::Literal(Value::Bool(true)),
        };
        assert_eq!(optimize(plan), scan());
    }

    #[test]
    fn local_conjuncts_move_into_scan() {
        let pred = Expr::binary(
            BinaryOp::And,
            Expr::eq(col(0), Expr::int(1)),
            Expr::eq(col(1), Expr::int(2)),
        );
        let plan = optimize(LogicalPlan::Selection {
            input: Box::new(scan()),
            predicate: pred,
        });
        let LogicalPlan::Selection { input, predicate } = plan else {
            panic!("correlated conjunct must stay above the scan");
        };
        assert_eq!(predicate, Expr::eq(col(1), Expr::int(2)));
        let LogicalPlan::TableScan { filters, .. } = *input else {
            panic!("expected scan");
        };
        assert_eq!(filters, vec![Expr::eq(col(0), Expr::int(1))]);
    }
}
