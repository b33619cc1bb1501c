//! Logical and physical plan representations.
//!
//! The optimizer builds a `LogicalPlan` (what to compute) from a resolved
//! statement, rewrites it, then lowers it to a `PhysicalPlan` that binds
//! operator IDs. Every plan is bound to the schema snapshot it was built
//! against; the binding lives on the planner's `Plan` wrapper.

use serde::{Deserialize, Serialize};

use crate::ast::{Assignment, ByItem, Expr, JoinType, Statement};
use crate::id::{OpId, TableId};
use crate::schema::Schema;

/// Fully qualified, resolved table reference inside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub db: String,
    pub name: String,
    pub id: TableId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalPlan {
    /// Single empty row (SELECT without FROM).
    Dual {
        schema: Schema,
    },
    TableScan {
        table: TableRef,
        alias: Option<String>,
        schema: Schema,
        /// Predicates pushed into the scan.
        filters: Vec<Expr>,
    },
    Selection {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },
    Projection {
        input: Box<LogicalPlan>,
        exprs: Vec<Expr>,
        schema: Schema,
    },
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        join_type: JoinType,
        on: Option<Expr>,
    },
    Aggregate {
        input: Box<LogicalPlan>,
        group_by: Vec<Expr>,
        aggs: Vec<Expr>,
    },
    Distinct {
        input: Box<LogicalPlan>,
    },
    Sort {
        input: Box<LogicalPlan>,
        by: Vec<ByItem>,
    },
    Limit {
        input: Box<LogicalPlan>,
        count: u64,
        offset: u64,
    },
    Union {
        inputs: Vec<LogicalPlan>,
        distinct: bool,
    },
    Insert {
        table: TableRef,
        columns: Vec<String>,
        input: Box<LogicalPlan>,
        is_replace: bool,
    },
    /// Literal rows (INSERT ... VALUES).
    Values {
        rows: Vec<Vec<Expr>>,
        schema: Schema,
    },
    Update {
        table: TableRef,
        input: Box<LogicalPlan>,
        assignments: Vec<Assignment>,
    },
    Delete {
        table: TableRef,
        input: Box<LogicalPlan>,
    },
    /// Schema change handed verbatim to the DDL executor.
    Ddl {
        statement: Statement,
    },
    /// Transaction control, admin and session statements executed as-is.
    Simple {
        statement: Statement,
    },
    Explain {
        input: Box<LogicalPlan>,
    },
}

impl LogicalPlan {
    /// Child plans, left to right.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        use LogicalPlan::*;
        match self {
            Dual { .. } | TableScan { .. } | Values { .. } | Ddl { .. } | Simple { .. } => vec![],
            Selection { input, .. }
            | Projection { input, .. }
            | Aggregate { input, .. }
            | Distinct { input }
            | Sort { input, .. }
            | Limit { input, .. }
            | Insert { input, .. }
            | Update { input, .. }
            | Delete { input, .. }
            | Explain { input } => vec![input.as_ref()],
            Join { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Union { inputs, .. } => inputs.iter().collect(),
        }
    }

    /// Returns the number of inputs for this node.
    pub fn inputs(&self) -> usize {
        self.children().len()
    }

    /// True when the plan only reads data.
    pub fn is_query(&self) -> bool {
        use LogicalPlan::*;
        match self {
            Insert { .. } | Update { .. } | Delete { .. } | Ddl { .. } | Simple { .. } => false,
            other => other.children().into_iter().all(LogicalPlan::is_query),
        }
    }

    /// Operator key used when lowering to a physical binding.
    pub fn name(&self) -> &'static str {
        use LogicalPlan::*;
        match self {
            Dual { .. } => "dual",
            TableScan { .. } => "table_scan",
            Selection { .. } => "selection",
            Projection { .. } => "projection",
            Join { .. } => "join",
            Aggregate { .. } => "aggregate",
            Distinct { .. } => "distinct",
            Sort { .. } => "sort",
            Limit { .. } => "limit",
            Union { .. } => "union",
            Insert { .. } => "insert",
            Values { .. } => "values",
            Update { .. } => "update",
            Delete { .. } => "delete",
            Ddl { .. } => "ddl",
            Simple { .. } => "simple",
            Explain { .. } => "explain",
        }
    }
}

/// Physical nodes bind to operator IDs; bindings live in the planner's program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhysicalPlan {
    Source {
        op: OpId,
        schema: Schema,
    },
    Unary {
        op: OpId,
        input: Box<PhysicalPlan>,
        schema: Schema,
    },
    Binary {
        op: OpId,
        left: Box<PhysicalPlan>,
        right: Box<PhysicalPlan>,
        schema: Schema,
    },
    /// N-ary input (union).
    Nary {
        op: OpId,
        inputs: Vec<PhysicalPlan>,
        schema: Schema,
    },
    /// Writes or side-effecting root (DML, DDL, admin).
    Sink {
        op: OpId,
        input: Option<Box<PhysicalPlan>>,
    },
}

impl PhysicalPlan {
    pub fn op(&self) -> OpId {
        use PhysicalPlan::*;
        match self {
            Source { op, .. } | Unary { op, .. } | Binary { op, .. } | Nary { op, .. } | Sink { op, .. } => *op,
        }
    }

    /// Returns the number of inputs for this node.
    pub fn inputs(&self) -> usize {
        use PhysicalPlan::*;
        match self {
            Source { .. } => 0,
            Unary { .. } => 1,
            Sink { input, .. } => usize::from(input.is_some()),
            Binary { .. } => 2,
            Nary { inputs, .. } => inputs.len(),
        }
    }

    /// Output row shape; sinks produce no rows.
    pub fn schema(&self) -> Schema {
        use PhysicalPlan::*;
        match self {
            Source { schema, .. } | Unary { schema, .. } | Binary { schema, .. } | Nary { schema, .. } => {
                schema.clone()
            }
            Sink { .. } => Schema::empty(),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        use PhysicalPlan::*;
        1 + match self {
            Source { .. } => 0,
            Unary { input, .. } => input.node_count(),
            Binary { left, right, .. } => left.node_count() + right.node_count(),
            Nary { inputs, .. } => inputs.iter().map(PhysicalPlan::node_count).sum(),
            Sink { input, .. } => input.as_ref().map_or(0, |i| i.node_count()),
        }
    }
}
