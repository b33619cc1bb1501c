//! Physical program: `PhysicalPlan` plus operator bindings, and the `Plan`
//! artifact the optimizer hands back to the compiler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlfront_core::hash::{hash_serde, Hash256};
use sqlfront_core::id::{OpId, SchemaVersion};
use sqlfront_core::plan::{LogicalPlan, PhysicalPlan};

/// Operator key (e.g. "table_scan", "hash_join") plus a JSON config payload
/// the executor uses to instantiate the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorBinding {
    pub key: String,
    pub config: serde_json::Value,
}

/// Physical program = physical tree + a stable map of OpIds → bindings.
/// We use a BTreeMap to keep deterministic order for hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProgram {
    pub plan: PhysicalPlan,
    pub bindings: BTreeMap<OpId, OperatorBinding>,
}

impl PhysicalProgram {
    pub fn new(plan: PhysicalPlan, bindings: BTreeMap<OpId, OperatorBinding>) -> Self {
        Self { plan, bindings }
    }

    pub fn root_key(&self) -> Option<&str> {
        self.bindings.get(&self.plan.op()).map(|b| b.key.as_str())
    }

    /// Hash both plan and bindings into one stable digest.
    pub fn digest(&self) -> sqlfront_core::error::Result<Hash256> {
        let a = hash_serde(&self.plan)?;
        let b = hash_serde(&self.bindings)?;
        Ok(a.combine(b))
    }
}

/// Optimizer output. Bound to exactly one schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    schema_version: SchemaVersion,
    logical: LogicalPlan,
    program: PhysicalProgram,
}

impl Plan {
    pub fn new(schema_version: SchemaVersion, logical: LogicalPlan, program: PhysicalProgram) -> Self {
        Self {
            schema_version,
            logical,
            program,
        }
    }

    /// Version of the schema snapshot the plan was optimized against.
    pub fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    pub fn logical(&self) -> &LogicalPlan {
        &self.logical
    }

    pub fn program(&self) -> &PhysicalProgram {
        &self.program
    }

    /// Render the physical tree, one operator per line, children indented.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_node(&self.program.plan, 0, &mut out);
        out
    }

    fn explain_node(&self, node: &PhysicalPlan, depth: usize, out: &mut String) {
        use std::fmt::Write as _;
        let key = self
            .program
            .bindings
            .get(&node.op())
            .map(|b| b.key.as_str())
            .unwrap_or("?");
        let _ = writeln!(out, "{}{} [{}]", "  ".repeat(depth), key, node.op().get());
        match node {
            PhysicalPlan::Source { .. } => {}
            PhysicalPlan::Unary { input, .. } => self.explain_node(input, depth + 1, out),
            PhysicalPlan::Binary { left, right, .. } => {
                self.explain_node(left, depth + 1, out);
                self.explain_node(right, depth + 1, out);
            }
            PhysicalPlan::Nary { inputs, .. } => {
                for i in inputs {
                    self.explain_node(i, depth + 1, out);
                }
            }
            PhysicalPlan::Sink { input, .. } => {
                if let Some(i) = input {
                    self.explain_node(i, depth + 1, out);
                }
            }
        }
    }
}
