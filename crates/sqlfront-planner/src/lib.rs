#![forbid(unsafe_code)]
//! sqlfront-planner: the three stages a statement passes through between
//! parsing and execution.
//!
//! - `traits`: the `Preprocessor` / `Validator` / `Optimizer` seams the
//!   compiler drives.
//! - `preprocess::NameResolver`: binds table and column names against a
//!   schema snapshot, in place.
//! - `validate::StatementValidator`: shape checks that need resolved names.
//! - `logical` + `rules` + `lower`: statement → `LogicalPlan` → rewrites →
//!   `PhysicalProgram`, wrapped by `optimizer::RuleOptimizer` into a `Plan`.
//! - `dsl::yaml`: YAML loaders for statements and catalogs.

pub mod dsl;
pub mod error;
pub mod logical;
pub mod lower;
pub mod optimizer;
pub mod physical;
pub mod preprocess;
pub mod rules;
pub mod traits;
pub mod validate;

pub use dsl::yaml::{parse_yaml_catalog, parse_yaml_statement};
pub use error::{PlanError, Result};
pub use lower::lower_to_physical;
pub use optimizer::RuleOptimizer;
pub use physical::{OperatorBinding, PhysicalProgram, Plan};
pub use preprocess::NameResolver;
pub use traits::{Optimizer, Preprocessor, Validator};
pub use validate::StatementValidator;
