//! Stage traits the compiler drives, in order: preprocess → validate → optimize.
//!
//! Invariants:
//! - `preprocess` may rewrite the node in place (name/type annotations only);
//!   it must not change the statement kind.
//! - `validate` runs on a preprocessed node and never mutates it.
//! - `optimize` returns a `Plan` bound to the `schema` it was given.

use sqlfront_core::ast::StatementNode;
use sqlfront_core::schema::InfoSchema;
use sqlfront_session::SessionState;

use crate::error::Result;
use crate::physical::Plan;

pub trait Preprocessor: Send + Sync {
    fn preprocess(
        &self,
        node: &mut StatementNode,
        schema: &InfoSchema,
        session: &SessionState,
    ) -> Result<()>;
}

pub trait Validator: Send + Sync {
    /// `in_prepare` is true when validating the body of a PREPARE.
    fn validate(&self, node: &StatementNode, in_prepare: bool) -> Result<()>;
}

pub trait Optimizer: Send + Sync {
    fn optimize(
        &self,
        session: &SessionState,
        node: &StatementNode,
        schema: &InfoSchema,
    ) -> Result<Plan>;
}
