use std::fmt;

use sqlfront_core::id::{ConnectionId, SchemaVersion};
use sqlfront_planner::PlanError;
use thiserror::Error;

/// Result type local to sqlfront-exec.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Pipeline stage a compile failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Preprocess,
    Validate,
    Optimize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Preprocess => "preprocess",
            Stage::Validate => "validate",
            Stage::Optimize => "optimize",
        })
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("[conn {conn}] preprocess failed: {source}")]
    Preprocess {
        conn: u64,
        #[source]
        source: PlanError,
    },

    #[error("[conn {conn}] validate failed: {source}")]
    Validate {
        conn: u64,
        #[source]
        source: PlanError,
    },

    #[error("[conn {conn}] optimize failed: {source}")]
    Optimize {
        conn: u64,
        #[source]
        source: PlanError,
    },

    /// The optimizer returned a plan for a different snapshot than it was given.
    #[error("[conn {conn}] plan bound to {plan} but compiled against {schema}")]
    Invariant {
        conn: u64,
        schema: SchemaVersion,
        plan: SchemaVersion,
    },
}

impl CompileError {
    pub(crate) fn at(stage: Stage, conn: ConnectionId, source: PlanError) -> Self {
        let conn = conn.get();
        match stage {
            Stage::Preprocess => CompileError::Preprocess { conn, source },
            Stage::Validate => CompileError::Validate { conn, source },
            Stage::Optimize => CompileError::Optimize { conn, source },
        }
    }

    /// Stage the failure came from; `None` for invariant violations.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CompileError::Preprocess { .. } => Some(Stage::Preprocess),
            CompileError::Validate { .. } => Some(Stage::Validate),
            CompileError::Optimize { .. } => Some(Stage::Optimize),
            CompileError::Invariant { .. } => None,
        }
    }

    /// The collaborator error that aborted compilation, unwrapped.
    pub fn root_cause(&self) -> Option<&PlanError> {
        match self {
            CompileError::Preprocess { source, .. }
            | CompileError::Validate { source, .. }
            | CompileError::Optimize { source, .. } => Some(source),
            CompileError::Invariant { .. } => None,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        match self {
            CompileError::Preprocess { conn, .. }
            | CompileError::Validate { conn, .. }
            | CompileError::Optimize { conn, .. }
            | CompileError::Invariant { conn, .. } => ConnectionId::new(*conn),
        }
    }
}
