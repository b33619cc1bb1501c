use sqlfront_core::id::SchemaVersion;
use thiserror::Error;

/// Result type local to sqlfront-session.
pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("schema snapshot {requested} is not retained (oldest {oldest}, latest {latest})")]
    SnapshotUnavailable {
        requested: SchemaVersion,
        oldest: SchemaVersion,
        latest: SchemaVersion,
    },

    #[error("schema publish rejected: {0}")]
    Publish(String),

    #[error(transparent)]
    Core(#[from] sqlfront_core::error::Error),
}
