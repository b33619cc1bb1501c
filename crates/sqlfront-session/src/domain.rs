//! The schema domain: publisher of immutable `InfoSchema` snapshots.
//!
//! Readers take an `Arc` of the live snapshot and never block writers for
//! longer than a pointer swap. Each publish installs version N+1 and keeps
//! the last `capacity` snapshots so sessions can pin a historical version.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use sqlfront_core::config::CompilerConfig;
use sqlfront_core::id::SchemaVersion;
use sqlfront_core::schema::{InfoSchema, InfoSchemaBuilder};
use tracing::debug;

use crate::error::{Result, SessionError};

/// Source of the live schema snapshot.
pub trait SchemaProvider: Send + Sync {
    fn current_schema(&self) -> Arc<InfoSchema>;
}

struct DomainState {
    current: Arc<InfoSchema>,
    /// Oldest first; always ends with `current`.
    history: VecDeque<Arc<InfoSchema>>,
}

pub struct Domain {
    state: RwLock<DomainState>,
    capacity: usize,
}

impl Domain {
    /// Start with an empty schema at version 0.
    pub fn new(capacity: usize) -> Self {
        Self::with_schema(InfoSchema::empty(SchemaVersion::new(0)), capacity)
    }

    pub fn from_config(cfg: &CompilerConfig) -> Self {
        Self::new(cfg.schema_history_capacity)
    }

    pub fn with_schema(initial: InfoSchema, capacity: usize) -> Self {
        let current = Arc::new(initial);
        let mut history = VecDeque::new();
        history.push_back(Arc::clone(&current));
        Self {
            state: RwLock::new(DomainState { current, history }),
            capacity: capacity.max(1),
        }
    }

    /// Live snapshot.
    pub fn info_schema(&self) -> Arc<InfoSchema> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&state.current)
    }

    pub fn latest_version(&self) -> SchemaVersion {
        self.info_schema().schema_meta_version()
    }

    /// Install the builder's contents as the next schema version.
    pub fn publish(&self, builder: InfoSchemaBuilder) -> Arc<InfoSchema> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        self.install(&mut state, builder)
    }

    /// Derive the next version from the live one under the write lock, so
    /// concurrent schema changes cannot overwrite each other.
    pub fn apply<F>(&self, change: F) -> Result<Arc<InfoSchema>>
    where
        F: FnOnce(&mut InfoSchemaBuilder) -> sqlfront_core::error::Result<()>,
    {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let mut builder = state.current.to_builder();
        change(&mut builder).map_err(|e| SessionError::Publish(e.to_string()))?;
        Ok(self.install(&mut state, builder))
    }

    fn install(&self, state: &mut DomainState, builder: InfoSchemaBuilder) -> Arc<InfoSchema> {
        let version = state.current.schema_meta_version().next();
        let next = Arc::new(builder.build(version));
        state.history.push_back(Arc::clone(&next));
        while state.history.len() > self.capacity {
            state.history.pop_front();
        }
        state.current = Arc::clone(&next);
        debug!(%version, retained = state.history.len(), "published schema");
        next
    }

    /// A retained snapshot for `version`.
    pub fn snapshot(&self, version: SchemaVersion) -> Result<Arc<InfoSchema>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        if let Some(found) = state
            .history
            .iter()
            .find(|s| s.schema_meta_version() == version)
        {
            return Ok(Arc::clone(found));
        }
        let oldest = state
            .history
            .front()
            .map(|s| s.schema_meta_version())
            .unwrap_or(version);
        Err(SessionError::SnapshotUnavailable {
            requested: version,
            oldest,
            latest: state.current.schema_meta_version(),
        })
    }
}

impl SchemaProvider for Domain {
    fn current_schema(&self) -> Arc<InfoSchema> {
        self.info_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfront_core::schema::{ColumnSpec, DataType};

    #[test]
    fn publish_bumps_version_and_keeps_history() {
        let domain = Domain::new(2);
        assert_eq!(domain.latest_version(), SchemaVersion::new(0));

        let v1 = domain
            .apply(|b| b.add_database("test").map(|_| ()))
            .unwrap();
        assert_eq!(v1.schema_meta_version(), SchemaVersion::new(1));

        let v2 = domain
            .apply(|b| {
                b.add_table("test", "t", vec![ColumnSpec::new("a", DataType::Int64, true)])
                    .map(|_| ())
            })
            .unwrap();
        assert_eq!(v2.schema_meta_version(), SchemaVersion::new(2));

        // Capacity 2: version 0 has been evicted.
        assert!(domain.snapshot(SchemaVersion::new(1)).is_ok());
        assert!(matches!(
            domain.snapshot(SchemaVersion::new(0)),
            Err(SessionError::SnapshotUnavailable { .. })
        ));

        // Old snapshots are untouched by later publishes.
        let old = domain.snapshot(SchemaVersion::new(1)).unwrap();
        assert!(old.table("test", "t").is_none());
        assert!(domain.info_schema().table("test", "t").is_some());
    }

    #[test]
    fn failed_change_does_not_publish() {
        let domain = Domain::new(4);
        let err = domain.apply(|b| b.drop_database("nope").map(|_| ()));
        assert!(matches!(err, Err(SessionError::Publish(_))));
        assert_eq!(domain.latest_version(), SchemaVersion::new(0));
    }
}
