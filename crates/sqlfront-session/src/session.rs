//! Per-connection session state.
//!
//! A `SessionState` is owned by exactly one connection. The compiler borrows
//! it mutably for the duration of one compile call.

use std::sync::Arc;

use sqlfront_core::config::CompilerConfig;
use sqlfront_core::id::{ConnectionId, SchemaVersion};
use sqlfront_core::schema::InfoSchema;

use crate::binlog::BinlogInfo;
use crate::domain::Domain;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct SessionState {
    connection_id: ConnectionId,
    current_db: Option<String>,
    in_update_stmt: bool,
    snapshot_schema: Option<Arc<InfoSchema>>,
    binlog: BinlogInfo,
}

impl SessionState {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            current_db: None,
            in_update_stmt: false,
            snapshot_schema: None,
            binlog: BinlogInfo::default(),
        }
    }

    pub fn with_config(connection_id: ConnectionId, cfg: &CompilerConfig) -> Self {
        let mut s = Self::new(connection_id);
        s.current_db = cfg.default_database.clone();
        s
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn current_db(&self) -> Option<&str> {
        self.current_db.as_deref()
    }

    pub fn set_current_db(&mut self, db: impl Into<String>) {
        self.current_db = Some(db.into());
    }

    /// True while an UPDATE statement is being compiled on this session.
    pub fn in_update_stmt(&self) -> bool {
        self.in_update_stmt
    }

    /// Prefer `UpdateStmtScope`, which restores the previous value on every exit path.
    pub fn set_in_update_stmt(&mut self, v: bool) {
        self.in_update_stmt = v;
    }

    /// Pinned historical schema, if the session asked for snapshot reads.
    pub fn snapshot_schema(&self) -> Option<&Arc<InfoSchema>> {
        self.snapshot_schema.as_ref()
    }

    pub fn set_snapshot_schema(&mut self, schema: Arc<InfoSchema>) {
        self.snapshot_schema = Some(schema);
    }

    /// Pin the snapshot the domain retains for `version`.
    pub fn pin_snapshot(&mut self, domain: &Domain, version: SchemaVersion) -> Result<()> {
        let snap = domain.snapshot(version)?;
        self.snapshot_schema = Some(snap);
        Ok(())
    }

    /// Return to live-schema reads.
    pub fn unpin_snapshot(&mut self) -> Option<Arc<InfoSchema>> {
        self.snapshot_schema.take()
    }

    pub fn binlog(&self) -> &BinlogInfo {
        &self.binlog
    }

    pub fn binlog_mut(&mut self) -> &mut BinlogInfo {
        &mut self.binlog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_sets_initial_database() {
        let cfg = CompilerConfig {
            default_database: Some("app".into()),
            ..Default::default()
        };
        let s = SessionState::with_config(ConnectionId::new(9), &cfg);
        assert_eq!(s.current_db(), Some("app"));
        assert_eq!(s.connection_id(), ConnectionId::new(9));
        assert!(!s.in_update_stmt());
        assert!(s.snapshot_schema().is_none());
    }

    #[test]
    fn unpin_returns_pinned_snapshot() {
        let mut s = SessionState::new(ConnectionId::new(1));
        let snap = Arc::new(InfoSchema::empty(SchemaVersion::new(4)));
        s.set_snapshot_schema(Arc::clone(&snap));
        let back = s.unpin_snapshot().expect("pinned");
        assert!(Arc::ptr_eq(&back, &snap));
        assert!(s.snapshot_schema().is_none());
    }
}
