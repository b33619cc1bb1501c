//! Replication (binlog) metadata recorded at compile time.
//!
//! Every statement compiled against the *live* schema records that schema's
//! version so the eventual binlog entry can be replayed against the same
//! metadata. Statements compiled against a pinned snapshot observe committed
//! history and never record.

use serde::{Deserialize, Serialize};
use sqlfront_core::id::SchemaVersion;
use tracing::trace;

use crate::session::SessionState;

/// Per-session binlog bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogInfo {
    schema_version: Option<SchemaVersion>,
}

impl BinlogInfo {
    pub fn schema_version(&self) -> Option<SchemaVersion> {
        self.schema_version
    }

    pub fn set_schema_version(&mut self, version: SchemaVersion) {
        self.schema_version = Some(version);
    }

    pub fn clear(&mut self) {
        self.schema_version = None;
    }
}

/// Sink for the schema version associated with a statement's binlog entry.
pub trait SchemaVersionRecorder: Send + Sync {
    fn record_schema_version(&self, session: &mut SessionState, version: SchemaVersion);
}

/// Stores the version in the session's `BinlogInfo` when binlog is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionBinlogRecorder {
    enabled: bool,
}

impl SessionBinlogRecorder {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl SchemaVersionRecorder for SessionBinlogRecorder {
    fn record_schema_version(&self, session: &mut SessionState, version: SchemaVersion) {
        if !self.enabled {
            return;
        }
        trace!(conn = %session.connection_id(), %version, "binlog schema version");
        session.binlog_mut().set_schema_version(version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfront_core::id::ConnectionId;

    #[test]
    fn disabled_recorder_keeps_binlog_empty() {
        let mut s = SessionState::new(ConnectionId::new(1));
        SessionBinlogRecorder::new(false).record_schema_version(&mut s, SchemaVersion::new(5));
        assert_eq!(s.binlog().schema_version(), None);
    }

    #[test]
    fn enabled_recorder_overwrites_previous_version() {
        let mut s = SessionState::new(ConnectionId::new(1));
        let rec = SessionBinlogRecorder::new(true);
        rec.record_schema_version(&mut s, SchemaVersion::new(5));
        rec.record_schema_version(&mut s, SchemaVersion::new(6));
        assert_eq!(s.binlog().schema_version(), Some(SchemaVersion::new(6)));
    }
}
