//! Schema resolution: pinned snapshot vs. live schema.

use std::sync::Arc;

use sqlfront_core::schema::InfoSchema;
use sqlfront_session::{SchemaProvider, SchemaVersionRecorder, SessionState};
use tracing::{debug, info};

/// Where the resolved snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    /// The session's pinned historical snapshot.
    Pinned,
    /// The provider's current schema.
    Live,
}

/// Pick the snapshot to compile against.
///
/// A pinned snapshot wins and leaves the binlog bookkeeping alone: it
/// observes already-committed state. The live schema's version is handed to
/// `recorder` exactly once.
pub fn resolve_schema(
    session: &mut SessionState,
    provider: &dyn SchemaProvider,
    recorder: &dyn SchemaVersionRecorder,
) -> (Arc<InfoSchema>, SchemaSource) {
    if let Some(snap) = session.snapshot_schema() {
        let snap = Arc::clone(snap);
        info!(
            conn = session.connection_id().get(),
            version = snap.schema_meta_version().get(),
            "use snapshot schema"
        );
        return (snap, SchemaSource::Pinned);
    }

    let live = provider.current_schema();
    let version = live.schema_meta_version();
    recorder.record_schema_version(session, version);
    debug!(
        conn = session.connection_id().get(),
        version = version.get(),
        "use live schema"
    );
    (live, SchemaSource::Live)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfront_core::id::{ConnectionId, SchemaVersion};
    use sqlfront_session::{Domain, SessionBinlogRecorder};

    #[test]
    fn live_path_records_version_in_binlog() {
        let domain = Domain::new(4);
        domain.apply(|b| b.add_database("test").map(|_| ())).unwrap();
        let mut session = SessionState::new(ConnectionId::new(1));

        let (schema, source) =
            resolve_schema(&mut session, &domain, &SessionBinlogRecorder::new(true));
        assert_eq!(source, SchemaSource::Live);
        assert_eq!(schema.schema_meta_version(), SchemaVersion::new(1));
        assert_eq!(session.binlog().schema_version(), Some(SchemaVersion::new(1)));
    }

    #[test]
    fn pinned_path_leaves_binlog_untouched() {
        let domain = Domain::new(4);
        domain.apply(|b| b.add_database("test").map(|_| ())).unwrap();
        let mut session = SessionState::new(ConnectionId::new(1));
        session.pin_snapshot(&domain, SchemaVersion::new(0)).unwrap();

        let (schema, source) =
            resolve_schema(&mut session, &domain, &SessionBinlogRecorder::new(true));
        assert_eq!(source, SchemaSource::Pinned);
        assert_eq!(schema.schema_meta_version(), SchemaVersion::new(0));
        assert_eq!(session.binlog().schema_version(), None);
    }
}
