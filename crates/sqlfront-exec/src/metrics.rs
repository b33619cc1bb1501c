//! Statement counters partitioned by classification label.
//!
//! The process-wide counter is created on first use and lives until exit.
//! Increments are fire-and-forget: they never fail and never block on
//! anything but a short map lock the first time a label is seen.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use tracing::trace;

/// Where the compiler reports one classified statement.
pub trait MetricsSink: Send + Sync {
    fn inc(&self, label: &'static str);
}

/// Lock-protected map of atomic counters.
#[derive(Default)]
pub struct LabeledCounter {
    counters: RwLock<HashMap<&'static str, Arc<AtomicU64>>>,
}

impl LabeledCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, label: &'static str) {
        let existing = {
            let map = self.counters.read().unwrap_or_else(|e| e.into_inner());
            map.get(label).cloned()
        };
        let counter = match existing {
            Some(c) => c,
            None => {
                let mut map = self.counters.write().unwrap_or_else(|e| e.into_inner());
                Arc::clone(map.entry(label).or_default())
            }
        };
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(label, count = n, "statement counted");
    }

    pub fn get(&self, label: &str) -> u64 {
        let map = self.counters.read().unwrap_or_else(|e| e.into_inner());
        map.get(label).map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Point-in-time copy, sorted by label.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        let map = self.counters.read().unwrap_or_else(|e| e.into_inner());
        map.iter()
            .map(|(k, v)| (*k, v.load(Ordering::Relaxed)))
            .collect()
    }
}

impl MetricsSink for LabeledCounter {
    fn inc(&self, label: &'static str) {
        LabeledCounter::inc(self, label);
    }
}

/// Process-wide statement counter.
pub static STATEMENT_COUNTER: Lazy<LabeledCounter> = Lazy::new(LabeledCounter::new);

/// Sink writing to [`STATEMENT_COUNTER`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalStatementCounter;

impl MetricsSink for GlobalStatementCounter {
    fn inc(&self, label: &'static str) {
        STATEMENT_COUNTER.inc(label);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn inc(&self, _label: &'static str) {}
}

/// Snapshot of the process-wide counter, for export.
pub fn statement_counts() -> BTreeMap<&'static str, u64> {
    STATEMENT_COUNTER.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counter = Arc::new(LabeledCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        c.inc("Select-Simple");
                        c.inc("Insert");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.get("Select-Simple"), 8000);
        assert_eq!(counter.get("Insert"), 8000);
        assert_eq!(counter.get("Update"), 0);
        assert_eq!(counter.snapshot().len(), 2);
    }
}
