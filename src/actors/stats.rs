//! Outcome counters shared by all workers

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of probe and write outcomes
///
/// Cloning is cheap; all clones update the same counters.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    probes_succeeded: AtomicU64,
    probes_failed: AtomicU64,
    writes_succeeded: AtomicU64,
    writes_failed: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub probes_succeeded: u64,
    pub probes_failed: u64,
    pub writes_succeeded: u64,
    pub writes_failed: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_probe(&self, success: bool) {
        let counter = if success {
            &self.inner.probes_succeeded
        } else {
            &self.inner.probes_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, success: bool) {
        let counter = if success {
            &self.inner.writes_succeeded
        } else {
            &self.inner.writes_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            probes_succeeded: self.inner.probes_succeeded.load(Ordering::Relaxed),
            probes_failed: self.inner.probes_failed.load(Ordering::Relaxed),
            writes_succeeded: self.inner.writes_succeeded.load(Ordering::Relaxed),
            writes_failed: self.inner.writes_failed.load(Ordering::Relaxed),
        }
    }
}
