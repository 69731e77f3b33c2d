//! Worker pool counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by callers and workers.
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    submitted: AtomicU64,
    executed: AtomicU64,
    discarded: AtomicU64,
}

impl PoolStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: usize) {
        self.discarded.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, pending: usize) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            pending,
        }
    }
}

/// Point-in-time view of the pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatsSnapshot {
    /// Tasks accepted by `insert`.
    pub submitted: u64,
    /// Task bodies that returned.
    pub executed: u64,
    /// Tasks dropped by shutdown without running.
    pub discarded: u64,
    /// Tasks currently queued.
    pub pending: usize,
}
