use std::sync::atomic::{AtomicUsize, Ordering};

/// Statistics regarding the pool
#[derive(Debug, Default)]
#[must_use]
pub struct PoolMetrics {
    /// The number of handles created by the manager, including the primary
    /// handle.
    pub created: AtomicUsize,
    /// The number of acquisitions served from the idle stack
    pub reused: AtomicUsize,
    /// The number of idle handles the reclaimer tried to close
    pub reclaimed: AtomicUsize,
    /// The number of reclaimed handles whose close failed
    pub reclaim_failures: AtomicUsize,
}

impl PoolMetrics {
    pub(crate) fn record_created(&self) {
        let _ = self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reused(&self) {
        let _ = self.reused.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reclaimed(&self, count: usize, failures: usize) {
        let _ = self.reclaimed.fetch_add(count, Ordering::Relaxed);
        let _ = self.reclaim_failures.fetch_add(failures, Ordering::Relaxed);
    }
}

impl PoolMetrics {
    /// Get the total number of handles the manager created
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
    /// Get the total number of acquisitions that reused an idle handle
    pub fn reused(&self) -> usize {
        self.reused.load(Ordering::Relaxed)
    }
    /// Get the total number of handles closed by the reclaimer, failed
    /// closes included
    pub fn reclaimed(&self) -> usize {
        self.reclaimed.load(Ordering::Relaxed)
    }
    /// Get the total number of reclaimed handles whose close failed
    pub fn reclaim_failures(&self) -> usize {
        self.reclaim_failures.load(Ordering::Relaxed)
    }
}
