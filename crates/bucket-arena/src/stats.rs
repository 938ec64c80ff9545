//! Atomic arena statistics for lock-free usage tracking.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of arena activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArenaStats {
    /// Successful allocations.
    pub allocations: u64,
    /// Allocations rejected with `ValueTooLarge`.
    pub rejected: u64,
    /// Total bytes handed out by successful allocations.
    pub bytes_allocated: u64,
    /// Buckets appended to the store.
    pub buckets_grown: u64,
    /// Times the cursor moved into an already existing bucket.
    pub buckets_reused: u64,
    /// Number of `reset` calls.
    pub resets: u64,
    /// Number of `clear` calls.
    pub clears: u64,
}

/// Relaxed atomic counters backing [`ArenaStats`].
pub struct AtomicArenaStats {
    allocations: AtomicU64,
    rejected: AtomicU64,
    bytes_allocated: AtomicU64,
    buckets_grown: AtomicU64,
    buckets_reused: AtomicU64,
    resets: AtomicU64,
    clears: AtomicU64,
}

impl AtomicArenaStats {
    /// Create new zeroed stats.
    pub fn new() -> Self {
        Self {
            allocations: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            bytes_allocated: AtomicU64::new(0),
            buckets_grown: AtomicU64::new(0),
            buckets_reused: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            clears: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of current stats.
    pub fn snapshot(&self) -> ArenaStats {
        ArenaStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            buckets_grown: self.buckets_grown.load(Ordering::Relaxed),
            buckets_reused: self.buckets_reused.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.allocations,
            &self.rejected,
            &self.bytes_allocated,
            &self.buckets_grown,
            &self.buckets_reused,
            &self.resets,
            &self.clears,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Record a successful allocation of `bytes` bytes.
    pub fn record_allocation(&self, bytes: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes_allocated.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record an allocation rejected for size.
    pub fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a newly appended bucket.
    pub fn record_growth(&self) {
        self.buckets_grown.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the cursor advancing into an existing bucket.
    pub fn record_reuse(&self) {
        self.buckets_reused.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment reset counter.
    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment clear counter.
    pub fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AtomicArenaStats {
    fn default() -> Self {
        Self::new()
    }
}
