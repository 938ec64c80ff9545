//! The bucketed bump arena.

use std::mem::size_of;

use bytemuck::Pod;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::bucket::{Advance, BucketStore};
use crate::config::{normalize_bucket_size, ArenaConfig};
use crate::error::ArenaError;
use crate::handle::Handle;
use crate::stats::{ArenaStats, AtomicArenaStats};

/// Thread-safe bump allocator backed by fixed-size buckets.
///
/// Every state-mutating operation (`allocate`, `reset`, `clear`) runs under
/// a single lock around the bucket store. The critical sections are O(1)
/// apart from `clear`, which is linear in the number of buckets it retires.
/// The lock is never held while handle accesses or caller closures run.
///
/// `Arena` is neither `Clone` nor `Copy`. Share it by reference or through
/// an `Arc`; two copies would each carry their own lock and cursor.
pub struct Arena {
    bucket_size: usize,
    store: Mutex<BucketStore>,
    stats: AtomicArenaStats,
}

impl Arena {
    /// Create an arena with buckets of `bucket_size_bytes` bytes.
    ///
    /// Zero selects [`DEFAULT_BUCKET_SIZE`](crate::DEFAULT_BUCKET_SIZE).
    #[must_use]
    pub fn new(bucket_size_bytes: usize) -> Self {
        let bucket_size = normalize_bucket_size(bucket_size_bytes);
        debug!(bucket_size, "creating arena");
        Self {
            bucket_size,
            store: Mutex::new(BucketStore::new(bucket_size)),
            stats: AtomicArenaStats::new(),
        }
    }

    /// Create an arena from a config.
    #[must_use]
    pub fn with_config(config: &ArenaConfig) -> Self {
        Self::new(config.bucket_size_bytes)
    }

    /// Reserve a slot for one `T`.
    ///
    /// The slot's bytes are whatever the bucket last held: zero for a fresh
    /// bucket, old data after a [`reset`](Self::reset).
    pub fn allocate<T: Pod>(&self) -> Result<Handle<T>, ArenaError> {
        let size = size_of::<T>();
        if size > self.bucket_size {
            self.stats.record_rejection();
            return Err(ArenaError::ValueTooLarge {
                requested: size,
                bucket_size: self.bucket_size,
            });
        }

        let (reservation, num_buckets) = {
            let mut store = self.store.lock();
            let reservation = store.reserve(size);
            (reservation, store.num_buckets())
        };

        match reservation.advance {
            Advance::Stayed => {}
            Advance::Grew => {
                self.stats.record_growth();
                debug!(num_buckets, bucket_size = self.bucket_size, "arena grew");
            }
            Advance::Reused => {
                self.stats.record_reuse();
                debug!(bucket = reservation.bucket_index, "arena reusing bucket");
            }
        }
        self.stats.record_allocation(size);
        trace!(
            bucket = reservation.bucket_index,
            offset = reservation.offset,
            size,
            "allocated slot"
        );

        Ok(Handle::new(
            reservation.bucket,
            reservation.offset,
            reservation.generation,
        ))
    }

    /// Reserve a slot and store `value` in it.
    ///
    /// The reservation and the write are two steps. If another thread calls
    /// [`clear`](Self::clear) in between, the returned handle is already dead
    /// and `value` was never stored; [`Handle::is_live`] tells the cases apart.
    pub fn allocate_with<T: Pod>(&self, value: T) -> Result<Handle<T>, ArenaError> {
        let handle = self.allocate::<T>()?;
        let _ = handle.write(value);
        Ok(handle)
    }

    /// Rewind to the first bucket without releasing memory.
    ///
    /// Existing handles keep resolving but may observe data written by later
    /// allocations.
    pub fn reset(&self) {
        let num_buckets = {
            let mut store = self.store.lock();
            store.reset();
            store.num_buckets()
        };
        self.stats.record_reset();
        debug!(num_buckets, "arena reset");
    }

    /// Release every bucket. All handles issued so far stop resolving.
    ///
    /// The arena stays usable and grows a fresh store on the next allocation.
    /// Handles are invalidated before this returns; the bucket memory is
    /// freed once no in-flight handle access still holds it.
    pub fn clear(&self) {
        let (retired, epoch) = {
            let mut store = self.store.lock();
            let retired = store.clear();
            (retired, store.epoch())
        };
        let released = retired.len();
        drop(retired);
        self.stats.record_clear();
        debug!(epoch, released, "arena cleared");
    }

    /// Fixed bucket size in bytes.
    #[must_use]
    pub fn bucket_size_bytes(&self) -> usize {
        self.bucket_size
    }

    /// Number of buckets currently held.
    #[must_use]
    pub fn num_buckets(&self) -> usize {
        self.store.lock().num_buckets()
    }

    /// Total bytes held across all buckets.
    #[must_use]
    pub fn total_mem_bytes(&self) -> usize {
        self.bucket_size * self.num_buckets()
    }

    /// Bytes behind the cursor in the current pass, counting skipped tails.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.store.lock().used_bytes()
    }

    /// Number of clears performed so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.store.lock().epoch()
    }

    /// Copy out the raw contents of the bucket at `index`.
    #[must_use]
    pub fn bucket_snapshot(&self, index: usize) -> Option<Vec<u8>> {
        let bucket = self.store.lock().bucket(index)?;
        Some(bucket.snapshot())
    }

    /// Snapshot of the activity counters.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.stats.snapshot()
    }

    /// Zero the activity counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::with_config(&ArenaConfig::default())
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.store.lock();
        f.debug_struct("Arena")
            .field("bucket_size", &self.bucket_size)
            .field("num_buckets", &store.num_buckets())
            .field("used_bytes", &store.used_bytes())
            .field("epoch", &store.epoch())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::config::DEFAULT_BUCKET_SIZE;

    type Triple = [u64; 3];

    #[test]
    fn zero_bucket_size_uses_default() {
        let arena = Arena::new(0);
        assert_eq!(arena.bucket_size_bytes(), DEFAULT_BUCKET_SIZE);
        arena.allocate::<Triple>().unwrap();
        assert_eq!(arena.num_buckets(), 1);
    }

    #[test]
    fn six_hundred_byte_values_use_two_buckets() {
        let arena = Arena::new(300);
        for _ in 0..6 {
            arena.allocate::<[u8; 100]>().unwrap();
        }
        assert_eq!(arena.num_buckets(), 2);
        assert_eq!(arena.total_mem_bytes(), 600);
    }

    #[test]
    fn too_large_is_rejected_without_state_change() {
        let arena = Arena::new(16);
        let before = arena.used_bytes();
        let err = arena.allocate::<Triple>().unwrap_err();
        assert_eq!(
            err,
            ArenaError::ValueTooLarge {
                requested: 24,
                bucket_size: 16
            }
        );
        assert_eq!(arena.num_buckets(), 1);
        assert_eq!(arena.used_bytes(), before);
        assert_eq!(arena.stats().rejected, 1);
        assert_eq!(arena.stats().allocations, 0);
    }

    #[test]
    fn value_equal_to_bucket_size_fits() {
        let arena = Arena::new(24);
        let handle = arena.allocate_with([1u64, 2, 3]).unwrap();
        assert_eq!(handle.resolve(), Some([1, 2, 3]));
        assert_eq!(arena.num_buckets(), 1);
    }

    #[test]
    fn reset_keeps_memory_and_handles() {
        let arena = Arena::new(48);
        let first = arena.allocate_with([1u64, 1, 1]).unwrap();
        arena.allocate::<Triple>().unwrap();
        arena.allocate::<Triple>().unwrap();
        assert_eq!(arena.num_buckets(), 2);

        arena.reset();
        assert_eq!(arena.num_buckets(), 2);
        assert_eq!(arena.used_bytes(), 0);
        assert_eq!(first.resolve(), Some([1, 1, 1]));

        let second = arena.allocate_with([9u64, 9, 9]).unwrap();
        assert_eq!(second.offset(), first.offset());
        assert_eq!(first.resolve(), Some([9, 9, 9]));
    }

    #[test]
    fn clear_invalidates_and_regrows() {
        let arena = Arena::new(48);
        let old = arena.allocate_with(7u64).unwrap();
        arena.clear();
        assert_eq!(arena.num_buckets(), 0);
        assert_eq!(arena.total_mem_bytes(), 0);
        assert_eq!(arena.epoch(), 1);
        assert!(old.resolve().is_none());

        let new = arena.allocate_with(8u64).unwrap();
        assert_eq!(arena.num_buckets(), 1);
        assert_eq!(new.generation(), 1);
        assert_eq!(new.resolve(), Some(8));
        assert!(old.resolve().is_none());
    }

    #[test]
    fn snapshot_reflects_written_bytes() {
        let arena = Arena::new(4);
        arena.allocate_with(0xAAu8).unwrap();
        arena.allocate_with(0xBBu8).unwrap();
        assert_eq!(arena.bucket_snapshot(0), Some(vec![0xAA, 0xBB, 0, 0]));
        assert_eq!(arena.bucket_snapshot(1), None);
    }

    #[test]
    fn stats_track_growth_and_reuse() {
        let arena = Arena::new(8);
        for _ in 0..3 {
            arena.allocate::<u64>().unwrap();
        }
        arena.reset();
        for _ in 0..3 {
            arena.allocate::<u64>().unwrap();
        }
        let stats = arena.stats();
        assert_eq!(stats.allocations, 6);
        assert_eq!(stats.bytes_allocated, 48);
        assert_eq!(stats.buckets_grown, 2);
        assert_eq!(stats.buckets_reused, 2);
        assert_eq!(stats.resets, 1);

        arena.reset_stats();
        assert_eq!(arena.stats(), ArenaStats::default());
    }

    #[test]
    fn shared_across_threads() {
        let arena = Arc::new(Arena::new(64));
        let workers: Vec<_> = (0..8u64)
            .map(|i| {
                let arena = Arc::clone(&arena);
                thread::spawn(move || arena.allocate_with(i).unwrap())
            })
            .collect();
        let handles: Vec<_> = workers.into_iter().map(|t| t.join().unwrap()).collect();

        let mut values: Vec<u64> = handles.iter().filter_map(Handle::resolve).collect();
        values.sort_unstable();
        assert_eq!(values, (0..8).collect::<Vec<_>>());
        assert_eq!(arena.num_buckets(), 1);
    }

    #[test]
    fn slot_released_before_write_reports_dead_handle() {
        let arena = Arena::new(16);
        let handle = arena.allocate::<u64>().unwrap();
        arena.clear();
        assert!(handle.write(1).is_none());
        assert!(!handle.is_live());

        let fresh = arena.allocate_with(2u64).unwrap();
        assert!(fresh.is_live());
        assert_eq!(fresh.resolve(), Some(2));
    }

    #[test]
    fn clear_from_inside_update_completes() {
        let arena = Arc::new(Arena::new(64));
        let handle = arena.allocate_with(1u64).unwrap();
        let (done, finished) = mpsc::channel();

        let worker = {
            let arena = Arc::clone(&arena);
            let handle = handle.clone();
            thread::spawn(move || {
                let out = handle.update(|v| {
                    *v += 1;
                    arena.clear();
                    *v
                });
                done.send(out).unwrap();
            })
        };

        let out = finished
            .recv_timeout(Duration::from_secs(2))
            .expect("update calling clear did not finish");
        worker.join().unwrap();
        assert_eq!(out, Some(2));
        assert!(handle.resolve().is_none());
        assert_eq!(arena.epoch(), 1);
    }

    #[test]
    fn slow_update_does_not_stall_clear_or_allocate() {
        let arena = Arc::new(Arena::new(64));
        let handle = arena.allocate_with(1u64).unwrap();
        let (entered, in_update) = mpsc::channel();

        let updater = {
            let handle = handle.clone();
            thread::spawn(move || {
                handle.update(|v| {
                    entered.send(()).unwrap();
                    thread::sleep(Duration::from_millis(800));
                    *v += 1;
                })
            })
        };
        in_update.recv().unwrap();

        let (cleared, clear_done) = mpsc::channel();
        let clearer = {
            let arena = Arc::clone(&arena);
            thread::spawn(move || {
                arena.clear();
                cleared.send(()).unwrap();
            })
        };
        clear_done
            .recv_timeout(Duration::from_millis(400))
            .expect("clear waited on an in-flight update");

        let start = Instant::now();
        let fresh = arena.allocate_with(5u8).unwrap();
        assert!(start.elapsed() < Duration::from_millis(400));
        assert_eq!(fresh.resolve(), Some(5));

        assert_eq!(updater.join().unwrap(), Some(()));
        clearer.join().unwrap();
        assert!(handle.resolve().is_none());
    }

    #[test]
    fn debug_output_mentions_buckets() {
        let arena = Arena::new(32);
        let text = format!("{arena:?}");
        assert!(text.contains("num_buckets: 1"));
    }
}
