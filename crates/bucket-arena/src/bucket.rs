//! Fixed-size buckets and the append-only bucket store.
//!
//! A [`Bucket`] is a zero-initialized byte buffer tagged with a generation.
//! The [`BucketStore`] owns the bucket list together with the bump cursor and
//! decides when to move to the next bucket and when to append a new one.
//! The store itself is not synchronized; [`Arena`](crate::Arena) wraps it in
//! its guard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// A fixed-size byte buffer shared between the store and its handles.
///
/// The store holds the only strong references. Handles hold [`Weak`]
/// references, so dropping a bucket from the store releases its memory.
///
/// The generation lives outside the byte lock: retiring a bucket never waits
/// for a handle that is busy with its bytes.
pub(crate) struct Bucket {
    generation: AtomicU64,
    bytes: Mutex<Box<[u8]>>,
}

impl Bucket {
    fn new(size: usize, generation: u64) -> Arc<Self> {
        Arc::new(Self {
            generation: AtomicU64::new(generation),
            bytes: Mutex::new(vec![0u8; size].into_boxed_slice()),
        })
    }

    /// Run `f` over the bucket bytes if the bucket is still at `generation`.
    pub(crate) fn access<R>(&self, generation: u64, f: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        let mut bytes = self.bytes.lock();
        if self.generation() != generation {
            return None;
        }
        Some(f(&mut bytes))
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Invalidate every handle issued against this bucket.
    fn retire(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn snapshot(&self) -> Vec<u8> {
        self.bytes.lock().to_vec()
    }
}

/// How the cursor moved while satisfying a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// The slot fit in the current bucket.
    Stayed,
    /// A new bucket was appended.
    Grew,
    /// The cursor moved into a bucket kept from before a reset.
    Reused,
}

/// A slot carved out of the store by [`BucketStore::reserve`].
pub(crate) struct Reservation {
    pub(crate) bucket: Weak<Bucket>,
    pub(crate) bucket_index: usize,
    pub(crate) offset: usize,
    pub(crate) generation: u64,
    pub(crate) advance: Advance,
}

/// Append-only list of buckets plus the bump cursor.
pub(crate) struct BucketStore {
    bucket_size: usize,
    buckets: Vec<Arc<Bucket>>,
    current: usize,
    remaining: usize,
    epoch: u64,
}

impl BucketStore {
    /// Create a store with one pre-allocated bucket.
    pub(crate) fn new(bucket_size: usize) -> Self {
        let mut store = Self {
            bucket_size,
            buckets: Vec::new(),
            current: 0,
            remaining: bucket_size,
            epoch: 0,
        };
        store.push_bucket();
        store
    }

    fn push_bucket(&mut self) {
        self.buckets.push(Bucket::new(self.bucket_size, self.epoch));
    }

    /// Reserve `size` contiguous bytes.
    ///
    /// The caller guarantees `size <= bucket_size`. A slot never spans two
    /// buckets: if it does not fit in what is left of the current bucket the
    /// cursor moves to the next one, which is appended only when the current
    /// bucket is the last.
    pub(crate) fn reserve(&mut self, size: usize) -> Reservation {
        debug_assert!(size <= self.bucket_size);

        let mut advance = Advance::Stayed;
        if self.buckets.is_empty() {
            self.push_bucket();
            self.current = 0;
            self.remaining = self.bucket_size;
            advance = Advance::Grew;
        } else if self.remaining < size {
            if self.current == self.buckets.len() - 1 {
                self.push_bucket();
                advance = Advance::Grew;
            } else {
                advance = Advance::Reused;
            }
            self.current += 1;
            self.remaining = self.bucket_size;
        }

        let offset = self.bucket_size - self.remaining;
        self.remaining -= size;

        Reservation {
            bucket: Arc::downgrade(&self.buckets[self.current]),
            bucket_index: self.current,
            offset,
            generation: self.epoch,
            advance,
        }
    }

    /// Rewind the cursor to the start of the first bucket. Nothing is freed.
    pub(crate) fn reset(&mut self) {
        self.remaining = self.bucket_size;
        self.current = 0;
    }

    /// Retire every bucket and start a new epoch.
    ///
    /// The retired buckets are handed back so the caller can release them
    /// after dropping its guard.
    pub(crate) fn clear(&mut self) -> Vec<Arc<Bucket>> {
        let retired = std::mem::take(&mut self.buckets);
        for bucket in &retired {
            bucket.retire();
        }
        self.epoch += 1;
        self.remaining = self.bucket_size;
        self.current = 0;
        retired
    }

    pub(crate) fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Bytes before the cursor, including unused bucket tails.
    pub(crate) fn used_bytes(&self) -> usize {
        if self.buckets.is_empty() {
            return 0;
        }
        self.current * self.bucket_size + (self.bucket_size - self.remaining)
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn bucket(&self, index: usize) -> Option<Arc<Bucket>> {
        self.buckets.get(index).cloned()
    }
}
