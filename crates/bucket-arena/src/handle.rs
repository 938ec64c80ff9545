//! Weak, generation-checked references to arena slots.
//!
//! A [`Handle`] records the bucket, byte offset and generation of a slot at
//! the moment it was allocated. It never keeps the bucket alive:
//!
//! - after [`Arena::reset`](crate::Arena::reset) the handle still resolves,
//!   but later allocations may overwrite the bytes it points at;
//! - after [`Arena::clear`](crate::Arena::clear), or once the arena is
//!   dropped, the handle resolves to `None` forever.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::Weak;

use bytemuck::Pod;

use crate::bucket::Bucket;

/// Non-owning reference to a value of type `T` stored in an arena.
///
/// Values are plain data copied in and out of the bucket bytes; slots carry
/// no alignment, so the handle hands out copies instead of references.
pub struct Handle<T> {
    bucket: Weak<Bucket>,
    offset: usize,
    generation: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Pod> Handle<T> {
    pub(crate) fn new(bucket: Weak<Bucket>, offset: usize, generation: u64) -> Self {
        Self {
            bucket,
            offset,
            generation,
            _marker: PhantomData,
        }
    }

    /// A handle that never resolves.
    #[must_use]
    pub fn dangling() -> Self {
        Self::new(Weak::new(), 0, 0)
    }

    fn with_bytes<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        let bucket = self.bucket.upgrade()?;
        let range = self.offset..self.offset + size_of::<T>();
        bucket.access(self.generation, |bytes| f(&mut bytes[range]))
    }

    /// Read the current value, or `None` if the slot has been released.
    #[must_use]
    pub fn resolve(&self) -> Option<T> {
        self.with_bytes(|bytes| bytemuck::pod_read_unaligned(bytes))
    }

    /// Overwrite the slot. Returns `None` if the slot has been released.
    pub fn write(&self, value: T) -> Option<()> {
        self.with_bytes(|bytes| bytes.copy_from_slice(bytemuck::bytes_of(&value)))
    }

    /// Read-modify-write the slot while holding its bucket lock.
    ///
    /// `f` must not touch other handles into the same bucket. It may call
    /// into the arena; a [`clear`](crate::Arena::clear) issued from `f` kills
    /// this handle once `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.with_bytes(|bytes| {
            let mut value: T = bytemuck::pod_read_unaligned(bytes);
            let out = f(&mut value);
            bytes.copy_from_slice(bytemuck::bytes_of(&value));
            out
        })
    }

    /// Whether [`resolve`](Self::resolve) would currently succeed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.bucket
            .upgrade()
            .is_some_and(|bucket| bucket.generation() == self.generation)
    }
}

impl<T> Handle<T> {
    /// Byte offset of the slot within its bucket.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Arena epoch the slot was allocated in.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            bucket: self.bucket.clone(),
            offset: self.offset,
            generation: self.generation,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("type", &std::any::type_name::<T>())
            .field("offset", &self.offset)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
