//! # bucket-arena
//!
//! A thread-safe bump allocator that carves typed slots out of large,
//! fixed-size buckets.
//!
//! Allocation advances a cursor through the current bucket and moves to the
//! next bucket (appending one if needed) when a value does not fit. Memory
//! is reclaimed in bulk: [`Arena::reset`] rewinds the cursor and reuses the
//! existing buckets, [`Arena::clear`] releases them all.
//!
//! Allocations return [`Handle`]s, weak references that never keep a bucket
//! alive. A handle survives a reset (its bytes may be overwritten) and is
//! invalidated by a clear.
//!
//! ```
//! use bucket_arena::Arena;
//!
//! let arena = Arena::new(1024);
//! let handle = arena.allocate_with(42u64).unwrap();
//! assert_eq!(handle.resolve(), Some(42));
//!
//! arena.clear();
//! assert_eq!(handle.resolve(), None);
//! ```
#![warn(missing_docs)]

pub mod arena;
mod bucket;
pub mod config;
pub mod error;
pub mod handle;
pub mod stats;

pub use arena::Arena;
pub use config::{ArenaConfig, DEFAULT_BUCKET_SIZE};
pub use error::ArenaError;
pub use handle::Handle;
pub use stats::ArenaStats;
