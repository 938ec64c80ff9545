//! Arena error types.

/// Errors returned by arena allocation.
///
/// A failed allocation never mutates the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// The value does not fit in a single bucket. Retrying with the same
    /// type always fails.
    #[error("value too large for arena: requested {requested} bytes, bucket size {bucket_size} bytes")]
    ValueTooLarge {
        /// Size of the rejected value in bytes.
        requested: usize,
        /// The arena's fixed bucket size in bytes.
        bucket_size: usize,
    },
}
