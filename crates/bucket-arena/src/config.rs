//! Arena configuration.

use serde::{Deserialize, Serialize};

/// Bucket size used when a bucket size of zero is requested (64 KiB).
pub const DEFAULT_BUCKET_SIZE: usize = 65_536;

/// Construction parameters for an [`Arena`](crate::Arena).
///
/// The bucket size is fixed for the lifetime of the arena. A value of zero
/// selects [`DEFAULT_BUCKET_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Size of every bucket in bytes.
    pub bucket_size_bytes: usize,
}

impl ArenaConfig {
    /// Create a config with the given bucket size.
    #[must_use]
    pub fn new(bucket_size_bytes: usize) -> Self {
        Self { bucket_size_bytes }
    }

    /// Return a copy with the zero bucket size replaced by the default.
    #[must_use]
    pub fn normalize(self) -> Self {
        Self {
            bucket_size_bytes: normalize_bucket_size(self.bucket_size_bytes),
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_SIZE)
    }
}

pub(crate) fn normalize_bucket_size(bytes: usize) -> usize {
    if bytes == 0 {
        DEFAULT_BUCKET_SIZE
    } else {
        bytes
    }
}
