//! Error types and exit codes.

use bucket_arena::ArenaError;

/// Process exit codes.
pub mod exit_codes {
    /// Workload completed.
    pub const SUCCESS: u8 = 0;
    /// Unclassified failure.
    pub const ERROR_GENERIC: u8 = 1;
    /// The arena rejected an allocation.
    pub const ERROR_ARENA: u8 = 3;
    /// Invalid flags or config file.
    pub const ERROR_CONFIG: u8 = 4;
}

/// Errors raised by the workload driver.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The arena rejected an allocation.
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

/// Map an error to the process exit code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::Config(_)) => exit_codes::ERROR_CONFIG,
        Some(AppError::Arena(_)) => exit_codes::ERROR_ARENA,
        None => exit_codes::ERROR_GENERIC,
    }
}
