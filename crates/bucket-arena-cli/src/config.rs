//! Application configuration from CLI flags, environment and config file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use bucket_arena::ArenaConfig;

use crate::errors::AppError;

/// What to do with the arena between two allocation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Between {
    /// Keep allocating after the previous pass.
    None,
    /// Rewind and reuse the existing buckets.
    Reset,
    /// Release all buckets.
    Clear,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// JSON document.
    Json,
}

/// bucket-arena — drive a bucketed bump arena and report its footprint.
#[derive(Parser, Debug)]
#[command(name = "bucket-arena", version, about)]
pub struct AppConfig {
    /// Bucket size in bytes (0 selects the 64 KiB default).
    #[arg(short, long, default_value = "0", env = "BUCKET_ARENA_BUCKET_SIZE")]
    pub bucket_size: usize,

    /// Size in bytes of every allocated value.
    #[arg(short = 's', long, default_value = "64", env = "BUCKET_ARENA_VALUE_SIZE")]
    pub value_size: usize,

    /// Allocations per pass.
    #[arg(short = 'n', long, default_value = "1000", env = "BUCKET_ARENA_COUNT")]
    pub count: usize,

    /// Number of allocation passes.
    #[arg(short, long, default_value = "1")]
    pub passes: usize,

    /// Arena operation run between passes.
    #[arg(long, value_enum, default_value = "reset")]
    pub between: Between,

    /// Worker threads allocating concurrently.
    #[arg(short, long, default_value = "1", env = "BUCKET_ARENA_THREADS")]
    pub threads: usize,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// JSON file holding an arena config; `--bucket-size` overrides it.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Resolve the arena config from the config file and flags.
    pub fn arena_config(&self) -> Result<ArenaConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
                serde_json::from_str::<ArenaConfig>(&text)
                    .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?
            }
            None => ArenaConfig::new(0),
        };
        if self.bucket_size != 0 {
            config.bucket_size_bytes = self.bucket_size;
        }
        Ok(config.normalize())
    }

    /// Check flag combinations the parser cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.threads == 0 {
            return Err(AppError::Config("--threads must be at least 1".into()));
        }
        if self.passes == 0 {
            return Err(AppError::Config("--passes must be at least 1".into()));
        }
        Ok(())
    }
}
