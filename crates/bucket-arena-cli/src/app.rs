//! Application entry point and workload execution.

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use bucket_arena::{Arena, ArenaError, ArenaStats};

use crate::config::{AppConfig, Between, OutputFormat};
use crate::errors::AppError;
use crate::output;

type AllocFn = fn(&Arena, u8) -> Result<(), ArenaError>;

fn allocate_block<const N: usize>(arena: &Arena, fill: u8) -> Result<(), ArenaError> {
    arena.allocate_with([fill; N]).map(drop)
}

/// Value sizes the driver can allocate.
pub const SUPPORTED_VALUE_SIZES: [usize; 20] = [
    1, 2, 4, 8, 16, 24, 32, 64, 100, 128, 256, 512, 1024, 2048, 4096, 8192, 16_384, 32_768,
    65_536, 131_072,
];

fn allocator_for(size: usize) -> Option<AllocFn> {
    let f: AllocFn = match size {
        1 => allocate_block::<1>,
        2 => allocate_block::<2>,
        4 => allocate_block::<4>,
        8 => allocate_block::<8>,
        16 => allocate_block::<16>,
        24 => allocate_block::<24>,
        32 => allocate_block::<32>,
        64 => allocate_block::<64>,
        100 => allocate_block::<100>,
        128 => allocate_block::<128>,
        256 => allocate_block::<256>,
        512 => allocate_block::<512>,
        1024 => allocate_block::<1024>,
        2048 => allocate_block::<2048>,
        4096 => allocate_block::<4096>,
        8192 => allocate_block::<8192>,
        16_384 => allocate_block::<16_384>,
        32_768 => allocate_block::<32_768>,
        65_536 => allocate_block::<65_536>,
        131_072 => allocate_block::<131_072>,
        _ => return None,
    };
    Some(f)
}

/// Outcome of a workload run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Arena bucket size in bytes.
    pub bucket_size_bytes: usize,
    /// Size of each allocated value.
    pub value_size: usize,
    /// Allocations per pass.
    pub count: usize,
    /// Number of passes run.
    pub passes: usize,
    /// Operation run between passes.
    pub between: Between,
    /// Worker threads.
    pub threads: usize,
    /// Buckets held at the end.
    pub num_buckets: usize,
    /// Largest bucket count observed after any pass.
    pub peak_buckets: usize,
    /// Bytes held at the end.
    pub total_mem_bytes: usize,
    /// Bytes behind the cursor at the end.
    pub used_bytes: usize,
    /// Clears performed.
    pub epoch: u64,
    /// Wall-clock time spent allocating.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Arena activity counters.
    pub stats: ArenaStats,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    let report = run_workload(config)?;
    let mut stdout = io::stdout().lock();
    match config.format {
        OutputFormat::Text => output::present_text(&report, &mut stdout)?,
        OutputFormat::Json => output::present_json(&report, &mut stdout)?,
    }
    Ok(())
}

/// Build an arena from `config`, run every pass and collect the report.
#[allow(clippy::cast_possible_truncation)]
pub fn run_workload(config: &AppConfig) -> Result<Report> {
    config.validate()?;
    let arena_config = config.arena_config()?;
    let allocate = allocator_for(config.value_size).ok_or_else(|| {
        AppError::Config(format!(
            "unsupported value size {} (supported: {SUPPORTED_VALUE_SIZES:?})",
            config.value_size
        ))
    })?;

    let arena = Arena::with_config(&arena_config);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;

    let mut peak_buckets = arena.num_buckets();
    let mut elapsed = Duration::ZERO;
    for pass in 0..config.passes {
        if pass > 0 {
            match config.between {
                Between::None => {}
                Between::Reset => arena.reset(),
                Between::Clear => arena.clear(),
            }
        }

        let start = Instant::now();
        pool.install(|| {
            (0..config.count)
                .into_par_iter()
                .try_for_each(|i| allocate(&arena, (i % 256) as u8))
        })
        .map_err(AppError::from)?;
        elapsed += start.elapsed();

        peak_buckets = peak_buckets.max(arena.num_buckets());
        debug!(pass, num_buckets = arena.num_buckets(), "pass complete");
    }

    let report = Report {
        bucket_size_bytes: arena.bucket_size_bytes(),
        value_size: config.value_size,
        count: config.count,
        passes: config.passes,
        between: config.between,
        threads: config.threads,
        num_buckets: arena.num_buckets(),
        peak_buckets,
        total_mem_bytes: arena.total_mem_bytes(),
        used_bytes: arena.used_bytes(),
        epoch: arena.epoch(),
        elapsed,
        stats: arena.stats(),
    };
    info!(
        num_buckets = report.num_buckets,
        total_mem_bytes = report.total_mem_bytes,
        "workload finished"
    );
    Ok(report)
}
