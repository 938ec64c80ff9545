//! Report formatting.

use std::io::{self, Write};
use std::time::Duration;

use crate::app::Report;

/// Format a number with thousand separators.
#[must_use]
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a byte count with a binary-unit suffix.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Format a duration for display.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else {
        format!("{secs:.3}s")
    }
}

/// Write a human-readable summary.
pub fn present_text(report: &Report, w: &mut impl Write) -> io::Result<()> {
    writeln!(
        w,
        "workload: {} x {} B values, {} pass(es), between={:?}, threads={}",
        format_number(report.count as u64),
        report.value_size,
        report.passes,
        report.between,
        report.threads
    )?;
    writeln!(w, "bucket size:   {}", format_bytes(report.bucket_size_bytes))?;
    writeln!(
        w,
        "buckets:       {} (peak {})",
        report.num_buckets, report.peak_buckets
    )?;
    writeln!(w, "total memory:  {}", format_bytes(report.total_mem_bytes))?;
    writeln!(w, "cursor:        {}", format_bytes(report.used_bytes))?;
    writeln!(w, "epoch:         {}", report.epoch)?;
    writeln!(
        w,
        "allocations:   {} ({} grown, {} reused)",
        format_number(report.stats.allocations),
        report.stats.buckets_grown,
        report.stats.buckets_reused
    )?;
    writeln!(w, "elapsed:       {}", format_duration(report.elapsed))
}

/// Write the report as pretty-printed JSON.
pub fn present_json(report: &Report, w: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, report)?;
    writeln!(w)
}
