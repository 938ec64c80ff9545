//! bucket-arena CLI library — workload driver for the bucket arena.

pub mod app;
pub mod config;
pub mod errors;
pub mod output;
