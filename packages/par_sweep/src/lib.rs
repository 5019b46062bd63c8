#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Benchmarking harness for comparing parallel execution strategies of a
//! CPU-bound, embarrassingly-parallel workload against a sequential
//! baseline.
//!
//! The harness partitions an ordered workload, dispatches it across
//! interchangeable concurrency backends, captures per-unit execution
//! telemetry (worker identity, best-effort CPU id, monotonic timing) and
//! reduces the measured durations into speedup and efficiency series.
//!
//! The core pieces:
//! - [`partition`] - splits a workload into near-equal contiguous chunks
//! - [`Strategy`] - the closed `{pool model} x {granularity}` set of four
//!   execution strategies
//! - [`measure`] - the warmup + repeated-trial + median sequential baseline
//! - [`aggregate`] - the pure speedup/efficiency reduction
//! - [`Sweep`] - drives one strategy across a worker-count sweep and
//!   assembles a [`BenchmarkRun`] for reporting collaborators
//!
//! The workload itself is an opaque [`ItemProcessor`] callback. Shared-pool
//! strategies call it in-process; isolated strategies reach it through a
//! worker binary speaking the [`proto`] protocol, because closures do not
//! cross process boundaries.
//!
//! # Example
//!
//! Sweeping the built-in spin workload over a shared pool:
//!
//! ```
//! use new_zealand::nz;
//! use par_sweep::{
//!     BaselinePolicy, Granularity, PoolModel, SpinProcessor, Strategy, Sweep, SweepConfig,
//!     units_from,
//! };
//!
//! let units = units_from((0..16).map(|_| "2000"));
//!
//! let config = SweepConfig::new(Strategy::new(PoolModel::Shared, Granularity::Chunked))
//!     .with_worker_counts(vec![nz!(1), nz!(2)])
//!     .with_baseline_policy(BaselinePolicy::SelfRelative);
//!
//! let run = Sweep::new(config).execute(&units, &SpinProcessor).unwrap();
//!
//! assert_eq!(run.rows().len(), 2);
//! ```
//!
//! # Limits, by design
//!
//! This is a pragmatic best-of-N/median harness, not a statistically
//! rigorous one: no CPU pinning, no variance modelling. There is also no
//! mid-run cancellation - a hung unit stalls its sweep point. Failed units
//! are never retried, since timing retried work would corrupt the duration
//! metric; a failed sweep point is reported as failed and the sweep moves
//! on.

mod baseline;
mod error;
mod metrics;
mod partition;
mod pool;
mod processor;
mod spin;
mod strategy;
mod sweep;
mod telemetry;
mod work;

pub mod proto;

pub use baseline::*;
pub use error::Error;
pub use metrics::*;
pub use partition::*;
pub use processor::{ItemError, ItemProcessor};
pub use spin::*;
pub use strategy::{Granularity, PoolModel, Strategy};
pub use sweep::*;
pub use telemetry::{ExecutionRecord, WorkerIdentity, current_processor_id};
pub use work::*;
