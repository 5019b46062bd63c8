#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Fixed per-image transform pipeline packaged as a [`par_sweep`] workload.
//!
//! Every image goes through the same five filters in order - grayscale,
//! gaussian blur, sobel edge detection, sharpen, brightness adjustment -
//! and is written to the output directory under its original file name.
//! The pipeline itself is deliberately boring: it exists to give the
//! benchmarking harness a CPU-bound, embarrassingly-parallel payload whose
//! per-item writes are independent.
//!
//! The `pixel_worker` binary exposes [`PixelProcessor`] over the isolated
//! pool's worker protocol.

pub mod filters;
mod processor;

pub use processor::{PipelineError, PixelProcessor};
