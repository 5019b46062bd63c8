use std::num::NonZero;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{ItemProcessor, OutputSink, UnitId, WorkUnit};

/// How many leading units the discarded warmup pass covers.
const WARMUP_UNITS: usize = 10;

/// The reference measurement a sweep's speedups are computed against.
///
/// Produced by [`measure`]: one discarded warmup pass, then `trials` full
/// sequential passes; the retained duration is the **median** of the
/// samples, which is less sensitive to one slow outlier than the mean. For
/// an even number of trials the two middle samples are averaged.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Baseline {
    samples: Vec<Duration>,
    duration: Duration,
}

impl Baseline {
    /// Every retained trial duration, in measurement order.
    #[must_use]
    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    /// The median trial duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Measures the sequential reference duration for a workload.
///
/// Policy: run the processor over the first `min(10, n)` units once,
/// discarded, to warm caches; then run the full workload sequentially
/// `trials` times on a monotonic clock; retain the median sample.
///
/// # Errors
///
/// Fails with [`Error::EmptyWorkload`] when there is nothing to measure,
/// or with [`Error::UnitExecutionFailed`] when the processor rejects an
/// item (there are no retries - timing retried work would corrupt the
/// reference).
pub fn measure<P: ItemProcessor>(
    units: &[WorkUnit],
    processor: &P,
    sink: &OutputSink,
    trials: NonZero<usize>,
) -> Result<Baseline> {
    if units.is_empty() {
        return Err(Error::EmptyWorkload);
    }

    let warmup = &units[..units.len().min(WARMUP_UNITS)];
    sequential_pass(processor, warmup, sink)?;

    let mut samples = Vec::with_capacity(trials.get());

    for _ in 0..trials.get() {
        let clock = Instant::now();
        sequential_pass(processor, units, sink)?;
        samples.push(clock.elapsed());
    }

    let duration = median(&samples);

    Ok(Baseline { samples, duration })
}

fn sequential_pass<P: ItemProcessor>(
    processor: &P,
    units: &[WorkUnit],
    sink: &OutputSink,
) -> Result<()> {
    for unit in units {
        processor.process(unit, sink).map_err(|error| {
            Error::UnitExecutionFailed {
                unit_id: UnitId::Item(unit.index()),
                cause: error.to_string(),
            }
        })?;
    }

    Ok(())
}

fn median(samples: &[Duration]) -> Duration {
    debug_assert!(!samples.is_empty());

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2
    }
}
