use std::hint::black_box;

use crate::{ItemError, ItemProcessor, OutputSink, WorkUnit};

/// Synthetic CPU-bound item processor for calibrating the harness.
///
/// Interprets each item identifier as a decimal number of spin rounds and
/// burns that many rounds of floating-point work, touching no files and
/// writing nothing to the sink. Useful for exercising the harness with a
/// workload whose cost is deterministic and free of I/O noise; also the
/// processor behind the `spin_worker` binary, so the isolated backend can
/// be driven without any real payload.
///
/// Items that do not parse as a round count fail, which doubles as a
/// convenient failure-injection lever.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpinProcessor;

impl ItemProcessor for SpinProcessor {
    fn process(&self, unit: &WorkUnit, _sink: &OutputSink) -> Result<(), ItemError> {
        let rounds: u64 = unit.item().parse().map_err(|_| {
            ItemError::from(format!("'{}' is not a spin round count", unit.item()))
        })?;

        let mut value = 1.0_f64;
        for _ in 0..rounds {
            value = (value * 1.1 + 1.0).sin().abs();
        }
        black_box(value);

        Ok(())
    }
}
