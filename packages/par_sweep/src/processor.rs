use crate::{OutputSink, WorkUnit};

/// Error type returned by item processors.
///
/// Boxed because the harness treats processor failures as opaque causes; it
/// only ever renders them, including across the isolated backend's process
/// boundary.
pub type ItemError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The per-item workload callback, executed by every backend.
///
/// Implementations must be idempotent: re-invoking `process` on the same
/// item must succeed and produce the same output. Side effects must be
/// independent across items (each item writes to a distinct path under the
/// sink), since isolated workers share no mutable state and shared workers
/// run concurrently.
///
/// For the isolated backend the processor additionally has to be reachable
/// from a worker binary (see [`crate::proto::serve`]), because closures do
/// not cross process boundaries.
pub trait ItemProcessor: Send + Sync {
    /// Processes one work unit, writing any outputs to the given sink.
    ///
    /// # Errors
    ///
    /// Fails when the item is invalid or its outputs cannot be produced.
    /// The harness converts the failure into a hard failure of the unit
    /// that contained the item; it never retries.
    fn process(&self, unit: &WorkUnit, sink: &OutputSink) -> Result<(), ItemError>;
}

/// Runs a processor over a slice of units, stopping at the first failure.
///
/// The returned cause names the failing item, so chunk-granularity failures
/// remain attributable to an item even though the unit id names the chunk.
pub(crate) fn process_all<P>(
    processor: &P,
    units: &[WorkUnit],
    sink: &OutputSink,
) -> Result<(), String>
where
    P: ItemProcessor + ?Sized,
{
    for unit in units {
        processor.process(unit, sink).map_err(|error| {
            format!("item '{}' (index {}): {error}", unit.item(), unit.index())
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units_from;

    struct FailOn(&'static str);

    impl ItemProcessor for FailOn {
        fn process(&self, unit: &WorkUnit, _sink: &OutputSink) -> Result<(), ItemError> {
            if unit.item() == self.0 {
                return Err(format!("refusing '{}'", unit.item()).into());
            }
            Ok(())
        }
    }

    #[test]
    fn stops_at_first_failure_and_names_the_item() {
        let units = units_from(["a", "bad", "c"]);

        let cause = process_all(&FailOn("bad"), &units, &OutputSink::new("out")).unwrap_err();

        assert_eq!(cause, "item 'bad' (index 1): refusing 'bad'");
    }

    #[test]
    fn clean_pass_succeeds() {
        let units = units_from(["a", "b"]);

        process_all(&FailOn("bad"), &units, &OutputSink::new("out")).unwrap();
    }
}
