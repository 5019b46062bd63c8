//! The two worker pool models behind the execution backend.
//!
//! Both pools consume the same task list and feed the same append-only
//! record collection; they differ only in where workers live (threads in
//! this process vs. separate worker processes) and therefore in how worker
//! identity and abort are handled.

use std::sync::mpsc;

use crate::error::{Error, Result};
use crate::{ExecutionRecord, UnitId};

pub(crate) mod isolated;
pub(crate) mod shared;

/// What became of one dispatched task. Every dispatched task produces
/// exactly one outcome, which is what lets the collector know when a run is
/// fully joined.
pub(crate) enum TaskOutcome {
    /// The task completed and was observed.
    Completed(ExecutionRecord),

    /// The task failed; the first failure aborts the run.
    Failed { unit_id: UnitId, cause: String },

    /// The task was never started because the run was already aborting.
    Skipped,
}

/// Drains one outcome per dispatched task, keeping completed records and the
/// first failure.
///
/// Records arrive in completion order, which carries no meaning; consumers
/// group by unit id. A prematurely closed channel means every remaining
/// worker is gone (the pool aborted), so the drain simply ends.
pub(crate) fn collect_outcomes(
    outcomes: &mpsc::Receiver<TaskOutcome>,
    dispatched: usize,
) -> Result<Vec<ExecutionRecord>> {
    let mut records = Vec::with_capacity(dispatched);
    let mut first_failure = None;

    for _ in 0..dispatched {
        match outcomes.recv() {
            Ok(TaskOutcome::Completed(record)) => records.push(record),
            Ok(TaskOutcome::Failed { unit_id, cause }) => {
                if first_failure.is_none() {
                    first_failure = Some(Error::UnitExecutionFailed { unit_id, cause });
                }
            }
            Ok(TaskOutcome::Skipped) => {}
            Err(mpsc::RecvError) => break,
        }
    }

    match first_failure {
        None => Ok(records),
        Some(failure) => Err(failure),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use new_zealand::nz;

    use super::*;
    use crate::WorkerIdentity;

    fn record(unit_id: UnitId) -> ExecutionRecord {
        ExecutionRecord::new(
            unit_id,
            WorkerIdentity::Process { pid: 1 },
            None,
            Duration::ZERO,
            Duration::from_millis(1),
            nz!(1),
        )
    }

    #[test]
    fn keeps_records_until_all_outcomes_drain() {
        let (tx, rx) = mpsc::channel();
        tx.send(TaskOutcome::Completed(record(UnitId::Item(0))))
            .unwrap();
        tx.send(TaskOutcome::Completed(record(UnitId::Item(1))))
            .unwrap();

        let records = collect_outcomes(&rx, 2).unwrap();

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn first_failure_wins_and_skips_are_not_records() {
        let (tx, rx) = mpsc::channel();
        tx.send(TaskOutcome::Completed(record(UnitId::Item(0))))
            .unwrap();
        tx.send(TaskOutcome::Failed {
            unit_id: UnitId::Item(1),
            cause: "first".to_string(),
        })
        .unwrap();
        tx.send(TaskOutcome::Failed {
            unit_id: UnitId::Item(2),
            cause: "second".to_string(),
        })
        .unwrap();
        tx.send(TaskOutcome::Skipped).unwrap();

        let error = collect_outcomes(&rx, 4).unwrap_err();

        assert!(matches!(
            error,
            Error::UnitExecutionFailed {
                unit_id: UnitId::Item(1),
                ..
            }
        ));
    }

    #[test]
    fn closed_channel_ends_the_drain() {
        let (tx, rx) = mpsc::channel::<TaskOutcome>();
        drop(tx);

        let records = collect_outcomes(&rx, 5).unwrap();

        assert!(records.is_empty());
    }
}
