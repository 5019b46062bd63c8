//! Shared-memory worker pool: a fixed set of named worker threads pulling
//! tasks from one queue.
//!
//! The measured window covers pool construction, dispatch and join, so runs
//! are comparable with the isolated pool (whose process spawning is likewise
//! inside the window).
//!
//! On a runtime with a global execution lock, threads in one address space
//! cannot speed up CPU-bound work; that expectation belongs to the
//! measurement's interpretation, not to this pool, which always dispatches
//! concurrently. Under this implementation both pool models genuinely run
//! in parallel - what this pool uniquely offers is shared memory, and what
//! it gives up is isolation.

use std::num::NonZero;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::pool::{TaskOutcome, collect_outcomes};
use crate::processor::process_all;
use crate::strategy::Task;
use crate::telemetry::observe_unit;
use crate::{ExecutionRecord, ItemProcessor, WorkerIdentity};

/// Runs the task list on `pool_size` worker threads, blocking until every
/// dispatched task is accounted for.
///
/// The first task failure marks the run aborted: tasks not yet started are
/// skipped, tasks already started drain to completion (shared workers are
/// never force-killed), and the first failure is returned.
#[cfg_attr(test, mutants::skip)] // Mutants that drop tasks deadlock the collector.
pub(crate) fn run<P: ItemProcessor>(
    tasks: Vec<Task>,
    pool_size: NonZero<usize>,
    processor: &P,
) -> Result<(Duration, Vec<ExecutionRecord>)> {
    let dispatched = tasks.len();
    let clock = Instant::now();

    let (task_tx, task_rx) = mpsc::channel::<Task>();
    let task_rx = Arc::new(Mutex::new(task_rx));
    let (outcome_tx, outcome_rx) = mpsc::channel::<TaskOutcome>();
    let abort = AtomicBool::new(false);

    let collected = thread::scope(|scope| {
        for worker_index in 0..pool_size.get() {
            let task_rx = Arc::clone(&task_rx);
            let outcome_tx = outcome_tx.clone();
            let abort = &abort;

            thread::Builder::new()
                .name(format!("sweep-worker-{worker_index}"))
                .spawn_scoped(scope, move || {
                    let identity = WorkerIdentity::Thread {
                        pid: process::id(),
                        worker_index,
                    };

                    loop {
                        // Take the next task while holding the queue lock,
                        // then release it before doing any work.
                        let task = {
                            let queue = task_rx.lock().expect("task queue lock poisoned");
                            queue.recv()
                        };

                        let Ok(task) = task else {
                            // Queue closed: every task has been handed out.
                            break;
                        };

                        if abort.load(Ordering::Relaxed) {
                            _ = outcome_tx.send(TaskOutcome::Skipped);
                            continue;
                        }

                        let outcome = observe_unit(task.unit_id, identity, clock, pool_size, || {
                            process_all(processor, &task.units, &task.sink)
                        });

                        let outcome = match outcome {
                            Ok(record) => TaskOutcome::Completed(record),
                            Err(cause) => {
                                abort.store(true, Ordering::Relaxed);
                                TaskOutcome::Failed {
                                    unit_id: task.unit_id,
                                    cause,
                                }
                            }
                        };

                        // The collector may already have given up after an
                        // abort, in which case outcomes go nowhere.
                        _ = outcome_tx.send(outcome);
                    }
                })
                .expect("spawning a worker thread failed");
        }

        drop(outcome_tx);

        for task in tasks {
            task_tx
                .send(task)
                .expect("workers hold the queue receiver until it is drained");
        }
        drop(task_tx);

        collect_outcomes(&outcome_rx, dispatched)
    });

    let total = clock.elapsed();

    collected.map(|records| (total, records))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use new_zealand::nz;

    use super::*;
    use crate::error::Error;
    use crate::strategy::{Granularity, make_tasks};
    use crate::{ItemError, OutputSink, UnitId, WorkUnit, units_from};

    struct SpinOrFail;

    impl ItemProcessor for SpinOrFail {
        fn process(&self, unit: &WorkUnit, _sink: &OutputSink) -> std::result::Result<(), ItemError> {
            if unit.item() == "boom" {
                return Err("boom".into());
            }
            std::hint::black_box((0..512).sum::<u64>());
            Ok(())
        }
    }

    fn tasks(items: &[&str], granularity: Granularity, pool_size: NonZero<usize>) -> Vec<Task> {
        make_tasks(
            &units_from(items.iter().copied()),
            granularity,
            pool_size,
            &OutputSink::new("out"),
        )
        .unwrap()
    }

    #[test]
    fn chunked_run_yields_one_record_per_chunk() {
        let (total, records) = run(
            tasks(&["1", "2", "3", "4", "5"], Granularity::Chunked, nz!(2)),
            nz!(2),
            &SpinOrFail,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert!(total >= records.iter().map(ExecutionRecord::duration).max().unwrap());

        let ids: HashSet<UnitId> = records.iter().map(ExecutionRecord::unit_id).collect();
        assert_eq!(ids, HashSet::from([UnitId::Chunk(1), UnitId::Chunk(2)]));

        assert!(records.iter().all(|r| r.worker_count() == nz!(2)));
        assert!(
            records
                .iter()
                .all(|r| matches!(r.worker(), WorkerIdentity::Thread { pid, .. } if pid == process::id()))
        );
    }

    #[test]
    fn per_item_run_yields_one_record_per_item() {
        let (_, records) = run(
            tasks(&["1", "2", "3", "4", "5"], Granularity::PerItem, nz!(2)),
            nz!(2),
            &SpinOrFail,
        )
        .unwrap();

        assert_eq!(records.len(), 5);

        let ids: HashSet<UnitId> = records.iter().map(ExecutionRecord::unit_id).collect();
        assert_eq!(ids, (0..5).map(UnitId::Item).collect());
    }

    #[test]
    fn failing_item_fails_the_run_with_its_unit() {
        let error = run(
            tasks(&["1", "boom", "3"], Granularity::PerItem, nz!(1)),
            nz!(1),
            &SpinOrFail,
        )
        .unwrap_err();

        let Error::UnitExecutionFailed { unit_id, cause } = error else {
            panic!("expected a unit failure");
        };
        assert_eq!(unit_id, UnitId::Item(1));
        assert!(cause.contains("boom"));
    }

    #[test]
    fn single_worker_executes_everything_itself() {
        let (_, records) = run(
            tasks(&["1", "2", "3"], Granularity::PerItem, nz!(1)),
            nz!(1),
            &SpinOrFail,
        )
        .unwrap();

        let workers: HashSet<WorkerIdentity> =
            records.iter().map(ExecutionRecord::worker).collect();
        assert_eq!(workers.len(), 1);
    }
}
