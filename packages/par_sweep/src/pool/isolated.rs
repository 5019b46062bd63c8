//! Isolated worker pool: a fixed set of child worker processes fed over the
//! line protocol in [`crate::proto`].
//!
//! Each child is driven by one feeder thread that pulls tasks from a shared
//! queue, ships them over the child's stdin and waits for the reply on its
//! stdout. Workers share no memory with the parent or each other; the only
//! state that crosses the boundary is the serialized task and its reply.
//!
//! The measured window covers process spawning, dispatch and join - the
//! cost of standing up isolated workers is part of what this pool model is
//! being measured for.

use std::io::{BufRead, BufReader, Write};
use std::num::NonZero;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::pool::{TaskOutcome, collect_outcomes};
use crate::proto::WireResponse;
use crate::strategy::Task;
use crate::sweep::WorkerCommand;
use crate::{ExecutionRecord, WorkerIdentity};

/// Runs the task list on `pool_size` worker processes, blocking until every
/// dispatched task is accounted for.
///
/// The first task failure marks the run aborted: tasks not yet shipped are
/// skipped and the workers are terminated once the run has joined, since an
/// isolated worker can be killed without corrupting the parent.
#[cfg_attr(test, mutants::skip)] // Mutants that drop tasks deadlock the collector.
pub(crate) fn run(
    tasks: Vec<Task>,
    pool_size: NonZero<usize>,
    worker: &WorkerCommand,
) -> Result<(Duration, Vec<ExecutionRecord>)> {
    let dispatched = tasks.len();
    let clock = Instant::now();

    let mut children = spawn_workers(pool_size, worker)?;

    let (task_tx, task_rx) = mpsc::channel::<Task>();
    for task in tasks {
        task_tx
            .send(task)
            .expect("the queue receiver outlives this loop");
    }
    drop(task_tx);
    let task_rx = Arc::new(Mutex::new(task_rx));

    let (outcome_tx, outcome_rx) = mpsc::channel::<TaskOutcome>();
    let abort = AtomicBool::new(false);

    let collected = thread::scope(|scope| {
        for child in &mut children {
            let stdin = child.stdin.take().expect("child stdin was piped");
            let stdout = child.stdout.take().expect("child stdout was piped");
            let task_rx = Arc::clone(&task_rx);
            let outcome_tx = outcome_tx.clone();
            let abort = &abort;

            scope.spawn(move || {
                feed_worker(stdin, stdout, &task_rx, &outcome_tx, abort, pool_size);
            });
        }

        drop(outcome_tx);

        collect_outcomes(&outcome_rx, dispatched)
    });

    // On success the workers have already exited via end-of-stream; on
    // failure termination is the best-effort abort the isolated model
    // allows. Either way, reap them.
    for child in &mut children {
        if collected.is_err() {
            _ = child.kill();
        }
        _ = child.wait();
    }

    let total = clock.elapsed();

    collected.map(|records| (total, records))
}

fn spawn_workers(pool_size: NonZero<usize>, worker: &WorkerCommand) -> Result<Vec<Child>> {
    let mut children = Vec::with_capacity(pool_size.get());

    for _ in 0..pool_size.get() {
        let spawned = Command::new(worker.program())
            .args(worker.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn();

        match spawned {
            Ok(child) => children.push(child),
            Err(error) => {
                for mut child in children {
                    _ = child.kill();
                    _ = child.wait();
                }
                return Err(error.into());
            }
        }
    }

    Ok(children)
}

/// Drives one worker process: pull a task, ship it, wait for the reply.
///
/// Any transport failure counts as a failure of the task being shipped -
/// from the harness's point of view a dead worker and a failing unit are
/// the same event, a sweep point that cannot produce a trustworthy
/// duration.
fn feed_worker(
    stdin: ChildStdin,
    stdout: ChildStdout,
    task_rx: &Mutex<mpsc::Receiver<Task>>,
    outcome_tx: &mpsc::Sender<TaskOutcome>,
    abort: &AtomicBool,
    pool_size: NonZero<usize>,
) {
    let mut stdin = stdin;
    let mut replies = BufReader::new(stdout).lines();

    loop {
        let task = {
            let queue = task_rx.lock().expect("task queue lock poisoned");
            queue.recv()
        };

        let Ok(task) = task else {
            // Queue closed: dropping stdin ends the worker's task stream.
            break;
        };

        if abort.load(Ordering::Relaxed) {
            _ = outcome_tx.send(TaskOutcome::Skipped);
            continue;
        }

        let outcome = match ship(&mut stdin, &mut replies, &task, pool_size) {
            Ok(record) => TaskOutcome::Completed(record),
            Err(cause) => {
                abort.store(true, Ordering::Relaxed);
                TaskOutcome::Failed {
                    unit_id: task.unit_id,
                    cause,
                }
            }
        };

        _ = outcome_tx.send(outcome);
    }
}

fn ship(
    stdin: &mut ChildStdin,
    replies: &mut std::io::Lines<BufReader<ChildStdout>>,
    task: &Task,
    pool_size: NonZero<usize>,
) -> std::result::Result<ExecutionRecord, String> {
    let mut line =
        serde_json::to_string(task).map_err(|error| format!("task serialization failed: {error}"))?;
    line.push('\n');

    stdin
        .write_all(line.as_bytes())
        .map_err(|error| format!("worker did not accept the task: {error}"))?;
    stdin
        .flush()
        .map_err(|error| format!("worker did not accept the task: {error}"))?;

    let reply = replies
        .next()
        .ok_or_else(|| "worker exited before replying".to_string())?
        .map_err(|error| format!("reading the worker reply failed: {error}"))?;

    let response: WireResponse = serde_json::from_str(&reply)
        .map_err(|error| format!("worker reply is not valid protocol: {error}"))?;

    match response {
        WireResponse::Completed {
            unit_id,
            pid,
            processor_id,
            started,
            ended,
        } => Ok(ExecutionRecord::new(
            unit_id,
            WorkerIdentity::Process { pid },
            processor_id,
            started,
            ended,
            pool_size,
        )),
        WireResponse::Failed { cause, .. } => Err(cause),
    }
}
