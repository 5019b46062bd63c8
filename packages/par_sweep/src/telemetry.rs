use std::num::NonZero;
use std::time::{Duration, Instant};

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::UnitId;

/// Identifies the worker that executed one unit of work.
#[derive(Clone, Copy, Debug, Display, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum WorkerIdentity {
    /// A memory-isolated worker process.
    #[display("process-{pid}")]
    Process {
        /// The worker's operating system process id.
        pid: u32,
    },

    /// A worker thread sharing the dispatching process's address space.
    #[display("{pid}/worker-{worker_index}")]
    Thread {
        /// The dispatching process's id.
        pid: u32,

        /// The worker's 0-based index within its pool.
        worker_index: usize,
    },
}

/// Telemetry for one completed unit of work.
///
/// `started` and `ended` are offsets on the executing worker's own monotonic
/// clock, so they are comparable within one worker but not across workers in
/// different processes. Consumers group records by [`UnitId`] and compare
/// durations only; collection order carries no meaning.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ExecutionRecord {
    unit_id: UnitId,
    worker: WorkerIdentity,
    processor_id: Option<u32>,
    started: Duration,
    ended: Duration,
    worker_count: NonZero<usize>,
}

impl ExecutionRecord {
    pub(crate) fn new(
        unit_id: UnitId,
        worker: WorkerIdentity,
        processor_id: Option<u32>,
        started: Duration,
        ended: Duration,
        worker_count: NonZero<usize>,
    ) -> Self {
        Self {
            unit_id,
            worker,
            processor_id,
            started,
            ended,
            worker_count,
        }
    }

    /// The unit this record describes.
    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    /// The worker that executed the unit.
    #[must_use]
    pub fn worker(&self) -> WorkerIdentity {
        self.worker
    }

    /// Best-effort id of the processor the unit finished on, or `None` when
    /// the platform cannot report it.
    #[must_use]
    pub fn processor_id(&self) -> Option<u32> {
        self.processor_id
    }

    /// Start offset on the executing worker's monotonic clock.
    #[must_use]
    pub fn started(&self) -> Duration {
        self.started
    }

    /// End offset on the executing worker's monotonic clock.
    #[must_use]
    pub fn ended(&self) -> Duration {
        self.ended
    }

    /// How long the unit took to execute. Never negative, as both endpoints
    /// come from the same monotonic clock.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.ended.saturating_sub(self.started)
    }

    /// The pool size used for the run this record belongs to, attached so
    /// records can be grouped per sweep point after the fact.
    #[must_use]
    pub fn worker_count(&self) -> NonZero<usize> {
        self.worker_count
    }
}

/// Best-effort query for the processor the calling thread is currently
/// executing on.
///
/// This is a capability query, not a guarantee: platforms without a
/// current-processor lookup yield `None`, which downstream reporting treats
/// as "unavailable". It never fails and never blocks.
#[must_use]
#[cfg_attr(test, mutants::skip)] // Hardware-dependent; no stable expectation to assert on.
pub fn current_processor_id() -> Option<u32> {
    #[cfg(any(target_os = "linux", target_os = "windows"))]
    {
        Some(many_cpus::HardwareTracker::current_processor_id())
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

/// Runs one unit of work under observation, producing its execution record.
///
/// The measured window covers exactly the `work` closure. Telemetry capture
/// degrades (processor id becomes `None`) but never aborts the run; a failed
/// closure yields the failure cause instead of a record.
pub(crate) fn observe_unit(
    unit_id: UnitId,
    worker: WorkerIdentity,
    epoch: Instant,
    worker_count: NonZero<usize>,
    work: impl FnOnce() -> std::result::Result<(), String>,
) -> std::result::Result<ExecutionRecord, String> {
    let started = epoch.elapsed();
    let outcome = work();
    let ended = epoch.elapsed();

    outcome.map(|()| {
        ExecutionRecord::new(
            unit_id,
            worker,
            current_processor_id(),
            started,
            ended,
            worker_count,
        )
    })
}
