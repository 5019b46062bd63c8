use std::io;

use thiserror::Error;

use crate::UnitId;

/// Errors that can occur when partitioning, measuring or executing a
/// workload.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller asked for something the workload or configuration cannot
    /// satisfy (e.g. more non-empty chunks than there are units). Fatal to
    /// the call that raised it; never retried.
    #[error("invalid argument: {problem}")]
    InvalidArgument {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// There is nothing to benchmark. Fatal to the call that raised it.
    #[error("the workload is empty")]
    EmptyWorkload,

    /// A dispatched unit of work failed. Aborts the current sweep point but
    /// not the whole sweep; never retried, since timing retried work would
    /// corrupt the duration metric.
    #[error("unit {unit_id} failed: {cause}")]
    UnitExecutionFailed {
        /// The failing unit.
        unit_id: UnitId,

        /// The underlying cause. A string because causes cross the process
        /// boundary of the isolated backend.
        cause: String,
    },

    /// The isolated worker pool could not be operated (process spawn or
    /// pipe plumbing failed). Aborts the current sweep point.
    #[error("worker pool failure: {source}")]
    WorkerPool {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },
}

/// A specialized `Result` type returning the crate's [`Error`] as the error
/// value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
