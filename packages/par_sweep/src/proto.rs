//! Line-oriented protocol between the isolated pool and its worker
//! processes.
//!
//! The parent writes one JSON-encoded task per line to the worker's stdin;
//! the worker replies with one JSON-encoded response per line on stdout and
//! exits when the task stream ends. Timing and processor lookup happen on
//! the worker side so the measured window excludes pipe transfer and
//! serialization on the parent side of the boundary.
//!
//! Worker binaries embed their item processor and hand control to
//! [`serve`]:
//!
//! ```no_run
//! use par_sweep::{ItemError, ItemProcessor, OutputSink, WorkUnit, proto};
//!
//! struct NoopProcessor;
//!
//! impl ItemProcessor for NoopProcessor {
//!     fn process(&self, _unit: &WorkUnit, _sink: &OutputSink) -> Result<(), ItemError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> std::io::Result<()> {
//!     proto::serve(&NoopProcessor)
//! }
//! ```

use std::io::{self, BufRead, Write};
use std::process;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::processor::process_all;
use crate::strategy::Task;
use crate::telemetry::current_processor_id;
use crate::{ItemProcessor, UnitId};

/// One worker reply, covering one dispatched task.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) enum WireResponse {
    /// The task completed; carries the worker-side telemetry the parent
    /// turns into an execution record.
    Completed {
        unit_id: UnitId,
        pid: u32,
        processor_id: Option<u32>,
        started: Duration,
        ended: Duration,
    },

    /// The task failed; the cause is rendered to a string because error
    /// values do not cross the process boundary.
    Failed { unit_id: UnitId, cause: String },
}

/// Runs the worker side of the protocol on stdin/stdout until the parent
/// closes the task stream.
///
/// # Errors
///
/// Fails when the task stream is unreadable, a task line is not valid
/// protocol, or a reply cannot be written. Item processing failures are not
/// errors here - they are reported to the parent as failed-task replies.
pub fn serve<P: ItemProcessor>(processor: &P) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    serve_io(processor, stdin.lock(), stdout.lock())
}

pub(crate) fn serve_io<P, R, W>(processor: &P, input: R, mut output: W) -> io::Result<()>
where
    P: ItemProcessor,
    R: BufRead,
    W: Write,
{
    let pid = process::id();
    let epoch = Instant::now();

    for line in input.lines() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        let task: Task = serde_json::from_str(&line).map_err(io::Error::other)?;

        let started = epoch.elapsed();
        let outcome = process_all(processor, &task.units, &task.sink);
        let ended = epoch.elapsed();

        let response = match outcome {
            Ok(()) => WireResponse::Completed {
                unit_id: task.unit_id,
                pid,
                processor_id: current_processor_id(),
                started,
                ended,
            },
            Err(cause) => WireResponse::Failed {
                unit_id: task.unit_id,
                cause,
            },
        };

        serde_json::to_writer(&mut output, &response).map_err(io::Error::other)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }

    Ok(())
}
