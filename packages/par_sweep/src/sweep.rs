use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::time::Duration;

use new_zealand::nz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pool::{isolated, shared};
use crate::strategy::make_tasks;
use crate::{
    BaselinePolicy, ExecutionRecord, ItemProcessor, MetricsRow, OutputSink, PoolModel, Strategy,
    WorkUnit, aggregate, measure,
};

/// Program plus arguments used to launch one isolated worker process.
///
/// The binary must speak the [`crate::proto`] protocol, which worker
/// binaries get by embedding their item processor and calling
/// [`crate::proto::serve`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerCommand {
    /// Creates a worker command for the given program, without arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument passed to every spawned worker.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn program(&self) -> &Path {
        &self.program
    }

    pub(crate) fn args(&self) -> &[String] {
        &self.args
    }
}

/// Configuration of one strategy sweep.
///
/// Built fluently from a strategy; every other option defaults to the
/// standard analysis setup (worker counts 1, 2, 4 and 8; three baseline
/// trials; a global sequential baseline).
///
/// # Examples
///
/// ```
/// use new_zealand::nz;
/// use par_sweep::{BaselinePolicy, Granularity, PoolModel, Strategy, SweepConfig};
///
/// let config = SweepConfig::new(Strategy::new(PoolModel::Shared, Granularity::Chunked))
///     .with_worker_counts(vec![nz!(1), nz!(2)])
///     .with_baseline_policy(BaselinePolicy::SelfRelative)
///     .with_sink_base("output");
/// assert_eq!(config.worker_counts().len(), 2);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SweepConfig {
    strategy: Strategy,
    worker_counts: Vec<NonZero<usize>>,
    baseline_trials: NonZero<usize>,
    baseline_policy: BaselinePolicy,
    sink_base: String,
    worker: Option<WorkerCommand>,
}

impl SweepConfig {
    /// Creates a configuration for the given strategy with default options.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            worker_counts: vec![nz!(1), nz!(2), nz!(4), nz!(8)],
            baseline_trials: nz!(3),
            baseline_policy: BaselinePolicy::GlobalSequential,
            sink_base: "output".to_string(),
            worker: None,
        }
    }

    /// Replaces the worker counts the sweep visits, in order.
    #[must_use]
    pub fn with_worker_counts(mut self, worker_counts: Vec<NonZero<usize>>) -> Self {
        self.worker_counts = worker_counts;
        self
    }

    /// Replaces the number of retained baseline trials.
    #[must_use]
    pub fn with_baseline_trials(mut self, trials: NonZero<usize>) -> Self {
        self.baseline_trials = trials;
        self
    }

    /// Replaces the baseline selection policy.
    #[must_use]
    pub fn with_baseline_policy(mut self, policy: BaselinePolicy) -> Self {
        self.baseline_policy = policy;
        self
    }

    /// Replaces the base from which per-point sinks are derived. Each sweep
    /// point writes to `<base>/<strategy label>_<worker count>` so no two
    /// points share outputs; the sequential baseline writes to
    /// `<base>/sequential`.
    #[must_use]
    pub fn with_sink_base(mut self, sink_base: impl Into<String>) -> Self {
        self.sink_base = sink_base.into();
        self
    }

    /// Sets the worker command the isolated pool spawns. Required for
    /// isolated strategies, ignored by shared ones.
    #[must_use]
    pub fn with_worker(mut self, worker: WorkerCommand) -> Self {
        self.worker = Some(worker);
        self
    }

    /// The strategy this sweep exercises.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The worker counts the sweep visits.
    #[must_use]
    pub fn worker_counts(&self) -> &[NonZero<usize>] {
        &self.worker_counts
    }

    /// The baseline selection policy.
    #[must_use]
    pub fn baseline_policy(&self) -> BaselinePolicy {
        self.baseline_policy
    }

    fn point_sink(&self, worker_count: NonZero<usize>) -> OutputSink {
        OutputSink::new(format!(
            "{}/{}_{}",
            self.sink_base,
            self.strategy.label(),
            worker_count
        ))
    }
}

/// One sweep point that did not complete. Kept alongside the completed rows
/// so a failed point is visibly incomplete instead of silently missing.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FailedPoint {
    worker_count: NonZero<usize>,
    cause: String,
}

impl FailedPoint {
    /// The pool size of the failed point.
    #[must_use]
    pub fn worker_count(&self) -> NonZero<usize> {
        self.worker_count
    }

    /// Why the point failed.
    #[must_use]
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

/// The outcome of one full sweep for one strategy: metrics rows for every
/// completed worker count, the flat execution record collection across all
/// of them, and the points that failed.
///
/// The baseline policy travels with the run so consumers know what the
/// speedups are relative to.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BenchmarkRun {
    strategy: Strategy,
    baseline_policy: BaselinePolicy,
    baseline: Duration,
    rows: Vec<MetricsRow>,
    records: Vec<ExecutionRecord>,
    failed: Vec<FailedPoint>,
}

impl BenchmarkRun {
    /// The strategy that was swept.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The policy behind [`Self::baseline`].
    #[must_use]
    pub fn baseline_policy(&self) -> BaselinePolicy {
        self.baseline_policy
    }

    /// The baseline duration the rows' speedups are relative to.
    #[must_use]
    pub fn baseline(&self) -> Duration {
        self.baseline
    }

    /// One row per completed sweep point, in sweep order.
    #[must_use]
    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }

    /// Every execution record across all completed sweep points, in no
    /// particular order; group by unit id and worker count.
    #[must_use]
    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    /// The sweep points that failed, in sweep order.
    #[must_use]
    pub fn failed(&self) -> &[FailedPoint] {
        &self.failed
    }
}

/// Executes one strategy's full worker-count sweep.
///
/// Sweep points run one after another so they never contend with each
/// other; within a point the pool's workers run concurrently. A failed
/// point is recorded and the sweep continues with the remaining counts -
/// only configuration errors ([`Error::InvalidArgument`],
/// [`Error::EmptyWorkload`]) abort the sweep as a whole.
#[derive(Clone, Debug)]
pub struct Sweep {
    config: SweepConfig,
    sequential: Option<Duration>,
}

impl Sweep {
    /// Creates a sweep from its configuration.
    #[must_use]
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            sequential: None,
        }
    }

    /// Reuses an already-measured sequential baseline instead of measuring
    /// a fresh one, so one global baseline can be shared across the sweeps
    /// of several strategies.
    #[must_use]
    pub fn with_sequential_baseline(mut self, baseline: Duration) -> Self {
        self.sequential = Some(baseline);
        self
    }

    /// Runs the sweep over the given workload.
    ///
    /// The processor is invoked in-process by the baseline measurement and
    /// the shared pool; isolated strategies additionally need the worker
    /// command from the configuration.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::EmptyWorkload`] for an empty workload, or with
    /// [`Error::InvalidArgument`] when the configuration cannot be
    /// satisfied (oversized chunk request, missing worker command, or a
    /// baseline policy whose required measurement is unavailable).
    pub fn execute<P: ItemProcessor>(
        &self,
        units: &[WorkUnit],
        processor: &P,
    ) -> Result<BenchmarkRun> {
        let config = &self.config;

        if units.is_empty() {
            return Err(Error::EmptyWorkload);
        }

        // A dedicated sequential pass only serves the global policy; the
        // self-relative policy takes its baseline from the 1-worker point.
        let sequential = match (config.baseline_policy, self.sequential) {
            (BaselinePolicy::GlobalSequential, None) => Some(
                measure(
                    units,
                    processor,
                    &OutputSink::new(format!("{}/sequential", config.sink_base)),
                    config.baseline_trials,
                )?
                .duration(),
            ),
            (BaselinePolicy::GlobalSequential, Some(baseline)) => Some(baseline),
            (BaselinePolicy::SelfRelative, _) => None,
        };

        let mut measurements = Vec::with_capacity(config.worker_counts.len());
        let mut records = Vec::new();
        let mut failed = Vec::new();

        for &worker_count in &config.worker_counts {
            let sink = config.point_sink(worker_count);

            match run_point(config, units, processor, worker_count, &sink) {
                Ok((total, point_records)) => {
                    measurements.push((worker_count, total));
                    records.extend(point_records);
                }
                Err(error @ (Error::InvalidArgument { .. } | Error::EmptyWorkload)) => {
                    return Err(error);
                }
                Err(error) => failed.push(FailedPoint {
                    worker_count,
                    cause: error.to_string(),
                }),
            }
        }

        let baseline = config.baseline_policy.resolve(sequential, &measurements)?;
        let rows = aggregate(baseline, &measurements);

        Ok(BenchmarkRun {
            strategy: config.strategy,
            baseline_policy: config.baseline_policy,
            baseline,
            rows,
            records,
            failed,
        })
    }
}

fn run_point<P: ItemProcessor>(
    config: &SweepConfig,
    units: &[WorkUnit],
    processor: &P,
    worker_count: NonZero<usize>,
    sink: &OutputSink,
) -> Result<(Duration, Vec<ExecutionRecord>)> {
    let tasks = make_tasks(units, config.strategy.granularity, worker_count, sink)?;

    match config.strategy.pool {
        PoolModel::Shared => shared::run(tasks, worker_count, processor),
        PoolModel::Isolated => {
            let worker = config.worker.as_ref().ok_or_else(|| Error::InvalidArgument {
                problem: "isolated strategies need a worker command".to_string(),
            })?;

            isolated::run(tasks, worker_count, worker)
        }
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;
    use crate::{Granularity, ItemError, units_from};

    struct NoopProcessor;

    impl ItemProcessor for NoopProcessor {
        fn process(&self, _unit: &WorkUnit, _sink: &OutputSink) -> std::result::Result<(), ItemError> {
            Ok(())
        }
    }

    #[test]
    fn empty_workload_is_rejected_before_any_measurement() {
        let config = SweepConfig::new(Strategy::new(PoolModel::Shared, Granularity::Chunked));

        let result = Sweep::new(config).execute(&[], &NoopProcessor);

        assert!(matches!(result, Err(Error::EmptyWorkload)));
    }

    #[test]
    fn isolated_strategy_without_worker_command_is_invalid() {
        let config = SweepConfig::new(Strategy::new(PoolModel::Isolated, Granularity::Chunked))
            .with_worker_counts(vec![nz!(1)])
            .with_baseline_policy(BaselinePolicy::SelfRelative);
        let units = units_from(["a", "b"]);

        let result = Sweep::new(config).execute(&units, &NoopProcessor);

        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn point_sinks_are_distinct_per_worker_count() {
        let config = SweepConfig::new(Strategy::new(PoolModel::Shared, Granularity::PerItem))
            .with_sink_base("out");

        assert_eq!(config.point_sink(nz!(2)).as_str(), "out/shared_per_item_2");
        assert_eq!(config.point_sink(nz!(8)).as_str(), "out/shared_per_item_8");
    }
}
