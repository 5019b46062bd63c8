use std::num::NonZero;
use std::time::Duration;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which reference duration speedups are computed against.
///
/// The policy travels with the aggregated output so consumers never
/// conflate absolute wall-clock comparisons with relative scaling curves.
#[derive(Clone, Copy, Debug, Display, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum BaselinePolicy {
    /// One dedicated sequential measurement, shared across every strategy
    /// in a comparison. Use when asking which strategy is fastest in
    /// absolute terms.
    #[display("global-sequential")]
    #[serde(rename = "global-sequential")]
    GlobalSequential,

    /// The strategy's own 1-worker duration. Use when asking how well a
    /// strategy scales with worker count - required when backends are not
    /// directly comparable (e.g. isolated vs. shared pools under
    /// contention).
    #[display("self-relative")]
    #[serde(rename = "self-relative")]
    SelfRelative,
}

impl BaselinePolicy {
    /// Resolves the baseline duration this policy prescribes for a set of
    /// sweep measurements.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] when the policy's required
    /// input is missing: a measured sequential baseline for
    /// [`Self::GlobalSequential`], a 1-worker sweep point for
    /// [`Self::SelfRelative`].
    pub fn resolve(
        self,
        sequential: Option<Duration>,
        measurements: &[(NonZero<usize>, Duration)],
    ) -> Result<Duration> {
        match self {
            Self::GlobalSequential => sequential.ok_or_else(|| Error::InvalidArgument {
                problem: "the global-sequential policy needs a measured sequential baseline"
                    .to_string(),
            }),
            Self::SelfRelative => measurements
                .iter()
                .find(|(worker_count, _)| worker_count.get() == 1)
                .map(|&(_, duration)| duration)
                .ok_or_else(|| Error::InvalidArgument {
                    problem: "the self-relative policy needs a completed 1-worker measurement"
                        .to_string(),
                }),
        }
    }
}

/// Speedup and efficiency of one sweep point, derived from its measured
/// duration and the baseline.
///
/// Rows are recomputed from their inputs whenever those change; they are
/// never mutated in place.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MetricsRow {
    worker_count: NonZero<usize>,
    duration: Duration,
    speedup: f64,
    efficiency: f64,
}

impl MetricsRow {
    /// The pool size of the sweep point.
    #[must_use]
    pub fn worker_count(&self) -> NonZero<usize> {
        self.worker_count
    }

    /// The measured duration of the sweep point.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Baseline duration divided by this point's duration; 1.0 means "as
    /// fast as the baseline".
    #[must_use]
    pub fn speedup(&self) -> f64 {
        self.speedup
    }

    /// Speedup divided by worker count; 1.0 is the ideal of perfectly
    /// linear scaling.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }
}

/// Reduces per-worker-count durations and a baseline into metrics rows.
///
/// A pure function of its inputs: aggregating the same measurements against
/// the same baseline twice yields bit-identical rows.
#[must_use]
pub fn aggregate(
    baseline: Duration,
    measurements: &[(NonZero<usize>, Duration)],
) -> Vec<MetricsRow> {
    measurements
        .iter()
        .map(|&(worker_count, duration)| {
            let speedup = baseline.as_secs_f64() / duration.as_secs_f64();

            #[expect(
                clippy::cast_precision_loss,
                reason = "worker counts are small integers, exactly representable as f64"
            )]
            let efficiency = speedup / worker_count.get() as f64;

            MetricsRow {
                worker_count,
                duration,
                speedup,
                efficiency,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn speedup_and_efficiency_follow_the_definitions() {
        let rows = aggregate(
            Duration::from_secs(10),
            &[(nz!(4), Duration::from_secs(3))],
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].worker_count(), nz!(4));
        assert_eq!(rows[0].duration(), Duration::from_secs(3));
        assert!((rows[0].speedup() - 10.0 / 3.0).abs() < 1e-9);
        assert!((rows[0].efficiency() - 10.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn one_worker_at_baseline_speed_has_unit_efficiency() {
        let duration = Duration::from_millis(1234);

        let rows = aggregate(duration, &[(nz!(1), duration)]);

        assert!((rows[0].speedup() - 1.0).abs() < f64::EPSILON);
        assert!(rows[0].efficiency() <= 1.0 + f64::EPSILON);
    }

    #[test]
    fn aggregation_is_pure() {
        let measurements = [
            (nz!(1), Duration::from_millis(977)),
            (nz!(2), Duration::from_millis(521)),
            (nz!(4), Duration::from_millis(333)),
        ];
        let baseline = Duration::from_millis(1000);

        let first = aggregate(baseline, &measurements);
        let second = aggregate(baseline, &measurements);

        assert_eq!(first, second);
    }

    #[test]
    fn global_policy_uses_the_sequential_measurement() {
        let baseline = BaselinePolicy::GlobalSequential
            .resolve(Some(Duration::from_secs(9)), &[])
            .unwrap();

        assert_eq!(baseline, Duration::from_secs(9));
    }

    #[test]
    fn global_policy_without_sequential_measurement_is_invalid() {
        let result = BaselinePolicy::GlobalSequential.resolve(None, &[]);

        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn self_relative_policy_uses_the_one_worker_point() {
        let measurements = [
            (nz!(1), Duration::from_secs(8)),
            (nz!(2), Duration::from_secs(5)),
        ];

        let baseline = BaselinePolicy::SelfRelative
            .resolve(None, &measurements)
            .unwrap();

        assert_eq!(baseline, Duration::from_secs(8));
    }

    #[test]
    fn self_relative_policy_without_one_worker_point_is_invalid() {
        let measurements = [(nz!(2), Duration::from_secs(5))];

        let result = BaselinePolicy::SelfRelative.resolve(None, &measurements);

        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }
}
