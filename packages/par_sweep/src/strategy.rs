use std::num::NonZero;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::{OutputSink, UnitId, WorkUnit, partition};

/// The worker pool model a strategy dispatches to.
#[derive(Clone, Copy, Debug, Display, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum PoolModel {
    /// Tasks execute in separate, memory-isolated worker processes. Side
    /// effects must be independent across tasks because workers share no
    /// mutable state.
    #[display("isolated")]
    #[serde(rename = "isolated")]
    Isolated,

    /// Tasks execute on lightweight workers sharing one address space.
    /// Under a runtime with a global execution lock this backend is not
    /// expected to speed up CPU-bound payloads - a documented measurement
    /// outcome, not an error condition.
    #[display("shared")]
    #[serde(rename = "shared")]
    Shared,
}

/// The dispatch granularity a strategy uses.
#[derive(Clone, Copy, Debug, Display, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Granularity {
    /// Data-parallel: the workload is partitioned into one chunk per
    /// worker; each chunk is dispatched as a single task and yields one
    /// execution record covering the whole chunk's window.
    #[display("chunked")]
    #[serde(rename = "chunked")]
    Chunked,

    /// Task-parallel: every unit is dispatched as its own task and yields
    /// its own execution record.
    #[display("per-item")]
    #[serde(rename = "per-item")]
    PerItem,
}

/// One concrete execution strategy: a pool model combined with a dispatch
/// granularity.
///
/// The four members of the `{pool} x {granularity}` product are the closed
/// set of strategies the harness knows; there is deliberately no way to
/// plug in a fifth, so every strategy shares the exact same dispatch and
/// telemetry plumbing.
#[derive(Clone, Copy, Debug, Display, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[display("{pool}/{granularity}")]
pub struct Strategy {
    /// The worker pool model.
    pub pool: PoolModel,

    /// The dispatch granularity.
    pub granularity: Granularity,
}

impl Strategy {
    /// Creates a strategy from its two axes.
    #[must_use]
    pub const fn new(pool: PoolModel, granularity: Granularity) -> Self {
        Self { pool, granularity }
    }

    /// All four concrete strategies, in a stable order suitable for
    /// strategy-by-strategy sweeps.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Strategy] = &[
            Strategy::new(PoolModel::Isolated, Granularity::Chunked),
            Strategy::new(PoolModel::Isolated, Granularity::PerItem),
            Strategy::new(PoolModel::Shared, Granularity::Chunked),
            Strategy::new(PoolModel::Shared, Granularity::PerItem),
        ];
        ALL
    }

    /// A label safe for file names and sink paths, e.g. `isolated_chunked`.
    #[must_use]
    pub fn label(&self) -> String {
        let granularity = match self.granularity {
            Granularity::Chunked => "chunked",
            Granularity::PerItem => "per_item",
        };

        format!("{}_{granularity}", self.pool)
    }
}

/// One dispatched unit of work: a chunk of units or a single unit,
/// plus the sink its items write to. Serializable because tasks are shipped
/// to isolated worker processes as-is.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Task {
    pub(crate) unit_id: UnitId,
    pub(crate) units: Vec<WorkUnit>,
    pub(crate) sink: OutputSink,
}

/// Shapes the workload into the task list a pool will dispatch.
///
/// This is the only place granularity matters: chunked dispatch partitions
/// into `pool_size` chunks (one task each), per-item dispatch emits one
/// task per unit. Both pool models consume the resulting list identically.
pub(crate) fn make_tasks(
    units: &[WorkUnit],
    granularity: Granularity,
    pool_size: NonZero<usize>,
    sink: &OutputSink,
) -> Result<Vec<Task>> {
    match granularity {
        Granularity::Chunked => Ok(partition(units, pool_size, sink)?
            .into_iter()
            .map(|chunk| Task {
                unit_id: UnitId::Chunk(chunk.chunk_id().get()),
                sink: chunk.sink().clone(),
                units: chunk.into_units(),
            })
            .collect()),
        Granularity::PerItem => Ok(units
            .iter()
            .map(|unit| Task {
                unit_id: UnitId::Item(unit.index()),
                units: vec![unit.clone()],
                sink: sink.clone(),
            })
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools as _;
    use new_zealand::nz;

    use super::*;
    use crate::units_from;

    #[test]
    fn four_strategies_with_distinct_labels() {
        let labels = Strategy::all().iter().map(Strategy::label).collect_vec();

        assert_eq!(labels.len(), 4);
        assert_eq!(labels.iter().unique().count(), 4);
        assert!(labels.contains(&"isolated_chunked".to_string()));
        assert!(labels.contains(&"shared_per_item".to_string()));
    }

    #[test]
    fn strategy_display_names_both_axes() {
        let strategy = Strategy::new(PoolModel::Shared, Granularity::PerItem);

        assert_eq!(strategy.to_string(), "shared/per-item");
    }

    #[test]
    fn chunked_tasks_cover_the_workload_one_task_per_worker() {
        let units = units_from((0..10).map(|i| i.to_string()));

        let tasks = make_tasks(&units, Granularity::Chunked, nz!(3), &OutputSink::new("out"))
            .unwrap();

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].unit_id, UnitId::Chunk(1));
        assert_eq!(tasks[0].units.len(), 4);
        assert_eq!(tasks[2].unit_id, UnitId::Chunk(3));

        let total: usize = tasks.iter().map(|t| t.units.len()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn per_item_tasks_are_one_per_unit() {
        let units = units_from(["a", "b", "c"]);

        let tasks = make_tasks(&units, Granularity::PerItem, nz!(2), &OutputSink::new("out"))
            .unwrap();

        assert_eq!(tasks.len(), 3);
        assert!(
            tasks
                .iter()
                .enumerate()
                .all(|(i, t)| t.unit_id == UnitId::Item(i) && t.units.len() == 1)
        );
    }

    #[test]
    fn chunked_tasks_with_oversized_pool_are_invalid() {
        let units = units_from(["a", "b"]);

        let result = make_tasks(&units, Granularity::Chunked, nz!(3), &OutputSink::new("out"));

        assert!(result.is_err());
    }
}
