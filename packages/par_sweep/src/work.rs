use std::num::NonZero;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// One item of work: an opaque item identifier (typically a file path) plus
/// its stable 0-based position in the workload.
///
/// Work units are immutable once created. They are owned by the partitioner
/// until dispatched, after which they are logically owned by whichever worker
/// executes them - including workers in other processes, which is why the
/// type is serializable.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct WorkUnit {
    index: usize,
    item: String,
}

impl WorkUnit {
    pub(crate) fn new(index: usize, item: String) -> Self {
        Self { index, item }
    }

    /// The unit's 0-based position in the original workload.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The opaque item identifier handed to the item processor.
    #[must_use]
    pub fn item(&self) -> &str {
        &self.item
    }
}

/// Converts an ordered sequence of item identifiers into indexed work units.
///
/// The harness treats the identifiers as opaque; it never validates their
/// content. Order is preserved and determines unit indexes.
///
/// # Examples
///
/// ```
/// use par_sweep::units_from;
///
/// let units = units_from(["a.png", "b.png"]);
/// assert_eq!(units[1].index(), 1);
/// assert_eq!(units[1].item(), "b.png");
/// ```
pub fn units_from<I, S>(items: I) -> Vec<WorkUnit>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| WorkUnit::new(index, item.into()))
        .collect()
}

/// Opaque destination label forwarded to the item processor alongside each
/// unit (typically an output directory). The harness never interprets it.
#[derive(Clone, Debug, Display, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[display("{_0}")]
pub struct OutputSink(String);

impl OutputSink {
    /// Creates a sink label from anything string-like.
    pub fn new(sink: impl Into<String>) -> Self {
        Self(sink.into())
    }

    /// The sink label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifies one dispatched unit of work.
///
/// Records from different workers may arrive in any order; consumers group
/// them by this id rather than assuming any collection order.
#[derive(Clone, Copy, Debug, Display, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum UnitId {
    /// A whole chunk dispatched as one task. Chunk ids are 1-based and
    /// stable within one run.
    #[display("chunk-{_0}")]
    Chunk(usize),

    /// A single item dispatched as its own task, identified by its 0-based
    /// workload index.
    #[display("item-{_0}")]
    Item(usize),
}

/// An ordered, contiguous, non-overlapping sub-sequence of work units,
/// tagged with its 1-based chunk id and the output sink its items write to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Chunk {
    chunk_id: NonZero<usize>,
    units: Vec<WorkUnit>,
    sink: OutputSink,
}

impl Chunk {
    pub(crate) fn new(chunk_id: NonZero<usize>, units: Vec<WorkUnit>, sink: OutputSink) -> Self {
        Self {
            chunk_id,
            units,
            sink,
        }
    }

    /// The chunk's 1-based id, stable within one partitioning.
    #[must_use]
    pub fn chunk_id(&self) -> NonZero<usize> {
        self.chunk_id
    }

    /// The units belonging to this chunk, in original workload order.
    #[must_use]
    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    /// The output sink the chunk's items write to.
    #[must_use]
    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// The number of units in the chunk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the chunk is empty. The default partitioning policy never
    /// produces empty chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub(crate) fn into_units(self) -> Vec<WorkUnit> {
        self.units
    }
}
