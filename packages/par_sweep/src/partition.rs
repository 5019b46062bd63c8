use std::num::NonZero;

use crate::error::{Error, Result};
use crate::{Chunk, OutputSink, WorkUnit};

/// Splits an ordered workload into `chunk_count` near-equal contiguous
/// chunks.
///
/// Chunk sizes are `floor(n / k)` or `floor(n / k) + 1`, with the first
/// `n mod k` chunks receiving the extra element, so sizes differ by at most
/// one. The concatenation of all chunks equals the input in original order.
/// Deterministic and side-effect free.
///
/// The default policy forbids empty chunks: requesting more chunks than
/// there are units fails with [`Error::InvalidArgument`]. A zero chunk
/// count is unrepresentable by construction.
///
/// # Examples
///
/// ```
/// use new_zealand::nz;
/// use par_sweep::{OutputSink, partition, units_from};
///
/// let units = units_from((1..=10).map(|i| i.to_string()));
/// let chunks = partition(&units, nz!(3), &OutputSink::new("out")).unwrap();
///
/// let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
/// assert_eq!(sizes, [4, 3, 3]);
/// ```
pub fn partition(
    units: &[WorkUnit],
    chunk_count: NonZero<usize>,
    sink: &OutputSink,
) -> Result<Vec<Chunk>> {
    let k = chunk_count.get();

    if k > units.len() {
        return Err(Error::InvalidArgument {
            problem: format!(
                "cannot split {} units into {k} non-empty chunks",
                units.len()
            ),
        });
    }

    let base_size = units.len() / k;
    let remainder = units.len() % k;

    let mut chunks = Vec::with_capacity(k);
    let mut start = 0;

    for i in 0..k {
        let size = base_size + usize::from(i < remainder);
        let end = start + size;

        let chunk_id = NonZero::new(i + 1).expect("chunk ids are 1-based and cannot be zero");

        chunks.push(Chunk::new(
            chunk_id,
            units[start..end].to_vec(),
            sink.clone(),
        ));

        start = end;
    }

    debug_assert_eq!(start, units.len());

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;
    use crate::units_from;

    fn sink() -> OutputSink {
        OutputSink::new("out")
    }

    #[test]
    fn ten_units_in_three_chunks() {
        let units = units_from((1..=10).map(|i| i.to_string()));

        let chunks = partition(&units, nz!(3), &sink()).unwrap();

        let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(sizes, [4, 3, 3]);

        let items: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.units().iter().map(WorkUnit::item))
            .collect();
        assert_eq!(items, ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);

        assert_eq!(chunks[0].units()[0].item(), "1");
        assert_eq!(chunks[0].units()[3].item(), "4");
        assert_eq!(chunks[1].units()[0].item(), "5");
        assert_eq!(chunks[2].units()[2].item(), "10");
    }

    #[test]
    fn chunk_ids_are_one_based_and_sequential() {
        let units = units_from(["a", "b", "c", "d"]);

        let chunks = partition(&units, nz!(2), &sink()).unwrap();

        assert_eq!(chunks[0].chunk_id().get(), 1);
        assert_eq!(chunks[1].chunk_id().get(), 2);
    }

    #[test]
    fn covers_and_balances_all_small_workloads() {
        for n in 1..=12 {
            let units = units_from((0..n).map(|i| i.to_string()));

            for k in 1..=n {
                let chunks =
                    partition(&units, NonZero::new(k).unwrap(), &sink()).unwrap();

                assert_eq!(chunks.len(), k, "n={n} k={k}");

                let concatenated: Vec<WorkUnit> = chunks
                    .iter()
                    .flat_map(|c| c.units().iter().cloned())
                    .collect();
                assert_eq!(concatenated, units, "n={n} k={k}");

                let max = chunks.iter().map(Chunk::len).max().unwrap();
                let min = chunks.iter().map(Chunk::len).min().unwrap();
                assert!(max - min <= 1, "n={n} k={k} max={max} min={min}");
                assert!(min > 0, "n={n} k={k}: empty chunk produced");
            }
        }
    }

    #[test]
    fn more_chunks_than_units_is_invalid() {
        let units = units_from(["a", "b"]);

        let result = partition(&units, nz!(3), &sink());

        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn empty_workload_is_invalid_for_any_chunk_count() {
        let result = partition(&[], nz!(1), &sink());

        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn partitioning_is_deterministic() {
        let units = units_from((0..97).map(|i| format!("item-{i}")));

        let first = partition(&units, nz!(7), &sink()).unwrap();
        let second = partition(&units, nz!(7), &sink()).unwrap();

        assert_eq!(first, second);
    }
}
