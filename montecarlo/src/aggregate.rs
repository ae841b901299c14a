//! Fan-in of per-chunk hit counts.
//!
//! Workers never share a counter: each returns its own [`ChunkTally`] and the
//! totals are summed here on the calling thread once every unit has finished.
//! Any failed unit fails the whole aggregation.

use tracing::warn;

use crate::error::Result;

/// Outcome of one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkTally {
    /// Samples actually drawn; below the assigned size if the chunk was cancelled.
    pub samples: u64,
    pub hits: u64,
    /// Set when the chunk stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl ChunkTally {
    pub fn complete(samples: u64, hits: u64) -> Self {
        Self {
            samples,
            hits,
            cancelled: false,
        }
    }
}

/// Summed totals across all chunks of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub samples: u64,
    pub hits: u64,
    pub chunks: usize,
    pub cancelled: bool,
}

impl Tally {
    pub fn hit_ratio(&self) -> Option<f64> {
        (self.samples > 0).then(|| self.hits as f64 / self.samples as f64)
    }
}

/// Accumulates chunk results in whatever order they complete.
#[derive(Debug, Default)]
pub struct Aggregator {
    total: Tally,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, chunk: ChunkTally) {
        self.total.samples += chunk.samples;
        self.total.hits += chunk.hits;
        self.total.chunks += 1;
        self.total.cancelled |= chunk.cancelled;
    }

    pub fn finish(self) -> Tally {
        self.total
    }
}

/// Sum every chunk result, failing on the first error.
///
/// Partial totals are dropped on failure.
pub fn aggregate<I>(results: I) -> Result<Tally>
where
    I: IntoIterator<Item = Result<ChunkTally>>,
{
    let mut aggregator = Aggregator::new();
    for result in results {
        match result {
            Ok(chunk) => aggregator.record(chunk),
            Err(e) => {
                warn!(error = %e, "unit of work failed, discarding partial totals");
                return Err(e);
            }
        }
    }
    Ok(aggregator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, WorkerPanic};
    use crate::test_support::capture_logs;
    use proptest::prelude::*;

    #[test]
    fn sums_hits_and_samples() {
        let tally = aggregate(vec![
            Ok(ChunkTally::complete(10, 7)),
            Ok(ChunkTally::complete(10, 8)),
            Ok(ChunkTally::complete(12, 9)),
        ])
        .unwrap();
        assert_eq!(tally.samples, 32);
        assert_eq!(tally.hits, 24);
        assert_eq!(tally.chunks, 3);
        assert!(!tally.cancelled);
        assert_eq!(tally.hit_ratio(), Some(0.75));
    }

    #[test]
    fn any_failure_fails_the_run() {
        let (result, logs) = capture_logs(|| {
            aggregate(vec![
                Ok(ChunkTally::complete(10, 7)),
                Err(Error::execution(
                    "chunk 1 failed",
                    WorkerPanic {
                        message: "rng".to_string(),
                    },
                )),
                Ok(ChunkTally::complete(10, 8)),
            ])
        });
        assert!(matches!(result, Err(Error::ExecutionFailure { .. })));
        assert!(logs.contains("WARN"), "logs: {logs}");
        assert!(logs.contains("chunk 1 failed"), "logs: {logs}");
    }

    #[test]
    fn cancelled_chunk_marks_tally() {
        let tally = aggregate(vec![
            Ok(ChunkTally::complete(10, 7)),
            Ok(ChunkTally {
                samples: 3,
                hits: 2,
                cancelled: true,
            }),
        ])
        .unwrap();
        assert!(tally.cancelled);
        assert_eq!(tally.samples, 13);
    }

    #[test]
    fn empty_run_has_no_ratio() {
        let tally = aggregate(Vec::new()).unwrap();
        assert_eq!(tally.hit_ratio(), None);
    }

    fn chunk_results() -> impl Strategy<Value = Vec<ChunkTally>> {
        prop::collection::vec(
            (0u64..100_000).prop_flat_map(|samples| {
                (Just(samples), 0..=samples)
                    .prop_map(|(samples, hits)| ChunkTally::complete(samples, hits))
            }),
            1..64,
        )
    }

    proptest! {
        #[test]
        fn completion_order_does_not_change_totals(
            (chunks, shuffled) in chunk_results()
                .prop_flat_map(|chunks| (Just(chunks.clone()), Just(chunks).prop_shuffle()))
        ) {
            let in_order = aggregate(chunks.into_iter().map(Ok)).unwrap();
            let reordered = aggregate(shuffled.into_iter().map(Ok)).unwrap();
            prop_assert_eq!(in_order, reordered);
        }
    }
}
