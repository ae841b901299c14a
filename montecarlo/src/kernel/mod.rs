//! Sampling kernels.
//!
//! A kernel turns a [`SampleConfig`] into one estimate. Sequential and
//! parallel kernels share the same per-chunk sample loop and differ only in
//! how chunks are scheduled; the problem kind is plain data composed into
//! either of them.

mod parallel;
mod sequential;

pub use parallel::ParallelKernel;
pub use sequential::{Observer, SequentialKernel};

use rand::Rng;
use tracing::warn;

use crate::aggregate::{ChunkTally, Tally};
use crate::cancel::CancellationToken;
use crate::config::SampleConfig;
use crate::error::{Error, Result};
use crate::problem::{PointSampler, ProblemKind, SamplePoint};
use crate::progress::Progress;
use crate::rng::SeedStrategy;

/// Samples drawn between two checks of the cancellation flag.
pub const CANCEL_CHECK_STRIDE: u64 = 1024;

/// Capability shared by every kernel variant.
pub trait SamplingKernel: Send + Sync {
    fn problem(&self) -> ProblemKind;

    fn name(&self) -> String;

    /// Estimate, stopping early with [`Error::Cancelled`] once `cancel` is set
    /// and publishing drawn samples to `progress` as it goes.
    fn estimate_tracked(
        &self,
        config: &SampleConfig,
        cancel: &CancellationToken,
        progress: &Progress,
    ) -> Result<f64>;

    fn estimate_cancellable(
        &self,
        config: &SampleConfig,
        cancel: &CancellationToken,
    ) -> Result<f64> {
        self.estimate_tracked(config, cancel, &Progress::new())
    }

    fn estimate(&self, config: &SampleConfig) -> Result<f64> {
        self.estimate_cancellable(config, &CancellationToken::new())
    }
}

/// Execution strategy selectable at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    Parallel,
}

/// Compose a strategy and a problem into a kernel.
pub fn build_kernel(
    strategy: Strategy,
    problem: ProblemKind,
    seed: SeedStrategy,
) -> Box<dyn SamplingKernel> {
    match strategy {
        Strategy::Sequential => Box::new(SequentialKernel::new(problem).with_seed(seed)),
        Strategy::Parallel => Box::new(ParallelKernel::new(problem).with_seed(seed)),
    }
}

/// Draw `samples` points and count hits.
///
/// Every [`CANCEL_CHECK_STRIDE`] samples the chunk publishes its counts to
/// `progress` and checks the flag; a cancelled chunk reports only what it
/// actually drew.
pub fn sample_chunk<R, F>(
    sampler: &PointSampler,
    rng: &mut R,
    samples: u64,
    cancel: &CancellationToken,
    progress: &Progress,
    mut observe: F,
) -> ChunkTally
where
    R: Rng + ?Sized,
    F: FnMut(SamplePoint),
{
    let mut hits = 0;
    let mut published = (0, 0);
    for drawn in 0..samples {
        if drawn % CANCEL_CHECK_STRIDE == 0 {
            progress.add(drawn - published.0, hits - published.1);
            published = (drawn, hits);
            if cancel.is_cancelled() {
                return ChunkTally {
                    samples: drawn,
                    hits,
                    cancelled: true,
                };
            }
        }
        let point = sampler.sample(rng);
        if point.hit {
            hits += 1;
        }
        observe(point);
    }
    progress.add(samples - published.0, hits - published.1);
    ChunkTally::complete(samples, hits)
}

/// Turn aggregated totals into the run's outcome.
pub fn conclude(problem: ProblemKind, tally: Tally, requested: u64) -> Result<f64> {
    let estimate = problem.estimate_from(tally.hits, tally.samples);
    if tally.cancelled {
        warn!(
            completed = tally.samples,
            requested,
            partial = ?estimate,
            "run cancelled"
        );
        return Err(Error::Cancelled {
            completed: tally.samples,
            requested,
            partial_estimate: estimate,
        });
    }
    estimate.ok_or_else(|| Error::invalid("no samples were drawn"))
}
