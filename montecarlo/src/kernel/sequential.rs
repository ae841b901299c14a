use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{conclude, sample_chunk, SamplingKernel};
use crate::aggregate::Aggregator;
use crate::cancel::CancellationToken;
use crate::config::SampleConfig;
use crate::error::Result;
use crate::problem::{ProblemKind, SamplePoint};
use crate::progress::Progress;
use crate::rng::SeedStrategy;

/// Per-sample callback, invoked synchronously on the sampling thread.
pub type Observer = Arc<dyn Fn(SamplePoint) + Send + Sync>;

/// Runs the whole sample loop on the calling thread.
///
/// Task and worker counts in the config are ignored.
#[derive(Clone)]
pub struct SequentialKernel {
    problem: ProblemKind,
    seed: SeedStrategy,
    observer: Option<Observer>,
}

impl SequentialKernel {
    pub fn new(problem: ProblemKind) -> Self {
        Self {
            problem,
            seed: SeedStrategy::default(),
            observer: None,
        }
    }

    pub fn with_seed(mut self, seed: SeedStrategy) -> Self {
        self.seed = seed;
        self
    }

    /// Report every sample to `observer`. Marshaling to another thread is
    /// the observer's job.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl fmt::Debug for SequentialKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialKernel")
            .field("problem", &self.problem)
            .field("seed", &self.seed)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl SamplingKernel for SequentialKernel {
    fn problem(&self) -> ProblemKind {
        self.problem
    }

    fn name(&self) -> String {
        match self.problem {
            ProblemKind::CircleMembership => "Sequential Pi".to_string(),
            ProblemKind::CurveMembership => "Sequential Integration (x^2)".to_string(),
        }
    }

    fn estimate_tracked(
        &self,
        config: &SampleConfig,
        cancel: &CancellationToken,
        progress: &Progress,
    ) -> Result<f64> {
        let total = config.total_samples();
        let mut rng = self.seed.rng_for(0)?;
        let sampler = self.problem.sampler();

        let chunk = match &self.observer {
            Some(observer) => {
                sample_chunk(&sampler, &mut rng, total, cancel, progress, |p| observer(p))
            }
            None => sample_chunk(&sampler, &mut rng, total, cancel, progress, |_| {}),
        };

        let mut aggregator = Aggregator::new();
        aggregator.record(chunk);
        let tally = aggregator.finish();
        debug!(samples = tally.samples, hits = tally.hits, "sequential run finished");

        conclude(self.problem, tally, total)
    }
}
