use tracing::debug;

use super::{conclude, sample_chunk, SamplingKernel};
use crate::aggregate::{aggregate, ChunkTally};
use crate::cancel::CancellationToken;
use crate::config::SampleConfig;
use crate::error::Result;
use crate::partition::partition;
use crate::pool::{PoolMonitor, WorkerPool};
use crate::problem::ProblemKind;
use crate::progress::Progress;
use crate::rng::SeedStrategy;

/// Fans chunks out across a pool of `worker_count` threads.
///
/// Each call builds its own pool and tears it down before returning.
#[derive(Debug, Clone)]
pub struct ParallelKernel {
    problem: ProblemKind,
    seed: SeedStrategy,
    monitor: PoolMonitor,
}

impl ParallelKernel {
    pub fn new(problem: ProblemKind) -> Self {
        Self {
            problem,
            seed: SeedStrategy::default(),
            monitor: PoolMonitor::new(),
        }
    }

    pub fn with_seed(mut self, seed: SeedStrategy) -> Self {
        self.seed = seed;
        self
    }

    /// Worker threads of this kernel's pools that are still alive.
    pub fn active_workers(&self) -> usize {
        self.monitor.active_workers()
    }
}

impl SamplingKernel for ParallelKernel {
    fn problem(&self) -> ProblemKind {
        self.problem
    }

    fn name(&self) -> String {
        match self.problem {
            ProblemKind::CircleMembership => "Parallel Pi".to_string(),
            ProblemKind::CurveMembership => "Parallel Integration (x^2)".to_string(),
        }
    }

    fn estimate_tracked(
        &self,
        config: &SampleConfig,
        cancel: &CancellationToken,
        progress: &Progress,
    ) -> Result<f64> {
        let chunks = partition(config.total_samples(), config.task_count())?;
        let sampler = self.problem.sampler();
        let seed = self.seed;
        // tripped by the first failed chunk; also follows the caller's token
        let abort = cancel.child();

        let pool = WorkerPool::with_monitor(config.worker_count(), Some(self.monitor.clone()))?;
        let results = pool.run_chunks(&chunks, &abort, |index, samples| {
            if abort.is_cancelled() {
                return Ok(ChunkTally {
                    cancelled: true,
                    ..ChunkTally::default()
                });
            }
            let mut rng = seed.rng_for(index as u64)?;
            Ok(sample_chunk(&sampler, &mut rng, samples, &abort, progress, |_| {}))
        });
        pool.shutdown();

        let tally = aggregate(results)?;
        debug!(
            chunks = tally.chunks,
            samples = tally.samples,
            hits = tally.hits,
            "parallel run finished"
        );

        conclude(self.problem, tally, config.total_samples())
    }
}
