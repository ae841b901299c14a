use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use montecarlo::error::WorkerPanic;
use montecarlo::kernel::{conclude, sample_chunk};
use montecarlo::{
    aggregate, partition, CancellationToken, ChunkTally, Error, ProblemKind, Progress, Result,
    SampleConfig, SamplingKernel, SeedStrategy,
};
use tokio::runtime::Builder;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinHandle};
use tracing::debug;

/// Parallel kernel that runs each chunk as a `spawn_blocking` job.
///
/// At most `worker_count` chunks sample at the same time.
#[derive(Debug, Clone)]
pub struct AsyncParallelKernel {
    problem: ProblemKind,
    seed: SeedStrategy,
}

impl AsyncParallelKernel {
    pub fn new(problem: ProblemKind) -> Self {
        Self {
            problem,
            seed: SeedStrategy::default(),
        }
    }

    pub fn with_seed(mut self, seed: SeedStrategy) -> Self {
        self.seed = seed;
        self
    }

    /// Estimate on the caller's runtime.
    pub async fn estimate_async(
        &self,
        config: &SampleConfig,
        cancel: &CancellationToken,
    ) -> Result<f64> {
        self.run(config, cancel, &Progress::new()).await
    }

    async fn run(
        &self,
        config: &SampleConfig,
        cancel: &CancellationToken,
        progress: &Progress,
    ) -> Result<f64> {
        let chunks = partition(config.total_samples(), config.task_count())?;
        let sampler = self.problem.sampler();
        let seed = self.seed;
        let progress = progress.clone();

        let results = fan_out(
            chunks,
            config.worker_count(),
            cancel.child(),
            move |task_id, samples, abort| {
                let mut rng = seed.rng_for(task_id as u64)?;
                Ok(sample_chunk(&sampler, &mut rng, samples, abort, &progress, |_| {}))
            },
        )
        .await?;

        let tally = aggregate(results)?;
        debug!(
            chunks = tally.chunks,
            samples = tally.samples,
            hits = tally.hits,
            "async run finished"
        );
        conclude(self.problem, tally, config.total_samples())
    }
}

/// Run `work` once per chunk as blocking jobs, `workers` at a time, and
/// collect the outcomes in chunk order.
///
/// A failed or panicked chunk trips `abort`; chunks not yet started then
/// return a cancelled tally and running ones stop at their next check.
async fn fan_out<F>(
    chunks: Vec<u64>,
    workers: usize,
    abort: CancellationToken,
    work: F,
) -> Result<Vec<Result<ChunkTally>>>
where
    F: Fn(usize, u64, &CancellationToken) -> Result<ChunkTally> + Send + Sync + 'static,
{
    let permits = Arc::new(Semaphore::new(workers));
    let work = Arc::new(work);

    let mut handles = Vec::with_capacity(chunks.len());
    for (task_id, samples) in chunks.into_iter().enumerate() {
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .map_err(|e| Error::execution("worker permits closed", e))?;
        let abort = abort.clone();
        let work = Arc::clone(&work);

        let handle = task::spawn_blocking(move || {
            let _permit = permit;
            if abort.is_cancelled() {
                return Ok(ChunkTally {
                    cancelled: true,
                    ..ChunkTally::default()
                });
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| work(task_id, samples, &abort)))
                .unwrap_or_else(|payload| {
                    Err(Error::execution(
                        format!("chunk {task_id} failed"),
                        WorkerPanic::from_payload(payload),
                    ))
                });
            if outcome.is_err() {
                abort.cancel();
            }
            outcome
        });

        handles.push(handle);
    }

    Ok(join_chunks(handles).await)
}

/// Await every chunk in task order.
async fn join_chunks(handles: Vec<JoinHandle<Result<ChunkTally>>>) -> Vec<Result<ChunkTally>> {
    let mut results = Vec::with_capacity(handles.len());
    for (task_id, handle) in handles.into_iter().enumerate() {
        results.push(match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(Error::execution(format!("chunk {task_id} failed"), e)),
        });
    }
    results
}

impl SamplingKernel for AsyncParallelKernel {
    fn problem(&self) -> ProblemKind {
        self.problem
    }

    fn name(&self) -> String {
        match self.problem {
            ProblemKind::CircleMembership => "Async Pi".to_string(),
            ProblemKind::CurveMembership => "Async Integration (x^2)".to_string(),
        }
    }

    /// Runs on a dedicated runtime that is shut down before returning.
    ///
    /// Must not be called from inside a Tokio runtime; use
    /// [`AsyncParallelKernel::estimate_async`] there.
    fn estimate_tracked(
        &self,
        config: &SampleConfig,
        cancel: &CancellationToken,
        progress: &Progress,
    ) -> Result<f64> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.worker_count())
            .thread_name("mc-async-worker")
            .enable_all()
            .build()
            .map_err(|e| Error::execution("failed to build tokio runtime", e))?;

        // every spawned chunk is awaited inside block_on, so dropping the
        // runtime only has idle threads left to stop
        runtime.block_on(self.run(config, cancel, progress))
    }
}
