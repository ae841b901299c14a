//! Scoped worker pool for one parallel run.
//!
//! A [`WorkerPool`] is built by the run that needs it and torn down before
//! that run returns. Dropping it terminates the underlying rayon pool and
//! blocks until every worker thread has exited, on every exit path.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::aggregate::ChunkTally;
use crate::cancel::CancellationToken;
use crate::error::{Error, Result, WorkerPanic};

/// Live worker-thread counter.
///
/// Cloning shares the counter, so a kernel can keep one across the pools it
/// creates and report how many of their threads are still alive.
#[derive(Debug, Clone, Default)]
pub struct PoolMonitor {
    inner: Arc<LiveThreads>,
}

#[derive(Debug, Default)]
struct LiveThreads {
    count: Mutex<usize>,
    exited: Condvar,
}

impl PoolMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worker threads started and not yet exited.
    pub fn active_workers(&self) -> usize {
        *self.lock()
    }

    fn register(&self, workers: usize) {
        *self.lock() += workers;
    }

    fn unregister(&self, workers: usize) {
        let mut count = self.lock();
        *count = count.saturating_sub(workers);
        self.inner.exited.notify_all();
    }

    fn wait_idle(&self) {
        let mut count = self.lock();
        while *count > 0 {
            count = self
                .inner
                .exited
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.inner
            .count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed-size pool executing chunks of one run.
pub struct WorkerPool {
    // Field order matters: the rayon pool is terminated before `teardown`
    // waits for its threads.
    pool: ThreadPool,
    teardown: Teardown,
    workers: usize,
}

struct Teardown {
    live: PoolMonitor,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.live.wait_idle();
        debug!("worker pool shut down");
    }
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_monitor(workers, None)
    }

    /// Build a pool whose threads are also counted by `shared`.
    pub fn with_monitor(workers: usize, shared: Option<PoolMonitor>) -> Result<Self> {
        if workers < 1 {
            return Err(Error::invalid("worker count must be at least 1"));
        }

        let live = PoolMonitor::new();
        live.register(workers);
        if let Some(shared) = &shared {
            shared.register(workers);
        }

        let on_exit = {
            let live = live.clone();
            let shared = shared.clone();
            // shared goes first: teardown is released by `live` reaching
            // zero, and by then every counter must be settled
            move |_index: usize| {
                if let Some(shared) = &shared {
                    shared.unregister(1);
                }
                live.unregister(1);
            }
        };

        let built = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("mc-worker-{index}"))
            .exit_handler(on_exit)
            .build();

        match built {
            Ok(pool) => {
                debug!(workers, "worker pool started");
                Ok(Self {
                    pool,
                    teardown: Teardown { live },
                    workers,
                })
            }
            Err(e) => {
                live.unregister(workers);
                if let Some(shared) = &shared {
                    shared.unregister(workers);
                }
                Err(Error::execution("failed to build worker pool", e))
            }
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn active_workers(&self) -> usize {
        self.teardown.live.active_workers()
    }

    /// Run `work(index, samples)` once per chunk and collect every outcome.
    ///
    /// Returns only after all chunks have finished. A panicking chunk is
    /// reported as an [`Error::ExecutionFailure`] in its slot. The first
    /// failure trips `abort`, so `work` should poll it to stop siblings early.
    pub fn run_chunks<F>(
        &self,
        chunks: &[u64],
        abort: &CancellationToken,
        work: F,
    ) -> Vec<Result<ChunkTally>>
    where
        F: Fn(usize, u64) -> Result<ChunkTally> + Send + Sync,
    {
        self.pool.install(|| {
            chunks
                .par_iter()
                .enumerate()
                .map(|(index, &samples)| {
                    let outcome = catch_unwind(AssertUnwindSafe(|| work(index, samples)))
                        .unwrap_or_else(|payload| {
                            Err(Error::execution(
                                format!("chunk {index} failed"),
                                WorkerPanic::from_payload(payload),
                            ))
                        });
                    if outcome.is_err() {
                        abort.cancel();
                    }
                    outcome
                })
                .collect()
        })
    }

    /// Tear the pool down now; equivalent to dropping it.
    pub fn shutdown(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    fn run_all<F>(pool: &WorkerPool, chunks: &[u64], work: F) -> Vec<Result<ChunkTally>>
    where
        F: Fn(usize, u64) -> Result<ChunkTally> + Send + Sync,
    {
        pool.run_chunks(chunks, &CancellationToken::new(), work)
    }

    #[test]
    fn runs_every_chunk() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.workers(), 3);
        let chunks = [5, 5, 5, 7];
        let results = run_all(&pool, &chunks, |_, samples| Ok(ChunkTally::complete(samples, 1)));
        assert_eq!(results.len(), 4);
        let total: u64 = results.into_iter().map(|r| r.unwrap().samples).sum();
        assert_eq!(total, 22);
    }

    #[test]
    fn concurrency_is_bounded_by_worker_count() {
        let pool = WorkerPool::new(2).unwrap();
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let chunks = vec![1u64; 16];
        run_all(&pool, &chunks, |_, samples| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(ChunkTally::complete(samples, 0))
        });
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn panic_becomes_execution_failure() {
        let pool = WorkerPool::new(2).unwrap();
        let abort = CancellationToken::new();
        let results = pool.run_chunks(&[10, 10, 10], &abort, |index, samples| {
            if index == 1 {
                panic!("random source exhausted");
            }
            Ok(ChunkTally::complete(samples, 0))
        });
        assert!(results[0].is_ok());
        assert!(results[2].is_ok());
        match &results[1] {
            Err(Error::ExecutionFailure { source, .. }) => {
                assert_eq!(source.to_string(), "worker panicked: random source exhausted");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(abort.is_cancelled());
    }

    #[test]
    fn failure_stops_slow_siblings() {
        let pool = WorkerPool::new(2).unwrap();
        let abort = CancellationToken::new();
        let start = Instant::now();
        let results = pool.run_chunks(&[1, 1], &abort, |index, samples| {
            if index == 0 {
                return Err(Error::invalid("bad chunk"));
            }
            // would take five seconds if nobody tripped the abort flag
            while !abort.is_cancelled() && start.elapsed() < Duration::from_secs(5) {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(ChunkTally {
                cancelled: true,
                ..ChunkTally::complete(samples, 0)
            })
        });
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(results[0].is_err());
        assert!(results[1].as_ref().unwrap().cancelled);
    }

    #[test]
    fn success_leaves_abort_untouched() {
        let pool = WorkerPool::new(2).unwrap();
        let abort = CancellationToken::new();
        pool.run_chunks(&[3, 3], &abort, |_, samples| Ok(ChunkTally::complete(samples, 0)));
        assert!(!abort.is_cancelled());
    }

    #[test]
    fn drop_waits_for_all_workers() {
        let shared = PoolMonitor::new();
        let pool = WorkerPool::with_monitor(4, Some(shared.clone())).unwrap();
        assert_eq!(shared.active_workers(), 4);
        run_all(&pool, &[1, 2, 3], |_, samples| Ok(ChunkTally::complete(samples, 0)));
        pool.shutdown();
        assert_eq!(shared.active_workers(), 0);
    }

    #[test]
    fn shared_monitor_is_settled_on_every_shutdown() {
        let shared = PoolMonitor::new();
        for _ in 0..200 {
            let pool = WorkerPool::with_monitor(4, Some(shared.clone())).unwrap();
            run_all(&pool, &[1, 1, 1, 1], |_, samples| Ok(ChunkTally::complete(samples, 0)));
            pool.shutdown();
            assert_eq!(shared.active_workers(), 0);
        }
    }

    #[test]
    fn failed_run_still_releases_workers() {
        let shared = PoolMonitor::new();
        {
            let pool = WorkerPool::with_monitor(3, Some(shared.clone())).unwrap();
            let results = run_all(&pool, &[1, 1, 1], |_, _| panic!("boom"));
            assert!(results.iter().all(|r| r.is_err()));
        }
        assert_eq!(shared.active_workers(), 0);
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
