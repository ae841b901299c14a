//! Live sample counters for runs watched from another thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::problem::ProblemKind;

/// Samples drawn and hits seen so far, shared by every chunk of a run.
///
/// Chunks publish in batches of [`CANCEL_CHECK_STRIDE`](crate::kernel::CANCEL_CHECK_STRIDE),
/// so readers may lag the workers by up to one batch per chunk.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    samples: AtomicU64,
    hits: AtomicU64,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, samples: u64, hits: u64) {
        // hits first, so a reader never sees more hits than samples
        self.inner.hits.fetch_add(hits, Ordering::Relaxed);
        self.inner.samples.fetch_add(samples, Ordering::Release);
    }

    pub fn samples(&self) -> u64 {
        self.inner.samples.load(Ordering::Acquire)
    }

    pub fn hits(&self) -> u64 {
        self.inner.hits.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, problem: ProblemKind, requested: u64) -> RunProgress {
        let completed = self.samples();
        let hits = self.hits().min(completed);
        RunProgress {
            completed,
            requested,
            estimate: problem.estimate_from(hits, completed),
        }
    }
}

/// Point-in-time view of a running estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunProgress {
    pub completed: u64,
    pub requested: u64,
    /// Estimate from the samples drawn so far; `None` before the first batch.
    pub estimate: Option<f64>,
}

impl RunProgress {
    /// Share of the requested samples already drawn, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.requested == 0 {
            return 0.0;
        }
        (self.completed as f64 / self.requested as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn snapshot_scales_running_ratio() {
        let progress = Progress::new();
        assert_eq!(
            progress.snapshot(ProblemKind::CircleMembership, 100).estimate,
            None
        );

        progress.add(20, 15);
        progress.clone().add(20, 16);
        let view = progress.snapshot(ProblemKind::CircleMembership, 100);
        assert_eq!(view.completed, 40);
        assert_eq!(view.requested, 100);
        assert_relative_eq!(view.estimate.unwrap(), 3.1, epsilon = 1e-12);
        assert_relative_eq!(view.fraction(), 0.4, epsilon = 1e-12);
    }
}
