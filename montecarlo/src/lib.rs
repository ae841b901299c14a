//! Monte Carlo estimation of π and ∫₀¹ x² dx with sequential and
//! thread-pool kernels.
//!
//! A run samples random points, classifies them with the problem's
//! membership predicate and scales the hit ratio into an estimate:
//!
//! ```no_run
//! use montecarlo::{ExperimentRunner, ParallelKernel, ProblemKind, SampleConfig};
//!
//! # fn main() -> montecarlo::Result<()> {
//! let kernel = ParallelKernel::new(ProblemKind::CircleMembership);
//! let config = SampleConfig::for_workers(1_000_000, 4)?;
//! let stats = ExperimentRunner::new().run_trials(
//!     &kernel,
//!     &config,
//!     "Parallel(4 threads)",
//!     ProblemKind::CircleMembership.reference_value(),
//!     10,
//! )?;
//! println!("{stats}");
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod background;
pub mod cancel;
pub mod config;
pub mod error;
pub mod experiment;
pub mod kernel;
pub mod logging;
pub mod partition;
pub mod plot;
pub mod pool;
pub mod problem;
pub mod progress;
pub mod report;
pub mod rng;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use aggregate::{aggregate, Aggregator, ChunkTally, Tally};
pub use background::{BackgroundRun, RunState};
pub use cancel::CancellationToken;
pub use config::SampleConfig;
pub use error::{Error, Result};
pub use experiment::{speedup, ExperimentRunner, SingleRunResult, WarmupPolicy};
pub use kernel::{
    build_kernel, ParallelKernel, SamplingKernel, SequentialKernel, Strategy,
};
pub use partition::partition;
pub use pool::{PoolMonitor, WorkerPool};
pub use problem::{ProblemKind, SamplePoint};
pub use progress::{Progress, RunProgress};
pub use rng::SeedStrategy;
pub use stats::TrialStatistics;
