//! Timed runs, repeated trials and sequential/parallel comparisons.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::config::SampleConfig;
use crate::error::{Error, Result};
use crate::kernel::SamplingKernel;
use crate::stats::TrialStatistics;

/// Label given to the sequential baseline in comparisons.
pub const SEQUENTIAL_LABEL: &str = "Sequential";

pub fn parallel_label(workers: usize) -> String {
    format!("Parallel({workers} threads)")
}

/// Outcome of one timed estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleRunResult {
    pub config: SampleConfig,
    pub label: String,
    pub estimate: f64,
    pub runtime_millis: u64,
    pub absolute_error: f64,
}

impl SingleRunResult {
    pub fn new(
        config: SampleConfig,
        label: impl Into<String>,
        estimate: f64,
        runtime_millis: u64,
        reference_value: f64,
    ) -> Self {
        Self {
            config,
            label: label.into(),
            estimate,
            runtime_millis,
            absolute_error: (estimate - reference_value).abs(),
        }
    }
}

impl fmt::Display for SingleRunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | Est ≈ {:.6} | Error: {:.6} | Time: {} ms",
            self.label, self.config, self.estimate, self.absolute_error, self.runtime_millis
        )
    }
}

/// Sequential runtime over parallel runtime; `None` when the parallel run
/// measured 0 ms.
pub fn speedup(sequential: &SingleRunResult, parallel: &SingleRunResult) -> Option<f64> {
    (parallel.runtime_millis > 0)
        .then(|| sequential.runtime_millis as f64 / parallel.runtime_millis as f64)
}

/// Untimed pass run before large measurements to absorb one-time setup cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupPolicy {
    /// Warm up only when the measured run has more samples than this.
    pub threshold: u64,
    pub samples: u64,
}

impl Default for WarmupPolicy {
    fn default() -> Self {
        Self {
            threshold: 100_000,
            samples: 10_000,
        }
    }
}

impl WarmupPolicy {
    pub fn disabled() -> Self {
        Self {
            threshold: u64::MAX,
            samples: 0,
        }
    }

    fn applies_to(&self, config: &SampleConfig) -> bool {
        self.samples > 0 && config.total_samples() > self.threshold
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExperimentRunner {
    warmup: WarmupPolicy,
}

impl ExperimentRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_warmup(mut self, warmup: WarmupPolicy) -> Self {
        self.warmup = warmup;
        self
    }

    /// Time exactly one call to `kernel.estimate`.
    #[instrument(level = "debug", skip(self, kernel), fields(kernel = %kernel.name()))]
    pub fn run_once(
        &self,
        kernel: &dyn SamplingKernel,
        config: &SampleConfig,
        label: &str,
        reference_value: f64,
    ) -> Result<SingleRunResult> {
        if self.warmup.applies_to(config) {
            let warmup = config.with_total_samples(self.warmup.samples)?;
            debug!(samples = self.warmup.samples, "warm-up pass");
            kernel.estimate(&warmup)?;
        }

        let start = Instant::now();
        let estimate = kernel.estimate(config)?;
        let runtime_millis = start.elapsed().as_millis() as u64;

        let result = SingleRunResult::new(*config, label, estimate, runtime_millis, reference_value);
        debug!(%result, "run complete");
        Ok(result)
    }

    /// Run `trial_count` trials one after another and reduce them.
    ///
    /// Trials never overlap, so each timing sees the whole machine.
    pub fn run_trials(
        &self,
        kernel: &dyn SamplingKernel,
        config: &SampleConfig,
        label: &str,
        reference_value: f64,
        trial_count: usize,
    ) -> Result<TrialStatistics> {
        if trial_count < 1 {
            return Err(Error::invalid("trial count must be at least 1"));
        }

        info!(trials = trial_count, label, "running trials");
        let results = (0..trial_count)
            .map(|_| self.run_once(kernel, config, label, reference_value))
            .collect::<Result<Vec<_>>>()?;

        TrialStatistics::from_results(results)
    }

    /// For every sample size, one sequential run followed by one parallel run
    /// per worker count (with two tasks per worker).
    pub fn run_comparison(
        &self,
        sample_sizes: &[u64],
        worker_counts: &[usize],
        sequential: &dyn SamplingKernel,
        parallel: &dyn SamplingKernel,
        reference_value: f64,
    ) -> Result<Vec<SingleRunResult>> {
        info!(
            "Monte Carlo experiments ({} vs {})",
            sequential.name(),
            parallel.name()
        );

        let mut results = Vec::with_capacity(sample_sizes.len() * (worker_counts.len() + 1));
        for &samples in sample_sizes {
            let seq_config = SampleConfig::sequential(samples)?;
            let baseline = self.run_once(sequential, &seq_config, SEQUENTIAL_LABEL, reference_value)?;
            info!("{baseline}");
            results.push(baseline.clone());

            for &workers in worker_counts {
                let par_config = SampleConfig::for_workers(samples, workers)?;
                let result =
                    self.run_once(parallel, &par_config, &parallel_label(workers), reference_value)?;
                match speedup(&baseline, &result) {
                    Some(ratio) => info!("{result} | Speedup: {ratio:.2}x"),
                    None => info!("{result} | Speedup: n/a"),
                }
                results.push(result);
            }
        }
        Ok(results)
    }
}
