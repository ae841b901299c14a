//! Reduction of repeated trials.

use std::fmt;

use statrs::statistics::Statistics;

use crate::error::{Error, Result};
use crate::experiment::SingleRunResult;

/// Mean, spread and timing of trials that share a label.
///
/// Computed once at construction; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TrialStatistics {
    label: String,
    trials: Vec<SingleRunResult>,
    mean_estimate: f64,
    std_dev_estimate: f64,
    mean_runtime_millis: f64,
    mean_absolute_error: f64,
}

impl TrialStatistics {
    /// Fails with [`Error::InvalidConfiguration`] on an empty list or mixed labels.
    pub fn from_results(trials: Vec<SingleRunResult>) -> Result<Self> {
        let Some(first) = trials.first() else {
            return Err(Error::invalid("trial results cannot be empty"));
        };
        let label = first.label.clone();
        if let Some(other) = trials.iter().find(|t| t.label != label) {
            return Err(Error::invalid(format!(
                "trial results mix labels '{}' and '{}'",
                label, other.label
            )));
        }

        let estimates: Vec<f64> = trials.iter().map(|t| t.estimate).collect();
        let mean_estimate = estimates.iter().mean();
        let std_dev_estimate = estimates.iter().population_std_dev();
        let mean_runtime_millis = trials.iter().map(|t| t.runtime_millis as f64).mean();
        let mean_absolute_error = trials.iter().map(|t| t.absolute_error).mean();

        Ok(Self {
            label,
            trials,
            mean_estimate,
            std_dev_estimate,
            mean_runtime_millis,
            mean_absolute_error,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn trials(&self) -> &[SingleRunResult] {
        &self.trials
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    pub fn mean_estimate(&self) -> f64 {
        self.mean_estimate
    }

    /// Population standard deviation of the estimates.
    pub fn std_dev_estimate(&self) -> f64 {
        self.std_dev_estimate
    }

    pub fn mean_runtime_millis(&self) -> f64 {
        self.mean_runtime_millis
    }

    pub fn mean_absolute_error(&self) -> f64 {
        self.mean_absolute_error
    }
}

impl fmt::Display for TrialStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} trials) | Mean Est: {:.6} | StdDev: {:.6} | Mean Error: {:.6} | Mean Time: {:.1} ms",
            self.label,
            self.trial_count(),
            self.mean_estimate,
            self.std_dev_estimate,
            self.mean_absolute_error,
            self.mean_runtime_millis
        )
    }
}
