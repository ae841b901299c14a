//! Run parameters.

use std::fmt;

use crate::error::{Error, Result};

/// Immutable parameters describing one estimation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleConfig {
    total_samples: u64,
    task_count: usize,
    worker_count: usize,
}

impl SampleConfig {
    /// Validate and build a configuration. Every value must be at least 1.
    pub fn new(total_samples: u64, task_count: usize, worker_count: usize) -> Result<Self> {
        if total_samples < 1 {
            return Err(Error::invalid("total samples must be at least 1"));
        }
        if task_count < 1 {
            return Err(Error::invalid("task count must be at least 1"));
        }
        if worker_count < 1 {
            return Err(Error::invalid("worker count must be at least 1"));
        }
        Ok(Self {
            total_samples,
            task_count,
            worker_count,
        })
    }

    /// Single task on a single worker.
    pub fn sequential(total_samples: u64) -> Result<Self> {
        Self::new(total_samples, 1, 1)
    }

    /// Two tasks per worker so early finishers can pick up another chunk.
    pub fn for_workers(total_samples: u64, worker_count: usize) -> Result<Self> {
        Self::new(total_samples, worker_count.saturating_mul(2), worker_count)
    }

    /// Same decomposition with a different sample count.
    pub fn with_total_samples(&self, total_samples: u64) -> Result<Self> {
        Self::new(total_samples, self.task_count, self.worker_count)
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn task_count(&self) -> usize {
        self.task_count
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl fmt::Display for SampleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config[points={}, tasks={}, threads={}]",
            self.total_samples, self.task_count, self.worker_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_values() {
        assert!(matches!(
            SampleConfig::new(0, 1, 1),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            SampleConfig::new(10, 0, 1),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            SampleConfig::new(10, 1, 0),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn for_workers_doubles_tasks() {
        let config = SampleConfig::for_workers(1_000, 4).unwrap();
        assert_eq!(config.task_count(), 8);
        assert_eq!(config.worker_count(), 4);
        assert!(SampleConfig::for_workers(1_000, 0).is_err());
    }

    #[test]
    fn with_total_samples_keeps_decomposition() {
        let config = SampleConfig::new(1_000_000, 8, 4).unwrap();
        let warmup = config.with_total_samples(10_000).unwrap();
        assert_eq!(warmup.total_samples(), 10_000);
        assert_eq!(warmup.task_count(), 8);
        assert_eq!(warmup.worker_count(), 4);
    }

    #[test]
    fn display_format() {
        let config = SampleConfig::new(1_000, 8, 4).unwrap();
        assert_eq!(config.to_string(), "Config[points=1000, tasks=8, threads=4]");
    }
}
