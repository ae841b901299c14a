//! Splitting a sample budget into chunks.

use crate::error::{Error, Result};

/// Split `total_samples` into `task_count` chunk sizes.
///
/// Every chunk gets `total_samples / task_count`; the last one also absorbs
/// the remainder. Chunks may be empty when there are more tasks than samples.
pub fn partition(total_samples: u64, task_count: usize) -> Result<Vec<u64>> {
    if task_count < 1 {
        return Err(Error::invalid("task count must be at least 1"));
    }

    let tasks = task_count as u64;
    let per_task = total_samples / tasks;
    let remainder = total_samples % tasks;

    Ok((0..task_count)
        .map(|task_id| {
            if task_id == task_count - 1 {
                per_task + remainder
            } else {
                per_task
            }
        })
        .collect())
}
