//! Plain-text tables for the batch driver.

use crate::experiment::{speedup, SingleRunResult, SEQUENTIAL_LABEL};
use crate::stats::TrialStatistics;

const RULE_WIDTH: usize = 90;

/// One row per run: estimator, points, estimate, error and time.
pub fn results_table(results: &[SingleRunResult]) -> String {
    let mut out = String::from("=== Experiment Summary ===\n");
    out.push_str(&format!(
        "{:<25} | {:<15} | {:<12} | {:<12} | {:<10}\n",
        "Estimator", "Points", "Estimate", "Error", "Time (ms)"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for result in results {
        out.push_str(&format!(
            "{:<25} | {:>15} | {:.10} | {:.10} | {:>10}\n",
            result.label,
            result.config.total_samples(),
            result.estimate,
            result.absolute_error,
            result.runtime_millis
        ));
    }
    out
}

pub fn trials_table(stats: &[TrialStatistics]) -> String {
    let mut out = String::from("=== Multi-Trial Experiment Summary ===\n");
    out.push_str(&format!(
        "{:<25} | {:<10} | {:<12} | {:<12} | {:<12} | {:<12}\n",
        "Estimator", "Trials", "Mean Est", "Std Dev", "Mean Error", "Mean ms"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for s in stats {
        out.push_str(&format!(
            "{:<25} | {:<10} | {:.8} | {:.8} | {:.8} | {:.1}\n",
            s.label(),
            s.trial_count(),
            s.mean_estimate(),
            s.std_dev_estimate(),
            s.mean_absolute_error(),
            s.mean_runtime_millis()
        ));
    }
    out
}

/// Comparison output grouped by sample size.
///
/// Each parallel row is compared with the closest preceding sequential row
/// for the same sample count.
pub fn comparison_table(results: &[SingleRunResult]) -> String {
    let mut out = String::new();
    let mut baseline: Option<&SingleRunResult> = None;

    for result in results {
        if result.label == SEQUENTIAL_LABEL {
            if baseline.is_some() {
                out.push('\n');
            }
            out.push_str(&format!(
                "Testing with {} points:\n",
                result.config.total_samples()
            ));
            out.push_str(&format!("  {result}\n"));
            baseline = Some(result);
            continue;
        }

        let ratio = baseline
            .filter(|b| b.config.total_samples() == result.config.total_samples())
            .and_then(|b| speedup(b, result));
        match ratio {
            Some(ratio) => out.push_str(&format!("  {result} | Speedup: {ratio:.2}x\n")),
            None => out.push_str(&format!("  {result} | Speedup: n/a\n")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleConfig;
    use crate::experiment::parallel_label;
    use std::f64::consts::PI;

    fn results() -> Vec<SingleRunResult> {
        let seq = SampleConfig::sequential(1_000).unwrap();
        let par = SampleConfig::for_workers(1_000, 2).unwrap();
        vec![
            SingleRunResult::new(seq, SEQUENTIAL_LABEL, 3.14, 100, PI),
            SingleRunResult::new(par, parallel_label(2), 3.15, 40, PI),
            SingleRunResult::new(par, parallel_label(2), 3.13, 0, PI),
        ]
    }

    #[test]
    fn comparison_table_reports_speedups() {
        let table = comparison_table(&results());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Testing with 1000 points:");
        assert!(lines[1].starts_with("  Sequential | Config[points=1000, tasks=1, threads=1]"));
        assert!(lines[2].ends_with("| Speedup: 2.50x"));
        assert!(lines[3].ends_with("| Speedup: n/a"));
    }

    #[test]
    fn results_table_has_row_per_run() {
        let table = results_table(&results());
        assert_eq!(table.lines().count(), 3 + 3);
        assert!(table.contains("Parallel(2 threads)"));
        assert!(table.contains("3.1400000000"));
    }

    #[test]
    fn trials_table_has_row_per_label() {
        let runs = results();
        let stats = TrialStatistics::from_results(runs[1..].to_vec()).unwrap();
        let table = trials_table(&[stats]);
        let row = table.lines().last().unwrap();
        assert!(row.starts_with("Parallel(2 threads)"));
        assert!(row.contains("| 2 "));
        assert!(row.contains("3.14000000"));
    }
}
