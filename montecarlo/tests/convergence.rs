//! Statistical behaviour of the kernels.
//!
//! These draw millions of samples; the tolerances sit several standard
//! errors away from the true value.

use montecarlo::{
    ExperimentRunner, ParallelKernel, ProblemKind, SampleConfig, SamplingKernel, SeedStrategy,
    SequentialKernel, WarmupPolicy,
};
use std::f64::consts::PI;

const MILLION: u64 = 1_000_000;

fn runner() -> ExperimentRunner {
    ExperimentRunner::new().with_warmup(WarmupPolicy::disabled())
}

#[test]
fn pi_converges_with_a_million_samples() {
    let kernels: Vec<Box<dyn SamplingKernel>> = vec![
        Box::new(SequentialKernel::new(ProblemKind::CircleMembership)),
        Box::new(ParallelKernel::new(ProblemKind::CircleMembership)),
    ];
    let config = SampleConfig::for_workers(MILLION, 4).unwrap();

    for kernel in &kernels {
        let trials = 10;
        let close = (0..trials)
            .map(|_| kernel.estimate(&config).unwrap())
            .filter(|estimate| (estimate - PI).abs() < 0.01)
            .count();
        assert!(
            close * 100 >= trials * 95,
            "{}: only {close} of {trials} estimates within 0.01 of π",
            kernel.name()
        );
    }
}

#[test]
fn integral_converges_with_a_million_samples() {
    let kernel =
        ParallelKernel::new(ProblemKind::CurveMembership).with_seed(SeedStrategy::Fixed(2024));
    let config = SampleConfig::for_workers(MILLION, 4).unwrap();
    let estimate = kernel.estimate(&config).unwrap();
    assert!((estimate - 1.0 / 3.0).abs() < 0.005, "estimate {estimate}");
}

#[test]
fn sequential_and_parallel_agree_in_expectation() {
    let runner = runner();
    let problem = ProblemKind::CircleMembership;
    let trials = 5;

    let sequential = runner
        .run_trials(
            &SequentialKernel::new(problem),
            &SampleConfig::sequential(MILLION).unwrap(),
            "Sequential",
            problem.reference_value(),
            trials,
        )
        .unwrap();
    let parallel = runner
        .run_trials(
            &ParallelKernel::new(problem),
            &SampleConfig::for_workers(MILLION, 4).unwrap(),
            "Parallel(4 threads)",
            problem.reference_value(),
            trials,
        )
        .unwrap();

    let gap = (sequential.mean_estimate() - parallel.mean_estimate()).abs();
    assert!(
        gap < 0.005,
        "sequential {} vs parallel {}",
        sequential.mean_estimate(),
        parallel.mean_estimate()
    );
    assert!(sequential.std_dev_estimate() > 0.0);
    assert!(parallel.std_dev_estimate() > 0.0);
}

#[test]
fn error_shrinks_with_more_samples() {
    let runner = runner();
    let problem = ProblemKind::CircleMembership;
    let kernel = ParallelKernel::new(problem);

    let small = runner
        .run_trials(
            &kernel,
            &SampleConfig::for_workers(10_000, 2).unwrap(),
            "Parallel(2 threads)",
            PI,
            20,
        )
        .unwrap();
    let large = runner
        .run_trials(
            &kernel,
            &SampleConfig::for_workers(MILLION, 2).unwrap(),
            "Parallel(2 threads)",
            PI,
            20,
        )
        .unwrap();

    // 100x the samples should cut the spread by about 10x
    assert!(large.std_dev_estimate() < small.std_dev_estimate() / 3.0);
    assert!(large.mean_absolute_error() < small.mean_absolute_error());
}

#[test]
fn one_sample_never_divides_by_zero() {
    for problem in ProblemKind::ALL {
        let sequential = SequentialKernel::new(problem);
        let parallel = ParallelKernel::new(problem);
        let one = SampleConfig::new(1, 4, 2).unwrap();

        for estimate in [
            sequential.estimate(&one).unwrap(),
            parallel.estimate(&one).unwrap(),
        ] {
            assert!(estimate.is_finite());
            assert!(estimate == 0.0 || estimate == problem.scale(1.0));
        }
    }
}
