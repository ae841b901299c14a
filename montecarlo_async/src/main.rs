use std::time::Instant;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use montecarlo::experiment::{parallel_label, SEQUENTIAL_LABEL};
use montecarlo::{
    build_kernel, logging, report, CancellationToken, ExperimentRunner, ProblemKind,
    SampleConfig, SeedStrategy, SingleRunResult, Strategy,
};
use montecarlo_async::AsyncParallelKernel;
use tokio::task;
use tracing::info;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Problem {
    Circle,
    Curve,
}

impl From<Problem> for ProblemKind {
    fn from(problem: Problem) -> Self {
        match problem {
            Problem::Circle => ProblemKind::CircleMembership,
            Problem::Curve => ProblemKind::CurveMembership,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "montecarlo_async",
    about = "Threaded vs tokio Monte Carlo estimation"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Problem::Circle)]
    problem: Problem,
    #[arg(long, value_delimiter = ',', default_values_t = vec![100_000, 1_000_000, 10_000_000])]
    samples: Vec<u64>,
    /// Maximum number of chunks sampling at once.
    #[arg(long, value_delimiter = ',', default_values_t = vec![2, 4, 8])]
    workers: Vec<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

fn async_label(workers: usize) -> String {
    format!("Async({workers} tasks)")
}

/// Time one of the thread-based kernels off the async workers.
async fn threaded_run(
    strategy: Strategy,
    problem: ProblemKind,
    seed: SeedStrategy,
    config: SampleConfig,
    label: String,
) -> Result<SingleRunResult> {
    let result = task::spawn_blocking(move || {
        let kernel = build_kernel(strategy, problem, seed);
        ExperimentRunner::new().run_once(
            kernel.as_ref(),
            &config,
            &label,
            problem.reference_value(),
        )
    })
    .await??;
    Ok(result)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    let problem = ProblemKind::from(cli.problem);
    let seed = cli.seed.map_or(SeedStrategy::Entropy, SeedStrategy::Fixed);
    let kernel = AsyncParallelKernel::new(problem).with_seed(seed);
    let cancel = CancellationToken::new();

    let start = Instant::now();
    let mut results = Vec::new();
    for &samples in &cli.samples {
        let baseline = SampleConfig::sequential(samples)?;
        results.push(
            threaded_run(
                Strategy::Sequential,
                problem,
                seed,
                baseline,
                SEQUENTIAL_LABEL.to_string(),
            )
            .await?,
        );

        for &workers in &cli.workers {
            let config = SampleConfig::for_workers(samples, workers)?;
            results.push(
                threaded_run(
                    Strategy::Parallel,
                    problem,
                    seed,
                    config,
                    parallel_label(workers),
                )
                .await?,
            );

            let run_start = Instant::now();
            let estimate = kernel.estimate_async(&config, &cancel).await?;
            let runtime_millis = run_start.elapsed().as_millis() as u64;

            let result = SingleRunResult::new(
                config,
                async_label(workers),
                estimate,
                runtime_millis,
                problem.reference_value(),
            );
            info!(%result, "async run complete");
            results.push(result);
        }
    }

    println!("{}", report::comparison_table(&results));
    println!("{}", report::results_table(&results));
    println!("Actual value: {}", problem.reference_value());
    println!("Total time: {}ms", start.elapsed().as_millis());
    Ok(())
}
