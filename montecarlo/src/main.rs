use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use montecarlo::experiment::{parallel_label, SEQUENTIAL_LABEL};
use montecarlo::plot::{self, PointRecorder};
use montecarlo::{
    build_kernel, logging, report, ExperimentRunner, ParallelKernel, ProblemKind, SampleConfig,
    SamplingKernel, SeedStrategy, SequentialKernel, Strategy, WarmupPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "montecarlo", about = "Sequential vs parallel Monte Carlo estimation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sequential run followed by parallel runs for every sample size.
    Compare(CompareArgs),
    /// Repeat one configuration and report mean, spread and timing.
    Trials(TrialsArgs),
    /// Sample sequentially and save a scatter plot of the points.
    Plot(PlotArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Problem {
    /// π from points inside the unit circle
    Circle,
    /// ∫₀¹ x² dx from points under the curve
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

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Sequential,
    Parallel,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[arg(long, value_enum, default_value_t = Problem::Circle)]
    problem: Problem,
    /// Comma-separated sample sizes.
    #[arg(long, value_delimiter = ',', default_values_t = vec![100_000, 1_000_000, 10_000_000])]
    samples: Vec<u64>,
    /// Comma-separated worker counts; each uses two tasks per worker.
    #[arg(long, value_delimiter = ',', default_values_t = vec![2, 4, 8])]
    workers: Vec<usize>,
    /// Fixed seed for reproducible estimates.
    #[arg(long)]
    seed: Option<u64>,
    /// Skip the warm-up pass before large runs.
    #[arg(long)]
    no_warmup: bool,
}

#[derive(Args, Debug)]
struct TrialsArgs {
    #[arg(long, value_enum, default_value_t = Problem::Circle)]
    problem: Problem,
    #[arg(long, value_enum, default_value_t = StrategyArg::Parallel)]
    strategy: StrategyArg,
    #[arg(long, default_value_t = 1_000_000)]
    samples: u64,
    #[arg(long, default_value_t = num_cpus::get())]
    workers: usize,
    /// Defaults to twice the worker count.
    #[arg(long)]
    tasks: Option<usize>,
    #[arg(long, default_value_t = 10)]
    trials: usize,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct PlotArgs {
    #[arg(long, value_enum, default_value_t = Problem::Circle)]
    problem: Problem,
    #[arg(long, default_value_t = 5_000)]
    samples: u64,
    /// Image width and height in pixels.
    #[arg(long, default_value_t = 600)]
    size: u32,
    #[arg(long, default_value = "samples.png")]
    output: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
}

fn seed_strategy(seed: Option<u64>) -> SeedStrategy {
    seed.map_or(SeedStrategy::Entropy, SeedStrategy::Fixed)
}

fn compare(args: CompareArgs) -> Result<()> {
    let problem = ProblemKind::from(args.problem);
    let seed = seed_strategy(args.seed);
    let sequential = SequentialKernel::new(problem).with_seed(seed);
    let parallel = ParallelKernel::new(problem).with_seed(seed);

    let mut runner = ExperimentRunner::new();
    if args.no_warmup {
        runner = runner.with_warmup(WarmupPolicy::disabled());
    }

    println!(
        "=== Monte Carlo Experiments ({} vs {}) ===\n",
        sequential.name(),
        parallel.name()
    );
    let results = runner.run_comparison(
        &args.samples,
        &args.workers,
        &sequential,
        &parallel,
        problem.reference_value(),
    )?;

    println!("{}", report::comparison_table(&results));
    println!("{}", report::results_table(&results));
    println!("Actual value: {}", problem.reference_value());
    Ok(())
}

fn trials(args: TrialsArgs) -> Result<()> {
    let problem = ProblemKind::from(args.problem);
    let (strategy, config, label) = match args.strategy {
        StrategyArg::Sequential => (
            Strategy::Sequential,
            SampleConfig::sequential(args.samples)?,
            SEQUENTIAL_LABEL.to_string(),
        ),
        StrategyArg::Parallel => {
            let config = match args.tasks {
                Some(tasks) => SampleConfig::new(args.samples, tasks, args.workers)?,
                None => SampleConfig::for_workers(args.samples, args.workers)?,
            };
            (Strategy::Parallel, config, parallel_label(args.workers))
        }
    };

    let kernel = build_kernel(strategy, problem, seed_strategy(args.seed));
    println!("Running {} trials for {label} ({config})...", args.trials);
    let stats = ExperimentRunner::new().run_trials(
        kernel.as_ref(),
        &config,
        &label,
        problem.reference_value(),
        args.trials,
    )?;

    println!("{}", report::trials_table(&[stats]));
    println!("Actual value: {}", problem.reference_value());
    Ok(())
}

fn plot(args: PlotArgs) -> Result<()> {
    let problem = ProblemKind::from(args.problem);
    let recorder = PointRecorder::for_samples(args.samples);
    let kernel = SequentialKernel::new(problem)
        .with_seed(seed_strategy(args.seed))
        .with_observer(recorder.observer());

    let estimate = kernel.estimate(&SampleConfig::sequential(args.samples)?)?;
    let points = recorder.points();
    plot::save_scatter(&points, problem, args.size, &args.output)?;

    println!("{problem}: estimate {estimate:.6} (actual {:.6})", problem.reference_value());
    println!("Plotted {} points to {}", points.len(), args.output.display());
    Ok(())
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    let start = Instant::now();
    match cli.command {
        Command::Compare(args) => compare(args)?,
        Command::Trials(args) => trials(args)?,
        Command::Plot(args) => plot(args)?,
    }
    println!("Total time: {}ms", start.elapsed().as_millis());
    Ok(())
}
