//! Sweep binary.
//!
//! Usage:
//!   banditsim [OPTIONS]
//!
//! Examples:
//!   # Reference sweep, 100 iterations per pair, into ./results
//!   banditsim
//!
//!   # Custom sweep from JSON, fewer iterations, 4 worker threads
//!   banditsim --config sweep.json --iterations 20 --threads 4
//!
//!   # Start a config file from the defaults
//!   banditsim --print-default-config > sweep.json
//!
//! Re-running skips every artifact that already exists, so a sweep stopped
//! with Ctrl-C resumes where it left off.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use banditsim::{Sweep, SweepConfig};

#[derive(Parser)]
#[command(name = "banditsim")]
#[command(about = "Monte Carlo evaluation of UCB-family bandit policies")]
#[command(version)]
struct Args {
    /// Sweep configuration (JSON); defaults to the reference sweep
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Directory for artifacts
    #[arg(short = 'o', long, default_value = "./results")]
    out_dir: PathBuf,

    /// Override iterations per (algorithm, arm configuration) pair
    #[arg(short = 'n', long)]
    iterations: Option<u32>,

    /// Override the run seed
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (default: one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Print the default configuration as JSON and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse()?),
        )
        .init();

    if args.print_default_config {
        println!("{}", serde_json::to_string_pretty(&SweepConfig::default())?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => SweepConfig::from_json_file(path)?,
        None => SweepConfig::default(),
    };
    if let Some(n) = args.iterations {
        config.iterations = n;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    tracing::info!(
        algorithms = config.algorithms.len(),
        combinations = config.combinations().len(),
        iterations = config.iterations,
        out_dir = %args.out_dir.display(),
        "starting sweep"
    );

    let summary = Sweep::new(config, &args.out_dir)?.run()?;
    tracing::info!(
        written = summary.written,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        groups = summary.groups_written,
        "sweep finished"
    );
    if !summary.failed.is_empty() {
        for (label, arms, err) in &summary.failed {
            tracing::error!(algorithm = %label, arms = %arms, "{err}");
        }
        anyhow::bail!("{} combination(s) failed", summary.failed.len());
    }
    Ok(())
}
