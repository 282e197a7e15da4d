//! Bindeval CLI - bootstrap evaluation of model predictions.
//!
//! # Usage
//!
//! ```bash
//! # Score one prediction table (columns: key,pred,pk)
//! bindeval metrics results.csv
//! bindeval metrics results.csv -g FEP_benchmark.csv --n-iterations 1000
//! bindeval metrics results.csv --json --ci
//!
//! # Score several models and their averaged ensemble
//! bindeval ensemble model1.csv model2.csv model3.csv -g FEP_benchmark.csv
//!
//! # Show help
//! bindeval --help
//! ```

mod config;
mod evaluate;
mod output;

use anyhow::{Context, Result};
use bindeval_core::config::{
    DEFAULT_CONFIDENCE, DEFAULT_N_ITERATIONS, DEFAULT_N_MIN, DEFAULT_SEED, DEFAULT_WORKERS,
};
use bindeval_core::EngineConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Bootstrap evaluation of predicted vs. measured values.
///
/// Reports RMSE, Pearson, Kendall, Spearman and C-index, each with a
/// bootstrap estimate of its uncertainty. With a group lookup, resampling
/// is stratified by group.
#[derive(Parser)]
#[command(name = "bindeval", version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a single prediction table
    Metrics(MetricsArgs),
    /// Evaluate several models and the ensemble of their averaged predictions
    Ensemble(EnsembleArgs),
}

/// Bootstrap tuning shared by all subcommands.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// CSV mapping system_id to group_id; enables stratified resampling
    #[arg(short = 'g', long)]
    group_lookup: Option<PathBuf>,

    /// Number of bootstrap rounds
    #[arg(long, default_value_t = DEFAULT_N_ITERATIONS)]
    n_iterations: usize,

    /// Minimum group size for stratified resampling
    #[arg(long, default_value_t = DEFAULT_N_MIN)]
    n_min: usize,

    /// Seed for the bootstrap random source
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Worker threads for bootstrap rounds
    #[arg(long, env = "BINDEVAL_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,
}

impl TuningArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            n_iterations: self.n_iterations,
            n_min: self.n_min,
            seed: self.seed,
            workers: self.workers,
        }
    }
}

#[derive(Args)]
struct MetricsArgs {
    /// Prediction table with key, pred and pk columns
    csv_file: PathBuf,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Also report a bootstrap percentile interval
    #[arg(long)]
    ci: bool,
}

#[derive(Args)]
struct EnsembleArgs {
    /// Prediction tables, one per model, listing the same keys in the same order
    #[arg(required = true)]
    csv_files: Vec<PathBuf>,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Output ensemble CSV (default: ensemble.csv next to the first table)
    #[arg(short = 'e', long)]
    ensemble_file: Option<PathBuf>,

    /// Output metrics log (default: metrics_[un]weighted.log next to the first table)
    #[arg(short = 'o', long)]
    output_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Metrics(args) => run_metrics(args),
        Command::Ensemble(args) => run_ensemble(args),
    }
}

fn run_metrics(args: MetricsArgs) -> Result<()> {
    let engine_config = args.tuning.engine_config();
    let lookup = evaluate::load_lookup(args.tuning.group_lookup.as_deref())?;

    eprintln!(
        "Calculating metrics and performing bootstrapping with {} iterations",
        engine_config.n_iterations
    );
    let report = evaluate::evaluate_file(&args.csv_file, lookup.as_ref(), engine_config)?;

    let confidence = args.ci.then_some(DEFAULT_CONFIDENCE);
    let output = if args.json {
        output::format_json(&report, confidence)?
    } else {
        format!(
            "\nOverall metrics:\n{}",
            output::format_human(&report, confidence)
        )
    };
    println!("{}", output);

    Ok(())
}

fn run_ensemble(args: EnsembleArgs) -> Result<()> {
    let engine_config = args.tuning.engine_config();
    let group_lookup = args.tuning.group_lookup.as_deref();
    let lookup = evaluate::load_lookup(group_lookup)?;
    let weighted = lookup.is_some();

    let ensemble_path = args
        .ensemble_file
        .unwrap_or_else(|| config::default_ensemble_path(&args.csv_files));
    let log_path = args
        .output_file
        .unwrap_or_else(|| config::default_log_path(&args.csv_files, weighted));

    let outcome = evaluate::evaluate_ensemble(&args.csv_files, lookup.as_ref(), engine_config)?;

    outcome
        .ensemble_table
        .write_csv(&ensemble_path)
        .with_context(|| format!("Failed to write ensemble CSV: {}", ensemble_path.display()))?;
    info!(path = %ensemble_path.display(), "Wrote ensemble predictions");

    let header = output::LogHeader {
        command: std::env::args().collect::<Vec<_>>().join(" "),
        weighted,
        group_lookup: group_lookup.map(|p| p.display().to_string()),
        source_dir: config::output_dir(&args.csv_files).display().to_string(),
    };
    let log = output::format_log(&header, &outcome, &ensemble_path);
    std::fs::write(&log_path, log)
        .with_context(|| format!("Failed to write metrics log: {}", log_path.display()))?;

    println!("Results written to {}", log_path.display());
    Ok(())
}
