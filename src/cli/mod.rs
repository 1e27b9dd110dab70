//! Command-line parsing for the latency-fit comparator.
//!
//! Argument parsing and command dispatch stay separate from the solver code.
//! Directory and experiment flags fall back to environment values (see
//! [`crate::app::EnvDefaults`]) when omitted.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "lfit",
    version,
    about = "Regularized least-squares latency fit: Gauss vs Jacobi vs Gauss-Seidel"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit an experiment's request log with every solver and write metrics + validation.
    Compare(CompareArgs),
    /// Run the comparison on synthetic samples.
    Demo(DemoArgs),
    /// Parse a metrics text file and print the summary table.
    Parse(ParseArgs),
    /// Tabulate the metrics of every experiment under the output directory.
    Summary(SummaryArgs),
}

/// Solver and validation knobs shared by `compare` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct SolverArgs {
    /// Run the methods one after another instead of on the thread pool.
    #[arg(long)]
    pub sequential: bool,

    /// Weight of the fresh Jacobi iterate (1.0 = undamped).
    #[arg(long, default_value_t = 0.8)]
    pub jacobi_damping: f64,

    /// Minimum R² for a method to pass validation.
    #[arg(long, default_value_t = 0.7)]
    pub r2_threshold: f64,

    /// Max RMSE difference between the first two successful methods.
    #[arg(long, default_value_t = 0.001)]
    pub rmse_tolerance: f64,

    /// Write a Markdown diagnostics bundle next to the outputs.
    #[arg(long)]
    pub debug_bundle: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Experiment id (defaults to $EXPERIMENT_ID, then "default").
    #[arg(short = 'e', long)]
    pub experiment: Option<String>,

    /// Root of per-experiment input directories (defaults to $LFIT_INPUT_DIR, then "input").
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Root of per-experiment output directories (defaults to $LFIT_OUTPUT_DIR, then "output").
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Cluster label file; `<input>/<id>/cluster_labels.json` is used when it exists.
    #[arg(long, value_name = "JSON")]
    pub labels: Option<PathBuf>,

    #[command(flatten)]
    pub solver: SolverArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of synthetic samples.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub sample_count: usize,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic clusters.
    #[arg(long, default_value_t = 3)]
    pub clusters: usize,

    /// Write outputs under `<DIR>/demo` instead of printing only.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub solver: SolverArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ParseArgs {
    /// Metrics text produced by `lfit compare`.
    #[arg(value_name = "METRICS")]
    pub metrics: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    /// Root of per-experiment output directories (defaults to $LFIT_OUTPUT_DIR, then "output").
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}
