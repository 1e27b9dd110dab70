//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves experiment defaults from the environment (`.env` supported)
//! - runs the solver comparison
//! - prints the summary and writes outputs
//! - tabulates metrics across experiments

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Command, CompareArgs, DemoArgs, ParseArgs, SolverArgs, SummaryArgs};
use crate::data::SyntheticConfig;
use crate::domain::{ComparisonReport, FitConfig, JacobiOptions};
use crate::error::AppError;
use crate::io::ExperimentPaths;

pub mod pipeline;

/// Defaults for flags that were not given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDefaults {
    pub experiment_id: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl EnvDefaults {
    /// Read `EXPERIMENT_ID`, `LFIT_INPUT_DIR` and `LFIT_OUTPUT_DIR` (after loading `.env`).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            experiment_id: get("EXPERIMENT_ID").unwrap_or_else(|| "default".to_string()),
            input_dir: get("LFIT_INPUT_DIR").map_or_else(|| PathBuf::from("input"), PathBuf::from),
            output_dir: get("LFIT_OUTPUT_DIR").map_or_else(|| PathBuf::from("output"), PathBuf::from),
        }
    }
}

/// Entry point for the `lfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Compare(args) => handle_compare(args, &EnvDefaults::from_env()),
        Command::Demo(args) => handle_demo(args),
        Command::Parse(args) => handle_parse(args),
        Command::Summary(args) => handle_summary(args, &EnvDefaults::from_env()),
    }
}

fn handle_compare(args: CompareArgs, env: &EnvDefaults) -> Result<(), AppError> {
    let experiment_id = args.experiment.unwrap_or_else(|| env.experiment_id.clone());
    let input_dir = args.input_dir.unwrap_or_else(|| env.input_dir.clone());
    let output_dir = args.output_dir.unwrap_or_else(|| env.output_dir.clone());

    let request = pipeline::ExperimentRequest {
        paths: ExperimentPaths::new(experiment_id, &input_dir, &output_dir),
        labels: args.labels,
        config: fit_config_from_args(&args.solver)?,
        debug_bundle: args.solver.debug_bundle,
    };
    let run = pipeline::run_experiment(&request)?;

    print_report(&run.comparison.report);
    for path in &run.written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let synthetic = SyntheticConfig {
        sample_count: args.sample_count,
        seed: args.seed,
        clusters: args.clusters,
        ..SyntheticConfig::default()
    };
    let config = fit_config_from_args(&args.solver)?;
    let paths = args
        .output_dir
        .map(|dir| ExperimentPaths::new("demo", &dir, &dir));

    let run = pipeline::run_demo(&synthetic, &config, paths.as_ref(), args.solver.debug_bundle)?;

    print_report(&run.comparison.report);
    for path in &run.written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn handle_parse(args: ParseArgs) -> Result<(), AppError> {
    let text = std::fs::read_to_string(&args.metrics)
        .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", args.metrics.display())))?;
    let results = crate::report::parse_metrics(&text)?;

    print_report(&ComparisonReport {
        results,
        validation: Default::default(),
    });
    Ok(())
}

fn handle_summary(args: SummaryArgs, env: &EnvDefaults) -> Result<(), AppError> {
    let output_dir = args.output_dir.unwrap_or_else(|| env.output_dir.clone());
    let all = crate::io::load_all_metrics(&output_dir)?;
    tracing::info!(experiments = all.len(), root = %output_dir.display(), "metrics loaded");

    println!("{}", crate::report::format_experiments(&all));
    Ok(())
}

fn print_report(report: &ComparisonReport) {
    println!("{}", crate::report::format_summary(report));
}

pub fn fit_config_from_args(args: &SolverArgs) -> Result<FitConfig, AppError> {
    if !(args.jacobi_damping > 0.0 && args.jacobi_damping <= 1.0) {
        return Err(AppError::new(
            2,
            format!("--jacobi-damping must be in (0, 1], got {}", args.jacobi_damping),
        ));
    }
    if !(args.rmse_tolerance.is_finite() && args.rmse_tolerance >= 0.0) {
        return Err(AppError::new(2, "--rmse-tolerance must be finite and >= 0."));
    }
    if !args.r2_threshold.is_finite() {
        return Err(AppError::new(2, "--r2-threshold must be finite."));
    }

    let defaults = FitConfig::default();
    Ok(FitConfig {
        jacobi: JacobiOptions {
            damping: args.jacobi_damping,
            ..defaults.jacobi
        },
        rmse_tolerance: args.rmse_tolerance,
        r2_threshold: args.r2_threshold,
        parallel: !args.sequential,
        ..defaults
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver_args() -> SolverArgs {
        SolverArgs {
            sequential: false,
            jacobi_damping: 0.8,
            r2_threshold: 0.7,
            rmse_tolerance: 0.001,
            debug_bundle: false,
        }
    }

    #[test]
    fn default_flags_give_default_config() {
        assert_eq!(fit_config_from_args(&solver_args()).unwrap(), FitConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let args = SolverArgs {
            sequential: true,
            jacobi_damping: 1.0,
            ..solver_args()
        };
        let config = fit_config_from_args(&args).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.jacobi.damping, 1.0);
        assert_eq!(config.jacobi.max_iter, 10_000);
    }

    #[test]
    fn rejects_out_of_range_damping() {
        let args = SolverArgs {
            jacobi_damping: 0.0,
            ..solver_args()
        };
        assert_eq!(fit_config_from_args(&args).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn env_defaults_fall_back() {
        let env = EnvDefaults::from_lookup(|key| match key {
            "EXPERIMENT_ID" => Some("exp42".to_string()),
            "LFIT_OUTPUT_DIR" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(env.experiment_id, "exp42");
        assert_eq!(env.input_dir, PathBuf::from("input"));
        assert_eq!(env.output_dir, PathBuf::from("output"));
    }
}
