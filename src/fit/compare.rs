//! Multi-method comparison.
//!
//! The system is built once (it depends only on the data) and handed read-only
//! to each solver. Per method we:
//!
//! 1. time the solve (wall clock)
//! 2. reject non-finite or oversized parameters
//! 3. evaluate the fit
//!
//! Any failure becomes that method's sentinel record; the other methods still run.
//! Only system-building failures (`DimensionMismatch`, `InsufficientData`)
//! propagate to the caller.

use std::time::Instant;

use nalgebra::DVector;
use rayon::prelude::*;

use crate::domain::{
    CheckRecord, CheckStatus, ComparisonReport, Design, FitConfig, MethodResult, NormalSystem, PARAM_COUNT,
    Sample, SolveMethod, Theta, ValidationReport,
};
use crate::error::FitError;
use crate::fit::evaluate::evaluate;
use crate::fit::system::{build_design, normal_system_from_design};
use crate::math::{dominance_margins, is_strictly_diagonally_dominant, solve_gauss, solve_gauss_seidel, solve_jacobi};

/// Comparison output together with the system it was computed from.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub system: NormalSystem,
    pub report: ComparisonReport,
}

/// Compare the three solvers on `samples` labelled with `cluster_labels`.
pub fn compare(samples: &[Sample], cluster_labels: &[i32], config: &FitConfig) -> Result<ComparisonReport, FitError> {
    compare_with_system(samples, cluster_labels, config).map(|c| c.report)
}

/// Like [`compare`], but also returns the regularized system (for diagnostics).
pub fn compare_with_system(
    samples: &[Sample],
    cluster_labels: &[i32],
    config: &FitConfig,
) -> Result<Comparison, FitError> {
    let design = build_design(samples, cluster_labels)?;
    let system = normal_system_from_design(&design);
    tracing::debug!(n = system.n_samples, lambda = system.lambda, "normal system built");

    let results: Vec<MethodResult> = if config.parallel {
        SolveMethod::ALL
            .par_iter()
            .map(|&method| run_method(method, &system, &design, config))
            .collect()
    } else {
        SolveMethod::ALL
            .iter()
            .map(|&method| run_method(method, &system, &design, config))
            .collect()
    };

    let validation = validate(&results, &system, config);
    Ok(Comparison {
        system,
        report: ComparisonReport { results, validation },
    })
}

struct Solved {
    theta: Theta,
    elapsed_seconds: f64,
    iterations: Option<usize>,
    converged: bool,
}

fn run_method(method: SolveMethod, system: &NormalSystem, design: &Design, config: &FitConfig) -> MethodResult {
    let total = design.len();
    match solve_and_evaluate(method, system, design, config) {
        Ok(result) => {
            tracing::info!(
                method = method.name(),
                rmse = result.rmse,
                r2 = result.r2,
                iterations = ?result.iterations,
                converged = result.converged,
                "method finished"
            );
            if !result.converged {
                tracing::warn!(method = method.name(), "iteration budget exhausted before tolerance");
            }
            result
        }
        Err(err) => {
            tracing::warn!(method = method.name(), kind = err.kind(), "method failed: {err}");
            MethodResult::failed(method, total, err.to_string())
        }
    }
}

fn solve_and_evaluate(
    method: SolveMethod,
    system: &NormalSystem,
    design: &Design,
    config: &FitConfig,
) -> Result<MethodResult, FitError> {
    let solved = solve(method, system, config)?;
    check_parameters(&solved.theta, config.param_limit)?;
    let eval = evaluate(&solved.theta, design)?;

    Ok(MethodResult {
        method,
        theta: solved.theta,
        elapsed_seconds: solved.elapsed_seconds,
        mae: eval.metrics.mae,
        rmse: eval.metrics.rmse,
        r2: eval.metrics.r2,
        valid_point_count: eval.metrics.valid,
        total_point_count: eval.metrics.total,
        iterations: solved.iterations,
        converged: solved.converged,
        error: None,
    })
}

fn solve(method: SolveMethod, system: &NormalSystem, config: &FitConfig) -> Result<Solved, FitError> {
    let start = Instant::now();
    let (x, iterations, converged) = match method {
        SolveMethod::Gauss => (solve_gauss(&system.ata, &system.atb)?, None, true),
        SolveMethod::Jacobi => {
            let sol = solve_jacobi(&system.ata, &system.atb, &config.jacobi)?;
            (sol.x, Some(sol.iterations), sol.converged)
        }
        SolveMethod::GaussSeidel => {
            let sol = solve_gauss_seidel(&system.ata, &system.atb, &config.gauss_seidel)?;
            (sol.x, Some(sol.iterations), sol.converged)
        }
    };
    let elapsed_seconds = start.elapsed().as_secs_f64();

    Ok(Solved {
        theta: to_theta(&x)?,
        elapsed_seconds,
        iterations,
        converged,
    })
}

fn to_theta(x: &DVector<f64>) -> Result<Theta, FitError> {
    if x.len() != PARAM_COUNT {
        return Err(FitError::dimension_mismatch(
            format!("{PARAM_COUNT} parameters"),
            format!("{}", x.len()),
        ));
    }
    let mut theta = [0.0; PARAM_COUNT];
    theta.copy_from_slice(x.as_slice());
    Ok(theta)
}

/// A solver that "succeeds" with divergent values is treated as failed.
pub fn check_parameters(theta: &Theta, limit: f64) -> Result<(), FitError> {
    let non_finite: Vec<f64> = theta.iter().copied().filter(|t| !t.is_finite()).collect();
    if !non_finite.is_empty() {
        return Err(FitError::NonFiniteParameters { values: non_finite });
    }
    let oversized: Vec<f64> = theta.iter().copied().filter(|t| t.abs() > limit).collect();
    if !oversized.is_empty() {
        return Err(FitError::ExcessiveParameterMagnitude {
            values: oversized,
            limit,
        });
    }
    Ok(())
}

/// Cross-method validation section.
///
/// - `diagonal_dominance`: the regularized system is strictly dominant
/// - `rmse_consistency`: first two successful methods agree on RMSE
/// - `r2_<method>`: per-method fit quality (failed methods always alert)
pub fn validate(results: &[MethodResult], system: &NormalSystem, config: &FitConfig) -> ValidationReport {
    let mut checks = Vec::new();

    let min_margin = dominance_margins(&system.ata)
        .into_iter()
        .fold(f64::INFINITY, f64::min);
    checks.push(CheckRecord {
        check: "diagonal_dominance".to_string(),
        status: CheckStatus::from_pass(is_strictly_diagonally_dominant(&system.ata)),
        details: format!("min margin {min_margin:.6e}, lambda {:.4}", system.lambda),
    });

    let ok: Vec<&MethodResult> = results.iter().filter(|r| r.is_ok()).collect();
    if let [first, second, ..] = ok.as_slice() {
        let diff = (first.rmse - second.rmse).abs();
        checks.push(CheckRecord {
            check: "rmse_consistency".to_string(),
            status: CheckStatus::from_pass(diff <= config.rmse_tolerance),
            details: format!(
                "{} vs {}: |dRMSE| = {diff:.6e} (tolerance {})",
                first.method, second.method, config.rmse_tolerance
            ),
        });
    }

    for r in results {
        let details = match &r.error {
            Some(err) => format!("R2={:.4} (failed: {err})", r.r2),
            None => format!("R2={:.4} (threshold {})", r.r2, config.r2_threshold),
        };
        checks.push(CheckRecord {
            check: format!("r2_{}", r.method),
            status: CheckStatus::from_pass(r.r2 >= config.r2_threshold),
            details,
        });
    }

    ValidationReport { checks }
}
