//! Reporting utilities: the per-method metrics text and a terminal summary.

pub mod format;

pub use format::*;

use std::collections::BTreeMap;

use crate::domain::{ComparisonReport, MethodResult};

/// Human-oriented summary for the terminal (not meant to be parsed).
pub fn format_summary(report: &ComparisonReport) -> String {
    let mut out = String::new();

    out.push_str("=== lfit - least-squares method comparison ===\n");
    out.push_str(&format!(
        "{:<14} {:>10} {:>10} {:>8} {:>9} {:>10}\n",
        "method", "MAE", "RMSE", "R2", "points", "time(s)"
    ));
    for r in &report.results {
        if let Some(err) = &r.error {
            out.push_str(&format!("{:<14} FAILED: {err}\n", r.method.name()));
            continue;
        }
        out.push_str(&format!(
            "{:<14} {:>10.4} {:>10.4} {:>8.4} {:>9} {:>10.6}\n",
            r.method.name(),
            r.mae,
            r.rmse,
            r.r2,
            format!("{}/{}", r.valid_point_count, r.total_point_count),
            r.elapsed_seconds,
        ));
    }

    out.push_str("\nValidation:\n");
    for c in &report.validation.checks {
        out.push_str(&format!("  [{:<6}] {:<20} {}\n", c.status.label(), c.check, c.details));
    }

    out
}

/// One table across experiments (rows grouped by experiment id).
pub fn format_experiments(all: &BTreeMap<String, Vec<MethodResult>>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<20} {:<14} {:>10} {:>10} {:>8} {:>9}\n",
        "experiment", "method", "MAE", "RMSE", "R2", "points"
    ));
    for (experiment, results) in all {
        for r in results {
            if r.is_ok() {
                out.push_str(&format!(
                    "{:<20} {:<14} {:>10.4} {:>10.4} {:>8.4} {:>9}\n",
                    experiment,
                    r.method.name(),
                    r.mae,
                    r.rmse,
                    r.r2,
                    format!("{}/{}", r.valid_point_count, r.total_point_count),
                ));
            } else {
                out.push_str(&format!("{:<20} {:<14} FAILED\n", experiment, r.method.name()));
            }
        }
    }
    if all.is_empty() {
        out.push_str("(no experiments with metrics)\n");
    }

    out
}
