//! Fit quality evaluation.
//!
//! Runs the model implied by a solved theta against the design rows and reports
//! MAE / RMSE / R². Non-finite predictions are dropped from the aggregates (and
//! counted) so one numerically broken row cannot poison the metrics.

use serde::{Deserialize, Serialize};

use crate::domain::{Design, Theta};
use crate::error::FitError;
use crate::models::predict;

/// Error metrics over the finite predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub valid: usize,
    pub total: usize,
}

impl FitMetrics {
    pub fn invalid(&self) -> usize {
        self.total - self.valid
    }
}

/// Predictions (one per design row, possibly non-finite) plus the metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub predictions: Vec<f64>,
    pub metrics: FitMetrics,
}

pub fn evaluate(theta: &Theta, design: &Design) -> Result<Evaluation, FitError> {
    let total = design.len();
    let predictions: Vec<f64> = design.rows.iter().map(|row| predict(theta, row)).collect();

    let pairs: Vec<(f64, f64)> = design
        .targets
        .iter()
        .zip(&predictions)
        .filter(|(_, p)| p.is_finite())
        .map(|(&y, &p)| (y, p))
        .collect();
    let valid = pairs.len();

    // Floor division: 2 of 5 valid still passes. Kept so thresholds match
    // metrics files produced by earlier runs.
    if valid == 0 || valid < total / 2 {
        return Err(FitError::TooManyInvalidPredictions { valid, total });
    }
    if valid < total {
        tracing::warn!(invalid = total - valid, total, "dropped non-finite predictions");
    }

    let n = valid as f64;
    let mut abs_sum = 0.0;
    let mut ss_res = 0.0;
    for &(y, p) in &pairs {
        let r = y - p;
        abs_sum += r.abs();
        ss_res += r * r;
    }
    let mae = abs_sum / n;
    let rmse = (ss_res / n).sqrt();

    let first = pairs[0].0;
    let all_identical = pairs.iter().all(|&(y, _)| y == first);
    let mean = pairs.iter().map(|&(y, _)| y).sum::<f64>() / n;
    let ss_tot: f64 = pairs.iter().map(|&(y, _)| (y - mean) * (y - mean)).sum();
    let r2 = if all_identical || ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(Evaluation {
        predictions,
        metrics: FitMetrics {
            mae,
            rmse,
            r2,
            valid,
            total,
        },
    })
}
