//! Normal-equations system builder.
//!
//! Given labelled samples we build the design matrix `X` (one row per sample),
//! accumulate `ATA = XᵀX` and `ATB = Xᵀy` with `y` = latency, then regularize:
//!
//! - add `λ = 0.1 × n` to every diagonal entry
//! - boost any diagonal entry that does not exceed its off-diagonal row sum by
//!   `1.1 ×` that sum
//!
//! After regularization the matrix is strictly diagonally dominant, which is what
//! the iterative solvers rely on to converge.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Design, MIN_SAMPLES, NormalSystem, PARAM_COUNT, Sample};
use crate::error::FitError;
use crate::math::off_diagonal_abs_sum;
use crate::models::{cluster_densities, fill_design_row};

/// Ridge term per sample.
pub const REGULARIZATION_PER_SAMPLE: f64 = 0.1;

/// Multiplier applied to the off-diagonal row sum when boosting a diagonal.
pub const DOMINANCE_BOOST: f64 = 1.1;

/// Attach external cluster labels to samples.
pub fn label_samples(samples: &[Sample], labels: &[i32]) -> Result<Vec<Sample>, FitError> {
    if samples.len() != labels.len() {
        return Err(FitError::dimension_mismatch(
            format!("{} cluster labels", samples.len()),
            format!("{} labels", labels.len()),
        ));
    }
    Ok(samples
        .iter()
        .zip(labels)
        .map(|(s, &label)| s.with_cluster(label))
        .collect())
}

/// Design rows and latency targets, one row per sample in input order.
pub fn build_design(samples: &[Sample], labels: &[i32]) -> Result<Design, FitError> {
    let labelled = label_samples(samples, labels)?;
    if labelled.len() < MIN_SAMPLES {
        return Err(FitError::InsufficientData {
            required: MIN_SAMPLES,
            actual: labelled.len(),
        });
    }

    let densities = cluster_densities(labels);
    let rows = labelled
        .iter()
        .zip(&densities)
        .map(|(s, &density)| fill_design_row(s, density))
        .collect();
    let targets = labelled.iter().map(|s| s.latency).collect();

    Ok(Design { rows, targets })
}

/// Build the regularized normal system for samples + labels.
pub fn build_normal_system(samples: &[Sample], labels: &[i32]) -> Result<NormalSystem, FitError> {
    let design = build_design(samples, labels)?;
    Ok(normal_system_from_design(&design))
}

/// Accumulate and regularize the normal equations of an existing design.
pub fn normal_system_from_design(design: &Design) -> NormalSystem {
    let n = design.len();
    let x = DMatrix::from_fn(n, PARAM_COUNT, |i, j| design.rows[i][j]);
    let y = DVector::from_column_slice(&design.targets);

    let xt = x.transpose();
    let mut ata = &xt * &x;
    let atb = &xt * &y;

    let lambda = regularize(&mut ata, n);

    NormalSystem {
        ata,
        atb,
        n_samples: n,
        lambda,
    }
}

/// Apply the ridge term and the diagonal-dominance boost in place.
///
/// Returns the ridge term `λ` that was added.
pub fn regularize(ata: &mut DMatrix<f64>, n_samples: usize) -> f64 {
    let lambda = REGULARIZATION_PER_SAMPLE * n_samples as f64;
    let dim = ata.nrows().min(ata.ncols());
    for i in 0..dim {
        ata[(i, i)] += lambda;
        let row_sum = off_diagonal_abs_sum(ata, i);
        // `<=` so that an exact tie is also boosted into strict dominance.
        if ata[(i, i)] <= row_sum {
            ata[(i, i)] += row_sum * DOMINANCE_BOOST;
        }
    }
    lambda
}
