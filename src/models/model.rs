//! Linear latency model.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a sample (for the normal equations)
//! - predict latency given theta and a design row (for residuals)
//!
//! Design row layout: `[size, cluster_density, cluster_id, 1.0]`.

use std::collections::HashMap;

use crate::domain::{DesignRow, PARAM_COUNT, Sample, Theta};

/// Share of samples carrying each label: `count(label) / n`, one entry per label.
///
/// Labels are treated as opaque categories; the result is aligned with `labels`.
pub fn cluster_densities(labels: &[i32]) -> Vec<f64> {
    if labels.is_empty() {
        return Vec::new();
    }
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for &label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let n = labels.len() as f64;
    labels.iter().map(|label| counts[label] as f64 / n).collect()
}

/// Design row for a labelled sample.
pub fn fill_design_row(sample: &Sample, cluster_density: f64) -> DesignRow {
    [sample.size, cluster_density, f64::from(sample.cluster_id), 1.0]
}

/// Predicted latency `Σ θ_j · row_j`.
pub fn predict(theta: &Theta, row: &DesignRow) -> f64 {
    (0..PARAM_COUNT).map(|j| theta[j] * row[j]).sum()
}
