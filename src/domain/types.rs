//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - used in-memory during fitting
//! - written to the metrics text block / validation JSON
//! - rebuilt later by the metrics parser

use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Number of model parameters: `[w_size, w_cluster_feature, w_cluster_id, bias]`.
pub const PARAM_COUNT: usize = 4;

/// Minimum number of samples needed to determine `PARAM_COUNT` parameters.
pub const MIN_SAMPLES: usize = PARAM_COUNT;

/// Size bounds in KB (0.1KB .. 100MB).
pub const SIZE_MIN: f64 = 0.1;
pub const SIZE_MAX: f64 = 100_000.0;

/// Latency bounds in seconds (1ms .. 5min).
pub const LATENCY_MIN: f64 = 0.001;
pub const LATENCY_MAX: f64 = 300.0;

/// One design row: `[size, cluster_density_feature, cluster_id, 1.0]`.
pub type DesignRow = [f64; PARAM_COUNT];

/// Solved model parameters.
pub type Theta = [f64; PARAM_COUNT];

/// A single preprocessed request observation.
///
/// Construction clamps to physical bounds and replaces non-finite inputs with the
/// floor values, so a `Sample` is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// File size in KB.
    pub size: f64,
    /// Request latency in seconds.
    pub latency: f64,
    /// Label assigned by the external clustering step (0 until labelled).
    pub cluster_id: i32,
}

impl Sample {
    pub fn new(size: f64, latency: f64, cluster_id: i32) -> Self {
        Self {
            size: clamp_or_floor(size, SIZE_MIN, SIZE_MAX),
            latency: clamp_or_floor(latency, LATENCY_MIN, LATENCY_MAX),
            cluster_id,
        }
    }

    /// Same observation with a different cluster label.
    pub fn with_cluster(self, cluster_id: i32) -> Self {
        Self { cluster_id, ..self }
    }
}

fn clamp_or_floor(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() { value.clamp(min, max) } else { min }
}

/// Design rows plus the target vector they are fitted against.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    pub rows: Vec<DesignRow>,
    pub targets: Vec<f64>,
}

impl Design {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Regularized normal equations `ATA · θ = ATB`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalSystem {
    pub ata: DMatrix<f64>,
    pub atb: DVector<f64>,
    pub n_samples: usize,
    /// Ridge term added to every diagonal entry (`0.1 × n`).
    pub lambda: f64,
}

/// The three solver variants, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    Gauss,
    Jacobi,
    GaussSeidel,
}

impl SolveMethod {
    pub const ALL: [SolveMethod; 3] = [SolveMethod::Gauss, SolveMethod::Jacobi, SolveMethod::GaussSeidel];

    /// Identifier used in the text block and the validation document.
    pub fn name(self) -> &'static str {
        match self {
            SolveMethod::Gauss => "gauss",
            SolveMethod::Jacobi => "jacobi",
            SolveMethod::GaussSeidel => "gauss_seidel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        SolveMethod::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn is_iterative(self) -> bool {
        !matches!(self, SolveMethod::Gauss)
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one method in one comparison run.
///
/// A failed method carries sentinels (`theta = 0`, metrics and elapsed `-1`) plus
/// the error string, so consumers can detect failure without reading `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResult {
    pub method: SolveMethod,
    pub theta: Theta,
    pub elapsed_seconds: f64,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub valid_point_count: usize,
    pub total_point_count: usize,
    /// Sweeps used by an iterative solver (`None` for Gauss and failures).
    pub iterations: Option<usize>,
    /// Whether the solver met its tolerance (always true for a Gauss success).
    pub converged: bool,
    pub error: Option<String>,
}

impl MethodResult {
    pub const SENTINEL: f64 = -1.0;

    /// Sentinel failure record.
    pub fn failed(method: SolveMethod, total_point_count: usize, error: impl Into<String>) -> Self {
        Self {
            method,
            theta: [0.0; PARAM_COUNT],
            elapsed_seconds: Self::SENTINEL,
            mae: Self::SENTINEL,
            rmse: Self::SENTINEL,
            r2: Self::SENTINEL,
            valid_point_count: 0,
            total_point_count,
            iterations: None,
            converged: false,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Status of one validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ALERTA")]
    Alert,
}

impl CheckStatus {
    pub fn from_pass(pass: bool) -> Self {
        if pass { CheckStatus::Ok } else { CheckStatus::Alert }
    }

    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Alert => "ALERTA",
        }
    }
}

/// One validation record, serialized as `{check, status, detalhes}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub check: String,
    pub status: CheckStatus,
    #[serde(rename = "detalhes")]
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckRecord>,
}

impl ValidationReport {
    pub fn alerts(&self) -> impl Iterator<Item = &CheckRecord> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Alert)
    }

    pub fn find(&self, check: &str) -> Option<&CheckRecord> {
        self.checks.iter().find(|c| c.check == check)
    }
}

/// Result of comparing the three methods on one dataset.
///
/// `results` always holds one entry per [`SolveMethod::ALL`], in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub results: Vec<MethodResult>,
    pub validation: ValidationReport,
}

impl ComparisonReport {
    pub fn get(&self, method: SolveMethod) -> Option<&MethodResult> {
        self.results.iter().find(|r| r.method == method)
    }

    pub fn successes(&self) -> impl Iterator<Item = &MethodResult> {
        self.results.iter().filter(|r| r.is_ok())
    }
}

/// Jacobi iteration settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobiOptions {
    pub max_iter: usize,
    pub tol: f64,
    /// Weight of the fresh Jacobi iterate (`1.0` = undamped).
    pub damping: f64,
}

impl Default for JacobiOptions {
    fn default() -> Self {
        Self {
            max_iter: 10_000,
            tol: 1e-10,
            damping: 0.8,
        }
    }
}

/// Gauss-Seidel iteration settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussSeidelOptions {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for GaussSeidelOptions {
    fn default() -> Self {
        Self {
            max_iter: 5_000,
            tol: 1e-12,
        }
    }
}

/// Comparison settings: solver options plus validation thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    pub jacobi: JacobiOptions,
    pub gauss_seidel: GaussSeidelOptions,
    /// Largest accepted `|θ_i|`.
    pub param_limit: f64,
    /// Max RMSE difference between the first two successful methods.
    pub rmse_tolerance: f64,
    /// Minimum R² for a method to be reported `OK`.
    pub r2_threshold: f64,
    /// Run the three methods on the rayon pool.
    pub parallel: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            jacobi: JacobiOptions::default(),
            gauss_seidel: GaussSeidelOptions::default(),
            param_limit: 1e6,
            rmse_tolerance: 1e-3,
            r2_threshold: 0.7,
            parallel: true,
        }
    }
}
