//! Error types.
//!
//! Two layers:
//!
//! - [`FitError`]: the numerical failure kinds produced by the solvers, the system
//!   builder and the evaluator. The comparator turns most of them into per-method
//!   failure records instead of aborting.
//! - [`AppError`]: what the binary reports. Carries a process exit code:
//!   `2` input/config/I/O, `3` insufficient data, `4` numerical/internal.

use std::fmt;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failure kinds of the fitting core.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// Pivot magnitude fell below the elimination threshold.
    SingularMatrix { column: usize, pivot: f64 },
    /// Gauss-Seidel needs every `|a_ii|` above its threshold.
    ZeroDiagonal { index: usize, value: f64 },
    /// Fewer samples than parameters to determine.
    InsufficientData { required: usize, actual: usize },
    /// Matrix/vector (or samples/labels) sizes do not line up.
    DimensionMismatch { expected: String, actual: String },
    /// The solver returned NaN or infinite parameters.
    NonFiniteParameters { values: Vec<f64> },
    /// The solver returned parameters beyond the accepted magnitude.
    ExcessiveParameterMagnitude { values: Vec<f64>, limit: f64 },
    /// Fewer than half of the predictions were finite.
    TooManyInvalidPredictions { valid: usize, total: usize },
}

impl FitError {
    pub fn dimension_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        FitError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Stable snake_case identifier, handy for logs and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            FitError::SingularMatrix { .. } => "singular_matrix",
            FitError::ZeroDiagonal { .. } => "zero_diagonal",
            FitError::InsufficientData { .. } => "insufficient_data",
            FitError::DimensionMismatch { .. } => "dimension_mismatch",
            FitError::NonFiniteParameters { .. } => "non_finite_parameters",
            FitError::ExcessiveParameterMagnitude { .. } => "excessive_parameter_magnitude",
            FitError::TooManyInvalidPredictions { .. } => "too_many_invalid_predictions",
        }
    }
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::SingularMatrix { column, pivot } => {
                write!(f, "singular matrix: pivot {pivot:e} in column {column}")
            }
            FitError::ZeroDiagonal { index, value } => {
                write!(f, "zero diagonal element A[{index}][{index}] = {value:e}")
            }
            FitError::InsufficientData { required, actual } => {
                write!(f, "insufficient data: need at least {required} samples, got {actual}")
            }
            FitError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
            FitError::NonFiniteParameters { values } => {
                write!(f, "non-finite parameters: {values:?}")
            }
            FitError::ExcessiveParameterMagnitude { values, limit } => {
                write!(f, "parameters exceed magnitude {limit:e}: {values:?}")
            }
            FitError::TooManyInvalidPredictions { valid, total } => {
                write!(f, "too many invalid predictions: {valid}/{total} valid")
            }
        }
    }
}

impl std::error::Error for FitError {}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::InsufficientData { .. } => 3,
            FitError::DimensionMismatch { .. } => 2,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}
