//! Diagonal dominance helpers.
//!
//! Row `i` is strictly dominant when `|a_ii| > Σ_{j≠i} |a_ij|`. A strictly
//! diagonally dominant matrix guarantees convergence of Jacobi and Gauss-Seidel.

use nalgebra::DMatrix;

/// `Σ_{j≠i} |a_ij|` for row `i`.
pub fn off_diagonal_abs_sum(a: &DMatrix<f64>, i: usize) -> f64 {
    a.row(i)
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(_, v)| v.abs())
        .sum()
}

/// Per-row margin `|a_ii| - Σ_{j≠i} |a_ij|` (positive means strictly dominant).
pub fn dominance_margins(a: &DMatrix<f64>) -> Vec<f64> {
    let n = a.nrows().min(a.ncols());
    (0..n).map(|i| a[(i, i)].abs() - off_diagonal_abs_sum(a, i)).collect()
}

/// `true` if the matrix is square and every row is strictly dominant.
pub fn is_strictly_diagonally_dominant(a: &DMatrix<f64>) -> bool {
    a.is_square() && dominance_margins(a).iter().all(|&m| m > 0.0)
}
