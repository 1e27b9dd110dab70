//! Dense linear solvers for small systems `A·x = b`.
//!
//! Three interchangeable algorithms:
//!
//! - [`solve_gauss`]: elimination with partial pivoting + back substitution.
//! - [`solve_jacobi`]: diagonally preconditioned, damped Jacobi iteration.
//! - [`solve_gauss_seidel`]: in-place sequential relaxation.
//!
//! The iterative solvers rely on the caller for convergence guarantees (strict
//! diagonal dominance is established by the system builder). Running out of
//! iterations is not an error: the last iterate is returned with
//! `converged = false`.

use nalgebra::{DMatrix, DVector};

use crate::domain::{GaussSeidelOptions, JacobiOptions};
use crate::error::FitError;

/// Pivots below this magnitude are treated as singular.
pub const PIVOT_EPS: f64 = 1e-10;

/// Stand-in for an exactly-zero diagonal during Jacobi preconditioning.
pub const JACOBI_ZERO_DIAGONAL: f64 = 1e-10;

/// Diagonal entries below this magnitude make Gauss-Seidel fail.
pub const GAUSS_SEIDEL_DIAGONAL_EPS: f64 = 1e-12;

/// Result of an iterative solve.
#[derive(Debug, Clone, PartialEq)]
pub struct IterativeSolution {
    pub x: DVector<f64>,
    /// Sweeps performed (including the one that met the tolerance).
    pub iterations: usize,
    pub converged: bool,
}

fn check_dimensions(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<usize, FitError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(FitError::dimension_mismatch(
            "square matrix",
            format!("{}x{}", a.nrows(), a.ncols()),
        ));
    }
    if b.len() != n {
        return Err(FitError::dimension_mismatch(
            format!("vector of length {n}"),
            format!("length {}", b.len()),
        ));
    }
    Ok(n)
}

/// Gaussian elimination with partial pivoting.
#[allow(clippy::needless_range_loop)]
pub fn solve_gauss(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, FitError> {
    let n = check_dimensions(a, b)?;

    // Augmented matrix [A | b].
    let mut m = a.clone().insert_column(n, 0.0);
    m.set_column(n, b);

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = m[(i, i)].abs();
        for row in (i + 1)..n {
            if m[(row, i)].abs() > max_val {
                max_val = m[(row, i)].abs();
                max_row = row;
            }
        }
        if max_row != i {
            m.swap_rows(i, max_row);
        }

        let pivot = m[(i, i)];
        if pivot.abs() < PIVOT_EPS {
            return Err(FitError::SingularMatrix { column: i, pivot });
        }

        for row in (i + 1)..n {
            let factor = m[(row, i)] / pivot;
            for k in i..=n {
                m[(row, k)] -= factor * m[(i, k)];
            }
        }
    }

    let mut x = DVector::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = m[(i, n)];
        for j in (i + 1)..n {
            sum -= m[(i, j)] * x[j];
        }
        x[i] = sum / m[(i, i)];
    }

    Ok(x)
}

/// Damped Jacobi iteration on the diagonally preconditioned system.
///
/// Each sweep computes the classic Jacobi update from the previous iterate and
/// blends it: `x_new = damping·x_jacobi + (1 - damping)·x_old`. Starts from zero.
#[allow(clippy::needless_range_loop)]
pub fn solve_jacobi(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    opts: &JacobiOptions,
) -> Result<IterativeSolution, FitError> {
    let n = check_dimensions(a, b)?;

    let mut scaled_a = a.clone();
    let mut scaled_b = b.clone();
    for i in 0..n {
        let d = if a[(i, i)] != 0.0 { a[(i, i)] } else { JACOBI_ZERO_DIAGONAL };
        scaled_a.row_mut(i).unscale_mut(d);
        scaled_b[i] /= d;
    }

    let damping = opts.damping;
    let mut x = DVector::<f64>::zeros(n);
    let mut x_new = DVector::<f64>::zeros(n);

    for iter in 0..opts.max_iter {
        let mut max_diff = 0.0_f64;
        for i in 0..n {
            let mut sigma = 0.0;
            for j in 0..n {
                if j != i {
                    sigma += scaled_a[(i, j)] * x[j];
                }
            }
            let jacobi = scaled_b[i] - sigma;
            let value = damping * jacobi + (1.0 - damping) * x[i];
            max_diff = max_diff.max((value - x[i]).abs());
            x_new[i] = value;
        }
        std::mem::swap(&mut x, &mut x_new);

        if max_diff < opts.tol {
            return Ok(IterativeSolution {
                x,
                iterations: iter + 1,
                converged: true,
            });
        }
    }

    Ok(IterativeSolution {
        x,
        iterations: opts.max_iter,
        converged: false,
    })
}

/// Gauss-Seidel relaxation, updating components in place. Starts from all-ones.
#[allow(clippy::needless_range_loop)]
pub fn solve_gauss_seidel(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    opts: &GaussSeidelOptions,
) -> Result<IterativeSolution, FitError> {
    let n = check_dimensions(a, b)?;

    if let Some(index) = (0..n).find(|&i| a[(i, i)].abs() < GAUSS_SEIDEL_DIAGONAL_EPS) {
        return Err(FitError::ZeroDiagonal {
            index,
            value: a[(index, index)],
        });
    }

    let mut x = DVector::<f64>::from_element(n, 1.0);

    for iter in 0..opts.max_iter {
        let mut max_diff = 0.0_f64;
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                if j != i {
                    sum += a[(i, j)] * x[j];
                }
            }
            let value = (b[i] - sum) / a[(i, i)];
            max_diff = max_diff.max((value - x[i]).abs());
            x[i] = value;
        }

        if max_diff < opts.tol {
            return Ok(IterativeSolution {
                x,
                iterations: iter + 1,
                converged: true,
            });
        }
    }

    Ok(IterativeSolution {
        x,
        iterations: opts.max_iter,
        converged: false,
    })
}
