//! Ordinary least squares with classical standard errors.
//!
//! For a design matrix X (n × k, intercept column included) and response y:
//!
//! - β = (XᵀX)⁻¹ Xᵀ y
//! - e = y − Xβ
//! - σ² = eᵀe / (n − k)
//! - se(β) = √(σ² · diag((XᵀX)⁻¹))
//! - t = β / se(β)
//!
//! With n = k the fit is exact and the t-values are non-finite.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use thiserror::Error;

/// Errors from fitting a regression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegressionError {
    /// Fewer observations than parameters.
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Parameters to estimate (factors + intercept)
        required: usize,
        /// Observations available after alignment
        actual: usize,
    },

    /// A requested factor column is absent.
    #[error("Missing factor column: {0}")]
    MissingFactor(String),

    /// XᵀX could not be inverted.
    #[error("Design matrix is singular")]
    SingularMatrix,

    /// Design matrix and response disagree on the number of rows.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Rows in the design matrix
        expected: usize,
        /// Length of the response
        actual: usize,
    },
}

/// Pivots smaller than this (relative to the largest diagonal) are treated as zero.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Result of an OLS fit.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// Estimated coefficients, in design-matrix column order
    pub coefficients: Array1<f64>,
    /// Standard errors of the coefficients
    pub standard_errors: Array1<f64>,
    /// t-statistics of the coefficients
    pub t_values: Array1<f64>,
    /// Residual variance σ²
    pub residual_variance: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Number of observations
    pub observations: usize,
}

/// Prepend a column of ones to `x`.
pub fn add_constant(x: ArrayView2<'_, f64>) -> Array2<f64> {
    let (n, k) = x.dim();
    let mut design = Array2::<f64>::ones((n, k + 1));
    for (j, column) in x.columns().into_iter().enumerate() {
        design.column_mut(j + 1).assign(&column);
    }
    design
}

/// Fit y on the columns of `design` (which should already contain an intercept).
///
/// # Errors
///
/// [`RegressionError::InsufficientData`] when there are fewer rows than columns,
/// [`RegressionError::SingularMatrix`] when XᵀX is not invertible.
pub fn ols(y: ArrayView1<'_, f64>, design: ArrayView2<'_, f64>) -> Result<OlsFit, RegressionError> {
    let (n, k) = design.dim();
    if y.len() != n {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: y.len(),
        });
    }
    if n < k {
        return Err(RegressionError::InsufficientData {
            required: k,
            actual: n,
        });
    }

    let xtx = design.t().dot(&design);
    let xtx_inv = invert(&xtx)?;
    let coefficients = xtx_inv.dot(&design.t().dot(&y));

    let fitted = design.dot(&coefficients);
    let residuals = &y - &fitted;
    let ssr = residuals.dot(&residuals);
    let residual_variance = ssr / (n - k) as f64;

    let standard_errors = xtx_inv
        .diag()
        .mapv(|d| (residual_variance * d).sqrt());
    let t_values = &coefficients / &standard_errors;

    let y_mean = y.mean().unwrap_or(f64::NAN);
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = 1.0 - ssr / sst;

    Ok(OlsFit {
        coefficients,
        standard_errors,
        t_values,
        residual_variance,
        r_squared,
        observations: n,
    })
}

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// # Errors
///
/// [`RegressionError::SingularMatrix`] when a pivot vanishes.
pub fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>, RegressionError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let scale = matrix
        .diag()
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);

    let mut a = matrix.clone();
    let mut inv = Array2::<f64>::eye(n);

    for col in 0..n {
        // Partial pivot: largest magnitude in this column at or below the diagonal
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        let pivot = a[[pivot_row, col]];
        if !pivot.is_finite() || pivot.abs() < SINGULAR_TOLERANCE * scale {
            return Err(RegressionError::SingularMatrix);
        }

        if pivot_row != col {
            swap_rows(&mut a, pivot_row, col);
            swap_rows(&mut inv, pivot_row, col);
        }

        a.row_mut(col).mapv_inplace(|v| v / pivot);
        inv.row_mut(col).mapv_inplace(|v| v / pivot);

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            let a_pivot = a.row(col).to_owned();
            let inv_pivot = inv.row(col).to_owned();
            a.row_mut(row).scaled_add(-factor, &a_pivot);
            inv.row_mut(row).scaled_add(-factor, &inv_pivot);
        }
    }

    Ok(inv)
}

fn swap_rows(m: &mut Array2<f64>, i: usize, j: usize) {
    let row_i = m.index_axis(Axis(0), i).to_owned();
    let row_j = m.index_axis(Axis(0), j).to_owned();
    m.row_mut(i).assign(&row_j);
    m.row_mut(j).assign(&row_i);
}
