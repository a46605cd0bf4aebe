//! Ordinary least squares regression

use crate::error::{PipelineError, Result};
use super::models::{check_fit_input, check_predict_input, Regressor};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pivots below this fraction of the largest diagonal entry count as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Ridge added to the diagonal of a rank-deficient system, relative to its
/// mean diagonal.
const RIDGE_JITTER: f64 = 1e-10;

/// Cholesky factorization A = L * L^T followed by forward/backward
/// substitution. Returns `None` when A is not positive definite or has a
/// non-finite pivot.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let max_diag = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let tol = PIVOT_TOLERANCE * max_diag.max(f64::MIN_POSITIVE);

    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if !(diag > tol) {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Solve the normal equations (X^T X) w = X^T y.
///
/// Collinear or constant columns make X^T X singular; in that case a tiny
/// ridge is added so the system still has a unique, near-minimum-norm
/// solution. A system that still has no factorization (non-finite input)
/// is a computation error.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    let n = xtx.nrows();

    if n == 0 {
        return Ok(Array1::zeros(0));
    }

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Ok(w);
    }

    let mean_diag = xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
    let ridge = (RIDGE_JITTER * mean_diag).max(RIDGE_JITTER);
    debug!(ridge, "Normal equations are rank deficient; adding diagonal jitter");

    let mut regularized = xtx.clone();
    for k in 0..n {
        regularized[[k, k]] += ridge;
    }
    if let Some(w) = cholesky_solve(&regularized, &xty) {
        return Ok(w);
    }

    Err(PipelineError::ComputationError(
        "normal equations have no finite solution".to_string(),
    ))
}

/// Linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;

        // Center data if fitting intercept
        let (coefficients, intercept) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| PipelineError::DataError("cannot fit on zero rows".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);

            let x_centered = x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = y - y_mean;

            let w = solve_least_squares(&x_centered, &y_centered)?;
            let b = y_mean - w.dot(&x_mean);
            (w, b)
        } else {
            (solve_least_squares(x, y)?, 0.0)
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        check_predict_input(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    fn n_features(&self) -> Option<usize> {
        self.coefficients.as_ref().map(|c| c.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_simple() {
        let x = array![
            [1.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [2.0, 2.0],
            [3.0, 1.0],
        ];
        // y = 2*x1 + 3*x2 + 1
        let y = array![6.0, 8.0, 9.0, 11.0, 10.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-8);
        assert!((coef[1] - 3.0).abs() < 1e-8);
        assert!((model.intercept.unwrap() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_without_intercept() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];

        let mut model = LinearRegression::new().with_fit_intercept(false);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.intercept, Some(0.0));
        assert!((model.coefficients.as_ref().unwrap()[0] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_collinear_columns_still_fit() {
        // Second column duplicates the first; third is constant.
        let x = array![
            [1.0, 1.0, 5.0],
            [2.0, 2.0, 5.0],
            [3.0, 3.0, 5.0],
            [4.0, 4.0, 5.0],
        ];
        let y = array![3.0, 5.0, 7.0, 9.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-4, "prediction {} vs {}", p, t);
        }
    }

    #[test]
    fn test_non_finite_input_is_computation_error() {
        let x = array![[1.0, 2.0], [2.0, f64::NAN], [3.0, 1.0]];
        let y = array![1.0, 2.0, 3.0];

        let mut model = LinearRegression::new();
        assert!(matches!(model.fit(&x, &y), Err(PipelineError::ComputationError(_))));
        assert!(!model.is_fitted());

        let x = array![[1.0, f64::INFINITY], [2.0, 1.0], [3.0, 0.0]];
        let mut model = LinearRegression::new().with_fit_intercept(false);
        assert!(matches!(model.fit(&x, &y), Err(PipelineError::ComputationError(_))));
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let err = model.predict(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_not_fitted() {
        let model = LinearRegression::new();
        assert!(matches!(model.predict(&array![[1.0]]), Err(PipelineError::ModelNotFitted)));
    }
}
