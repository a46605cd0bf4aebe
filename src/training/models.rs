//! Regressor trait and regression metrics

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Metrics for regression evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Number of scored samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compare true and predicted targets.
    ///
    /// When the true targets have zero variance, R² is 1.0 for an exact fit
    /// and 0.0 otherwise.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(PipelineError::DataError("cannot score an empty target vector".to_string()));
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples: y_true.len(),
        })
    }
}

/// Root-mean-squared error between true and predicted targets
pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    RegressionMetrics::compute(y_true, y_pred).map(|m| m.rmse)
}

/// Trait for regression models
pub trait Regressor {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Number of input columns seen during fit, `None` before fitting
    fn n_features(&self) -> Option<usize>;
}

/// Reject training inputs whose row counts disagree.
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(PipelineError::DataError("cannot fit on zero rows".to_string()));
    }
    Ok(())
}

/// Reject prediction inputs whose column count differs from the fitted one.
pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} feature columns", n_features),
            actual: format!("{} feature columns", x.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let metrics = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        assert!((metrics.mse - 0.006).abs() < 1e-12);
        assert!((metrics.rmse - 0.006f64.sqrt()).abs() < 1e-12);
        assert!(metrics.r2 > 0.99);
        assert_eq!(metrics.n_samples, 5);
    }

    #[test]
    fn test_perfect_fit() {
        let y = array![3.0, -1.0, 2.5];
        let metrics = RegressionMetrics::compute(&y, &y).unwrap();
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.r2, 1.0);
    }

    #[test]
    fn test_constant_target_r2_is_finite() {
        let y_true = array![2.0, 2.0, 2.0];
        assert_eq!(RegressionMetrics::compute(&y_true, &y_true).unwrap().r2, 1.0);
        let off = array![2.0, 2.5, 2.0];
        assert_eq!(RegressionMetrics::compute(&y_true, &off).unwrap().r2, 0.0);
    }

    #[test]
    fn test_mean_predictor_has_zero_r2() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![2.0, 2.0, 2.0];
        let metrics = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        assert!(metrics.r2.abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let err = rmse(&array![1.0, 2.0], &array![1.0]).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { .. }));
    }
}
