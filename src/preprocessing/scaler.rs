//! Standard scaling: (x - mean) / std with statistics taken from the fit frame

use crate::error::{PipelineError, Result};
use crate::utils::data_loader::float_values;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Running mean/variance using Welford's algorithm
#[derive(Debug, Clone, Default)]
struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Population variance (ddof = 0)
    fn variance(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.m2 / self.count as f64 }
    }
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    column: String,
    center: f64,
    scale: f64,
}

/// Feature scaler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit mean and population standard deviation for each column.
    /// Missing cells are skipped; a constant column gets scale 1.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.params.clear();

        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.clone()))?;

            let mut stats = RunningStats::default();
            for v in float_values(column.as_materialized_series())?.into_iter().flatten() {
                stats.update(v);
            }

            let std = stats.variance().sqrt();
            self.params.push(ScalerParams {
                column: col_name.clone(),
                center: stats.mean,
                scale: if std == 0.0 || !std.is_finite() { 1.0 } else { std },
            });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns of `df` into a dense block, one output column
    /// per fitted column. Missing cells map to 0.0, the scaled mean.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.params.len()));
        for (j, params) in self.params.iter().enumerate() {
            let column = df
                .column(&params.column)
                .map_err(|_| PipelineError::FeatureNotFound(params.column.clone()))?;
            let values = float_values(column.as_materialized_series())?;
            for (i, v) in values.into_iter().enumerate() {
                out[[i, j]] = v.map_or(0.0, |x| (x - params.center) / params.scale);
            }
        }

        Ok(out)
    }

    /// Fitted column names, in output order
    pub fn columns(&self) -> Vec<String> {
        self.params.iter().map(|p| p.column.clone()).collect()
    }

    /// Fitted (mean, std) for a column
    pub fn stats(&self, column: &str) -> Option<(f64, f64)> {
        self.params
            .iter()
            .find(|p| p.column == column)
            .map(|p| (p.center, p.scale))
    }
}
