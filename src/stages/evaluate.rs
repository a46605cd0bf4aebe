//! Evaluation stage

use crate::artifacts::{read_json, require, write_json, ArtifactLayout};
use crate::config::ParamSet;
use crate::error::{PipelineError, Result};
use crate::training::{Manifest, PersistedModel, RegressionMetrics};
use crate::utils::{read_feature_table, read_target_table};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Contents of `metrics.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub primary_metric: String,
    pub rmse: f64,
    pub r2: f64,
    pub best_model_name: String,
}

/// Score a persisted model on a feature matrix and its targets.
pub fn evaluate_model(
    model: &PersistedModel,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<RegressionMetrics> {
    if x.nrows() != y.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} test targets", x.nrows()),
            actual: format!("{} test targets", y.len()),
        });
    }
    let predictions = model.predict(x)?;
    RegressionMetrics::compute(y, &predictions)
}

/// Score the persisted best model on the held-out tables and write the
/// metrics report.
pub fn run(params: &ParamSet, layout: &ArtifactLayout) -> Result<MetricsReport> {
    let model_path = layout.best_model();
    let manifest_path = layout.manifest();
    require(&model_path)?;
    require(&manifest_path)?;

    let model = PersistedModel::load(&model_path)?;
    let manifest: Manifest = read_json(&manifest_path)?;

    if model.model_name != manifest.best_model_name {
        warn!(
            model = %model.model_name,
            manifest = %manifest.best_model_name,
            "Persisted model and manifest disagree on the best model; reporting the manifest's"
        );
    }
    if params.metrics.primary != manifest.primary_metric {
        warn!(
            configured = %params.metrics.primary,
            manifest = %manifest.primary_metric,
            "Primary metric changed since training; reporting the manifest's"
        );
    }

    let (feature_names, x) = read_feature_table(&layout.x_test())?;
    let y = read_target_table(&layout.y_test())?;

    if x.ncols() == model.n_features() && feature_names != model.feature_names {
        warn!("Test feature names differ from the names the model was trained on");
    }

    let metrics = evaluate_model(&model, &x, &y)?;
    info!(
        model = %manifest.best_model_name,
        n_samples = metrics.n_samples,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "Evaluated best model on test split"
    );

    let report = MetricsReport {
        primary_metric: manifest.primary_metric,
        rmse: metrics.rmse,
        r2: metrics.r2,
        best_model_name: manifest.best_model_name,
    };
    write_json(&layout.metrics_report(), &report)?;
    info!(path = %layout.metrics_report().display(), "Wrote metrics report");

    Ok(report)
}
