//! Model training and selection stage

use crate::artifacts::{ensure_parent, require, ArtifactLayout};
use crate::config::ParamSet;
use crate::error::{PipelineError, Result};
use crate::training::{Manifest, ModelSelector};
use crate::utils::{read_feature_table, read_target_table};
use std::fs;
use tracing::info;

/// Train every candidate on the processed training tables, then write the
/// winning model and the manifest.
///
/// Candidate types and hyperparameters are resolved before the data is
/// read, so configuration errors leave no artifacts behind.
pub fn run(params: &ParamSet, layout: &ArtifactLayout) -> Result<Manifest> {
    let specs = params.candidates()?;
    let selector = ModelSelector::from_specs(&specs, params.data.random_state)?;
    info!(candidates = ?selector.names(), "Resolved model candidates");

    let x_path = layout.x_train();
    let y_path = layout.y_train();
    require(&x_path)?;
    require(&y_path)?;

    let (feature_names, x) = read_feature_table(&x_path)?;
    let y = read_target_table(&y_path)?;
    if x.nrows() != y.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} training targets", x.nrows()),
            actual: format!("{} training targets", y.len()),
        });
    }
    info!(n_samples = x.nrows(), n_features = x.ncols(), "Loaded training tables");

    let selection = selector.select(&feature_names, &x, &y)?;
    let manifest = Manifest::from_selection(&params.metrics.primary, &selection)?;

    // Serialize both artifacts before writing either one.
    let model_bytes = selection.best.to_bytes()?;
    let manifest_json = serde_json::to_string_pretty(&manifest)?;

    let model_path = layout.best_model();
    let manifest_path = layout.manifest();
    ensure_parent(&model_path)?;
    ensure_parent(&manifest_path)?;
    fs::write(&model_path, model_bytes)?;
    fs::write(&manifest_path, manifest_json)?;

    info!(
        best_model = %manifest.best_model_name,
        best_rmse_train = manifest.best_rmse_train,
        model = %model_path.display(),
        manifest = %manifest_path.display(),
        "Saved best model"
    );

    Ok(manifest)
}
