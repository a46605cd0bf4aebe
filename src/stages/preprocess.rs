//! Feature transformation stage
//!
//! Reads the raw dataset, splits it, fits the feature transformer on the
//! train rows only and writes the four processed tables.

use crate::artifacts::ArtifactLayout;
use crate::config::ParamSet;
use crate::error::Result;
use crate::preprocessing::{split_features_target, take_rows, train_test_split, FeatureTransformer};
use crate::utils::{array1_to_frame, array2_to_frame, load_csv, save_csv};
use ndarray::Axis;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// What a preprocessing run produced
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessSummary {
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    /// Column names of the processed feature tables
    pub feature_names: Vec<String>,
    pub outputs: Vec<PathBuf>,
}

pub fn run(params: &ParamSet, layout: &ArtifactLayout) -> Result<PreprocessSummary> {
    let data = &params.data;
    data.validate()?;

    let raw_path = layout.resolve(&data.path);
    info!(path = %raw_path.display(), "Loading raw dataset");
    let df = load_csv(&raw_path)?;
    let (features, y) = split_features_target(&df, &data.target)?;

    let split = train_test_split(df.height(), data.test_size, data.random_state)?;
    info!(
        n_rows = df.height(),
        n_train = split.train_indices.len(),
        n_test = split.test_indices.len(),
        seed = data.random_state,
        "Split dataset"
    );

    let x_train_raw = take_rows(&features, &split.train_indices)?;
    let x_test_raw = take_rows(&features, &split.test_indices)?;
    let y_train = y.select(Axis(0), &split.train_indices);
    let y_test = y.select(Axis(0), &split.test_indices);

    let mut transformer = FeatureTransformer::new();
    let train = transformer.fit_transform(&x_train_raw)?;
    let test = transformer.transform(&x_test_raw)?;
    info!(
        n_features = train.names.len(),
        n_numeric = transformer.columns().numeric.len(),
        n_categorical = transformer.columns().categorical.len(),
        "Fitted feature transformer"
    );

    // Build every table before touching the output directory.
    let mut tables = vec![
        (layout.x_train(), array2_to_frame(&train.names, &train.values)?),
        (layout.x_test(), array2_to_frame(&test.names, &test.values)?),
        (layout.y_train(), array1_to_frame(&data.target, &y_train)?),
        (layout.y_test(), array1_to_frame(&data.target, &y_test)?),
    ];
    for (path, table) in tables.iter_mut() {
        save_csv(path, table)?;
    }
    info!(dir = %layout.processed_dir().display(), "Wrote processed tables");

    let columns = transformer.columns();
    Ok(PreprocessSummary {
        n_rows: df.height(),
        n_train: y_train.len(),
        n_test: y_test.len(),
        numeric_columns: columns.numeric.clone(),
        categorical_columns: columns.categorical.clone(),
        dropped_columns: columns.dropped.clone(),
        feature_names: train.names,
        outputs: tables.into_iter().map(|(path, _)| path).collect(),
    })
}
