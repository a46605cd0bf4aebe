//! Column-wise feature transformation
//!
//! Numeric columns are standardized and categorical columns one-hot encoded;
//! the two blocks are concatenated as `[numeric..., categorical...]`. All
//! statistics come from the frame passed to [`FeatureTransformer::fit`].

use crate::error::{PipelineError, Result};
use super::{classify_columns, ColumnClassification, OneHotEncoder, StandardScaler};
use crate::utils::data_loader::float_values;
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, warn};

const NUMERIC_PREFIX: &str = "num__";
const CATEGORICAL_PREFIX: &str = "cat__";

/// Dense output of a transform
#[derive(Debug, Clone)]
pub struct TransformedFeatures {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

/// Fitted column transformer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureTransformer {
    columns: ColumnClassification,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    is_fitted: bool,
    /// Seconds spent in the last fit call
    fit_time: Option<f64>,
}

impl FeatureTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify columns and learn scaling statistics and category vocabularies.
    pub fn fit(&mut self, features: &DataFrame) -> Result<&mut Self> {
        let start = Instant::now();

        let columns = classify_columns(features);
        for dropped in &columns.dropped {
            warn!(column = %dropped, "Column is neither numeric nor categorical; dropping it");
        }
        if columns.n_used() == 0 {
            return Err(PipelineError::DataError(
                "dataset has no numeric or categorical feature columns".to_string(),
            ));
        }

        self.scaler.fit(features, &columns.numeric)?;
        self.encoder.fit(features, &columns.categorical)?;

        for name in &columns.numeric {
            if let Some((mean, std)) = self.scaler.stats(name) {
                debug!(column = %name, mean, std, "Fitted numeric column");
            }
        }
        for name in &columns.categorical {
            if let Some(categories) = self.encoder.categories(name) {
                debug!(column = %name, n_categories = categories.len(), "Fitted categorical column");
            }
        }

        self.columns = columns;
        self.is_fitted = true;
        self.fit_time = Some(start.elapsed().as_secs_f64());
        Ok(self)
    }

    /// Apply the fitted transformation.
    pub fn transform(&self, features: &DataFrame) -> Result<TransformedFeatures> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let numeric = self.scaler.transform(features)?;
        let categorical = self.encoder.transform(features)?;
        let values = concatenate(Axis(1), &[numeric.view(), categorical.view()])?;

        Ok(TransformedFeatures {
            names: self.feature_names(),
            values,
        })
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, features: &DataFrame) -> Result<TransformedFeatures> {
        self.fit(features)?;
        self.transform(features)
    }

    /// Output column names: `num__<column>` then `cat__<column>_<category>`.
    ///
    /// A name already taken by an earlier column gets its output position
    /// appended, e.g. `cat__a_b_c__4`.
    pub fn feature_names(&self) -> Vec<String> {
        let raw = self
            .scaler
            .columns()
            .into_iter()
            .map(|c| format!("{}{}", NUMERIC_PREFIX, c))
            .chain(
                self.encoder
                    .feature_names()
                    .into_iter()
                    .map(|c| format!("{}{}", CATEGORICAL_PREFIX, c)),
            );

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for (position, name) in raw.enumerate() {
            let mut unique = name.clone();
            while seen.contains(&unique) {
                unique = format!("{}__{}", unique, position);
            }
            if unique != name {
                warn!(feature = %name, renamed = %unique, "Transformed feature name collides; renaming");
            }
            seen.insert(unique.clone());
            names.push(unique);
        }
        names
    }

    pub fn columns(&self) -> &ColumnClassification {
        &self.columns
    }

    pub fn fit_time(&self) -> Option<f64> {
        self.fit_time
    }
}

/// Separate the target column from the features.
///
/// A missing target column is a configuration error; a missing target value
/// is a data error.
pub fn split_features_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Array1<f64>)> {
    let column = df.column(target).map_err(|_| {
        PipelineError::Config(format!("target column '{}' not found in dataset", target))
    })?;

    let y = float_values(column.as_materialized_series())?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| PipelineError::DataError(format!("target '{}' is missing at row {}", target, row)))
        })
        .collect::<Result<Vec<f64>>>()?;

    let features = df.drop(target)?;
    Ok((features, Array1::from_vec(y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn mixed_df() -> DataFrame {
        df!(
            "size" => &[1.0, 2.0, 3.0, 4.0],
            "city" => &["b", "a", "b", "c"],
            "rooms" => &[1i64, 1, 3, 3],
            "price" => &[10.0, 20.0, 30.0, 40.0]
        )
        .unwrap()
    }

    #[test]
    fn test_split_features_target() {
        let (x, y) = split_features_target(&mixed_df(), "price").unwrap();
        assert_eq!(x.width(), 3);
        assert!(x.column("price").is_err());
        assert_eq!(y, array![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_missing_target_is_config_error() {
        let err = split_features_target(&mixed_df(), "nope").unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_numeric_block_then_categorical_block() {
        let (x, _) = split_features_target(&mixed_df(), "price").unwrap();
        let mut transformer = FeatureTransformer::new();
        let out = transformer.fit_transform(&x).unwrap();

        assert_eq!(
            out.names,
            vec!["num__size", "num__rooms", "cat__city_a", "cat__city_b", "cat__city_c"]
        );
        assert_eq!(out.values.dim(), (4, 5));
        // rooms: mean 2, population std 1
        assert_eq!(out.values.column(1).to_vec(), vec![-1.0, -1.0, 1.0, 1.0]);
        assert_eq!(out.values.row(1).slice(ndarray::s![2..]).to_vec(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_test_frame_keeps_train_layout() {
        let (x, _) = split_features_target(&mixed_df(), "price").unwrap();
        let test = df!(
            "size" => &[2.5],
            "city" => &["zzz"],
            "rooms" => &[2i64]
        )
        .unwrap();

        let mut transformer = FeatureTransformer::new();
        let train_out = transformer.fit_transform(&x).unwrap();
        let test_out = transformer.transform(&test).unwrap();

        assert_eq!(train_out.names, test_out.names);
        assert_eq!(test_out.values.ncols(), train_out.values.ncols());
        assert_eq!(test_out.values.row(0).slice(ndarray::s![2..]).sum(), 0.0);
    }

    #[test]
    fn test_colliding_one_hot_names_are_renamed() {
        let df = df!(
            "a_b" => &["c", "c", "d"],
            "a" => &["b_c", "e", "e"]
        )
        .unwrap();

        let mut transformer = FeatureTransformer::new();
        let out = transformer.fit_transform(&df).unwrap();

        assert_eq!(
            out.names,
            vec!["cat__a_b_c", "cat__a_b_d", "cat__a_b_c__2", "cat__a_e"]
        );
        assert_eq!(out.values.column(0).to_vec(), vec![1.0, 1.0, 0.0]);
        assert_eq!(out.values.column(2).to_vec(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_no_usable_columns() {
        let df = df!("flag" => &[true, false]).unwrap();
        let err = FeatureTransformer::new().fit(&df).unwrap_err();
        assert!(matches!(err, PipelineError::DataError(_)));
    }

    #[test]
    fn test_transform_before_fit() {
        let (x, _) = split_features_target(&mixed_df(), "price").unwrap();
        assert!(matches!(FeatureTransformer::new().transform(&x), Err(PipelineError::ModelNotFitted)));
    }
}
