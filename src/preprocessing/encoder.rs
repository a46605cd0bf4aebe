//! One-hot encoding of categorical columns

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Vocabulary learned for one column, sorted
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnVocabulary {
    column: String,
    categories: Vec<String>,
}

/// Categorical encoder.
///
/// Values outside the fitted vocabulary (and missing values) encode as an
/// all-zero indicator group instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    vocabularies: Vec<ColumnVocabulary>,
    is_fitted: bool,
}

fn string_values(df: &DataFrame, col_name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(col_name)
        .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
    let casted = column
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| PipelineError::DataError(format!("column '{}': {}", col_name, e)))?;
    let values = casted
        .str()
        .map_err(|e| PipelineError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the distinct values of each column.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.vocabularies.clear();

        for col_name in columns {
            let categories: BTreeSet<String> = string_values(df, col_name)?.into_iter().flatten().collect();
            self.vocabularies.push(ColumnVocabulary {
                column: col_name.clone(),
                categories: categories.into_iter().collect(),
            });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Number of indicator columns produced
    pub fn n_outputs(&self) -> usize {
        self.vocabularies.iter().map(|v| v.categories.len()).sum()
    }

    /// Encode into a dense indicator block. Each column group follows the
    /// fitted column order; categories within a group are sorted.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.n_outputs()));
        let mut offset = 0;

        for vocab in &self.vocabularies {
            let mut unseen = 0usize;
            for (i, value) in string_values(df, &vocab.column)?.into_iter().enumerate() {
                let Some(value) = value else { continue };
                match vocab.categories.binary_search(&value) {
                    Ok(k) => out[[i, offset + k]] = 1.0,
                    Err(_) => unseen += 1,
                }
            }
            if unseen > 0 {
                warn!(column = %vocab.column, rows = unseen, "Categories unseen during fit encoded as all zeros");
            }
            offset += vocab.categories.len();
        }

        Ok(out)
    }

    /// Output column names as `<column>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| v.categories.iter().map(move |c| format!("{}_{}", v.column, c)))
            .collect()
    }

    /// Fitted vocabulary of a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.categories.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sorted_vocabulary() {
        let df = df!("color" => &["red", "blue", "red", "green"]).unwrap();
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&df, &columns(&["color"])).unwrap();

        assert_eq!(encoder.categories("color").unwrap(), &["blue", "green", "red"]);
        assert_eq!(encoder.feature_names(), vec!["color_blue", "color_green", "color_red"]);

        let out = encoder.transform(&df).unwrap();
        assert_eq!(
            out,
            array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let train = df!("color" => &["red", "blue"]).unwrap();
        let test = df!("color" => &["purple", "blue"]).unwrap();

        let mut encoder = OneHotEncoder::new();
        encoder.fit(&train, &columns(&["color"])).unwrap();
        let out = encoder.transform(&test).unwrap();

        assert_eq!(out.row(0).sum(), 0.0);
        assert_eq!(out, array![[0.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_multiple_groups_and_missing() {
        let df = df!(
            "a" => &[Some("x"), None, Some("y")],
            "b" => &["k", "k", "k"]
        )
        .unwrap();

        let mut encoder = OneHotEncoder::new();
        encoder.fit(&df, &columns(&["a", "b"])).unwrap();
        assert_eq!(encoder.n_outputs(), 3);

        let out = encoder.transform(&df).unwrap();
        assert_eq!(out, array![[1.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0]]);
    }
}
