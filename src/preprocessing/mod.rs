//! Data preprocessing module
//!
//! Provides the feature transformation stage's building blocks:
//! - Column classification (numeric vs categorical)
//! - Standard scaling fitted on training rows only
//! - One-hot encoding that tolerates categories unseen at fit time
//! - Seeded train/test splitting

mod scaler;
mod encoder;
mod split;
mod pipeline;

pub use scaler::StandardScaler;
pub use encoder::OneHotEncoder;
pub use split::{take_rows, train_test_split, TrainTestSplit};
pub use pipeline::{split_features_target, FeatureTransformer, TransformedFeatures};

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column data type for preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
    /// Neither numeric nor string-like; left out of the feature table
    Unsupported,
}

impl ColumnType {
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
            DataType::Float32 | DataType::Float64 => ColumnType::Numeric,
            DataType::String | DataType::Categorical(_, _) => ColumnType::Categorical,
            _ => ColumnType::Unsupported,
        }
    }
}

/// Feature columns grouped by type, each group in frame order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnClassification {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub dropped: Vec<String>,
}

impl ColumnClassification {
    pub fn n_used(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }
}

/// Classify every column of `df` by its value type.
pub fn classify_columns(df: &DataFrame) -> ColumnClassification {
    let mut classes = ColumnClassification::default();

    for col in df.get_columns() {
        let name = col.name().to_string();
        match ColumnType::from_dtype(col.dtype()) {
            ColumnType::Numeric => classes.numeric.push(name),
            ColumnType::Categorical => classes.categorical.push(name),
            ColumnType::Unsupported => classes.dropped.push(name),
        }
    }

    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_columns() {
        let df = df!(
            "rooms" => &[3i64, 4, 5],
            "area" => &[70.5, 80.0, 95.25],
            "city" => &["a", "b", "a"],
            "flag" => &[true, false, true]
        )
        .unwrap();

        let classes = classify_columns(&df);
        assert_eq!(classes.numeric, vec!["rooms", "area"]);
        assert_eq!(classes.categorical, vec!["city"]);
        assert_eq!(classes.dropped, vec!["flag"]);
        assert_eq!(classes.n_used(), 3);
    }

    #[test]
    fn test_column_type_serialize() {
        let json = serde_json::to_string(&ColumnType::Numeric).unwrap();
        assert_eq!(json, "\"Numeric\"");
    }
}
