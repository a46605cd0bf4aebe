//! Parameter set loading
//!
//! The pipeline is driven by a single YAML document with three sections:
//!
//! ```yaml
//! data:
//!   path: data/raw/housing.csv
//!   target: MedHouseVal
//!   test_size: 0.2
//!   random_state: 42
//! metrics:
//!   primary: rmse
//! models:
//!   linear_regression:
//!     type: linear_regression
//!     params: {}
//!   random_forest:
//!     type: random_forest
//!     params:
//!       n_estimators: 10
//! ```
//!
//! Every stage loads the whole document but only reads the part it needs.

use crate::error::{PipelineError, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Conventional location of the parameter document
pub const DEFAULT_PARAMS_PATH: &str = "params.yaml";

/// Dataset and split parameters (`data.*`)
#[derive(Debug, Clone, Deserialize)]
pub struct DataParams {
    /// Raw dataset location (CSV)
    pub path: PathBuf,
    /// Name of the target column
    pub target: String,
    /// Fraction of rows held out for testing, exclusive range (0, 1)
    pub test_size: f64,
    /// Seed for the split and for any model without its own seed
    pub random_state: u64,
}

impl DataParams {
    /// Range checks that the structural parse cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::Config(format!(
                "data.test_size must lie strictly between 0 and 1, got {}",
                self.test_size
            )));
        }
        if self.target.trim().is_empty() {
            return Err(PipelineError::Config("data.target must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Metric reporting parameters (`metrics.*`)
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsParams {
    /// Name recorded in the manifest and the final report
    pub primary: String,
}

/// One configured model candidate, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSpec {
    pub name: String,
    pub model_type: String,
    /// Hyperparameter mapping exactly as written in the document
    pub params: Value,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCandidate {
    #[serde(rename = "type")]
    model_type: String,
    #[serde(default)]
    params: Option<Mapping>,
}

/// The full parameter document
#[derive(Debug, Clone, Deserialize)]
pub struct ParamSet {
    pub data: DataParams,
    pub metrics: MetricsParams,
    /// Ordered `name -> {type, params}` mapping
    models: Mapping,
}

impl ParamSet {
    /// Parse a parameter document from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| PipelineError::Config(format!("invalid parameter document: {}", e)))
    }

    /// Model candidates in the order they are declared.
    pub fn candidates(&self) -> Result<Vec<CandidateSpec>> {
        if self.models.is_empty() {
            return Err(PipelineError::Config("models: at least one candidate is required".to_string()));
        }

        self.models
            .iter()
            .map(|(key, value)| {
                let name = key
                    .as_str()
                    .ok_or_else(|| PipelineError::Config(format!("model name must be a string, got {:?}", key)))?
                    .to_string();

                let raw: RawCandidate = serde_yaml::from_value(value.clone())
                    .map_err(|e| PipelineError::Config(format!("models.{}: {}", name, e)))?;

                Ok(CandidateSpec {
                    name,
                    model_type: raw.model_type,
                    params: Value::Mapping(raw.params.unwrap_or_default()),
                })
            })
            .collect()
    }
}

/// Load the parameter document at `path`.
pub fn load_params(path: &Path) -> Result<ParamSet> {
    if !path.exists() {
        return Err(PipelineError::Config(format!(
            "parameter file not found: {}",
            path.display()
        )));
    }
    let contents = std::fs::read_to_string(path)?;
    ParamSet::from_yaml_str(&contents)
}
