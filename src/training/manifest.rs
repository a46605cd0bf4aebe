//! Selection manifest (`best_model_info.json`)

use super::engine::Selection;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Per-candidate entry of the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub model_name: String,
    pub model_type: String,
    pub rmse_train: f64,
    /// Hyperparameters exactly as configured
    pub params: serde_json::Value,
}

/// Human-readable record of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub primary_metric: String,
    pub best_model_name: String,
    pub best_rmse_train: f64,
    /// All candidates, in declaration order
    pub all_models: Vec<CandidateRecord>,
}

impl Manifest {
    pub fn from_selection(primary_metric: &str, selection: &Selection) -> Result<Self> {
        let all_models = selection
            .outcomes
            .iter()
            .map(|outcome| {
                Ok(CandidateRecord {
                    model_name: outcome.name.clone(),
                    model_type: outcome.kind.to_string(),
                    rmse_train: outcome.rmse_train,
                    params: serde_json::to_value(&outcome.params)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            primary_metric: primary_metric.to_string(),
            best_model_name: selection.best.model_name.clone(),
            best_rmse_train: selection.best.rmse_train,
            all_models,
        })
    }

    /// Record of a candidate by name
    pub fn candidate(&self, name: &str) -> Option<&CandidateRecord> {
        self.all_models.iter().find(|r| r.model_name == name)
    }
}
