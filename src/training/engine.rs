//! Candidate training, selection and model persistence

use crate::artifacts::require;
use crate::config::CandidateSpec;
use crate::error::{PipelineError, Result};
use super::gradient_boosting::GradientBoostingRegressor;
use super::linear_models::LinearRegression;
use super::models::{rmse, Regressor};
use super::random_forest::RandomForestRegressor;
use super::registry::{build_estimator, ModelKind};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Bumped whenever the persisted model layout changes
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Enum to hold model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    LinearRegression(LinearRegression),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl Estimator {
    pub fn kind(&self) -> ModelKind {
        match self {
            Estimator::LinearRegression(_) => ModelKind::LinearRegression,
            Estimator::RandomForest(_) => ModelKind::RandomForest,
            Estimator::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            Estimator::LinearRegression(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::GradientBoosting(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Estimator::LinearRegression(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::GradientBoosting(m) => m,
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }

    fn n_features(&self) -> Option<usize> {
        self.as_regressor().n_features()
    }
}

/// The selected model as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedModel {
    format_version: u32,
    pub model_name: String,
    pub model_type: ModelKind,
    /// Column names of the matrix the model was fitted on
    pub feature_names: Vec<String>,
    pub rmse_train: f64,
    pub estimator: Estimator,
}

impl PersistedModel {
    pub fn new(
        model_name: impl Into<String>,
        feature_names: Vec<String>,
        rmse_train: f64,
        estimator: Estimator,
    ) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            model_name: model_name.into(),
            model_type: estimator.kind(),
            feature_names,
            rmse_train,
            estimator,
        }
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Predict with the fitted estimator; the column count must match training.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} feature columns", self.n_features()),
                actual: format!("{} feature columns", x.ncols()),
            });
        }
        self.estimator.predict(x)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: Self = bincode::deserialize(bytes)?;
        if model.format_version != MODEL_FORMAT_VERSION {
            return Err(PipelineError::SerializationError(format!(
                "unsupported model format version {} (expected {})",
                model.format_version, MODEL_FORMAT_VERSION
            )));
        }
        Ok(model)
    }

    /// Load a model written by [`PersistedModel::to_bytes`].
    pub fn load(path: &Path) -> Result<Self> {
        require(path)?;
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// Training outcome of one candidate
#[derive(Debug, Clone)]
pub struct CandidateOutcome {
    pub name: String,
    pub kind: ModelKind,
    /// Hyperparameters as written in the parameter document
    pub params: Value,
    pub rmse_train: f64,
    pub fit_time_secs: f64,
}

/// Result of training every candidate
#[derive(Debug, Clone)]
pub struct Selection {
    pub best: PersistedModel,
    /// One entry per candidate, in declaration order
    pub outcomes: Vec<CandidateOutcome>,
}

#[derive(Debug)]
struct ResolvedCandidate {
    name: String,
    kind: ModelKind,
    params: Value,
    estimator: Estimator,
}

/// Trains every configured candidate and keeps the one with the lowest
/// training RMSE.
#[derive(Debug)]
pub struct ModelSelector {
    candidates: Vec<ResolvedCandidate>,
}

impl ModelSelector {
    /// Resolve every candidate up front, so an unsupported type or a bad
    /// hyperparameter fails before any model is trained.
    pub fn from_specs(specs: &[CandidateSpec], default_seed: u64) -> Result<Self> {
        if specs.is_empty() {
            return Err(PipelineError::Config("no model candidates configured".to_string()));
        }

        let candidates = specs
            .iter()
            .map(|spec| {
                let (kind, estimator) = build_estimator(&spec.model_type, &spec.params, default_seed)
                    .map_err(|e| match e {
                        PipelineError::Config(msg) => PipelineError::Config(format!("models.{}: {}", spec.name, msg)),
                        other => other,
                    })?;
                Ok(ResolvedCandidate {
                    name: spec.name.clone(),
                    kind,
                    params: spec.params.clone(),
                    estimator,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { candidates })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }

    /// Fit each candidate on `(x, y)` and score it on the same rows.
    ///
    /// The winner is the first candidate whose RMSE is strictly lower than
    /// every earlier one, so ties go to the earliest declared candidate.
    pub fn select(self, feature_names: &[String], x: &Array2<f64>, y: &Array1<f64>) -> Result<Selection> {
        if feature_names.len() != x.ncols() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} feature names", x.ncols()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }

        let mut outcomes = Vec::with_capacity(self.candidates.len());
        let mut best: Option<(f64, String, Estimator)> = None;

        for candidate in self.candidates {
            let ResolvedCandidate { name, kind, params, mut estimator } = candidate;
            info!(candidate = %name, model_type = %kind, "Training candidate");

            let start = Instant::now();
            estimator.fit(x, y)?;
            let fit_time_secs = start.elapsed().as_secs_f64();

            let predictions = estimator.predict(x)?;
            let rmse_train = rmse(y, &predictions)?;
            if !rmse_train.is_finite() {
                return Err(PipelineError::ComputationError(format!(
                    "candidate '{}' produced a non-finite training RMSE",
                    name
                )));
            }
            info!(candidate = %name, rmse_train, fit_time_secs, "Candidate trained");

            let improves = best.as_ref().map_or(true, |(best_rmse, _, _)| rmse_train < *best_rmse);
            if improves {
                debug!(candidate = %name, rmse_train, "New best candidate");
                best = Some((rmse_train, name.clone(), estimator));
            }

            outcomes.push(CandidateOutcome {
                name,
                kind,
                params,
                rmse_train,
                fit_time_secs,
            });
        }

        let (rmse_train, name, estimator) =
            best.ok_or_else(|| PipelineError::Config("no model candidates configured".to_string()))?;
        info!(best_model = %name, rmse_train, "Selected best model");

        Ok(Selection {
            best: PersistedModel::new(name, feature_names.to_vec(), rmse_train, estimator),
            outcomes,
        })
    }
}
