//! Regression pipeline - preprocess, train/select, evaluate
//!
//! Three stages coupled only through files on disk:
//!
//! 1. [`stages::preprocess`] splits the raw dataset with a fixed seed, fits a
//!    column transformer on the train rows (standard scaling for numeric
//!    columns, one-hot encoding for categorical ones) and writes
//!    `X_train`/`X_test`/`y_train`/`y_test` tables.
//! 2. [`stages::train`] fits every configured candidate (linear regression,
//!    random forest, gradient boosting), keeps the one with the lowest
//!    training RMSE, and writes it together with a JSON manifest.
//! 3. [`stages::evaluate`] scores the kept model on the test tables and writes
//!    `metrics.json`.
//!
//! # Modules
//!
//! - [`config`] - YAML parameter document
//! - [`artifacts`] - Artifact locations and pipeline state
//! - [`preprocessing`] - Splitting, scaling, encoding
//! - [`training`] - Regressors, model registry, selection, persistence
//! - [`stages`] - Stage entry points
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

pub mod artifacts;
pub mod config;
pub mod preprocessing;
pub mod stages;
pub mod training;
pub mod utils;

// Services
pub mod cli;

pub use error::{PipelineError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::artifacts::{ArtifactLayout, PipelineState};
    pub use crate::config::{load_params, CandidateSpec, ParamSet};
    pub use crate::error::{PipelineError, Result};
    pub use crate::preprocessing::{FeatureTransformer, OneHotEncoder, StandardScaler};
    pub use crate::stages::{run_all, MetricsReport, PreprocessSummary};
    pub use crate::training::{
        Estimator, Manifest, ModelKind, ModelSelector, PersistedModel, RegressionMetrics, Regressor,
    };
}
