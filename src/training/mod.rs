//! Model training module
//!
//! Provides the candidate regressors and the selection logic:
//! - Linear regression (ordinary least squares)
//! - Random forest of squared-error regression trees
//! - Gradient boosted regression trees
//!
//! Candidates are resolved from the parameter document through the
//! [`registry`], trained by the [`ModelSelector`] and persisted as a
//! [`PersistedModel`] plus a JSON [`Manifest`].

mod engine;
mod manifest;
mod models;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;
pub mod random_forest;
pub mod registry;

pub use decision_tree::{DecisionTreeRegressor, MaxFeatures, TreeNode};
pub use engine::{CandidateOutcome, Estimator, ModelSelector, PersistedModel, Selection, MODEL_FORMAT_VERSION};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use linear_models::LinearRegression;
pub use manifest::{CandidateRecord, Manifest};
pub use models::{rmse, RegressionMetrics, Regressor};
pub use random_forest::RandomForestRegressor;
pub use registry::{build_estimator, constructor, ModelConstructor, ModelKind};
