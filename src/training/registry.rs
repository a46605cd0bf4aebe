//! Model type registry
//!
//! Maps the `type` tag of a configured candidate to a constructor that
//! validates the candidate's hyperparameters and builds an unfitted
//! [`Estimator`]. Hyperparameter mappings are parsed into typed structs, so a
//! misspelled key is rejected instead of silently ignored.

use super::decision_tree::MaxFeatures;
use super::engine::Estimator;
use super::gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use super::linear_models::LinearRegression;
use super::random_forest::RandomForestRegressor;
use crate::error::{PipelineError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;

/// Supported model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearRegression,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LinearRegression,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
    ];

    /// Tag used in the parameter document and the manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "linear_regression",
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PipelineError::UnsupportedModelType(s.to_string()))
    }
}

/// `max_features` as written in the document: a count, a fraction, or one of
/// `"sqrt"`, `"log2"`. Absent or null means all features.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MaxFeaturesSetting {
    Count(usize),
    Fraction(f64),
    Named(String),
}

fn resolve_max_features(setting: Option<MaxFeaturesSetting>) -> Result<MaxFeatures> {
    match setting {
        None => Ok(MaxFeatures::All),
        Some(MaxFeaturesSetting::Count(0)) => Err(PipelineError::invalid_parameter(
            "max_features",
            0,
            "must be at least 1",
        )),
        Some(MaxFeaturesSetting::Count(k)) => Ok(MaxFeatures::Fixed(k)),
        Some(MaxFeaturesSetting::Fraction(f)) if f > 0.0 && f <= 1.0 => Ok(MaxFeatures::Fraction(f)),
        Some(MaxFeaturesSetting::Fraction(f)) => Err(PipelineError::invalid_parameter(
            "max_features",
            f,
            "fractions must lie in (0, 1]",
        )),
        Some(MaxFeaturesSetting::Named(name)) => match name.as_str() {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            _ => Err(PipelineError::invalid_parameter(
                "max_features",
                name,
                "expected \"sqrt\", \"log2\", an integer, or a fraction",
            )),
        },
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LinearRegressionParams {
    fit_intercept: bool,
}

impl Default for LinearRegressionParams {
    fn default() -> Self {
        Self { fit_intercept: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RandomForestParams {
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: Option<MaxFeaturesSetting>,
    bootstrap: bool,
    random_state: Option<u64>,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            random_state: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GradientBoostingParams {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    subsample: f64,
    max_features: Option<MaxFeaturesSetting>,
    random_state: Option<u64>,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: Some(3),
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 1.0,
            max_features: None,
            random_state: None,
        }
    }
}

fn parse_params<T: DeserializeOwned>(kind: ModelKind, params: &Value) -> Result<T> {
    let params = match params {
        Value::Null => Value::Mapping(Default::default()),
        other => other.clone(),
    };
    serde_yaml::from_value(params)
        .map_err(|e| PipelineError::Config(format!("{} params: {}", kind, e)))
}

fn check_tree_shape(
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
) -> Result<()> {
    if n_estimators == 0 {
        return Err(PipelineError::invalid_parameter("n_estimators", n_estimators, "must be at least 1"));
    }
    if max_depth == Some(0) {
        return Err(PipelineError::invalid_parameter("max_depth", 0, "must be at least 1 or null"));
    }
    if min_samples_split < 2 {
        return Err(PipelineError::invalid_parameter(
            "min_samples_split",
            min_samples_split,
            "must be at least 2",
        ));
    }
    if min_samples_leaf == 0 {
        return Err(PipelineError::invalid_parameter("min_samples_leaf", min_samples_leaf, "must be at least 1"));
    }
    Ok(())
}

/// Builds an unfitted estimator from a hyperparameter mapping and the seed to
/// use when the mapping sets none.
pub type ModelConstructor = fn(&Value, u64) -> Result<Estimator>;

fn build_linear_regression(params: &Value, _default_seed: u64) -> Result<Estimator> {
    let p: LinearRegressionParams = parse_params(ModelKind::LinearRegression, params)?;
    Ok(Estimator::LinearRegression(
        LinearRegression::new().with_fit_intercept(p.fit_intercept),
    ))
}

fn build_random_forest(params: &Value, default_seed: u64) -> Result<Estimator> {
    let p: RandomForestParams = parse_params(ModelKind::RandomForest, params)?;
    check_tree_shape(p.n_estimators, p.max_depth, p.min_samples_split, p.min_samples_leaf)?;
    let max_features = resolve_max_features(p.max_features)?;

    Ok(Estimator::RandomForest(
        RandomForestRegressor::new(p.n_estimators)
            .with_max_depth(p.max_depth)
            .with_min_samples_split(p.min_samples_split)
            .with_min_samples_leaf(p.min_samples_leaf)
            .with_max_features(max_features)
            .with_bootstrap(p.bootstrap)
            .with_random_state(p.random_state.unwrap_or(default_seed)),
    ))
}

fn build_gradient_boosting(params: &Value, default_seed: u64) -> Result<Estimator> {
    let p: GradientBoostingParams = parse_params(ModelKind::GradientBoosting, params)?;
    check_tree_shape(p.n_estimators, p.max_depth, p.min_samples_split, p.min_samples_leaf)?;
    if !(p.learning_rate > 0.0 && p.learning_rate.is_finite()) {
        return Err(PipelineError::invalid_parameter("learning_rate", p.learning_rate, "must be positive"));
    }
    if !(p.subsample > 0.0 && p.subsample <= 1.0) {
        return Err(PipelineError::invalid_parameter("subsample", p.subsample, "must lie in (0, 1]"));
    }

    Ok(Estimator::GradientBoosting(GradientBoostingRegressor::new(
        GradientBoostingConfig {
            n_estimators: p.n_estimators,
            learning_rate: p.learning_rate,
            max_depth: p.max_depth,
            min_samples_split: p.min_samples_split,
            min_samples_leaf: p.min_samples_leaf,
            subsample: p.subsample,
            max_features: resolve_max_features(p.max_features)?,
            random_state: Some(p.random_state.unwrap_or(default_seed)),
        },
    )))
}

/// Constructor for a model family
pub fn constructor(kind: ModelKind) -> ModelConstructor {
    match kind {
        ModelKind::LinearRegression => build_linear_regression,
        ModelKind::RandomForest => build_random_forest,
        ModelKind::GradientBoosting => build_gradient_boosting,
    }
}

/// Resolve a type tag and build an unfitted estimator in one step.
pub fn build_estimator(model_type: &str, params: &Value, default_seed: u64) -> Result<(ModelKind, Estimator)> {
    let kind: ModelKind = model_type.parse()?;
    let estimator = constructor(kind)(params, default_seed)?;
    Ok((kind, estimator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
        assert!(matches!(
            "xgboost".parse::<ModelKind>(),
            Err(PipelineError::UnsupportedModelType(t)) if t == "xgboost"
        ));
    }

    #[test]
    fn test_defaults_from_empty_mapping() {
        let (kind, est) = build_estimator("random_forest", &yaml("{}"), 9).unwrap();
        assert_eq!(kind, ModelKind::RandomForest);
        match est {
            Estimator::RandomForest(rf) => {
                assert_eq!(rf.n_estimators, 100);
                assert_eq!(rf.max_depth, None);
                assert_eq!(rf.max_features, MaxFeatures::All);
                assert!(rf.bootstrap);
                assert_eq!(rf.random_state, Some(9));
            }
            other => panic!("unexpected estimator {:?}", other.kind()),
        }
    }

    #[test]
    fn test_explicit_seed_wins() {
        let (_, est) = build_estimator("gradient_boosting", &yaml("random_state: 5\nmax_depth: null"), 9).unwrap();
        match est {
            Estimator::GradientBoosting(gb) => {
                assert_eq!(gb.config().random_state, Some(5));
                assert_eq!(gb.config().max_depth, None);
            }
            other => panic!("unexpected estimator {:?}", other.kind()),
        }
    }

    #[test]
    fn test_max_features_forms() {
        for (text, expected) in [
            ("max_features: sqrt", MaxFeatures::Sqrt),
            ("max_features: log2", MaxFeatures::Log2),
            ("max_features: 3", MaxFeatures::Fixed(3)),
            ("max_features: 0.5", MaxFeatures::Fraction(0.5)),
            ("max_features: null", MaxFeatures::All),
        ] {
            let (_, est) = build_estimator("random_forest", &yaml(text), 0).unwrap();
            let Estimator::RandomForest(rf) = est else { panic!("expected forest") };
            assert_eq!(rf.max_features, expected, "{}", text);
        }
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        for (model, text) in [
            ("random_forest", "n_estimators: 0"),
            ("random_forest", "max_features: cube"),
            ("random_forest", "max_features: 1.5"),
            ("random_forest", "min_samples_split: 1"),
            ("random_forest", "max_depth: 0"),
            ("gradient_boosting", "max_depth: 0"),
            ("gradient_boosting", "learning_rate: -0.1"),
            ("gradient_boosting", "subsample: 0"),
            ("linear_regression", "alpha: 1.0"),
            ("random_forest", "n_trees: 10"),
        ] {
            let err = build_estimator(model, &yaml(text), 0).unwrap_err();
            assert!(err.is_configuration_error(), "{} {} -> {}", model, text, err);
        }
    }

    #[test]
    fn test_zero_depth_names_the_parameter() {
        let err = build_estimator("gradient_boosting", &yaml("max_depth: 0"), 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter { ref name, .. } if name == "max_depth"));

        assert!(build_estimator("random_forest", &yaml("max_depth: 1"), 0).is_ok());
    }

    #[test]
    fn test_null_params() {
        let (_, est) = build_estimator("linear_regression", &Value::Null, 0).unwrap();
        assert_eq!(est.kind(), ModelKind::LinearRegression);
    }
}
