//! Gradient boosted regression trees
//!
//! Squared-error boosting: start from the target mean, then repeatedly fit a
//! shallow regression tree to the current residuals and add a shrunken copy
//! of its predictions to the ensemble.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision_tree::{DecisionTreeRegressor, MaxFeatures};
use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{PipelineError, Result};

/// Gradient Boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth, `None` for unlimited
    pub max_depth: Option<usize>,
    /// Minimum samples to split a node
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) for each tree
    pub subsample: f64,
    /// Features examined per split
    pub max_features: MaxFeatures,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: Some(3),
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 1.0,
            max_features: MaxFeatures::All,
            random_state: None,
        }
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTreeRegressor>,
    initial_prediction: f64,
    feature_importances: Vec<f64>,
    n_features: usize,
    /// Training RMSE after each round
    train_loss: Vec<f64>,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            feature_importances: Vec::new(),
            n_features: 0,
            train_loss: Vec::new(),
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Training RMSE recorded after each boosting round
    pub fn train_loss(&self) -> &[f64] {
        &self.train_loss
    }

    fn validate(&self) -> Result<()> {
        let c = &self.config;
        if c.n_estimators == 0 {
            return Err(PipelineError::invalid_parameter("n_estimators", c.n_estimators, "must be at least 1"));
        }
        if !(c.learning_rate > 0.0 && c.learning_rate.is_finite()) {
            return Err(PipelineError::invalid_parameter("learning_rate", c.learning_rate, "must be positive"));
        }
        if !(c.subsample > 0.0 && c.subsample <= 1.0) {
            return Err(PipelineError::invalid_parameter("subsample", c.subsample, "must lie in (0, 1]"));
        }
        Ok(())
    }

    /// Rows used by one boosting round, sorted
    fn subsample_indices(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        if self.config.subsample >= 1.0 {
            return indices;
        }
        let sample_size = (((n as f64) * self.config.subsample) as usize).max(1);
        indices.shuffle(rng);
        indices.truncate(sample_size);
        indices.sort_unstable();
        indices
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        self.initial_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(0));

        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut importances = vec![0.0; n_features];
        let mut train_loss = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            let residuals: Array1<f64> = y
                .iter()
                .zip(predictions.iter())
                .map(|(yi, pi)| yi - pi)
                .collect();

            let sample_indices = self.subsample_indices(n_samples, &mut rng);

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_split(self.config.min_samples_split)
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_max_features(self.config.max_features)
                .with_random_state(rng.next_u64());

            if sample_indices.len() == n_samples {
                tree.fit(x, &residuals)?;
            } else {
                let x_sub = x.select(Axis(0), &sample_indices);
                let r_sub = residuals.select(Axis(0), &sample_indices);
                tree.fit(&x_sub, &r_sub)?;
            }

            // Every row moves, including those left out of this round's sample.
            let update = tree.predict(x)?;
            predictions.scaled_add(self.config.learning_rate, &update);

            let mse = y
                .iter()
                .zip(predictions.iter())
                .map(|(yi, pi)| (yi - pi).powi(2))
                .sum::<f64>()
                / n_samples as f64;
            train_loss.push(mse.sqrt());

            if let Some(tree_importance) = tree.feature_importances() {
                for (acc, imp) in importances.iter_mut().zip(tree_importance.iter()) {
                    *acc += imp;
                }
            }

            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        debug!(
            n_trees = trees.len(),
            final_train_rmse = train_loss.last().copied().unwrap_or(f64::NAN),
            "Fitted gradient boosting"
        );

        self.trees = trees;
        self.feature_importances = importances;
        self.train_loss = train_loss;
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            predictions.scaled_add(self.config.learning_rate, &tree.predict(x)?);
        }
        Ok(predictions)
    }

    fn n_features(&self) -> Option<usize> {
        if self.trees.is_empty() { None } else { Some(self.n_features) }
    }
}
