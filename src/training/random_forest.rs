//! Random forest regression

use crate::error::{PipelineError, Result};
use super::decision_tree::{DecisionTreeRegressor, MaxFeatures};
use super::models::{check_fit_input, check_predict_input, Regressor};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    /// Individual trees
    trees: Vec<DecisionTreeRegressor>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features examined per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random state
    pub random_state: Option<u64>,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            random_state: None,
            feature_importances: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the per-tree importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.n_estimators == 0 {
            return Err(PipelineError::invalid_parameter(
                "n_estimators",
                self.n_estimators,
                "must be at least 1",
            ));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let base_seed = self.random_state.unwrap_or(0);

        // Each tree owns a generator derived from the base seed, so tree i is
        // the same no matter how many trees precede it.
        let mut trees = Vec::with_capacity(self.n_estimators);
        for tree_idx in 0..self.n_estimators {
            let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(self.max_depth)
                .with_min_samples_split(self.min_samples_split)
                .with_min_samples_leaf(self.min_samples_leaf)
                .with_max_features(self.max_features)
                .with_random_state(rng.next_u64());

            if self.bootstrap {
                let sample_indices: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = y.select(Axis(0), &sample_indices);
                tree.fit(&x_boot, &y_boot)?;
            } else {
                tree.fit(x, y)?;
            }

            trees.push(tree);
        }

        let mut importances = Array1::zeros(n_features);
        for tree in &trees {
            if let Some(imp) = tree.feature_importances() {
                importances += imp;
            }
        }
        importances /= trees.len() as f64;

        debug!(
            n_trees = trees.len(),
            mean_leaves = trees.iter().map(|t| t.n_leaves()).sum::<usize>() as f64 / trees.len() as f64,
            "Fitted random forest"
        );

        self.trees = trees;
        self.n_features = n_features;
        self.feature_importances = Some(importances);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut sum = Array1::zeros(x.nrows());
        for tree in &self.trees {
            sum += &tree.predict(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn n_features(&self) -> Option<usize> {
        if self.trees.is_empty() { None } else { Some(self.n_features) }
    }
}
