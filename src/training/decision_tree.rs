//! Regression tree with squared-error splits

use crate::error::{PipelineError, Result};
use super::models::{check_fit_input, check_predict_input, Regressor};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        /// Reduction in summed squared error achieved by this split
        gain: f64,
    },
}

/// Number of features examined at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum MaxFeatures {
    /// Square root of total features
    Sqrt,
    /// Log2 of total features
    Log2,
    /// Fixed fraction of features
    Fraction(f64),
    /// Fixed number of features
    Fixed(usize),
    /// All features
    #[default]
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count in `1..=n_features`.
    pub fn resolve(&self, n_features: usize) -> usize {
        if n_features == 0 {
            return 0;
        }
        let n = n_features as f64;
        let k = match *self {
            MaxFeatures::Sqrt => n.sqrt() as usize,
            MaxFeatures::Log2 => n.log2() as usize,
            MaxFeatures::Fraction(f) => (n * f) as usize,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features)
    }
}

/// Best split found for one node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth, `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Maximum features to consider
    pub max_features: MaxFeatures,
    /// Seed for per-node feature sampling
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let leaf = || TreeNode::Leaf {
            value: mean_of(y, indices),
            n_samples,
        };

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(y, indices);
        if should_stop {
            return leaf();
        }

        let Some(split) = self.find_best_split(x, y, indices, rng) else {
            return leaf();
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

        importances[split.feature_idx] += split.gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng, importances));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng, importances));

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            gain: split.gain,
        }
    }

    /// Scan a random subset of features (all of them by default) for the split
    /// with the largest squared-error reduction. Features are visited in
    /// ascending index order and only a strictly larger gain replaces the
    /// current best, so ties go to the lowest feature index and threshold.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        if indices.len() < 2 {
            return None;
        }
        let n_features = x.ncols();
        let k = self.max_features.resolve(n_features);
        let features: Vec<usize> = if k < n_features {
            let mut sampled = index::sample(rng, n_features, k).into_vec();
            sampled.sort_unstable();
            sampled
        } else {
            (0..n_features).collect()
        };

        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let parent_term = total_sum * total_sum / n;

        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(indices.len());

        for feature_idx in features {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (x[[i, feature_idx]], y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for pos in 0..pairs.len() - 1 {
                left_sum += pairs[pos].1;
                let left_count = pos + 1;
                let right_count = pairs.len() - left_count;

                if pairs[pos].0 == pairs[pos + 1].0 {
                    continue;
                }
                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                // SSE(parent) - SSE(left) - SSE(right), with the squared terms cancelled
                let gain = left_sum * left_sum / left_count as f64
                    + right_sum * right_sum / right_count as f64
                    - parent_term;

                if gain > best.map_or(0.0, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold: midpoint(pairs[pos].0, pairs[pos + 1].0),
                        gain,
                    });
                }
            }
        }

        best
    }

    fn predict_sample(&self, node: &TreeNode, sample: &ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                if sample[*feature_idx] <= *threshold {
                    self.predict_sample(left, sample)
                } else {
                    self.predict_sample(right, sample)
                }
            }
        }
    }

    /// Normalized squared-error reduction per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of split levels; a single leaf has depth 0
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Get number of leaves
    pub fn n_leaves(&self) -> usize {
        fn count_leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
            }
        }
        self.root.as_ref().map_or(0, count_leaves)
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;

        let n_features = x.ncols();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let mut importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..x.nrows()).collect();
        let root = self.build_tree(x, y, &indices, 0, &mut rng, &mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        self.root = Some(root);
        self.n_features = n_features;
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        check_predict_input(x, self.n_features)?;

        Ok(x.rows()
            .into_iter()
            .map(|row| self.predict_sample(root, &row))
            .collect())
    }

    fn n_features(&self) -> Option<usize> {
        self.root.as_ref().map(|_| self.n_features)
    }
}

fn mean_of(y: &Array1<f64>, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    match indices.split_first() {
        None => true,
        Some((&first, rest)) => rest.iter().all(|&i| y[i] == y[first]),
    }
}

/// Threshold halfway between two adjacent distinct values. Falls back to the
/// lower value when the midpoint rounds up onto the upper one.
fn midpoint(lower: f64, upper: f64) -> f64 {
    let mid = lower / 2.0 + upper / 2.0;
    if mid >= upper || !mid.is_finite() {
        lower
    } else {
        mid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_step_function_exactly() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![0.0, 0.0, 0.0, 10.0, 10.0, 10.0];

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.predict(&array![[3.4], [3.6]]).unwrap(), array![0.0, 10.0]);
    }

    #[test]
    fn test_unlimited_depth_memorizes_distinct_rows() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![3.0, -1.0, 4.0, 1.0, 5.0];

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

        let mut tree = DecisionTreeRegressor::new().with_max_depth(Some(2));
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 2);
        assert!(tree.n_leaves() <= 4);

        let mut stump = DecisionTreeRegressor::new().with_max_depth(Some(0));
        stump.fit(&x, &y).unwrap();
        assert_eq!(stump.predict(&array![[100.0]]).unwrap()[0], 4.5);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 0.0, 0.0, 100.0];

        let mut tree = DecisionTreeRegressor::new().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();
        // The 3|1 split is forbidden, so the only split is 2|2.
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(&array![[4.0]]).unwrap()[0], 50.0);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert_eq!(importances[0], 1.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_seeded_feature_sampling_is_reproducible() {
        let x = Array2::from_shape_fn((40, 6), |(i, j)| ((i * (j + 3)) % 11) as f64);
        let y = Array1::from_shape_fn(40, |i| (i % 7) as f64);

        let fit = |seed| {
            let mut tree = DecisionTreeRegressor::new()
                .with_max_features(MaxFeatures::Sqrt)
                .with_random_state(seed);
            tree.fit(&x, &y).unwrap();
            tree.predict(&x).unwrap()
        };
        assert_eq!(fit(5), fit(5));
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(10), 3);
        assert_eq!(MaxFeatures::Log2.resolve(10), 3);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(10), 5);
        assert_eq!(MaxFeatures::Fraction(0.01).resolve(10), 1);
        assert_eq!(MaxFeatures::Fixed(50).resolve(10), 10);
        assert_eq!(MaxFeatures::All.resolve(10), 10);
    }

    #[test]
    fn test_predict_shape_checked() {
        let x = array![[1.0, 2.0], [2.0, 1.0]];
        let y = array![1.0, 2.0];
        let mut tree = DecisionTreeRegressor::new();
        tree.fit(&x, &y).unwrap();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }
}
