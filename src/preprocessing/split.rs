//! Seeded train/test splitting

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of the two splits, each in permutation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Partition `n_samples` rows into disjoint train and test sets.
///
/// The test set holds `ceil(test_size * n_samples)` rows. Rows are drawn from
/// a ChaCha8 permutation seeded with `seed`, so identical inputs always give
/// identical membership and order.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::Config(format!(
            "test_size must lie strictly between 0 and 1, got {}",
            test_size
        )));
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::Config(format!(
            "test_size {} on {} rows leaves an empty split (train = {}, test = {})",
            test_size, n_samples, n_train, n_test
        )));
    }

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train_indices = permutation.split_off(n_test);
    Ok(TrainTestSplit {
        train_indices,
        test_indices: permutation,
    })
}

/// Select rows of `df` in the given order.
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sizes() {
        let split = train_test_split(100, 0.2, 42).unwrap();
        assert_eq!(split.train_indices.len(), 80);
        assert_eq!(split.test_indices.len(), 20);

        // ceil rounding
        let split = train_test_split(10, 0.25, 0).unwrap();
        assert_eq!(split.test_indices.len(), 3);
        assert_eq!(split.train_indices.len(), 7);
    }

    #[test]
    fn test_disjoint_and_complete() {
        let split = train_test_split(57, 0.3, 7).unwrap();
        let train: HashSet<usize> = split.train_indices.iter().copied().collect();
        let test: HashSet<usize> = split.test_indices.iter().copied().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 57);
        assert!(train.union(&test).all(|&i| i < 57));
    }

    #[test]
    fn test_deterministic() {
        let a = train_test_split(200, 0.2, 123).unwrap();
        let b = train_test_split(200, 0.2, 123).unwrap();
        let c = train_test_split(200, 0.2, 124).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_split_rejected() {
        assert!(train_test_split(1, 0.5, 0).unwrap_err().is_configuration_error());
        assert!(train_test_split(10, 1.0, 0).unwrap_err().is_configuration_error());
        assert!(train_test_split(10, 0.0, 0).unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_take_rows() {
        let df = df!("a" => &[10.0, 11.0, 12.0, 13.0]).unwrap();
        let taken = take_rows(&df, &[3, 0]).unwrap();
        let values: Vec<Option<f64>> = taken.column("a").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(13.0), Some(10.0)]);
    }
}
