//! Seeded train/test split

use mediclean_core::{Error, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Row indices of each side of a split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Materialized train and test partitions
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array1<u8>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<u8>,
    pub indices: SplitIndices,
}

/// Shuffle `n` row indices with `seed` and hold out `ceil(test_ratio * n)` of them
pub fn split_indices(n: usize, test_ratio: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(Error::config(format!(
            "test_ratio must be in (0, 1), got {}",
            test_ratio
        )));
    }

    let n_test = (test_ratio * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::model(format!(
            "cannot split {} samples with test ratio {}: both sides need at least one sample",
            n, test_ratio
        )));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: permutation,
    })
}

/// Split features and labels into train and test partitions
pub fn train_test_split(
    features: &Array2<f64>,
    labels: &Array1<u8>,
    test_ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if features.nrows() != labels.len() {
        return Err(Error::data(format!(
            "feature matrix has {} rows but there are {} labels",
            features.nrows(),
            labels.len()
        )));
    }

    let indices = split_indices(labels.len(), test_ratio, seed)?;
    debug!(
        train = indices.train.len(),
        test = indices.test.len(),
        seed,
        "Split dataset"
    );

    Ok(TrainTestSplit {
        x_train: features.select(Axis(0), &indices.train),
        y_train: labels.select(Axis(0), &indices.train),
        x_test: features.select(Axis(0), &indices.test),
        y_test: labels.select(Axis(0), &indices.test),
        indices,
    })
}
