//! Random forest classifier (classifier A)

use super::tree::{DecisionTree, TreeConfig};
use super::{check_training_set, check_width, BinaryClassifier};
use crate::config::ForestConfig;
use mediclean_core::{Error, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

/// Bagged ensemble of Gini trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl BinaryClassifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<()> {
        check_training_set(x, y, self.name())?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features.max(1));

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(max_features),
        };

        // Build trees in parallel; each owns its seeded stream
        let trees: Result<Vec<DecisionTree>> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(i as u64));

                let indices: Vec<usize> = if self.config.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new(tree_config.clone());
                tree.fit_indices(x, y, &indices, &mut rng)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        self.n_features = n_features;

        debug!(
            trees = self.trees.len(),
            max_features,
            samples = n_samples,
            "Fitted random forest"
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        // Majority of averaged probabilities; an exact tie goes to label 0
        Ok(self.predict_proba(x)?.mapv(|p| u8::from(p > 0.5)))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(Error::model("random forest has not been fitted"));
        }
        check_width(x, self.n_features, self.name())?;

        let n_trees = self.trees.len() as f64;
        x.outer_iter()
            .map(|sample| {
                let total = self
                    .trees
                    .iter()
                    .map(|tree| tree.predict_proba_one(sample.view()))
                    .sum::<Result<f64>>()?;
                Ok(total / n_trees)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
