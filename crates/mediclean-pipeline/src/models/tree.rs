//! CART decision tree for binary classification (Gini impurity)

use mediclean_core::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Decision tree configuration
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Non-constant features to examine per split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Tree node
#[derive(Debug, Clone)]
pub enum TreeNode {
    Leaf {
        /// Fraction of label 1 among the node's samples
        positive_rate: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct BestSplit {
    feature_idx: usize,
    threshold: f64,
    score: f64,
}

/// Binary classification tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
    n_features: usize,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_features: 0,
        }
    }

    /// Grow the tree on the rows listed in `indices` (duplicates allowed)
    pub fn fit_indices(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<u8>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        if indices.is_empty() {
            return Err(Error::model("cannot grow a tree from zero samples"));
        }
        if x.nrows() != y.len() {
            return Err(Error::model(format!(
                "{} feature rows for {} labels",
                x.nrows(),
                y.len()
            )));
        }

        self.n_features = x.ncols();
        self.root = Some(self.build(x, y, indices, 0, rng));
        Ok(())
    }

    /// Probability of label 1 for one sample
    pub fn predict_proba_one(&self, sample: ArrayView1<f64>) -> Result<f64> {
        let mut node = self
            .root
            .as_ref()
            .ok_or_else(|| Error::model("decision tree has not been fitted"))?;

        loop {
            match node {
                TreeNode::Leaf { positive_rate, .. } => return Ok(*positive_rate),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<u8>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let positives = indices.iter().filter(|&&i| y[i] == 1).count();

        let leaf = TreeNode::Leaf {
            positive_rate: positives as f64 / n as f64,
            n_samples: n,
        };

        if positives == 0
            || positives == n
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
            || self.config.max_depth.is_some_and(|d| depth >= d)
        {
            return leaf;
        }

        let Some(best) = self.find_best_split(x, y, indices, rng) else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        let left = self.build(x, y, &left_idx, depth + 1, rng);
        let right = self.build(x, y, &right_idx, depth + 1, rng);

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Examine features in random order until `max_features` non-constant ones
    /// have been scored, continuing past that only while no valid split exists
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<u8>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let budget = self.config.max_features.unwrap_or(self.n_features).max(1);

        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0usize;
        let mut column: Vec<(f64, u8)> = Vec::with_capacity(indices.len());

        for feature_idx in features {
            if visited >= budget && best.is_some() {
                break;
            }

            column.clear();
            column.extend(indices.iter().map(|&i| (x[[i, feature_idx]], y[i])));

            let first = column[0].0;
            if column.iter().all(|&(v, _)| v == first) {
                continue;
            }
            visited += 1;

            if let Some(candidate) = self.best_threshold(&mut column, feature_idx) {
                if best.as_ref().map_or(true, |b| candidate.score < b.score) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Lowest weighted Gini impurity over all thresholds of one feature
    fn best_threshold(&self, column: &mut [(f64, u8)], feature_idx: usize) -> Option<BestSplit> {
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = column.len();
        let total_pos = column.iter().filter(|(_, l)| *l == 1).count();
        let min_leaf = self.config.min_samples_leaf;

        let mut left_pos = 0usize;
        let mut best: Option<BestSplit> = None;

        for split in 1..n {
            left_pos += usize::from(column[split - 1].1);

            let (prev, next) = (column[split - 1].0, column[split].0);
            if prev == next || split < min_leaf || n - split < min_leaf {
                continue;
            }

            let score =
                weighted_gini(left_pos, split) + weighted_gini(total_pos - left_pos, n - split);
            if best.as_ref().map_or(true, |b| score < b.score) {
                let mut threshold = prev + (next - prev) / 2.0;
                // Midpoint can round up to `next`; keep the split strict
                if threshold >= next {
                    threshold = prev;
                }
                best = Some(BestSplit {
                    feature_idx,
                    threshold,
                    score,
                });
            }
        }

        best
    }
}

/// Gini impurity scaled by node size: n * (1 - p^2 - q^2)
fn weighted_gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    n as f64 * 2.0 * p * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_separable_data_gives_pure_leaves() {
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [10.0, 5.0], [11.0, 5.0]];
        let y = array![0, 0, 0, 1, 1];
        let mut tree = DecisionTree::new(TreeConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        tree.fit_indices(&x, &y, &[0, 1, 2, 3, 4], &mut rng).unwrap();

        let root = tree.root().unwrap();
        assert_eq!(root.depth(), 2);
        assert_eq!(root.n_leaves(), 2);
        assert_eq!(tree.predict_proba_one(array![1.5, 5.0].view()).unwrap(), 0.0);
        assert_eq!(tree.predict_proba_one(array![9.0, 5.0].view()).unwrap(), 1.0);
    }

    #[test]
    fn test_constant_features_yield_a_leaf() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = array![0, 1, 1];
        let mut tree = DecisionTree::new(TreeConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        tree.fit_indices(&x, &y, &[0, 1, 2], &mut rng).unwrap();

        let p = tree.predict_proba_one(array![1.0].view()).unwrap();
        assert!((p - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0, 1, 0, 1];
        let config = TreeConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        let mut tree = DecisionTree::new(config);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        tree.fit_indices(&x, &y, &[0, 1, 2, 3], &mut rng).unwrap();
        assert_eq!(tree.root().unwrap().depth(), 2);
    }

    #[test]
    fn test_unfitted_tree_errors() {
        let tree = DecisionTree::new(TreeConfig::default());
        assert!(tree.predict_proba_one(array![0.0].view()).is_err());
    }
}
