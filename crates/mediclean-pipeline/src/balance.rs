//! Class balancing by synthetic minority oversampling (SMOTE)
//!
//! Each synthetic row lies on the segment between a randomly chosen minority
//! row and one of its nearest minority neighbours. Synthetic rows are
//! appended after the original rows.

use crate::config::SmoteConfig;
use mediclean_core::{Error, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Features and labels with equal class counts
#[derive(Debug, Clone)]
pub struct BalancedDataset {
    pub features: Array2<f64>,
    pub labels: Array1<u8>,

    /// Rows appended by oversampling
    pub synthetic: usize,
}

impl BalancedDataset {
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Count of label 0 and label 1
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.labels)
    }
}

/// Synthetic minority oversampler
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    pub fn from_config(config: &SmoteConfig) -> Self {
        Self::new(config.k_neighbors, config.seed)
    }

    /// Oversample the minority class until both classes have the same count
    pub fn fit_resample(
        &self,
        features: &Array2<f64>,
        labels: &Array1<u8>,
    ) -> Result<BalancedDataset> {
        if features.nrows() != labels.len() {
            return Err(Error::data(format!(
                "feature matrix has {} rows but there are {} labels",
                features.nrows(),
                labels.len()
            )));
        }

        let counts = class_counts(labels);
        if let Some(empty) = counts.iter().position(|&c| c == 0) {
            return Err(Error::imbalance(format!(
                "insufficient minority samples: class {} has no members",
                empty
            )));
        }

        if counts[0] == counts[1] {
            debug!("Classes already balanced; skipping oversampling");
            return Ok(BalancedDataset {
                features: features.clone(),
                labels: labels.clone(),
                synthetic: 0,
            });
        }

        let minority_label: u8 = if counts[0] < counts[1] { 0 } else { 1 };
        let minority_count = counts[minority_label as usize];
        let deficit = counts[1 - minority_label as usize] - minority_count;

        if minority_count < 2 {
            return Err(Error::imbalance(format!(
                "insufficient minority samples: class {} has {} member, \
                 at least 2 are needed to interpolate",
                minority_label, minority_count
            )));
        }

        let k = self.k_neighbors.min(minority_count - 1);
        if k < self.k_neighbors {
            debug!(
                requested = self.k_neighbors,
                effective = k,
                "Reduced neighbour count to fit the minority class"
            );
        }

        let minority: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == minority_label)
            .map(|(i, _)| i)
            .collect();

        let neighbors: Vec<Vec<usize>> = minority
            .iter()
            .map(|&i| nearest_neighbors(features, &minority, i, k))
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut synthetic = Array2::zeros((deficit, features.ncols()));
        for mut row in synthetic.rows_mut() {
            let pick = rng.gen_range(0..minority.len() * k);
            let base = features.row(minority[pick / k]);
            let neighbor = features.row(neighbors[pick / k][pick % k]);
            let gap: f64 = rng.gen();

            row.assign(&(&base + &((&neighbor - &base) * gap)));
        }

        let features = concatenate(Axis(0), &[features.view(), synthetic.view()])
            .map_err(|e| Error::imbalance(format!("failed to append synthetic rows: {}", e)))?;
        let labels: Array1<u8> = labels
            .iter()
            .copied()
            .chain(std::iter::repeat(minority_label).take(deficit))
            .collect();

        info!(
            minority_label,
            synthetic = deficit,
            k_neighbors = k,
            total = labels.len(),
            "Balanced classes with SMOTE"
        );

        Ok(BalancedDataset {
            features,
            labels,
            synthetic: deficit,
        })
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::from_config(&SmoteConfig::default())
    }
}

fn class_counts(labels: &Array1<u8>) -> [usize; 2] {
    let ones = labels.iter().filter(|&&l| l == 1).count();
    [labels.len() - ones, ones]
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// The `k` minority rows closest to `target`, excluding itself; ties go to the lower index
fn nearest_neighbors(
    features: &Array2<f64>,
    minority: &[usize],
    target: usize,
    k: usize,
) -> Vec<usize> {
    let anchor = features.row(target);
    let mut candidates: Vec<(f64, usize)> = minority
        .iter()
        .filter(|&&j| j != target)
        .map(|&j| (squared_distance(anchor, features.row(j)), j))
        .collect();

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    candidates.into_iter().take(k).map(|(_, j)| j).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn imbalanced() -> (Array2<f64>, Array1<u8>) {
        let features = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [0.2, 0.2],
            [0.3, 0.1],
            [1.0, 1.0],
            [1.0, 0.9],
            [0.9, 1.0],
        ];
        let labels = array![0, 0, 0, 0, 0, 1, 1, 1];
        (features, labels)
    }

    #[test]
    fn test_balances_class_counts() {
        let (features, labels) = imbalanced();
        let balanced = Smote::default().fit_resample(&features, &labels).unwrap();

        assert_eq!(balanced.class_counts(), [5, 5]);
        assert_eq!(balanced.synthetic, 2);
        assert_eq!(balanced.features.nrows(), 10);
        assert_eq!(balanced.features.slice(ndarray::s![..8, ..]), features);
    }

    #[test]
    fn test_synthetic_rows_lie_within_minority_hull() {
        let (features, labels) = imbalanced();
        let balanced = Smote::new(2, 7).fit_resample(&features, &labels).unwrap();

        for row in balanced.features.slice(ndarray::s![8.., ..]).rows() {
            assert!(row.iter().all(|&v| (0.9..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_resampling_is_seeded() {
        let (features, labels) = imbalanced();
        let first = Smote::default().fit_resample(&features, &labels).unwrap();
        let second = Smote::default().fit_resample(&features, &labels).unwrap();
        assert_eq!(first.features, second.features);
    }

    #[test]
    fn test_balanced_input_is_unchanged() {
        let features = array![[0.0], [1.0]];
        let labels = array![0, 1];
        let balanced = Smote::default().fit_resample(&features, &labels).unwrap();
        assert_eq!(balanced.synthetic, 0);
        assert_eq!(balanced.features, features);
    }

    #[test]
    fn test_missing_class_is_imbalance_error() {
        let features = array![[0.0], [1.0], [2.0]];
        let labels = array![0, 0, 0];
        let err = Smote::default().fit_resample(&features, &labels).unwrap_err();
        assert_eq!(err.kind(), "imbalance_error");
        assert!(err.to_string().contains("insufficient minority samples"));
    }

    #[test]
    fn test_single_minority_sample_is_imbalance_error() {
        let features = array![[0.0], [1.0], [2.0]];
        let labels = array![0, 0, 1];
        let err = Smote::default().fit_resample(&features, &labels).unwrap_err();
        assert_eq!(err.kind(), "imbalance_error");
    }
}
