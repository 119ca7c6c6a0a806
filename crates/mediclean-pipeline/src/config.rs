//! Configuration for the preparation and training pipeline
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields the reference configuration: 5000 TF-IDF terms, 80/20 split with
//! seed 42, SMOTE with five neighbours, and library-default classifiers.

use mediclean_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sentinel written into notes that are missing
pub const DEFAULT_NOTES_SENTINEL: &str = "No medical history available";

/// Top-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Replacement for missing notes
    #[serde(default = "default_sentinel")]
    pub notes_sentinel: String,

    /// Vocabulary bound for the feature extractor
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Fraction of the balanced dataset held out for testing
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,

    /// Seed for the train/test split
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Class balancer settings
    #[serde(default)]
    pub smote: SmoteConfig,

    /// Classifier A settings
    #[serde(default)]
    pub forest: ForestConfig,

    /// Classifier B settings
    #[serde(default)]
    pub svm: SvmConfig,
}

impl PipelineConfig {
    /// Reject values the stages cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(Error::config("max_features must be at least 1"));
        }
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(Error::config(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.smote.k_neighbors == 0 {
            return Err(Error::config("smote.k_neighbors must be at least 1"));
        }
        if self.forest.n_trees == 0 {
            return Err(Error::config("forest.n_trees must be at least 1"));
        }
        if self.forest.min_samples_split < 2 {
            return Err(Error::config("forest.min_samples_split must be at least 2"));
        }
        if self.forest.min_samples_leaf == 0 {
            return Err(Error::config("forest.min_samples_leaf must be at least 1"));
        }
        if self.svm.c <= 0.0 {
            return Err(Error::config("svm.c must be positive"));
        }
        if self.svm.tolerance <= 0.0 {
            return Err(Error::config("svm.tolerance must be positive"));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            notes_sentinel: default_sentinel(),
            max_features: default_max_features(),
            test_ratio: default_test_ratio(),
            seed: default_seed(),
            smote: SmoteConfig::default(),
            forest: ForestConfig::default(),
            svm: SvmConfig::default(),
        }
    }
}

/// Synthetic minority oversampling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoteConfig {
    /// Nearest minority neighbours to interpolate towards
    #[serde(default = "default_k_neighbors")]
    pub k_neighbors: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SmoteConfig {
    fn default() -> Self {
        Self {
            k_neighbors: default_k_neighbors(),
            seed: default_seed(),
        }
    }
}

/// Random forest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Maximum depth of each tree (None = grow until pure)
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Minimum samples to split
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    /// Minimum samples in leaf
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    /// Max features per split (ceil(sqrt(n_features)) if None)
    #[serde(default)]
    pub max_features: Option<usize>,

    /// Bootstrap sampling
    #[serde(default = "default_true")]
    pub bootstrap: bool,

    /// Base seed; tree `i` uses `seed + i`
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: None,
            bootstrap: true,
            seed: default_seed(),
        }
    }
}

/// Support vector classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmConfig {
    /// Soft-margin penalty
    #[serde(default = "default_c")]
    pub c: f64,

    /// RBF width; `None` means 1 / (n_features * Var(X))
    #[serde(default)]
    pub gamma: Option<f64>,

    /// Stopping tolerance on the KKT violation
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Upper bound on solver iterations
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Fit Platt scaling so the model can report probabilities
    #[serde(default = "default_true")]
    pub probability: bool,

    /// Folds used to produce out-of-sample decision values for calibration
    #[serde(default = "default_calibration_folds")]
    pub calibration_folds: usize,

    /// Memory budget for cached kernel rows, in MiB
    #[serde(default = "default_cache_size_mb")]
    pub cache_size_mb: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: default_c(),
            gamma: None,
            tolerance: default_tolerance(),
            max_iter: default_max_iter(),
            probability: true,
            calibration_folds: default_calibration_folds(),
            cache_size_mb: default_cache_size_mb(),
            seed: default_seed(),
        }
    }
}

fn default_sentinel() -> String {
    DEFAULT_NOTES_SENTINEL.to_string()
}

fn default_max_features() -> usize {
    5000
}

fn default_test_ratio() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_k_neighbors() -> usize {
    5
}

fn default_n_trees() -> usize {
    100
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_c() -> f64 {
    1.0
}

fn default_tolerance() -> f64 {
    1e-3
}

fn default_max_iter() -> usize {
    10_000_000
}

fn default_calibration_folds() -> usize {
    5
}

fn default_cache_size_mb() -> usize {
    200
}

fn default_true() -> bool {
    true
}
