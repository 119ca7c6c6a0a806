//! Binary classifiers trained on the balanced feature matrix

pub mod calibration;
pub mod forest;
mod kernel;
pub mod svm;
pub mod tree;

pub use calibration::PlattScaling;
pub use forest::RandomForest;
pub use svm::SupportVectorClassifier;
pub use tree::{DecisionTree, TreeConfig, TreeNode};

use mediclean_core::{Error, Result};
use ndarray::{Array1, Array2};

/// A classifier over labels {0, 1}
pub trait BinaryClassifier: Send + Sync {
    /// Train on features and labels
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<()>;

    /// Predict a label for each row
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>>;

    /// Probability of label 1 for each row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Reject mismatched inputs and single-class training sets
pub(crate) fn check_training_set(x: &Array2<f64>, y: &Array1<u8>, model: &str) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(Error::model(format!(
            "{}: {} feature rows for {} labels",
            model,
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 {
        return Err(Error::model(format!("{}: training split is empty", model)));
    }

    let positives = y.iter().filter(|&&l| l == 1).count();
    if positives == 0 || positives == y.len() {
        return Err(Error::model(format!(
            "{}: training split contains a single class",
            model
        )));
    }
    Ok(())
}

/// Reject prediction inputs whose width differs from training
pub(crate) fn check_width(x: &Array2<f64>, expected: usize, model: &str) -> Result<()> {
    if x.ncols() != expected {
        return Err(Error::model(format!(
            "{}: expected {} features, got {}",
            model,
            expected,
            x.ncols()
        )));
    }
    Ok(())
}
