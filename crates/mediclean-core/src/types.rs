//! Result types shared by the pipeline and its transport

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Completion message returned with every successful run
pub const COMPLETION_MESSAGE: &str = "Files processed.";

/// A recorded snapshot of the record table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// File name, also the download key
    pub name: String,

    /// Where the snapshot was written
    pub path: PathBuf,
}

/// One named metric value, rounded for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub name: String,
    pub value: f64,
}

impl MetricEntry {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Binary confusion matrix with label 0 as negative and label 1 as positive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tp: u64,
}

impl ConfusionMatrix {
    /// Count outcomes of paired truth and prediction labels
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::model(format!(
                "{} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut matrix = Self::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth == 1, pred == 1) {
                (false, false) => matrix.tn += 1,
                (false, true) => matrix.fp += 1,
                (true, false) => matrix.fn_ += 1,
                (true, true) => matrix.tp += 1,
            }
        }
        Ok(matrix)
    }

    /// Number of predictions counted
    pub fn total(&self) -> u64 {
        self.tn + self.fp + self.fn_ + self.tp
    }
}

/// Metrics for both classifiers of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Bagged decision-tree ensemble
    pub classifier_a: Vec<MetricEntry>,

    /// Kernel margin classifier
    pub classifier_b: Vec<MetricEntry>,

    /// Computed from classifier B's predictions only
    pub confusion_matrix: ConfusionMatrix,
}

/// Everything a run hands back to its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub message: String,

    /// Artifacts in recording order
    pub generated_files: Vec<Artifact>,

    #[serde(rename = "randomForestData")]
    pub classifier_a_metrics: Vec<MetricEntry>,

    #[serde(rename = "svmData")]
    pub classifier_b_metrics: Vec<MetricEntry>,

    #[serde(rename = "confusionMatrixData")]
    pub confusion_matrix: ConfusionMatrix,
}

impl PipelineResult {
    pub fn new(generated_files: Vec<Artifact>, report: MetricsReport) -> Self {
        Self {
            message: COMPLETION_MESSAGE.to_string(),
            generated_files,
            classifier_a_metrics: report.classifier_a,
            classifier_b_metrics: report.classifier_b,
            confusion_matrix: report.confusion_matrix,
        }
    }
}
