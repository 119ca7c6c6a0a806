//! Trains both classifiers on one split and predicts the held-out rows

use crate::balance::BalancedDataset;
use crate::config::PipelineConfig;
use crate::models::{BinaryClassifier, RandomForest, SupportVectorClassifier};
use crate::split::{train_test_split, TrainTestSplit};
use mediclean_core::Result;
use std::time::Instant;
use tracing::info;

/// Test truth and each classifier's predictions for it
#[derive(Debug, Clone)]
pub struct DualPredictions {
    pub y_test: Vec<u8>,

    /// Random forest predictions
    pub classifier_a: Vec<u8>,

    /// Support vector predictions
    pub classifier_b: Vec<u8>,
}

/// Fits classifier A and classifier B on the same training split
pub struct DualTrainer {
    classifier_a: Box<dyn BinaryClassifier>,
    classifier_b: Box<dyn BinaryClassifier>,
    test_ratio: f64,
    seed: u64,
}

impl DualTrainer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_classifiers(
            Box::new(RandomForest::new(config.forest.clone())),
            Box::new(SupportVectorClassifier::new(config.svm.clone())),
            config.test_ratio,
            config.seed,
        )
    }

    pub fn with_classifiers(
        classifier_a: Box<dyn BinaryClassifier>,
        classifier_b: Box<dyn BinaryClassifier>,
        test_ratio: f64,
        seed: u64,
    ) -> Self {
        Self {
            classifier_a,
            classifier_b,
            test_ratio,
            seed,
        }
    }

    /// Split, fit both classifiers, and predict the test rows
    pub fn train_and_predict(&mut self, dataset: &BalancedDataset) -> Result<DualPredictions> {
        let split =
            train_test_split(&dataset.features, &dataset.labels, self.test_ratio, self.seed)?;
        info!(
            train = split.y_train.len(),
            test = split.y_test.len(),
            "Training classifiers"
        );

        let classifier_a = fit_predict(self.classifier_a.as_mut(), &split)?;
        let classifier_b = fit_predict(self.classifier_b.as_mut(), &split)?;

        Ok(DualPredictions {
            y_test: split.y_test.to_vec(),
            classifier_a,
            classifier_b,
        })
    }
}

fn fit_predict(classifier: &mut dyn BinaryClassifier, split: &TrainTestSplit) -> Result<Vec<u8>> {
    let start = Instant::now();
    classifier.fit(&split.x_train, &split.y_train)?;
    let predicted = classifier.predict(&split.x_test)?;
    info!(
        classifier = classifier.name(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Trained classifier"
    );
    Ok(predicted.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;
    use ndarray::{Array1, Array2};

    fn dataset() -> BalancedDataset {
        let features = Array2::from_shape_fn((20, 2), |(i, j)| {
            let base = if i < 10 { 0.0 } else { 1.0 };
            base + 0.01 * ((i * 3 + j) % 5) as f64
        });
        let labels: Array1<u8> = (0..20).map(|i| u8::from(i >= 10)).collect();
        BalancedDataset {
            features,
            labels,
            synthetic: 0,
        }
    }

    #[test]
    fn test_predictions_cover_test_split() {
        let config = PipelineConfig {
            forest: ForestConfig {
                n_trees: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let predictions = DualTrainer::new(&config).train_and_predict(&dataset()).unwrap();

        assert_eq!(predictions.y_test.len(), 4);
        assert_eq!(predictions.classifier_a.len(), 4);
        assert_eq!(predictions.classifier_b.len(), 4);
        assert_eq!(predictions.classifier_a, predictions.y_test);
        assert_eq!(predictions.classifier_b, predictions.y_test);
    }

    #[test]
    fn test_single_class_training_split_is_model_error() {
        let data = BalancedDataset {
            features: Array2::zeros((5, 2)),
            labels: Array1::zeros(5),
            synthetic: 0,
        };
        let err = DualTrainer::new(&PipelineConfig::default())
            .train_and_predict(&data)
            .unwrap_err();
        assert_eq!(err.kind(), "model_error");
    }
}
