//! Per-class precision, recall and F1 plus accuracy

use mediclean_core::{ConfusionMatrix, Error, MetricEntry, MetricsReport, Result};

/// Classification metrics for labels {0, 1}
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationReport {
    pub precision: [f64; 2],
    pub recall: [f64; 2],
    pub f1: [f64; 2],
    pub accuracy: f64,
}

impl ClassificationReport {
    /// Compute unrounded metrics; any 0/0 ratio is reported as 0
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::model(format!(
                "{} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut precision = [0.0; 2];
        let mut recall = [0.0; 2];
        let mut f1 = [0.0; 2];

        for label in 0..2u8 {
            let mut tp = 0usize;
            let mut predicted = 0usize;
            let mut actual = 0usize;
            for (&t, &p) in y_true.iter().zip(y_pred) {
                tp += usize::from(t == label && p == label);
                predicted += usize::from(p == label);
                actual += usize::from(t == label);
            }

            let i = label as usize;
            precision[i] = ratio(tp as f64, predicted as f64);
            recall[i] = ratio(tp as f64, actual as f64);
            f1[i] = ratio(2.0 * precision[i] * recall[i], precision[i] + recall[i]);
        }

        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
        let accuracy = ratio(correct as f64, y_true.len() as f64);

        Ok(Self {
            precision,
            recall,
            f1,
            accuracy,
        })
    }

    /// Display entries rounded to two decimals
    pub fn entries(&self) -> Vec<MetricEntry> {
        let mut entries = Vec::with_capacity(7);
        for label in 0..2 {
            entries.push(MetricEntry::new(
                format!("Precision {}", label),
                round2(self.precision[label]),
            ));
            entries.push(MetricEntry::new(format!("Recall {}", label), round2(self.recall[label])));
            entries.push(MetricEntry::new(format!("F1 {}", label), round2(self.f1[label])));
        }
        entries.push(MetricEntry::new("Accuracy", round2(self.accuracy)));
        entries
    }
}

/// Assemble the report for both classifiers; the confusion matrix covers B only
pub fn build_report(y_test: &[u8], pred_a: &[u8], pred_b: &[u8]) -> Result<MetricsReport> {
    Ok(MetricsReport {
        classifier_a: ClassificationReport::compute(y_test, pred_a)?.entries(),
        classifier_b: ClassificationReport::compute(y_test, pred_b)?.entries(),
        confusion_matrix: ConfusionMatrix::from_predictions(y_test, pred_b)?,
    })
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(entries: &[MetricEntry], name: &str) -> f64 {
        entries.iter().find(|e| e.name == name).unwrap().value
    }

    #[test]
    fn test_all_zero_predictions() {
        let y_true: Vec<u8> = [0; 10].iter().chain(&[1; 10]).copied().collect();
        let y_pred = vec![0u8; 20];
        let entries = ClassificationReport::compute(&y_true, &y_pred).unwrap().entries();

        assert_eq!(value(&entries, "Recall 1"), 0.0);
        assert_eq!(value(&entries, "Precision 1"), 0.0);
        assert_eq!(value(&entries, "F1 1"), 0.0);
        assert_eq!(value(&entries, "Recall 0"), 1.0);
        assert_eq!(value(&entries, "Precision 0"), 0.5);
        assert_eq!(value(&entries, "Accuracy"), 0.5);
    }

    #[test]
    fn test_entry_order_and_names() {
        let entries = ClassificationReport::compute(&[0, 1], &[0, 1]).unwrap().entries();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["Precision 0", "Recall 0", "F1 0", "Precision 1", "Recall 1", "F1 1", "Accuracy"]
        );
        assert!(entries.iter().all(|e| e.value == 1.0));
    }

    #[test]
    fn test_values_round_to_two_decimals() {
        let report = ClassificationReport::compute(&[1, 1, 1, 0], &[1, 0, 0, 0]).unwrap();
        assert!((report.recall[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(value(&report.entries(), "Recall 1"), 0.33);
    }

    #[test]
    fn test_empty_split_reports_zero_accuracy() {
        let report = ClassificationReport::compute(&[], &[]).unwrap();
        assert_eq!(report.accuracy, 0.0);
    }

    #[test]
    fn test_confusion_matrix_uses_classifier_b() {
        let report = build_report(&[0, 1, 1], &[0, 1, 1], &[1, 1, 0]).unwrap();
        assert_eq!(report.confusion_matrix.tp, 1);
        assert_eq!(report.confusion_matrix.fp, 1);
        assert_eq!(report.confusion_matrix.fn_, 1);
        assert_eq!(report.confusion_matrix.total(), 3);
        assert_eq!(value(&report.classifier_a, "Accuracy"), 1.0);
    }

    #[test]
    fn test_length_mismatch_is_model_error() {
        let err = build_report(&[0, 1], &[0, 1], &[0]).unwrap_err();
        assert_eq!(err.kind(), "model_error");
    }
}
