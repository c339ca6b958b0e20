//! Classification metrics over softmax outputs and one-hot labels
//!
//! Precision and recall are micro-averaged over every output cell, with a
//! cell counted as predicted positive when its probability exceeds 0.5.

use serde::{Deserialize, Serialize};

use crate::logic::risk::{argmax, Label, RISK_CLASS_COUNT};

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` inside the log
pub const EPSILON: f32 = 1e-7;

const POSITIVE_THRESHOLD: f32 = 0.5;

pub type Probabilities = [f32; RISK_CLASS_COUNT];

/// Mean categorical cross-entropy; 0 for an empty batch
pub fn cross_entropy(probabilities: &[Probabilities], labels: &[Label]) -> f32 {
    if probabilities.is_empty() {
        return 0.0;
    }
    let total: f32 = probabilities
        .iter()
        .zip(labels.iter())
        .map(|(p, y)| {
            p.iter()
                .zip(y.0.iter())
                .map(|(p, y)| -y * p.clamp(EPSILON, 1.0 - EPSILON).ln())
                .sum::<f32>()
        })
        .sum();
    total / probabilities.len() as f32
}

/// Share of samples whose arg-max matches the label
pub fn accuracy(probabilities: &[Probabilities], labels: &[Label]) -> f32 {
    if probabilities.is_empty() {
        return 0.0;
    }
    let hits = probabilities
        .iter()
        .zip(labels.iter())
        .filter(|(p, y)| argmax(&p[..]) == argmax(&y.0[..]))
        .count();
    hits as f32 / probabilities.len() as f32
}

/// Micro-averaged (precision, recall) at the 0.5 threshold
pub fn precision_recall(probabilities: &[Probabilities], labels: &[Label]) -> (f32, f32) {
    let mut true_positive = 0usize;
    let mut predicted = 0usize;
    let mut actual = 0usize;

    for (p, y) in probabilities.iter().zip(labels.iter()) {
        for (p, y) in p.iter().zip(y.0.iter()) {
            let predicted_positive = *p > POSITIVE_THRESHOLD;
            let actual_positive = *y > POSITIVE_THRESHOLD;
            predicted += predicted_positive as usize;
            actual += actual_positive as usize;
            true_positive += (predicted_positive && actual_positive) as usize;
        }
    }

    let precision = if predicted > 0 { true_positive as f32 / predicted as f32 } else { 0.0 };
    let recall = if actual > 0 { true_positive as f32 / actual as f32 } else { 0.0 };
    (precision, recall)
}

/// Harmonic mean; 0 when both are 0
pub fn f1_score(precision: f32, recall: f32) -> f32 {
    if precision + recall <= 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Loss, accuracy, precision, recall and F1 for one labelled set
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub loss: f32,
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub samples: usize,
}

impl EvaluationReport {
    pub fn compute(probabilities: &[Probabilities], labels: &[Label]) -> Self {
        let (precision, recall) = precision_recall(probabilities, labels);
        Self {
            loss: cross_entropy(probabilities, labels),
            accuracy: accuracy(probabilities, labels),
            precision,
            recall,
            f1: f1_score(precision, recall),
            samples: probabilities.len(),
        }
    }
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Test Loss: {:.4}", self.loss)?;
        writeln!(f, "Test Accuracy: {:.4}", self.accuracy)?;
        writeln!(f, "Test Precision: {:.4}", self.precision)?;
        writeln!(f, "Test Recall: {:.4}", self.recall)?;
        write!(f, "Test F1-Score: {:.4}", self.f1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::risk::RiskClass;

    fn labels() -> Vec<Label> {
        vec![Label::one_hot(RiskClass::Healthy), Label::one_hot(RiskClass::Critical)]
    }

    #[test]
    fn test_perfect_predictions() {
        let probs = [[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]];
        let report = EvaluationReport::compute(&probs, &labels());

        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 1.0);
        assert_eq!(report.f1, 1.0);
        assert!(report.loss < 1e-5);
    }

    #[test]
    fn test_unconfident_predictions_have_zero_precision() {
        // Correct arg-max everywhere but nothing crosses 0.5
        let probs = [[0.4, 0.3, 0.2, 0.1], [0.1, 0.2, 0.3, 0.4]];
        let report = EvaluationReport::compute(&probs, &labels());

        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);
    }

    #[test]
    fn test_cross_entropy_uniform() {
        let probs = [[0.25; 4], [0.25; 4]];
        let loss = cross_entropy(&probs, &labels());
        assert!((loss - 4.0f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_half_right() {
        let probs = [[0.9, 0.1, 0.0, 0.0], [0.9, 0.1, 0.0, 0.0]];
        let (precision, recall) = precision_recall(&probs, &labels());
        assert_eq!(precision, 0.5);
        assert_eq!(recall, 0.5);
        assert_eq!(accuracy(&probs, &labels()), 0.5);
    }

    #[test]
    fn test_empty() {
        let report = EvaluationReport::compute(&[], &[]);
        assert_eq!(report, EvaluationReport::default());
    }
}
