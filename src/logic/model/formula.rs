//! Formula Scorer - used when the learned backend is unavailable
//!
//! `score = clamp(round(hours * 10 + meetings * 5), 20, 90)`; probabilities
//! come from the band the score falls into. Deterministic.

use rand::RngCore;

use super::scorer::{PredictionResult, Scorer, ScorerKind, Trend};
use crate::error::PredictorResult;
use crate::logic::features::FeatureVector;
use crate::logic::risk::rules::{
    formula_band, FORMULA_HOURS_WEIGHT, FORMULA_MAX_SCORE, FORMULA_MEETINGS_WEIGHT, FORMULA_MIN_SCORE,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaScorer;

impl FormulaScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, features: &FeatureVector) -> u8 {
        let raw = features.hours_worked() * FORMULA_HOURS_WEIGHT + features.meetings_count() * FORMULA_MEETINGS_WEIGHT;
        // NaN clamps to the floor
        let rounded = if raw.is_finite() { raw.round() } else { f32::from(FORMULA_MIN_SCORE) };
        rounded.clamp(f32::from(FORMULA_MIN_SCORE), f32::from(FORMULA_MAX_SCORE)) as u8
    }

    pub fn evaluate(&self, features: &FeatureVector) -> PredictionResult {
        let score = self.score(features);
        let probabilities = formula_band(score);
        let confidence = probabilities.iter().cloned().fold(0.0f32, f32::max);

        PredictionResult {
            score,
            confidence,
            probabilities,
            trend: Trend::Stable,
            method: ScorerKind::Formula,
        }
    }
}

impl Scorer for FormulaScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Formula
    }

    fn predict_with(&self, features: &FeatureVector, _rng: &mut dyn RngCore) -> PredictorResult<PredictionResult> {
        Ok(self.evaluate(features))
    }
}
