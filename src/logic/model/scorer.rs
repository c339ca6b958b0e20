//! Scorer capability
//!
//! One trait, two implementations: the learned sequence classifier and
//! the deterministic formula. The service picks one at startup.

use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::PredictorResult;
use crate::logic::features::FeatureVector;
use crate::logic::risk::{RiskClass, RISK_CLASS_COUNT};

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Learned sequence classifier
    Lstm,
    /// Hours/meetings formula
    Formula,
}

impl ScorerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScorerKind::Lstm => "lstm",
            ScorerKind::Formula => "formula",
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single snapshot carries no history, so the trend is always stable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    #[default]
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0..=100
    pub score: u8,
    /// Probability of the arg-max class
    pub confidence: f32,
    pub probabilities: [f32; RISK_CLASS_COUNT],
    pub trend: Trend,
    pub method: ScorerKind,
}

impl PredictionResult {
    /// Status bucket for the score
    pub fn status(&self) -> RiskClass {
        RiskClass::from_score(self.score)
    }
}

// ============================================================================
// TRAIT
// ============================================================================

pub trait Scorer: Send + Sync {
    fn kind(&self) -> ScorerKind;

    /// Score one observation, drawing any randomness from `rng`
    fn predict_with(&self, features: &FeatureVector, rng: &mut dyn RngCore) -> PredictorResult<PredictionResult>;

    /// Parameters of the underlying model (0 for the formula)
    fn param_count(&self) -> usize {
        0
    }

    fn predict(&self, features: &FeatureVector) -> PredictorResult<PredictionResult> {
        self.predict_with(features, &mut StdRng::from_entropy())
    }

    /// Reproducible prediction
    fn predict_seeded(&self, features: &FeatureVector, seed: u64) -> PredictorResult<PredictionResult> {
        self.predict_with(features, &mut StdRng::seed_from_u64(seed))
    }
}
