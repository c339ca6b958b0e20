//! Learned Scorer - the trained sequence classifier behind `Scorer`
//!
//! One observation becomes a 30-day pseudo-history by jittering it, the
//! history is scaled, and the arg-max class is turned into a score.

use parking_lot::Mutex;
use rand::RngCore;

use super::network::SequenceClassifier;
use super::scaler::FeatureScaler;
use super::scorer::{PredictionResult, Scorer, ScorerKind, Trend};
use crate::error::{PredictorError, PredictorResult};
use crate::logic::features::{FeatureVector, Sequence};
use crate::logic::risk::score_from_probabilities;

/// Inference handle shared across threads.
///
/// burn modules are `Send` but not `Sync`, so forward passes take turns on
/// the mutex. The weights never change after construction.
#[derive(Debug)]
pub struct LearnedScorer {
    network: Mutex<SequenceClassifier>,
    param_count: usize,
    scaler: FeatureScaler,
    jitter_std: f32,
}

impl LearnedScorer {
    pub fn new(network: SequenceClassifier, scaler: FeatureScaler, jitter_std: f32) -> Self {
        Self {
            param_count: network.param_count(),
            network: Mutex::new(network),
            scaler,
            jitter_std,
        }
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }
}

impl Scorer for LearnedScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Lstm
    }

    fn predict_with(&self, features: &FeatureVector, rng: &mut dyn RngCore) -> PredictorResult<PredictionResult> {
        let network = self.network.lock();
        predict_sequence(&network, &self.scaler, self.jitter_std, features, rng)
    }

    fn param_count(&self) -> usize {
        self.param_count
    }
}

/// Jitter, scale, classify and score one observation
pub(crate) fn predict_sequence(
    network: &SequenceClassifier,
    scaler: &FeatureScaler,
    jitter_std: f32,
    features: &FeatureVector,
    rng: &mut dyn RngCore,
) -> PredictorResult<PredictionResult> {
    features.validate()?;

    let history = Sequence::jittered(features, jitter_std, rng)?;
    let scaled = scaler.transform(&history);
    let probabilities = network
        .predict_proba(&[scaled])?
        .into_iter()
        .next()
        .ok_or_else(|| PredictorError::ShapeMismatch("classifier returned no output".into()))?;

    let (class, confidence, score) = score_from_probabilities(&probabilities);
    log::debug!("Learned scorer: class={} confidence={:.3} score={}", class, confidence, score);

    Ok(PredictionResult {
        score,
        confidence,
        probabilities,
        trend: Trend::Stable,
        method: ScorerKind::Lstm,
    })
}
