//! Model Module - Burnout risk scorers
//!
//! The formula scorer is always available. The learned sequence classifier,
//! its trainer and its storage are compiled with the `lstm` feature.

pub mod artifact;
pub mod formula;
pub mod history;
pub mod lifecycle;
pub mod metrics;
pub mod scaler;
pub mod scorer;

#[cfg(feature = "lstm")]
pub mod learned;
#[cfg(feature = "lstm")]
pub mod network;
#[cfg(feature = "lstm")]
pub mod storage;
#[cfg(feature = "lstm")]
pub mod training;

#[cfg(all(test, feature = "lstm"))]
mod tests;

use std::sync::Arc;

pub use formula::FormulaScorer;
pub use history::TrainingHistory;
pub use lifecycle::ModelState;
pub use metrics::EvaluationReport;
pub use scaler::FeatureScaler;
pub use scorer::{PredictionResult, Scorer, ScorerKind, Trend};

#[cfg(feature = "lstm")]
pub use learned::LearnedScorer;
#[cfg(feature = "lstm")]
pub use lifecycle::BurnoutPredictor;
#[cfg(feature = "lstm")]
pub use network::SequenceClassifier;
#[cfg(feature = "lstm")]
pub use storage::{load_model, save_model, ModelInfo};
#[cfg(feature = "lstm")]
pub use training::{EncodedSet, Trainer};

use crate::error::PredictorResult;
use crate::logic::config::PredictorConfig;

/// Load (or bootstrap) the learned scorer for serving
#[cfg(feature = "lstm")]
pub fn load_learned_scorer(config: &PredictorConfig) -> PredictorResult<Arc<dyn Scorer>> {
    let mut predictor = BurnoutPredictor::new(config.clone())?;
    predictor.load()?;
    log::info!(
        "Learned scorer ready ({} parameters, state {})",
        predictor.param_count(),
        predictor.state()
    );
    Ok(Arc::new(predictor.into_scorer()?))
}

#[cfg(not(feature = "lstm"))]
pub fn load_learned_scorer(_config: &PredictorConfig) -> PredictorResult<Arc<dyn Scorer>> {
    Err(crate::error::PredictorError::FrameworkUnavailable(
        "built without the `lstm` feature".into(),
    ))
}
