//! Scoring Service
//!
//! Picks a scorer once at startup and serves predictions from it. Clones
//! share the one scorer, which never changes after start; the latency
//! counters are the only state written by every request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::engine_status::{EngineStatus, InferenceStatus, ModelStatus};
use crate::error::PredictorResult;
use crate::logic::config::{PredictorConfig, ScorerPreference};
use crate::logic::features::{FeatureVector, LayoutInfo};
use crate::logic::model::{load_learned_scorer, FormulaScorer, PredictionResult, Scorer, ScorerKind};

#[derive(Default)]
struct LatencyStats {
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl LatencyStats {
    fn record(&self, started: Instant) {
        let elapsed = started.elapsed().as_micros() as u64;
        self.latency_sum_us.fetch_add(elapsed, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> InferenceStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        InferenceStatus {
            inference_count: count,
            avg_latency_ms: avg,
        }
    }
}

#[derive(Clone)]
pub struct ScoringService {
    scorer: Arc<dyn Scorer>,
    config: Arc<PredictorConfig>,
    stats: Arc<LatencyStats>,
}

impl ScoringService {
    /// Probe the learned backend according to `config.scorer`.
    ///
    /// `auto` degrades to the formula only when the learned backend is
    /// unavailable; a broken model file is still an error.
    pub fn start(config: PredictorConfig) -> PredictorResult<Self> {
        config.validate()?;

        let scorer: Arc<dyn Scorer> = match config.scorer {
            ScorerPreference::Formula => Arc::new(FormulaScorer::new()),
            ScorerPreference::Learned => load_learned_scorer(&config)?,
            ScorerPreference::Auto => match load_learned_scorer(&config) {
                Ok(scorer) => scorer,
                Err(e) if e.is_framework_unavailable() => {
                    log::warn!("{}; using formula scorer", e);
                    Arc::new(FormulaScorer::new())
                }
                Err(e) => return Err(e),
            },
        };

        log::info!("Scoring service started with {} scorer", scorer.kind());
        Ok(Self::with_scorer(scorer, config))
    }

    /// Serve an already constructed scorer
    pub fn with_scorer(scorer: Arc<dyn Scorer>, config: PredictorConfig) -> Self {
        Self {
            scorer,
            config: Arc::new(config),
            stats: Arc::new(LatencyStats::default()),
        }
    }

    pub fn kind(&self) -> ScorerKind {
        self.scorer.kind()
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn predict(&self, features: &FeatureVector) -> PredictorResult<PredictionResult> {
        let started = Instant::now();
        let result = self.scorer.predict(features);
        self.stats.record(started);
        result
    }

    pub fn predict_seeded(&self, features: &FeatureVector, seed: u64) -> PredictorResult<PredictionResult> {
        let started = Instant::now();
        let result = self.scorer.predict_seeded(features, seed);
        self.stats.record(started);
        result
    }

    pub fn status(&self) -> EngineStatus {
        let kind = self.scorer.kind();
        let model_path = match kind {
            ScorerKind::Lstm => Some(self.config.model_path.clone()),
            ScorerKind::Formula => None,
        };

        EngineStatus {
            layout: LayoutInfo::current(),
            model: ModelStatus {
                scorer: kind,
                model_path,
                param_count: self.scorer.param_count(),
            },
            inference: self.stats.snapshot(),
        }
    }
}
