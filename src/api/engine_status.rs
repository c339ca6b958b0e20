use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logic::features::LayoutInfo;
use crate::logic::model::ScorerKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub layout: LayoutInfo,
    pub model: ModelStatus,
    pub inference: InferenceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub scorer: ScorerKind,
    /// Only meaningful for the learned scorer
    pub model_path: Option<PathBuf>,
    pub param_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceStatus {
    pub inference_count: u64,
    pub avg_latency_ms: f32,
}
