//! Error handling

use std::path::PathBuf;

use thiserror::Error;

use crate::logic::features::LayoutMismatchError;
use crate::logic::model::lifecycle::ModelState;
use crate::logic::risk::RiskClass;

pub type PredictorResult<T> = Result<T, PredictorError>;

#[derive(Debug, Error)]
pub enum PredictorError {
    // Capability errors
    #[error("learned scorer unavailable: {0}")]
    FrameworkUnavailable(String),

    #[error("model is not ready for inference (state: {state})")]
    InferencePrecondition { state: ModelState },

    #[error("cannot {operation} a model in state {state}")]
    InvalidState {
        operation: &'static str,
        state: ModelState,
    },

    // Generator configuration errors
    #[error("invalid {feature} distribution for {class}: {reason}")]
    InvalidProfile {
        class: RiskClass,
        feature: &'static str,
        reason: String,
    },

    #[error("invalid class prior: {0}")]
    InvalidPrior(String),

    // Shape errors
    #[error("sequence must contain {expected} days, got {actual}")]
    InvalidSequence { expected: usize, actual: usize },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("learned backend error: {0}")]
    Backend(String),

    // Artifact errors
    #[error("checksum mismatch for {path}: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("incompatible artifact {path}: {reason}")]
    IncompatibleArtifact { path: PathBuf, reason: String },

    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PredictorError {
    /// Whether the learned backend is missing rather than broken
    pub fn is_framework_unavailable(&self) -> bool {
        matches!(self, PredictorError::FrameworkUnavailable(_))
    }
}
