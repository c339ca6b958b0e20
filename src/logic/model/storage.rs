//! Model persistence
//!
//! The weights are a burn record (full precision, binary), hex-encoded
//! inside a JSON envelope that carries the feature contract, the
//! architecture, a model id and a SHA-256 of the record bytes. Loading
//! checks all of them before the network is handed out.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::artifact::{read_json, write_json};
use super::network::SequenceClassifier;
use crate::error::{PredictorError, PredictorResult};
use crate::logic::config::ArchitectureConfig;
use crate::logic::features::layout::validate_layout;
use crate::logic::features::{layout_hash, FEATURE_VERSION, SEQUENCE_LENGTH};

/// Bumped when the envelope or weight encoding changes
pub const MODEL_FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEnvelope {
    pub format_version: u32,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub sequence_length: usize,
    pub model_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub architecture: ArchitectureConfig,
    pub param_count: usize,
    /// Hex SHA-256 of the decoded `weights`
    pub checksum: String,
    /// Hex record bytes
    pub weights: String,
}

/// Summary of a stored model, without the weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub param_count: usize,
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn incompatible(path: &Path, reason: String) -> PredictorError {
    PredictorError::IncompatibleArtifact {
        path: path.to_path_buf(),
        reason,
    }
}

/// Write `network` to `path`; returns the new model's summary
pub fn save_model(network: &SequenceClassifier, path: &Path) -> PredictorResult<ModelInfo> {
    let bytes = network.to_bytes()?;
    let envelope = ModelEnvelope {
        format_version: MODEL_FORMAT_VERSION,
        feature_version: FEATURE_VERSION,
        layout_hash: layout_hash(),
        sequence_length: SEQUENCE_LENGTH,
        model_id: Uuid::new_v4(),
        saved_at: Utc::now(),
        architecture: network.architecture().clone(),
        param_count: network.param_count(),
        checksum: checksum(&bytes),
        weights: hex::encode(&bytes),
    };
    write_json(path, &envelope)?;

    log::info!("Model {} saved to {} ({} bytes of weights)", envelope.model_id, path.display(), bytes.len());
    Ok(ModelInfo {
        model_id: envelope.model_id,
        saved_at: envelope.saved_at,
        param_count: envelope.param_count,
    })
}

/// Read and verify a model file
pub fn load_model(path: &Path) -> PredictorResult<(SequenceClassifier, ModelInfo)> {
    let envelope: ModelEnvelope = read_json(path)?;

    if envelope.format_version != MODEL_FORMAT_VERSION {
        return Err(incompatible(
            path,
            format!("format version {} (expected {})", envelope.format_version, MODEL_FORMAT_VERSION),
        ));
    }
    if envelope.sequence_length != SEQUENCE_LENGTH {
        return Err(incompatible(
            path,
            format!("sequence length {} (expected {})", envelope.sequence_length, SEQUENCE_LENGTH),
        ));
    }
    validate_layout(envelope.feature_version, envelope.layout_hash)?;

    let bytes = hex::decode(&envelope.weights).map_err(|e| incompatible(path, format!("weights: {}", e)))?;
    let actual = checksum(&bytes);
    if actual != envelope.checksum {
        return Err(PredictorError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: envelope.checksum,
            actual,
        });
    }

    let network = SequenceClassifier::from_bytes(&envelope.architecture, bytes)?;
    if network.param_count() != envelope.param_count {
        return Err(PredictorError::ShapeMismatch(format!(
            "{} declares {} parameters, loaded {}",
            path.display(),
            envelope.param_count,
            network.param_count()
        )));
    }

    log::info!("Model {} loaded from {} (saved {})", envelope.model_id, path.display(), envelope.saved_at);
    let info = ModelInfo {
        model_id: envelope.model_id,
        saved_at: envelope.saved_at,
        param_count: envelope.param_count,
    };
    Ok((network, info))
}
