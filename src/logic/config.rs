//! Runtime configuration
//!
//! Every knob has a default in `constants.rs` and an `OASIS_*` override.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{PredictorError, PredictorResult};

// ============================================================================
// SCORER PREFERENCE
// ============================================================================

/// Which scorer the service should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerPreference {
    /// Learned scorer when available, formula otherwise
    #[default]
    Auto,
    /// Learned scorer or fail
    Learned,
    /// Formula scorer only
    Formula,
}

impl FromStr for ScorerPreference {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "learned" | "lstm" => Ok(Self::Learned),
            "formula" | "fallback" => Ok(Self::Formula),
            other => Err(PredictorError::InvalidConfig(format!("unknown scorer '{}'", other))),
        }
    }
}

impl fmt::Display for ScorerPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Learned => "learned",
            Self::Formula => "formula",
        };
        f.write_str(name)
    }
}

// ============================================================================
// NETWORK / TRAINING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    /// Widths of the stacked LSTM layers; all but the last return sequences
    pub lstm_units: Vec<usize>,
    /// Widths of the ReLU dense layers before the softmax head
    pub dense_units: Vec<usize>,
    /// Dropout after each LSTM layer except the last
    pub recurrent_dropout: f32,
    /// Dropout after the first dense layer
    pub dense_dropout: f32,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            lstm_units: vec![128, 64, 32],
            dense_units: vec![64, 32],
            recurrent_dropout: 0.3,
            dense_dropout: 0.2,
        }
    }
}

impl ArchitectureConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lstm_units: env_widths_or("OASIS_LSTM_UNITS", &defaults.lstm_units),
            dense_units: env_widths_or("OASIS_DENSE_UNITS", &defaults.dense_units),
            recurrent_dropout: env_parse_or("OASIS_RECURRENT_DROPOUT", defaults.recurrent_dropout),
            dense_dropout: env_parse_or("OASIS_DENSE_DROPOUT", defaults.dense_dropout),
        }
    }

    pub fn validate(&self) -> PredictorResult<()> {
        if self.lstm_units.is_empty() {
            return Err(PredictorError::InvalidConfig("at least one LSTM layer is required".into()));
        }
        if self.lstm_units.iter().chain(self.dense_units.iter()).any(|w| *w == 0) {
            return Err(PredictorError::InvalidConfig("layer widths must be positive".into()));
        }
        for rate in [self.recurrent_dropout, self.dense_dropout] {
            if !(0.0..1.0).contains(&rate) {
                return Err(PredictorError::InvalidConfig(format!("dropout rate {} outside [0, 1)", rate)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Epochs without validation-loss improvement before stopping
    pub patience: usize,
    /// Shuffling seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            patience: DEFAULT_PATIENCE,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            epochs: env_parse_or("OASIS_EPOCHS", defaults.epochs),
            batch_size: env_parse_or("OASIS_BATCH_SIZE", defaults.batch_size),
            learning_rate: env_parse_or("OASIS_LEARNING_RATE", defaults.learning_rate),
            patience: env_parse_or("OASIS_PATIENCE", defaults.patience),
            seed: std::env::var("OASIS_SEED").ok().and_then(|s| s.trim().parse().ok()),
        }
    }

    pub fn validate(&self) -> PredictorResult<()> {
        if self.batch_size == 0 {
            return Err(PredictorError::InvalidConfig("batch size must be positive".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PredictorError::InvalidConfig(format!(
                "learning rate {} must be positive",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Training run used when `load()` finds no model on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub samples: usize,
    pub epochs: usize,
    pub validation_fraction: f32,
    /// Generator seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_BOOTSTRAP_SAMPLES,
            epochs: DEFAULT_BOOTSTRAP_EPOCHS,
            validation_fraction: DEFAULT_BOOTSTRAP_VALIDATION,
            seed: None,
        }
    }
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            samples: env_parse_or("OASIS_BOOTSTRAP_SAMPLES", defaults.samples),
            epochs: env_parse_or("OASIS_BOOTSTRAP_EPOCHS", defaults.epochs),
            validation_fraction: env_parse_or("OASIS_BOOTSTRAP_VALIDATION", defaults.validation_fraction),
            seed: std::env::var("OASIS_SEED").ok().and_then(|s| s.trim().parse().ok()),
        }
    }
}

// ============================================================================
// PREDICTOR CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub scorer: ScorerPreference,
    pub architecture: ArchitectureConfig,
    pub training: TrainingConfig,
    pub bootstrap: BootstrapConfig,
    /// Std-dev of the per-day jitter in the pseudo-history
    pub jitter_std: f32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
            scorer: ScorerPreference::Auto,
            architecture: ArchitectureConfig::default(),
            training: TrainingConfig::default(),
            bootstrap: BootstrapConfig::default(),
            jitter_std: DEFAULT_JITTER_STD,
        }
    }
}

impl PredictorConfig {
    /// Load from `OASIS_*` environment variables. An unknown scorer name
    /// falls back to `auto` with a warning.
    pub fn from_env() -> Self {
        let scorer = match std::env::var("OASIS_SCORER") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("{}; using auto", e);
                ScorerPreference::Auto
            }),
            Err(_) => ScorerPreference::Auto,
        };

        Self {
            model_path: PathBuf::from(env_or("OASIS_MODEL_PATH", DEFAULT_MODEL_PATH)),
            scaler_path: PathBuf::from(env_or("OASIS_SCALER_PATH", DEFAULT_SCALER_PATH)),
            scorer,
            architecture: ArchitectureConfig::from_env(),
            training: TrainingConfig::from_env(),
            bootstrap: BootstrapConfig::from_env(),
            jitter_std: env_parse_or("OASIS_JITTER_STD", DEFAULT_JITTER_STD),
        }
    }

    /// Config rooted at `dir`, with the default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            model_path: dir.join(file_name(DEFAULT_MODEL_PATH)),
            scaler_path: dir.join(file_name(DEFAULT_SCALER_PATH)),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> PredictorResult<()> {
        self.architecture.validate()?;
        self.training.validate()?;
        if !(self.jitter_std.is_finite() && self.jitter_std >= 0.0) {
            return Err(PredictorError::InvalidConfig(format!(
                "jitter std {} must be non-negative",
                self.jitter_std
            )));
        }
        if !(0.0..1.0).contains(&self.bootstrap.validation_fraction) {
            return Err(PredictorError::InvalidConfig(format!(
                "bootstrap validation fraction {} outside [0, 1)",
                self.bootstrap.validation_fraction
            )));
        }
        Ok(())
    }

    /// Training curves live next to the model
    pub fn history_path(&self) -> PathBuf {
        self.model_path.with_file_name(file_name(DEFAULT_HISTORY_PATH))
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
