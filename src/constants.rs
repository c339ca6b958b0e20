//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Environment variables override these through `PredictorConfig::from_env`.

/// Default location of the persisted classifier
pub const DEFAULT_MODEL_PATH: &str = "models/burnout_predictor.json";

/// Default location of the fitted feature scaler (co-located with the model)
pub const DEFAULT_SCALER_PATH: &str = "models/scaler.json";

/// Default location of the training curves written by `train_model`
pub const DEFAULT_HISTORY_PATH: &str = "models/training_history.json";

/// Std-dev of the per-day jitter used to fabricate a 30-day history
pub const DEFAULT_JITTER_STD: f32 = 0.05;

// ============================================
// Training defaults
// ============================================

pub const DEFAULT_LEARNING_RATE: f32 = 0.001;
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_EPOCHS: usize = 30;

/// Epochs without validation-loss improvement before stopping
pub const DEFAULT_PATIENCE: usize = 10;

/// Synthetic samples used when `load()` finds no model on disk
pub const DEFAULT_BOOTSTRAP_SAMPLES: usize = 1000;
pub const DEFAULT_BOOTSTRAP_EPOCHS: usize = 20;
pub const DEFAULT_BOOTSTRAP_VALIDATION: f32 = 0.2;

// ============================================
// Training script
// ============================================

pub const SCRIPT_SAMPLES: usize = 5000;
pub const SCRIPT_EPOCHS: usize = 50;
pub const SCRIPT_SPLIT_SEED: u64 = 42;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "OÁSÎS";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Read a string from the environment or use the default
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse a value from the environment, falling back on absence or parse failure
pub fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a comma separated list of widths, e.g. `128,64,32`
pub fn env_widths_or(key: &str, default: &[usize]) -> Vec<usize> {
    std::env::var(key)
        .ok()
        .and_then(|s| {
            s.split(',')
                .map(|part| part.trim().parse::<usize>().ok())
                .collect::<Option<Vec<_>>>()
        })
        .filter(|widths| !widths.is_empty())
        .unwrap_or_else(|| default.to_vec())
}
