//! Risk Module
//!
//! Burnout risk tiers and the fixed tables that turn class probabilities
//! into a 0-100 score.
//!
//! ## Structure
//! - `types`: RiskClass, Label (one-hot)
//! - `rules`: priors, base scores, status thresholds, formula bands

pub mod types;
pub mod rules;

pub use types::{argmax, Label, RiskClass, RISK_CLASS_COUNT};
pub use rules::score_from_probabilities;
