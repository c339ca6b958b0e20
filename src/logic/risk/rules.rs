//! Risk Rules & Tables
//!
//! Fixed tables shared by the generator, the learned scorer and the
//! formula scorer. Only constants and small pure helpers live here.

use super::types::{argmax, RiskClass, RISK_CLASS_COUNT};

// ============================================================================
// CLASS TABLES (indexed by RiskClass::index)
// ============================================================================

/// Prior used when synthesizing training data
pub const CLASS_PRIORS: [f64; RISK_CLASS_COUNT] = [0.4, 0.3, 0.2, 0.1];

/// Score reported for the arg-max class before confidence scaling
pub const CLASS_BASE_SCORES: [u8; RISK_CLASS_COUNT] = [15, 45, 70, 90];

// ============================================================================
// STATUS THRESHOLDS
// ============================================================================

/// Scores below this are Healthy
pub const ATTENTION_MIN_SCORE: u8 = 30;

/// Scores below this (and >= ATTENTION_MIN_SCORE) are Attention
pub const RISK_MIN_SCORE: u8 = 60;

/// Scores at or above this are Critical
pub const CRITICAL_MIN_SCORE: u8 = 80;

// ============================================================================
// CONFIDENCE SCALING
// ============================================================================

/// score = base * (CONFIDENCE_FLOOR + CONFIDENCE_SPAN * confidence)
pub const CONFIDENCE_FLOOR: f32 = 0.8;
pub const CONFIDENCE_SPAN: f32 = 0.4;

pub const MAX_SCORE: u8 = 100;

// ============================================================================
// FORMULA SCORER
// ============================================================================

pub const FORMULA_HOURS_WEIGHT: f32 = 10.0;
pub const FORMULA_MEETINGS_WEIGHT: f32 = 5.0;
pub const FORMULA_MIN_SCORE: u8 = 20;
pub const FORMULA_MAX_SCORE: u8 = 90;

/// Probability tables substituted for the softmax output, per score band
pub const FORMULA_BAND_HEALTHY: [f32; RISK_CLASS_COUNT] = [0.8, 0.15, 0.05, 0.0];
pub const FORMULA_BAND_ATTENTION: [f32; RISK_CLASS_COUNT] = [0.2, 0.6, 0.15, 0.05];
pub const FORMULA_BAND_RISK: [f32; RISK_CLASS_COUNT] = [0.05, 0.2, 0.6, 0.15];
pub const FORMULA_BAND_CRITICAL: [f32; RISK_CLASS_COUNT] = [0.0, 0.05, 0.3, 0.65];

/// Band table for a formula score
pub fn formula_band(score: u8) -> [f32; RISK_CLASS_COUNT] {
    match RiskClass::from_score(score) {
        RiskClass::Healthy => FORMULA_BAND_HEALTHY,
        RiskClass::Attention => FORMULA_BAND_ATTENTION,
        RiskClass::Risk => FORMULA_BAND_RISK,
        RiskClass::Critical => FORMULA_BAND_CRITICAL,
    }
}

/// Convert a class distribution into (arg-max class, confidence, score).
///
/// Confidence is the arg-max probability; the score is the class base score
/// scaled into `[0.8, 1.2] x base` by confidence, truncated, capped at 100.
pub fn score_from_probabilities(probabilities: &[f32; RISK_CLASS_COUNT]) -> (RiskClass, f32, u8) {
    let index = argmax(probabilities);
    let class = RiskClass::from_index(index).unwrap_or(RiskClass::Healthy);
    let confidence = probabilities[index].clamp(0.0, 1.0);

    let scaled = class.base_score() as f32 * (CONFIDENCE_FLOOR + CONFIDENCE_SPAN * confidence);
    let score = (scaled.trunc() as u32).min(MAX_SCORE as u32) as u8;

    (class, confidence, score)
}
