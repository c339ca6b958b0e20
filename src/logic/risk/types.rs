//! Risk Types
//!
//! Core types for burnout risk tiers.
//! No scoring logic here - only data structures.

use serde::{Deserialize, Serialize};

use super::rules::{ATTENTION_MIN_SCORE, CLASS_BASE_SCORES, CLASS_PRIORS, CRITICAL_MIN_SCORE, RISK_MIN_SCORE};

/// Number of risk tiers (width of a label / probability vector)
pub const RISK_CLASS_COUNT: usize = 4;

// ============================================================================
// RISK CLASSIFICATION
// ============================================================================

/// Ordinal burnout severity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    /// Sustainable rhythm
    Healthy,
    /// Intense days, worth a nudge
    Attention,
    /// Overload pattern
    Risk,
    /// Imminent burnout
    Critical,
}

impl RiskClass {
    /// All classes in ordinal order
    pub const ALL: [RiskClass; RISK_CLASS_COUNT] = [
        RiskClass::Healthy,
        RiskClass::Attention,
        RiskClass::Risk,
        RiskClass::Critical,
    ];

    pub fn index(&self) -> usize {
        match self {
            RiskClass::Healthy => 0,
            RiskClass::Attention => 1,
            RiskClass::Risk => 2,
            RiskClass::Critical => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskClass::Healthy => "healthy",
            RiskClass::Attention => "attention",
            RiskClass::Risk => "risk",
            RiskClass::Critical => "critical",
        }
    }

    /// Label shown to end users
    pub fn display_name(&self) -> &'static str {
        match self {
            RiskClass::Healthy => "Saudável",
            RiskClass::Attention => "Atenção",
            RiskClass::Risk => "Risco",
            RiskClass::Critical => "Crítico",
        }
    }

    /// Prior probability used when synthesizing training data
    pub fn prior(&self) -> f64 {
        CLASS_PRIORS[self.index()]
    }

    /// Score reported for this class before confidence scaling
    pub fn base_score(&self) -> u8 {
        CLASS_BASE_SCORES[self.index()]
    }

    /// Status thresholding applied to any 0-100 score
    pub fn from_score(score: u8) -> Self {
        if score < ATTENTION_MIN_SCORE {
            RiskClass::Healthy
        } else if score < RISK_MIN_SCORE {
            RiskClass::Attention
        } else if score < CRITICAL_MIN_SCORE {
            RiskClass::Risk
        } else {
            RiskClass::Critical
        }
    }
}

impl std::fmt::Display for RiskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// LABEL
// ============================================================================

/// One-hot encoding of a RiskClass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Label(pub [f32; RISK_CLASS_COUNT]);

impl Label {
    pub fn one_hot(class: RiskClass) -> Self {
        let mut encoded = [0.0; RISK_CLASS_COUNT];
        encoded[class.index()] = 1.0;
        Self(encoded)
    }

    /// Class at the hot position
    pub fn class(&self) -> RiskClass {
        RiskClass::from_index(argmax(&self.0)).unwrap_or(RiskClass::Healthy)
    }

    pub fn as_array(&self) -> &[f32; RISK_CLASS_COUNT] {
        &self.0
    }
}

impl From<RiskClass> for Label {
    fn from(class: RiskClass) -> Self {
        Self::one_hot(class)
    }
}

/// Index of the largest value (first one wins on ties)
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

// ============================================================================
// TESTS
// ============================================================================
