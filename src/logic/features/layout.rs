//! Feature Layout - the daily work-signal schema
//!
//! Generator, classifier, scaler, persisted models and dataset records all
//! index days by the positions below. Any change to the names, their order
//! or the sequence length must bump `FEATURE_VERSION`; the CRC32 over the
//! layout catches the cases where that was forgotten.
//!
//! Every artifact stores `(FEATURE_VERSION, layout_hash())` and is rejected
//! on load when either differs.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FEATURE_VERSION: u8 = 1;

pub const FEATURE_COUNT: usize = 8;

/// Days in one classifier input
pub const SEQUENCE_LENGTH: usize = 30;

// ============================================================================
// SCHEMA
// ============================================================================

/// Field names, in vector order
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "hours_worked",
    "meetings_count",
    "avg_time_between_breaks",
    "night_work",
    "weekend_work",
    "avg_meeting_duration",
    "meeting_overlap_rate",
    "response_time_after_hours",
];

/// Unit of each field, same order as `FEATURE_LAYOUT`
pub const FEATURE_UNITS: [&str; FEATURE_COUNT] = [
    "hours",
    "count",
    "minutes",
    "flag",
    "flag",
    "minutes",
    "ratio",
    "minutes",
];

pub const IDX_HOURS_WORKED: usize = 0;
pub const IDX_MEETINGS_COUNT: usize = 1;
pub const IDX_BREAK_INTERVAL: usize = 2;
pub const IDX_NIGHT_WORK: usize = 3;
pub const IDX_WEEKEND_WORK: usize = 4;
pub const IDX_MEETING_DURATION: usize = 5;
pub const IDX_OVERLAP_RATE: usize = 6;
pub const IDX_RESPONSE_TIME: usize = 7;

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// CRC32 over version, sequence length and the NUL-separated field names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    hasher.update(&(SEQUENCE_LENGTH as u32).to_le_bytes());
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Schema summary reported by `ScoringService::status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub sequence_length: usize,
    /// `(name, unit)` in vector order
    pub features: Vec<(String, String)>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            sequence_length: SEQUENCE_LENGTH,
            features: FEATURE_LAYOUT
                .iter()
                .zip(FEATURE_UNITS.iter())
                .map(|(name, unit)| (name.to_string(), unit.to_string()))
                .collect(),
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "feature layout mismatch: built for v{actual_version} ({actual_hash:08x}), this build is v{expected_version} ({expected_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Check a stored `(version, hash)` pair against this build
pub fn validate_layout(version: u8, hash: u32) -> Result<(), LayoutMismatchError> {
    let expected_hash = layout_hash();
    if version == FEATURE_VERSION && hash == expected_hash {
        return Ok(());
    }
    Err(LayoutMismatchError {
        expected_version: FEATURE_VERSION,
        expected_hash,
        actual_version: version,
        actual_hash: hash,
    })
}
