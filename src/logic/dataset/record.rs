use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::logic::features::{layout_hash, DayVector, Sequence, FEATURE_VERSION};
use crate::logic::risk::{Label, RiskClass};

/// One labelled sequence as written to the JSONL dataset
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetRecord {
    /// Unix seconds at write time
    pub timestamp: u64,

    // Feature contract
    pub feature_version: u8,
    pub layout_hash: u32,

    pub class: RiskClass,
    pub label: Label,
    pub days: Vec<DayVector>,
}

impl DatasetRecord {
    pub fn new(sequence: &Sequence, label: Label) -> Self {
        Self {
            timestamp: Utc::now().timestamp().max(0) as u64,
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            class: label.class(),
            label,
            days: sequence.days().to_vec(),
        }
    }

    /// Whether this record was written under the current feature layout
    pub fn is_current_layout(&self) -> bool {
        self.feature_version == FEATURE_VERSION && self.layout_hash == layout_hash()
    }
}
