//! Feature Vector - one day of work behaviour
//!
//! Each vector is stamped with the layout it was built against.
//!
//! Values are stored in the order defined by `FEATURE_LAYOUT`. Boolean
//! fields are encoded as 0.0 / 1.0 so the vector can be jittered and scaled
//! like any other numeric input.

use serde::{Deserialize, Serialize};
use super::layout::{
    feature_index, layout_hash, validate_layout, LayoutMismatchError, FEATURE_COUNT,
    FEATURE_LAYOUT, FEATURE_VERSION, IDX_BREAK_INTERVAL, IDX_HOURS_WORKED, IDX_MEETINGS_COUNT,
    IDX_MEETING_DURATION, IDX_NIGHT_WORK, IDX_OVERLAP_RATE, IDX_RESPONSE_TIME, IDX_WEEKEND_WORK,
};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub version: u8,
    pub layout_hash: u32,
    /// Raw values, `FEATURE_LAYOUT` order
    pub values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// All-zero day
    pub fn new() -> Self {
        Self::from_values([0.0; FEATURE_COUNT])
    }

    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    pub fn as_array(&self) -> &[f32; FEATURE_COUNT] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        feature_index(name).and_then(|i| self.get(i))
    }

    pub fn set(&mut self, index: usize, value: f32) {
        if index < FEATURE_COUNT {
            self.values[index] = value;
        }
    }

    pub fn set_by_name(&mut self, name: &str, value: f32) -> bool {
        if let Some(index) = feature_index(name) {
            self.set(index, value);
            true
        } else {
            false
        }
    }

    pub fn hours_worked(&self) -> f32 {
        self.values[IDX_HOURS_WORKED]
    }

    pub fn meetings_count(&self) -> f32 {
        self.values[IDX_MEETINGS_COUNT]
    }

    /// Fails when the vector was stamped by another layout
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)
    }

    pub fn is_compatible(&self) -> bool {
        self.validate().is_ok()
    }

    /// Values keyed by feature name, for logs and CLI output
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "values": self.values,
            "named_values": FEATURE_LAYOUT.iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f32; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f32; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}

// ============================================================================
// WORK PATTERN (typed input)
// ============================================================================

/// Self-reported work metrics for one day, as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPattern {
    pub hours_worked: f32,
    pub meetings_count: u32,
    pub avg_time_between_breaks: f32,
    pub night_work: bool,
    pub weekend_work: bool,
    pub avg_meeting_duration: f32,
    pub meeting_overlap_rate: f32,
    pub response_time_after_hours: f32,
}

impl From<&WorkPattern> for FeatureVector {
    fn from(pattern: &WorkPattern) -> Self {
        FeatureVectorBuilder::new()
            .hours_worked(pattern.hours_worked)
            .meetings_count(pattern.meetings_count)
            .avg_time_between_breaks(pattern.avg_time_between_breaks)
            .night_work(pattern.night_work)
            .weekend_work(pattern.weekend_work)
            .avg_meeting_duration(pattern.avg_meeting_duration)
            .meeting_overlap_rate(pattern.meeting_overlap_rate)
            .response_time_after_hours(pattern.response_time_after_hours)
            .build()
    }
}

impl From<WorkPattern> for FeatureVector {
    fn from(pattern: WorkPattern) -> Self {
        Self::from(&pattern)
    }
}

// ============================================================================
// BUILDER PATTERN
// ============================================================================

/// Builder for creating FeatureVector with named setters
pub struct FeatureVectorBuilder {
    vector: FeatureVector,
}

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self { vector: FeatureVector::new() }
    }

    pub fn hours_worked(mut self, value: f32) -> Self {
        self.vector.set(IDX_HOURS_WORKED, value);
        self
    }

    pub fn meetings_count(mut self, value: u32) -> Self {
        self.vector.set(IDX_MEETINGS_COUNT, value as f32);
        self
    }

    pub fn avg_time_between_breaks(mut self, value: f32) -> Self {
        self.vector.set(IDX_BREAK_INTERVAL, value);
        self
    }

    pub fn night_work(mut self, value: bool) -> Self {
        self.vector.set(IDX_NIGHT_WORK, if value { 1.0 } else { 0.0 });
        self
    }

    pub fn weekend_work(mut self, value: bool) -> Self {
        self.vector.set(IDX_WEEKEND_WORK, if value { 1.0 } else { 0.0 });
        self
    }

    pub fn avg_meeting_duration(mut self, value: f32) -> Self {
        self.vector.set(IDX_MEETING_DURATION, value);
        self
    }

    pub fn meeting_overlap_rate(mut self, value: f32) -> Self {
        self.vector.set(IDX_OVERLAP_RATE, value);
        self
    }

    pub fn response_time_after_hours(mut self, value: f32) -> Self {
        self.vector.set(IDX_RESPONSE_TIME, value);
        self
    }

    /// Set feature by name dynamically
    pub fn set(mut self, name: &str, value: f32) -> Self {
        self.vector.set_by_name(name, value);
        self
    }

    pub fn build(self) -> FeatureVector {
        self.vector
    }
}

impl Default for FeatureVectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_new() {
        let vector = FeatureVector::new();
        assert_eq!(vector.version, FEATURE_VERSION);
        assert_eq!(vector.layout_hash, layout_hash());
        assert!(vector.is_compatible());
    }

    #[test]
    fn test_builder_encodes_booleans() {
        let vector = FeatureVectorBuilder::new()
            .hours_worked(9.5)
            .meetings_count(7)
            .night_work(true)
            .weekend_work(false)
            .build();

        assert_eq!(vector.hours_worked(), 9.5);
        assert_eq!(vector.meetings_count(), 7.0);
        assert_eq!(vector.get_by_name("night_work"), Some(1.0));
        assert_eq!(vector.get_by_name("weekend_work"), Some(0.0));
    }

    #[test]
    fn test_set_by_name_rejects_unknown() {
        let mut vector = FeatureVector::new();
        assert!(vector.set_by_name("meeting_overlap_rate", 0.25));
        assert_eq!(vector.get(IDX_OVERLAP_RATE), Some(0.25));
        assert!(!vector.set_by_name("cpu_percent", 1.0));
    }

    #[test]
    fn test_work_pattern_from_json() {
        let json = r#"{
            "hours_worked": 10.0,
            "meetings_count": 8,
            "avg_time_between_breaks": 45.0,
            "night_work": true,
            "weekend_work": true,
            "avg_meeting_duration": 70.0,
            "meeting_overlap_rate": 0.4,
            "response_time_after_hours": 15.0
        }"#;
        let pattern: WorkPattern = serde_json::from_str(json).unwrap();
        let vector = FeatureVector::from(&pattern);

        assert_eq!(
            vector.values,
            [10.0, 8.0, 45.0, 1.0, 1.0, 70.0, 0.4, 15.0]
        );
    }

    #[test]
    fn test_to_log_entry() {
        let vector = FeatureVectorBuilder::new().hours_worked(8.0).build();
        let log = vector.to_log_entry();
        assert_eq!(log["feature_version"], FEATURE_VERSION);
        assert_eq!(log["named_values"]["hours_worked"], 8.0);
    }
}
