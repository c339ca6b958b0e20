//! Feature Scaler - per-feature standardisation
//!
//! `(x - mean) / std`, fitted over every day of every training sequence.
//! Features with zero variance are centred but not scaled.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::artifact::{read_json, write_json};
use crate::error::PredictorResult;
use crate::logic::features::layout::validate_layout;
use crate::logic::features::{layout_hash, DayVector, Sequence, FEATURE_COUNT, FEATURE_VERSION};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub feature_version: u8,
    pub layout_hash: u32,
    pub mean: [f32; FEATURE_COUNT],
    pub variance: [f32; FEATURE_COUNT],
    /// Day vectors seen while fitting; 0 for the identity scaler
    pub samples: u64,
}

impl Default for FeatureScaler {
    fn default() -> Self {
        Self::identity()
    }
}

impl FeatureScaler {
    /// Pass-through scaler
    pub fn identity() -> Self {
        Self {
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            mean: [0.0; FEATURE_COUNT],
            variance: [1.0; FEATURE_COUNT],
            samples: 0,
        }
    }

    /// Fit mean and population variance over all days. An empty input
    /// yields the identity scaler.
    pub fn fit(sequences: &[Sequence]) -> Self {
        let mut sum = [0.0f64; FEATURE_COUNT];
        let mut sum_sq = [0.0f64; FEATURE_COUNT];
        let mut count = 0u64;

        for day in sequences.iter().flat_map(|s| s.iter()) {
            for i in 0..FEATURE_COUNT {
                let v = day[i] as f64;
                sum[i] += v;
                sum_sq[i] += v * v;
            }
            count += 1;
        }

        if count == 0 {
            return Self::identity();
        }

        let n = count as f64;
        let mut mean = [0.0f32; FEATURE_COUNT];
        let mut variance = [0.0f32; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let m = sum[i] / n;
            mean[i] = m as f32;
            variance[i] = (sum_sq[i] / n - m * m).max(0.0) as f32;
        }

        log::debug!("Scaler fitted on {} days", count);
        Self {
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            mean,
            variance,
            samples: count,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.samples == 0
    }

    pub fn transform_day(&self, day: &DayVector) -> DayVector {
        let mut out = [0.0f32; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let std = self.variance[i].sqrt();
            let scale = if std > f32::EPSILON { std } else { 1.0 };
            out[i] = (day[i] - self.mean[i]) / scale;
        }
        out
    }

    pub fn transform(&self, sequence: &Sequence) -> Vec<DayVector> {
        sequence.iter().map(|day| self.transform_day(day)).collect()
    }

    pub fn save(&self, path: &Path) -> PredictorResult<()> {
        write_json(path, self)?;
        log::info!("Scaler saved to {}", path.display());
        Ok(())
    }

    /// Load and check the feature layout the scaler was fitted under
    pub fn load(path: &Path) -> PredictorResult<Self> {
        let scaler: Self = read_json(path)?;
        validate_layout(scaler.feature_version, scaler.layout_hash)?;
        Ok(scaler)
    }

    /// Load from `path`, or the identity scaler when the file is absent
    pub fn load_or_identity(path: &Path) -> PredictorResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("Scaler file {} not found, using identity scaling", path.display());
            Ok(Self::identity())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictorError;
    use crate::logic::dataset::SequenceGenerator;
    use tempfile::tempdir;

    #[test]
    fn test_fit_standardises() {
        let (sequences, _) = SequenceGenerator::with_seed(5).unwrap().generate(40);
        let scaler = FeatureScaler::fit(&sequences);

        let scaled: Vec<DayVector> = sequences.iter().flat_map(|s| scaler.transform(s)).collect();
        let n = scaled.len() as f32;
        for i in 0..FEATURE_COUNT {
            let mean = scaled.iter().map(|d| d[i]).sum::<f32>() / n;
            let var = scaled.iter().map(|d| (d[i] - mean).powi(2)).sum::<f32>() / n;
            assert!(mean.abs() < 1e-3, "feature {} mean {}", i, mean);
            assert!((var - 1.0).abs() < 1e-2, "feature {} var {}", i, var);
        }
        assert_eq!(scaler.samples, 40 * 30);
    }

    #[test]
    fn test_identity_and_constant_features() {
        assert!(FeatureScaler::fit(&[]).is_identity());

        let day = [3.0; FEATURE_COUNT];
        let sequence = Sequence::new(vec![day; 30]).unwrap();
        let scaler = FeatureScaler::fit(&[sequence]);
        assert_eq!(scaler.transform_day(&day), [0.0; FEATURE_COUNT]);
    }

    #[test]
    fn test_save_load_and_layout_check() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        let (sequences, _) = SequenceGenerator::with_seed(6).unwrap().generate(5);
        let scaler = FeatureScaler::fit(&sequences);

        scaler.save(&path).unwrap();
        assert_eq!(FeatureScaler::load(&path).unwrap(), scaler);

        let mut stale = scaler.clone();
        stale.layout_hash ^= 0xFF;
        stale.save(&path).unwrap();
        assert!(matches!(FeatureScaler::load(&path), Err(PredictorError::LayoutMismatch(_))));
    }

    #[test]
    fn test_missing_file_is_identity() {
        let dir = tempdir().unwrap();
        let scaler = FeatureScaler::load_or_identity(&dir.path().join("missing.json")).unwrap();
        assert!(scaler.is_identity());
    }
}
