//! Sequence - the classifier input
//!
//! Exactly `SEQUENCE_LENGTH` day-vectors in chronological order. Days carry
//! no temporal correlation; the classifier only ever sees i.i.d. draws
//! (synthetic data) or jittered copies of one observation (inference).

use rand::RngCore;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::layout::{FEATURE_COUNT, SEQUENCE_LENGTH};
use super::vector::FeatureVector;
use crate::error::{PredictorError, PredictorResult};

/// One day of features as raw values
pub type DayVector = [f32; FEATURE_COUNT];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DayVector>", into = "Vec<DayVector>")]
pub struct Sequence {
    days: Vec<DayVector>,
}

impl Sequence {
    /// Build a sequence, rejecting any length other than `SEQUENCE_LENGTH`
    pub fn new(days: Vec<DayVector>) -> PredictorResult<Self> {
        if days.len() != SEQUENCE_LENGTH {
            return Err(PredictorError::InvalidSequence {
                expected: SEQUENCE_LENGTH,
                actual: days.len(),
            });
        }
        Ok(Self { days })
    }

    /// Fabricate a pseudo-history from a single observation.
    ///
    /// Each of the 30 days is `features + N(0, std)` drawn independently per
    /// field. This stands in for real historical data; whether repeated
    /// jittered snapshots resemble the distribution the classifier was
    /// trained on is an unvalidated modelling assumption.
    ///
    /// A negative or NaN `std` is rejected; `0.0` repeats the observation.
    pub fn jittered(features: &FeatureVector, std: f32, rng: &mut dyn RngCore) -> PredictorResult<Self> {
        let noise = Normal::new(0.0f32, std)
            .map_err(|e| PredictorError::InvalidConfig(format!("jitter std {}: {}", std, e)))?;
        let base = features.as_array();
        Ok(Self::from_fn(|| {
            let mut day = *base;
            for value in day.iter_mut() {
                *value += noise.sample(rng);
            }
            day
        }))
    }

    /// Build a full-length sequence by calling `next_day` once per day
    pub fn from_fn(mut next_day: impl FnMut() -> DayVector) -> Self {
        let days = (0..SEQUENCE_LENGTH).map(|_| next_day()).collect();
        Self { days }
    }

    pub fn days(&self) -> &[DayVector] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DayVector> {
        self.days.iter()
    }
}

impl TryFrom<Vec<DayVector>> for Sequence {
    type Error = PredictorError;

    fn try_from(days: Vec<DayVector>) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<Sequence> for Vec<DayVector> {
    fn from(sequence: Sequence) -> Self {
        sequence.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rejects_wrong_length() {
        let err = Sequence::new(vec![[0.0; FEATURE_COUNT]; 29]).unwrap_err();
        assert!(matches!(err, PredictorError::InvalidSequence { expected: 30, actual: 29 }));
        assert!(Sequence::new(vec![[0.0; FEATURE_COUNT]; SEQUENCE_LENGTH]).is_ok());
    }

    #[test]
    fn test_jitter_is_small_and_seeded() {
        let features = FeatureVector::from_values([9.0, 6.0, 75.0, 1.0, 0.0, 50.0, 0.2, 40.0]);

        let a = Sequence::jittered(&features, 0.05, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Sequence::jittered(&features, 0.05, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), SEQUENCE_LENGTH);

        for day in a.iter() {
            for (value, base) in day.iter().zip(features.values.iter()) {
                // 8 sigma
                assert!((value - base).abs() < 0.4);
            }
        }
        // days are not copies of each other
        assert_ne!(a.days()[0], a.days()[1]);
    }

    #[test]
    fn test_jitter_moments() {
        let features = FeatureVector::from_values([0.0; FEATURE_COUNT]);
        let mut rng = StdRng::seed_from_u64(11);
        let samples: Vec<f32> = (0..100)
            .flat_map(|_| {
                let sequence = Sequence::jittered(&features, 0.05, &mut rng).unwrap();
                sequence.days().iter().flatten().copied().collect::<Vec<_>>()
            })
            .collect();
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / samples.len() as f32;

        assert_eq!(samples.len(), 100 * SEQUENCE_LENGTH * FEATURE_COUNT);
        assert!(mean.abs() < 0.002);
        assert!((var.sqrt() - 0.05).abs() < 0.002);
    }

    #[test]
    fn test_jitter_rejects_bad_std() {
        let features = FeatureVector::from_values([1.0; FEATURE_COUNT]);
        let mut rng = StdRng::seed_from_u64(1);

        for std in [f32::NAN, -0.5] {
            let err = Sequence::jittered(&features, std, &mut rng).unwrap_err();
            assert!(matches!(err, PredictorError::InvalidConfig(_)), "{}", std);
        }

        let flat = Sequence::jittered(&features, 0.0, &mut rng).unwrap();
        assert!(flat.iter().all(|day| day == features.as_array()));
    }

    #[test]
    fn test_serde_enforces_length() {
        let json = serde_json::to_string(&vec![[0.0f32; FEATURE_COUNT]; 3]).unwrap();
        assert!(serde_json::from_str::<Sequence>(&json).is_err());
    }
}
