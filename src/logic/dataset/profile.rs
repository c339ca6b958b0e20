//! Class-conditional sampling profiles
//!
//! Each RiskClass owns one distribution per feature. Profiles are validated
//! once, when the generator is built; sampling itself never fails.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, PredictorResult};
use crate::logic::features::layout::{FEATURE_COUNT, FEATURE_LAYOUT, IDX_HOURS_WORKED, IDX_MEETINGS_COUNT};
use crate::logic::features::DayVector;
use crate::logic::risk::RiskClass;

// ============================================================================
// DISTRIBUTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureDistribution {
    /// Continuous uniform on `[low, high)`; `low == high` is a constant
    Uniform { low: f32, high: f32 },
    /// Integer uniform on `[low, high)`, like numpy `randint`
    Integer { low: i32, high: i32 },
    /// 1.0 with probability `p`, else 0.0
    Bernoulli { p: f64 },
}

impl FeatureDistribution {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            FeatureDistribution::Uniform { low, high } => {
                if high > low {
                    rng.gen_range(low..high)
                } else {
                    low
                }
            }
            FeatureDistribution::Integer { low, high } => rng.gen_range(low..high) as f32,
            FeatureDistribution::Bernoulli { p } => {
                if rng.gen_bool(p) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Inclusive bounds every sample falls within
    pub fn bounds(&self) -> (f32, f32) {
        match *self {
            FeatureDistribution::Uniform { low, high } => (low, high),
            FeatureDistribution::Integer { low, high } => (low as f32, (high - 1) as f32),
            FeatureDistribution::Bernoulli { p } => {
                let low = if p >= 1.0 { 1.0 } else { 0.0 };
                let high = if p <= 0.0 { 0.0 } else { 1.0 };
                (low, high)
            }
        }
    }

    /// Whether `value` is a possible draw
    pub fn contains(&self, value: f32) -> bool {
        match *self {
            FeatureDistribution::Uniform { low, high } => {
                if high > low {
                    value >= low && value < high
                } else {
                    value == low
                }
            }
            FeatureDistribution::Integer { low, high } => {
                value.fract() == 0.0 && value >= low as f32 && value < high as f32
            }
            FeatureDistribution::Bernoulli { .. } => {
                let (low, high) = self.bounds();
                value == low || value == high
            }
        }
    }

    fn check(&self) -> Result<(), String> {
        match *self {
            FeatureDistribution::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() {
                    return Err(format!("bounds must be finite, got [{}, {})", low, high));
                }
                if high < low {
                    return Err(format!("upper bound {} is below lower bound {}", high, low));
                }
            }
            FeatureDistribution::Integer { low, high } => {
                if high <= low {
                    return Err(format!("empty integer range [{}, {})", low, high));
                }
            }
            FeatureDistribution::Bernoulli { p } => {
                if !(0.0..=1.0).contains(&p) {
                    return Err(format!("probability {} outside [0, 1]", p));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// CLASS PROFILE
// ============================================================================

/// Per-feature distributions for one class, in layout order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProfile {
    pub class: RiskClass,
    pub features: [FeatureDistribution; FEATURE_COUNT],
}

impl ClassProfile {
    /// Validate every distribution, failing on the first ill-defined one
    pub fn new(class: RiskClass, features: [FeatureDistribution; FEATURE_COUNT]) -> PredictorResult<Self> {
        let profile = Self { class, features };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> PredictorResult<()> {
        for (i, distribution) in self.features.iter().enumerate() {
            distribution.check().map_err(|reason| PredictorError::InvalidProfile {
                class: self.class,
                feature: FEATURE_LAYOUT[i],
                reason,
            })?;
        }
        Ok(())
    }

    /// Draw one day; fields are independent
    pub fn sample_day<R: Rng + ?Sized>(&self, rng: &mut R) -> DayVector {
        let mut day = [0.0f32; FEATURE_COUNT];
        for (value, distribution) in day.iter_mut().zip(self.features.iter()) {
            *value = distribution.sample(rng);
        }
        day
    }

    /// Whether every field of `day` is a possible draw from this profile
    pub fn contains(&self, day: &DayVector) -> bool {
        day.iter()
            .zip(self.features.iter())
            .all(|(value, distribution)| distribution.contains(*value))
    }
}

// ============================================================================
// DEFAULT PROFILES
// ============================================================================

fn uniform(low: f32, high: f32) -> FeatureDistribution {
    FeatureDistribution::Uniform { low, high }
}

fn integer(low: i32, high: i32) -> FeatureDistribution {
    FeatureDistribution::Integer { low, high }
}

fn bernoulli(p: f64) -> FeatureDistribution {
    FeatureDistribution::Bernoulli { p }
}

/// Default distributions for a class.
///
/// Severity widens hours and meetings and shortens breaks and response
/// times.
pub fn default_profile(class: RiskClass) -> ClassProfile {
    let features = match class {
        RiskClass::Healthy => [
            uniform(7.0, 8.0),
            integer(3, 5),
            uniform(90.0, 120.0),
            bernoulli(0.0),
            bernoulli(0.0),
            uniform(30.0, 45.0),
            uniform(0.0, 0.1),
            uniform(60.0, 120.0),
        ],
        RiskClass::Attention => [
            uniform(8.0, 9.5),
            integer(5, 7),
            uniform(60.0, 90.0),
            bernoulli(0.3),
            bernoulli(0.2),
            uniform(45.0, 60.0),
            uniform(0.1, 0.3),
            uniform(30.0, 60.0),
        ],
        RiskClass::Risk => [
            uniform(9.5, 11.0),
            integer(7, 10),
            uniform(30.0, 60.0),
            bernoulli(0.6),
            bernoulli(0.5),
            uniform(60.0, 90.0),
            uniform(0.3, 0.5),
            uniform(10.0, 30.0),
        ],
        RiskClass::Critical => [
            uniform(11.0, 14.0),
            integer(10, 15),
            uniform(10.0, 30.0),
            bernoulli(0.8),
            bernoulli(0.7),
            uniform(90.0, 120.0),
            uniform(0.5, 0.8),
            uniform(5.0, 10.0),
        ],
    };
    ClassProfile { class, features }
}

/// Default profiles for all classes, in ordinal order
pub fn default_profiles() -> [ClassProfile; 4] {
    RiskClass::ALL.map(default_profile)
}

/// Profiles of the offline training run.
///
/// Identical to the defaults except for a wider healthy band: 6-8 hours
/// and 2-4 meetings a day.
pub fn training_profiles() -> [ClassProfile; 4] {
    let mut profiles = default_profiles();
    let healthy = &mut profiles[RiskClass::Healthy.index()].features;
    healthy[IDX_HOURS_WORKED] = uniform(6.0, 8.0);
    healthy[IDX_MEETINGS_COUNT] = integer(2, 5);
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_profiles_are_valid() {
        for profile in default_profiles() {
            assert!(profile.validate().is_ok(), "{} profile invalid", profile.class);
        }
    }

    #[test]
    fn test_training_profiles_widen_healthy_only() {
        let training = training_profiles();
        let defaults = default_profiles();

        let healthy = &training[RiskClass::Healthy.index()];
        assert!(healthy.validate().is_ok());
        assert_eq!(healthy.features[IDX_HOURS_WORKED].bounds(), (6.0, 8.0));
        assert_eq!(healthy.features[IDX_MEETINGS_COUNT].bounds(), (2.0, 4.0));
        assert!(healthy.contains(&[6.5, 2.0, 100.0, 0.0, 0.0, 35.0, 0.05, 90.0]));
        assert!(!defaults[RiskClass::Healthy.index()].contains(&[6.5, 2.0, 100.0, 0.0, 0.0, 35.0, 0.05, 90.0]));

        for class in [RiskClass::Attention, RiskClass::Risk, RiskClass::Critical] {
            assert_eq!(training[class.index()], defaults[class.index()]);
        }
    }

    #[test]
    fn test_rejects_inverted_uniform() {
        let mut features = default_profile(RiskClass::Risk).features;
        features[0] = uniform(11.0, 9.5);

        let err = ClassProfile::new(RiskClass::Risk, features).unwrap_err();
        match err {
            PredictorError::InvalidProfile { class, feature, .. } => {
                assert_eq!(class, RiskClass::Risk);
                assert_eq!(feature, "hours_worked");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_rejects_empty_integer_and_bad_probability() {
        let mut features = default_profile(RiskClass::Healthy).features;
        features[1] = integer(5, 5);
        assert!(ClassProfile::new(RiskClass::Healthy, features).is_err());

        let mut features = default_profile(RiskClass::Healthy).features;
        features[3] = bernoulli(1.5);
        assert!(ClassProfile::new(RiskClass::Healthy, features).is_err());

        let mut features = default_profile(RiskClass::Healthy).features;
        features[6] = uniform(f32::NAN, 1.0);
        assert!(ClassProfile::new(RiskClass::Healthy, features).is_err());
    }

    #[test]
    fn test_degenerate_uniform_is_constant() {
        let distribution = uniform(2.5, 2.5);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(distribution.sample(&mut rng), 2.5);
        assert!(distribution.contains(2.5));
        assert!(!distribution.contains(2.6));
    }

    #[test]
    fn test_integer_draws_cover_range() {
        let distribution = integer(3, 5);
        let mut rng = StdRng::seed_from_u64(5);
        let draws: Vec<f32> = (0..200).map(|_| distribution.sample(&mut rng)).collect();

        assert!(draws.contains(&3.0));
        assert!(draws.contains(&4.0));
        assert!(!draws.contains(&5.0));
        assert_eq!(distribution.bounds(), (3.0, 4.0));
    }

    #[test]
    fn test_bernoulli_zero_is_always_zero() {
        let distribution = bernoulli(0.0);
        let mut rng = StdRng::seed_from_u64(9);
        assert!((0..100).all(|_| distribution.sample(&mut rng) == 0.0));
        assert!(!distribution.contains(1.0));
    }
}
