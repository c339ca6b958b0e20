//! Synthetic Sequence Generator
//!
//! Draws a RiskClass from the prior, then 30 i.i.d. days from that class's
//! profile. Labels are one-hot and aligned 1:1 with sequences.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::profile::{default_profiles, ClassProfile};
use crate::error::{PredictorError, PredictorResult};
use crate::logic::features::Sequence;
use crate::logic::risk::rules::CLASS_PRIORS;
use crate::logic::risk::{Label, RiskClass, RISK_CLASS_COUNT};

const PRIOR_TOLERANCE: f64 = 1e-6;

pub struct SequenceGenerator {
    profiles: [ClassProfile; RISK_CLASS_COUNT],
    priors: [f64; RISK_CLASS_COUNT],
    class_index: WeightedIndex<f64>,
    rng: StdRng,
}

impl SequenceGenerator {
    /// Generator over the default profiles, seeded from OS entropy
    pub fn new() -> PredictorResult<Self> {
        Self::with_profiles(default_profiles(), CLASS_PRIORS, StdRng::from_entropy())
    }

    /// Reproducible generator over the default profiles
    pub fn with_seed(seed: u64) -> PredictorResult<Self> {
        Self::with_profiles(default_profiles(), CLASS_PRIORS, StdRng::seed_from_u64(seed))
    }

    /// Generator over custom profiles. Profiles must be listed in class
    /// order and are validated here, before any sampling happens.
    pub fn with_profiles(
        profiles: [ClassProfile; RISK_CLASS_COUNT],
        priors: [f64; RISK_CLASS_COUNT],
        rng: StdRng,
    ) -> PredictorResult<Self> {
        for (i, profile) in profiles.iter().enumerate() {
            if profile.class.index() != i {
                return Err(PredictorError::InvalidConfig(format!(
                    "profile for {} listed at position {}",
                    profile.class, i
                )));
            }
            profile.validate()?;
        }

        validate_priors(&priors)?;
        let class_index =
            WeightedIndex::new(priors).map_err(|e| PredictorError::InvalidPrior(e.to_string()))?;

        Ok(Self {
            profiles,
            priors,
            class_index,
            rng,
        })
    }

    pub fn priors(&self) -> &[f64; RISK_CLASS_COUNT] {
        &self.priors
    }

    pub fn profile(&self, class: RiskClass) -> &ClassProfile {
        &self.profiles[class.index()]
    }

    /// Draw one class from the prior
    pub fn sample_class(&mut self) -> RiskClass {
        let index = self.class_index.sample(&mut self.rng);
        RiskClass::from_index(index).unwrap_or(RiskClass::Healthy)
    }

    /// Draw one sequence for a given class
    pub fn sample_sequence(&mut self, class: RiskClass) -> Sequence {
        let profile = &self.profiles[class.index()];
        let rng = &mut self.rng;
        Sequence::from_fn(|| profile.sample_day(&mut *rng))
    }

    /// Labelled samples. `n_samples == 0` yields empty containers.
    pub fn generate(&mut self, n_samples: usize) -> (Vec<Sequence>, Vec<Label>) {
        let mut sequences = Vec::with_capacity(n_samples);
        let mut labels = Vec::with_capacity(n_samples);

        for _ in 0..n_samples {
            let class = self.sample_class();
            sequences.push(self.sample_sequence(class));
            labels.push(Label::one_hot(class));
        }

        log::debug!("Generated {} synthetic sequences", n_samples);
        (sequences, labels)
    }
}

fn validate_priors(priors: &[f64; RISK_CLASS_COUNT]) -> PredictorResult<()> {
    if let Some(bad) = priors.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(PredictorError::InvalidPrior(format!(
            "prior {} must be finite and non-negative",
            bad
        )));
    }
    let total: f64 = priors.iter().sum();
    if (total - 1.0).abs() > PRIOR_TOLERANCE {
        return Err(PredictorError::InvalidPrior(format!(
            "priors sum to {}, expected 1",
            total
        )));
    }
    Ok(())
}
