//! Properties of the learned scorer over arbitrary inputs

use std::sync::OnceLock;

use proptest::prelude::*;
use tempfile::tempdir;

use super::learned::LearnedScorer;
use super::lifecycle::BurnoutPredictor;
use super::scorer::{Scorer, ScorerKind};
use crate::logic::config::{ArchitectureConfig, PredictorConfig};
use crate::logic::features::{FeatureVector, FeatureVectorBuilder, FEATURE_COUNT};

/// One bootstrapped model shared by every case
fn scorer() -> &'static LearnedScorer {
    static SCORER: OnceLock<LearnedScorer> = OnceLock::new();
    SCORER.get_or_init(|| {
        let dir = tempdir().unwrap();
        let mut config = PredictorConfig::in_dir(dir.path());
        config.architecture = ArchitectureConfig {
            lstm_units: vec![4],
            dense_units: vec![4],
            ..ArchitectureConfig::default()
        };
        config.training.seed = Some(13);
        config.bootstrap.samples = 40;
        config.bootstrap.epochs = 1;
        config.bootstrap.seed = Some(13);

        let mut predictor = BurnoutPredictor::new(config).unwrap();
        predictor.load().unwrap();
        predictor.into_scorer().unwrap()
    })
}

fn finite_values() -> impl Strategy<Value = [f32; FEATURE_COUNT]> {
    prop::array::uniform8(-1.0e6f32..1.0e6f32)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_learned_score_is_bounded_and_reproducible(values in finite_values(), seed in any::<u64>()) {
        let features = FeatureVector::from_values(values);

        let first = scorer().predict_seeded(&features, seed).unwrap();
        let second = scorer().predict_seeded(&features, seed).unwrap();

        prop_assert!(first.score <= 100);
        prop_assert!(first.probabilities.iter().all(|p| p.is_finite() && *p >= 0.0));
        prop_assert!((first.probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        prop_assert!((0.0..=1.0).contains(&first.confidence));
        prop_assert_eq!(first.method, ScorerKind::Lstm);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_learned_score_on_extreme_hours_and_breaks() {
    for magnitude in [1.0e6f32, 1.0e20, 3.0e38] {
        let features = FeatureVectorBuilder::new()
            .hours_worked(magnitude)
            .avg_time_between_breaks(magnitude)
            .build();
        let result = scorer().predict_seeded(&features, 1).unwrap();

        assert!(result.score <= 100, "{}", magnitude);
        assert!(result.probabilities.iter().all(|p| p.is_finite()), "{}", magnitude);
        assert!((result.probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-6, "{}", magnitude);
    }
}
