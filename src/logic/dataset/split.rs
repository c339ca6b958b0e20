//! Labelled sample sets and train/validation/test splits

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PredictorError, PredictorResult};
use crate::logic::features::Sequence;
use crate::logic::risk::{Label, RISK_CLASS_COUNT};

/// Sequences with their aligned one-hot labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Samples {
    pub sequences: Vec<Sequence>,
    pub labels: Vec<Label>,
}

impl Samples {
    pub fn new(sequences: Vec<Sequence>, labels: Vec<Label>) -> PredictorResult<Self> {
        if sequences.len() != labels.len() {
            return Err(PredictorError::ShapeMismatch(format!(
                "{} sequences but {} labels",
                sequences.len(),
                labels.len()
            )));
        }
        Ok(Self { sequences, labels })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Number of samples per class, in class order
    pub fn class_counts(&self) -> [usize; RISK_CLASS_COUNT] {
        let mut counts = [0; RISK_CLASS_COUNT];
        for label in &self.labels {
            counts[label.class().index()] += 1;
        }
        counts
    }

    fn select(&self, indices: &[usize]) -> Samples {
        Samples {
            sequences: indices.iter().map(|&i| self.sequences[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

impl From<(Vec<Sequence>, Vec<Label>)> for Samples {
    /// Generator output is aligned by construction
    fn from((sequences, labels): (Vec<Sequence>, Vec<Label>)) -> Self {
        Self { sequences, labels }
    }
}

fn check_fraction(fraction: f32) -> PredictorResult<()> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(PredictorError::InvalidConfig(format!(
            "split fraction {} outside [0, 1)",
            fraction
        )));
    }
    Ok(())
}

/// Keep order: the first `1 - fraction` go to training, the tail to
/// validation
pub fn sequential_split(samples: Samples, fraction: f32) -> PredictorResult<(Samples, Samples)> {
    check_fraction(fraction)?;

    let held_out = (samples.len() as f32 * fraction).floor() as usize;
    let cut = samples.len() - held_out;

    let Samples { mut sequences, mut labels } = samples;
    let tail = Samples {
        sequences: sequences.split_off(cut),
        labels: labels.split_off(cut),
    };
    Ok((Samples { sequences, labels }, tail))
}

/// Shuffled split preserving class proportions in both halves.
///
/// Each class contributes `round(count * fraction)` samples to the second
/// half. The same seed always yields the same split.
pub fn stratified_split(samples: &Samples, fraction: f32, seed: u64) -> PredictorResult<(Samples, Samples)> {
    check_fraction(fraction)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut by_class: [Vec<usize>; RISK_CLASS_COUNT] = Default::default();
    for (i, label) in samples.labels.iter().enumerate() {
        by_class[label.class().index()].push(i);
    }

    let mut first = Vec::with_capacity(samples.len());
    let mut second = Vec::new();
    for mut indices in by_class {
        indices.shuffle(&mut rng);
        let take = (indices.len() as f32 * fraction).round() as usize;
        second.extend_from_slice(&indices[..take]);
        first.extend_from_slice(&indices[take..]);
    }
    first.shuffle(&mut rng);
    second.shuffle(&mut rng);

    Ok((samples.select(&first), samples.select(&second)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::generator::SequenceGenerator;

    fn samples(n: usize) -> Samples {
        SequenceGenerator::with_seed(17).unwrap().generate(n).into()
    }

    #[test]
    fn test_rejects_misaligned() {
        let (sequences, mut labels) = SequenceGenerator::with_seed(1).unwrap().generate(3);
        labels.pop();
        assert!(Samples::new(sequences, labels).is_err());
    }

    #[test]
    fn test_sequential_split_keeps_order() {
        let all = samples(10);
        let (train, val) = sequential_split(all.clone(), 0.2).unwrap();

        assert_eq!(train.len(), 8);
        assert_eq!(val.len(), 2);
        assert_eq!(train.sequences[..], all.sequences[..8]);
        assert_eq!(val.sequences[..], all.sequences[8..]);
    }

    #[test]
    fn test_sequential_split_zero_fraction() {
        let (train, val) = sequential_split(samples(5), 0.0).unwrap();
        assert_eq!(train.len(), 5);
        assert!(val.is_empty());
        assert!(sequential_split(samples(5), 1.0).is_err());
    }

    #[test]
    fn test_stratified_split_preserves_proportions() {
        let all = samples(400);
        let (train, test) = stratified_split(&all, 0.25, 42).unwrap();

        assert_eq!(train.len() + test.len(), 400);
        let totals = all.class_counts();
        let held = test.class_counts();
        for class in 0..RISK_CLASS_COUNT {
            let expected = (totals[class] as f32 * 0.25).round() as usize;
            assert_eq!(held[class], expected);
        }
    }

    #[test]
    fn test_stratified_split_is_deterministic() {
        let all = samples(60);
        let a = stratified_split(&all, 0.3, 42).unwrap();
        let b = stratified_split(&all, 0.3, 42).unwrap();
        assert_eq!(a, b);
    }
}
