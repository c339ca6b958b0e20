//! Trainer - mini-batch Adam with early stopping and checkpointing
//!
//! Gradients and the optimizer come from burn; the epoch loop, the
//! early-stopping monitor and the checkpoint policy live here.

use burn::nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::history::TrainingHistory;
use super::metrics::{self, EvaluationReport, Probabilities};
use super::network::{
    device, to_input, to_probabilities, to_targets, BurnoutNetwork, SequenceClassifier, TrainingBackend,
};
use super::scaler::FeatureScaler;
use crate::error::{PredictorError, PredictorResult};
use crate::logic::config::TrainingConfig;
use crate::logic::dataset::Samples;
use crate::logic::features::DayVector;
use crate::logic::risk::Label;

/// Called with the current model whenever validation accuracy improves
pub type Checkpoint<'a> = &'a mut dyn FnMut(&SequenceClassifier) -> PredictorResult<()>;

/// Batch size used when scoring whole sets
const EVAL_BATCH: usize = 256;

const ADAM_EPSILON: f32 = 1e-7;

/// Scaled sequences ready for the network
pub struct EncodedSet {
    pub sequences: Vec<Vec<DayVector>>,
    pub labels: Vec<Label>,
}

impl EncodedSet {
    pub fn encode(samples: &Samples, scaler: &FeatureScaler) -> PredictorResult<Self> {
        if samples.sequences.len() != samples.labels.len() {
            return Err(PredictorError::ShapeMismatch(format!(
                "{} sequences but {} labels",
                samples.sequences.len(),
                samples.labels.len()
            )));
        }
        Ok(Self {
            sequences: samples.sequences.iter().map(|s| scaler.transform(s)).collect(),
            labels: samples.labels.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

pub struct Trainer {
    config: TrainingConfig,
    rng: StdRng,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> PredictorResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `model` in place.
    ///
    /// Early stopping watches validation loss (training loss when there is
    /// no validation set). When training ends the best-seen parameters are
    /// restored.
    pub fn fit(
        &mut self,
        model: &mut SequenceClassifier,
        train: &EncodedSet,
        validation: Option<&EncodedSet>,
        mut checkpoint: Option<Checkpoint<'_>>,
    ) -> PredictorResult<TrainingHistory> {
        if train.is_empty() {
            return Err(PredictorError::InvalidConfig("training set is empty".into()));
        }
        let validation = validation.filter(|v| !v.is_empty());
        if let Some(seed) = self.config.seed {
            <TrainingBackend as Backend>::seed(seed);
        }

        let architecture = model.architecture().clone();
        let device = device();
        let mut network = model.to_training()?;
        let mut optimizer = AdamConfig::new()
            .with_epsilon(ADAM_EPSILON)
            .init::<TrainingBackend, BurnoutNetwork<TrainingBackend>>();
        let loss_fn: CrossEntropyLoss<TrainingBackend> = CrossEntropyLossConfig::new().init(&device);
        let learning_rate = self.config.learning_rate as f64;

        let mut history = TrainingHistory::default();
        let mut order: Vec<usize> = (0..train.len()).collect();

        let mut best_monitor = f32::INFINITY;
        let mut best_network: Option<BurnoutNetwork<TrainingBackend>> = None;
        let mut best_val_accuracy = f32::NEG_INFINITY;
        let mut wait = 0usize;

        log::info!(
            "Training on {} samples ({} validation) for up to {} epochs",
            train.len(),
            validation.map(EncodedSet::len).unwrap_or(0),
            self.config.epochs
        );

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut self.rng);

            let mut loss_sum = 0.0f32;
            let mut hits = 0.0f32;
            for chunk in order.chunks(self.config.batch_size) {
                let batch: Vec<Vec<DayVector>> = chunk.iter().map(|&i| train.sequences[i].clone()).collect();
                let labels: Vec<Label> = chunk.iter().map(|&i| train.labels[i]).collect();

                let logits = network.forward(to_input::<TrainingBackend>(&batch, &device)?);
                let loss = loss_fn.forward(logits.clone(), to_targets::<TrainingBackend>(&labels, &device));

                let probabilities = to_probabilities(softmax(logits.detach(), 1))?;
                loss_sum += metrics::cross_entropy(&probabilities, &labels) * chunk.len() as f32;
                hits += metrics::accuracy(&probabilities, &labels) * chunk.len() as f32;

                let grads = GradientsParams::from_grads(loss.backward(), &network);
                network = optimizer.step(learning_rate, network, grads);
            }

            let loss = loss_sum / train.len() as f32;
            let accuracy = hits / train.len() as f32;
            let current = SequenceClassifier::from_training(&architecture, &network);
            let report = match validation {
                Some(set) => Some(evaluate(&current, set)?),
                None => None,
            };
            history.record(loss, accuracy, report.as_ref());

            match &report {
                Some(r) => log::info!(
                    "Epoch {}/{} - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
                    epoch + 1,
                    self.config.epochs,
                    loss,
                    accuracy,
                    r.loss,
                    r.accuracy
                ),
                None => log::info!(
                    "Epoch {}/{} - loss: {:.4} - accuracy: {:.4}",
                    epoch + 1,
                    self.config.epochs,
                    loss,
                    accuracy
                ),
            }

            if let (Some(r), Some(save)) = (&report, checkpoint.as_deref_mut()) {
                if r.accuracy > best_val_accuracy {
                    log::info!("val_accuracy improved from {:.4} to {:.4}, checkpointing", best_val_accuracy.max(0.0), r.accuracy);
                    best_val_accuracy = r.accuracy;
                    save(&current)?;
                }
            }

            let monitored = report.as_ref().map(|r| r.loss).unwrap_or(loss);
            if monitored < best_monitor {
                best_monitor = monitored;
                best_network = Some(network.clone());
                history.best_epoch = Some(epoch);
                wait = 0;
            } else {
                wait += 1;
                if wait >= self.config.patience {
                    log::info!("Early stopping at epoch {}; best epoch {:?}", epoch + 1, history.best_epoch.map(|e| e + 1));
                    history.stopped_epoch = Some(epoch);
                    break;
                }
            }
        }

        *model = SequenceClassifier::from_training(&architecture, best_network.as_ref().unwrap_or(&network));
        Ok(history)
    }
}

/// Inference-mode probabilities for a whole set, in batches
pub fn predict_set(model: &SequenceClassifier, set: &EncodedSet) -> PredictorResult<Vec<Probabilities>> {
    let mut probabilities = Vec::with_capacity(set.len());
    for chunk in set.sequences.chunks(EVAL_BATCH) {
        probabilities.extend(model.predict_proba(chunk)?);
    }
    Ok(probabilities)
}

/// Loss, accuracy, precision, recall and F1 on a labelled set
pub fn evaluate(model: &SequenceClassifier, set: &EncodedSet) -> PredictorResult<EvaluationReport> {
    let probabilities = predict_set(model, set)?;
    Ok(EvaluationReport::compute(&probabilities, &set.labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::ArchitectureConfig;
    use crate::logic::dataset::{sequential_split, SequenceGenerator};

    fn tiny() -> ArchitectureConfig {
        ArchitectureConfig {
            lstm_units: vec![8, 4],
            dense_units: vec![8],
            recurrent_dropout: 0.3,
            dense_dropout: 0.2,
        }
    }

    fn sets(n: usize) -> (EncodedSet, EncodedSet) {
        let samples: Samples = SequenceGenerator::with_seed(11).unwrap().generate(n).into();
        let (train, val) = sequential_split(samples, 0.25).unwrap();
        let scaler = FeatureScaler::fit(&train.sequences);
        (
            EncodedSet::encode(&train, &scaler).unwrap(),
            EncodedSet::encode(&val, &scaler).unwrap(),
        )
    }

    fn config(epochs: usize, patience: usize) -> TrainingConfig {
        TrainingConfig {
            epochs,
            batch_size: 16,
            learning_rate: 0.01,
            patience,
            seed: Some(5),
        }
    }

    fn model(seed: u64) -> SequenceClassifier {
        SequenceClassifier::build(&tiny(), Some(seed)).unwrap()
    }

    #[test]
    fn test_fit_records_every_epoch() {
        let (train, val) = sets(80);
        let mut model = model(1);
        let mut trainer = Trainer::new(config(4, 10)).unwrap();

        let history = trainer.fit(&mut model, &train, Some(&val), None).unwrap();

        assert_eq!(history.epochs(), 4);
        assert_eq!(history.val_loss.len(), 4);
        assert_eq!(history.val_precision.len(), 4);
        assert!(history.loss.iter().all(|l| l.is_finite()));
        assert!(history.best_epoch.is_some());
        assert!(!history.stopped_early());
    }

    #[test]
    fn test_training_learns_separable_classes() {
        let (train, val) = sets(160);
        let mut model = model(2);
        let before = evaluate(&model, &val).unwrap();

        let mut trainer = Trainer::new(config(8, 10)).unwrap();
        trainer.fit(&mut model, &train, Some(&val), None).unwrap();
        let after = evaluate(&model, &val).unwrap();

        assert!(after.loss < before.loss, "{} -> {}", before.loss, after.loss);
    }

    #[test]
    fn test_early_stopping_restores_best() {
        let (train, val) = sets(40);
        let mut model = model(3);
        // A huge learning rate makes validation loss diverge quickly
        let mut trainer = Trainer::new(TrainingConfig {
            learning_rate: 5.0,
            ..config(30, 2)
        })
        .unwrap();

        let history = trainer.fit(&mut model, &train, Some(&val), None).unwrap();

        let best = history.best_epoch.unwrap();
        if let Some(stopped) = history.stopped_epoch {
            assert_eq!(stopped, best + 2);
            assert!(history.epochs() < 30);
        }
        // The restored model scores exactly the best recorded validation loss
        let restored = evaluate(&model, &val).unwrap();
        assert!((restored.loss - history.val_loss[best]).abs() < 1e-5);
        let min = history.val_loss.iter().cloned().fold(f32::INFINITY, f32::min);
        assert_eq!(history.val_loss[best], min);
    }

    #[test]
    fn test_checkpoint_fires_on_improvement() {
        let (train, val) = sets(40);
        let mut model = model(4);
        let mut trainer = Trainer::new(config(3, 10)).unwrap();

        let mut saved = 0;
        let mut on_improve = |_: &SequenceClassifier| -> PredictorResult<()> {
            saved += 1;
            Ok(())
        };
        let history = trainer.fit(&mut model, &train, Some(&val), Some(&mut on_improve)).unwrap();

        // First epoch always improves on "nothing yet"
        assert!(saved >= 1);
        let mut best = f32::NEG_INFINITY;
        let improvements = history
            .val_accuracy
            .iter()
            .filter(|a| {
                let improved = **a > best;
                if improved {
                    best = **a;
                }
                improved
            })
            .count();
        assert_eq!(saved, improvements);
    }

    #[test]
    fn test_rejects_empty_training_set() {
        let empty = EncodedSet {
            sequences: Vec::new(),
            labels: Vec::new(),
        };
        let mut trainer = Trainer::new(config(1, 1)).unwrap();
        assert!(trainer.fit(&mut model(5), &empty, None, None).is_err());
    }
}
