//! Burnout Predictor lifecycle
//!
//! ```text
//! Unbuilt --build--> Built --train--> Trained --persist--> Persisted
//! Unbuilt --load (file)--> Persisted
//! Unbuilt --load (no file)--> build, train, persist --> Persisted
//! ```
//!
//! Only `Trained` and `Persisted` models answer `predict`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Unbuilt,
    Built,
    Trained,
    Persisted,
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Trained | ModelState::Persisted)
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelState::Unbuilt => "unbuilt",
            ModelState::Built => "built",
            ModelState::Trained => "trained",
            ModelState::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

#[cfg(feature = "lstm")]
pub use learned_backend::BurnoutPredictor;

#[cfg(feature = "lstm")]
mod learned_backend {
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::ModelState;
    use crate::error::{PredictorError, PredictorResult};
    use crate::logic::config::{PredictorConfig, TrainingConfig};
    use crate::logic::dataset::{sequential_split, Samples, SequenceGenerator};
    use crate::logic::features::{FeatureVector, Sequence};
    use crate::logic::model::history::TrainingHistory;
    use crate::logic::model::learned::{predict_sequence, LearnedScorer};
    use crate::logic::model::metrics::EvaluationReport;
    use crate::logic::model::network::SequenceClassifier;
    use crate::logic::model::scaler::FeatureScaler;
    use crate::logic::model::scorer::PredictionResult;
    use crate::logic::model::storage::{load_model, save_model, ModelInfo};
    use crate::logic::model::training::{evaluate, EncodedSet, Trainer};
    use crate::logic::risk::Label;

    pub struct BurnoutPredictor {
        config: PredictorConfig,
        state: ModelState,
        network: Option<SequenceClassifier>,
        scaler: FeatureScaler,
        info: Option<ModelInfo>,
        history: Option<TrainingHistory>,
    }

    impl BurnoutPredictor {
        pub fn new(config: PredictorConfig) -> PredictorResult<Self> {
            config.validate()?;
            Ok(Self {
                config,
                state: ModelState::Unbuilt,
                network: None,
                scaler: FeatureScaler::identity(),
                info: None,
                history: None,
            })
        }

        pub fn state(&self) -> ModelState {
            self.state
        }

        pub fn config(&self) -> &PredictorConfig {
            &self.config
        }

        pub fn network(&self) -> Option<&SequenceClassifier> {
            self.network.as_ref()
        }

        pub fn scaler(&self) -> &FeatureScaler {
            &self.scaler
        }

        /// Id and save time of the model on disk, once persisted or loaded
        pub fn info(&self) -> Option<&ModelInfo> {
            self.info.as_ref()
        }

        pub fn history(&self) -> Option<&TrainingHistory> {
            self.history.as_ref()
        }

        pub fn param_count(&self) -> usize {
            self.network.as_ref().map(SequenceClassifier::param_count).unwrap_or(0)
        }

        // ====================================================================
        // BUILD / TRAIN / PERSIST
        // ====================================================================

        /// Fresh untrained network; discards any previous one
        pub fn build(&mut self) -> PredictorResult<()> {
            self.network = Some(SequenceClassifier::build(&self.config.architecture, self.config.training.seed)?);
            self.scaler = FeatureScaler::identity();
            self.info = None;
            self.history = None;
            self.state = ModelState::Built;
            Ok(())
        }

        /// Fit the scaler on the training sequences, then train.
        ///
        /// Whenever validation accuracy improves the current weights are
        /// checkpointed to the model path. The best-seen weights (by
        /// validation loss) are kept in memory at the end.
        pub fn train(
            &mut self,
            sequences: &[Sequence],
            labels: &[Label],
            val_sequences: &[Sequence],
            val_labels: &[Label],
            epochs: usize,
            batch_size: usize,
        ) -> PredictorResult<TrainingHistory> {
            if self.state == ModelState::Unbuilt {
                return Err(PredictorError::InvalidState {
                    operation: "train",
                    state: self.state,
                });
            }
            check_aligned(sequences, labels)?;
            check_aligned(val_sequences, val_labels)?;

            let train = Samples::new(sequences.to_vec(), labels.to_vec())?;
            let validation = Samples::new(val_sequences.to_vec(), val_labels.to_vec())?;

            self.scaler = FeatureScaler::fit(&train.sequences);
            self.scaler.save(&self.config.scaler_path)?;

            let train_set = EncodedSet::encode(&train, &self.scaler)?;
            let val_set = EncodedSet::encode(&validation, &self.scaler)?;

            let mut trainer = Trainer::new(TrainingConfig {
                epochs,
                batch_size,
                ..self.config.training.clone()
            })?;

            let model_path = self.config.model_path.clone();
            let mut checkpoint = |network: &SequenceClassifier| -> PredictorResult<()> {
                save_model(network, &model_path).map(|_| ())
            };

            let network = self.network.as_mut().ok_or(PredictorError::InvalidState {
                operation: "train",
                state: ModelState::Unbuilt,
            })?;
            let history = trainer.fit(network, &train_set, Some(&val_set), Some(&mut checkpoint))?;

            self.history = Some(history.clone());
            self.state = ModelState::Trained;
            Ok(history)
        }

        /// Write the in-memory model and scaler to their configured paths
        pub fn persist(&mut self) -> PredictorResult<&ModelInfo> {
            let network = match (&self.network, self.state.is_ready()) {
                (Some(network), true) => network,
                _ => {
                    return Err(PredictorError::InvalidState {
                        operation: "persist",
                        state: self.state,
                    })
                }
            };

            let info = save_model(network, &self.config.model_path)?;
            self.scaler.save(&self.config.scaler_path)?;
            self.state = ModelState::Persisted;
            Ok(self.info.insert(info))
        }

        /// Load the stored model, or train and persist one when none exists
        pub fn load(&mut self) -> PredictorResult<ModelState> {
            if self.config.model_path.exists() {
                let (network, info) = load_model(&self.config.model_path)?;
                self.scaler = FeatureScaler::load_or_identity(&self.config.scaler_path)?;
                self.network = Some(network);
                self.info = Some(info);
                self.state = ModelState::Persisted;
                return Ok(self.state);
            }

            log::warn!(
                "No model at {}, training a bootstrap model",
                self.config.model_path.display()
            );
            self.bootstrap()?;
            Ok(self.state)
        }

        fn bootstrap(&mut self) -> PredictorResult<()> {
            let bootstrap = self.config.bootstrap.clone();
            let mut generator = match bootstrap.seed {
                Some(seed) => SequenceGenerator::with_seed(seed)?,
                None => SequenceGenerator::new()?,
            };
            let samples: Samples = generator.generate(bootstrap.samples).into();
            let (train, val) = sequential_split(samples, bootstrap.validation_fraction)?;

            self.build()?;
            self.train(
                &train.sequences,
                &train.labels,
                &val.sequences,
                &val.labels,
                bootstrap.epochs,
                self.config.training.batch_size,
            )?;
            let info = self.persist()?;
            log::info!("Bootstrap model {} ready", info.model_id);
            Ok(())
        }

        // ====================================================================
        // INFERENCE
        // ====================================================================

        fn ready_network(&self) -> PredictorResult<&SequenceClassifier> {
            match (&self.network, self.state.is_ready()) {
                (Some(network), true) => Ok(network),
                _ => Err(PredictorError::InferencePrecondition { state: self.state }),
            }
        }

        pub fn predict_with(&self, features: &FeatureVector, rng: &mut dyn RngCore) -> PredictorResult<PredictionResult> {
            let network = self.ready_network()?;
            predict_sequence(network, &self.scaler, self.config.jitter_std, features, rng)
        }

        pub fn predict(&self, features: &FeatureVector) -> PredictorResult<PredictionResult> {
            self.predict_with(features, &mut StdRng::from_entropy())
        }

        /// Same jitter for the same seed, hence the same result
        pub fn predict_seeded(&self, features: &FeatureVector, seed: u64) -> PredictorResult<PredictionResult> {
            self.predict_with(features, &mut StdRng::seed_from_u64(seed))
        }

        /// Score a labelled set with the current network
        pub fn evaluate(&self, sequences: &[Sequence], labels: &[Label]) -> PredictorResult<EvaluationReport> {
            let network = self.ready_network()?;
            let samples = Samples::new(sequences.to_vec(), labels.to_vec())?;
            evaluate(network, &EncodedSet::encode(&samples, &self.scaler)?)
        }

        /// Hand the model to the serving side
        pub fn into_scorer(self) -> PredictorResult<LearnedScorer> {
            if !self.state.is_ready() {
                return Err(PredictorError::InferencePrecondition { state: self.state });
            }
            match self.network {
                Some(network) => Ok(LearnedScorer::new(network, self.scaler, self.config.jitter_std)),
                None => Err(PredictorError::InferencePrecondition { state: self.state }),
            }
        }
    }

    fn check_aligned(sequences: &[Sequence], labels: &[Label]) -> PredictorResult<()> {
        if sequences.len() != labels.len() {
            return Err(PredictorError::ShapeMismatch(format!(
                "{} sequences but {} labels",
                sequences.len(),
                labels.len()
            )));
        }
        Ok(())
    }
}
