//! Sequence Classifier - stacked LSTM, ReLU dense layers, softmax head
//!
//! The layers are burn modules. Training runs on `TrainingBackend`
//! (autodiff over ndarray); the served model lives on `InferenceBackend`,
//! where dropout is inactive. Weights cross between the two, and to disk,
//! as recorder bytes.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::module::{AutodiffModule, Module};
use burn::nn::{Dropout, DropoutConfig, Initializer, Linear, LinearConfig, Lstm, LstmConfig};
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};

use super::metrics::Probabilities;
use crate::error::{PredictorError, PredictorResult};
use crate::logic::config::ArchitectureConfig;
use crate::logic::features::{DayVector, FEATURE_COUNT, SEQUENCE_LENGTH};
use crate::logic::risk::{Label, RISK_CLASS_COUNT};

pub type InferenceBackend = NdArray<f32>;
pub type TrainingBackend = Autodiff<InferenceBackend>;

type WeightRecorder = BinBytesRecorder<FullPrecisionSettings>;

pub fn device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

// ============================================================================
// MODULE
// ============================================================================

#[derive(Module, Debug)]
pub struct BurnoutNetwork<B: Backend> {
    lstm: Vec<Lstm<B>>,
    dense: Vec<Linear<B>>,
    head: Linear<B>,
    /// Between stacked LSTM layers
    recurrent_dropout: Dropout,
    /// After the first dense layer
    dense_dropout: Dropout,
}

impl<B: Backend> BurnoutNetwork<B> {
    pub fn new(architecture: &ArchitectureConfig, device: &B::Device) -> Self {
        let init = Initializer::XavierUniform { gain: 1.0 };
        let mut width = FEATURE_COUNT;

        let mut lstm = Vec::with_capacity(architecture.lstm_units.len());
        for &units in &architecture.lstm_units {
            lstm.push(
                LstmConfig::new(width, units, true)
                    .with_initializer(init.clone())
                    .init(device),
            );
            width = units;
        }

        let mut dense = Vec::with_capacity(architecture.dense_units.len());
        for &units in &architecture.dense_units {
            dense.push(LinearConfig::new(width, units).with_initializer(init.clone()).init(device));
            width = units;
        }

        Self {
            lstm,
            dense,
            head: LinearConfig::new(width, RISK_CLASS_COUNT).with_initializer(init).init(device),
            recurrent_dropout: DropoutConfig::new(architecture.recurrent_dropout as f64).init(),
            dense_dropout: DropoutConfig::new(architecture.dense_dropout as f64).init(),
        }
    }

    /// `[batch, SEQUENCE_LENGTH, FEATURE_COUNT]` in, `[batch, RISK_CLASS_COUNT]` logits out
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        let last = self.lstm.len().saturating_sub(1);
        let mut sequence = input;
        for (k, layer) in self.lstm.iter().enumerate() {
            let (output, _) = layer.forward(sequence, None);
            sequence = if k < last { self.recurrent_dropout.forward(output) } else { output };
        }

        // Only the final step feeds the dense stack
        let [batch, steps, units] = sequence.dims();
        let mut x: Tensor<B, 2> = sequence
            .slice([0..batch, steps - 1..steps, 0..units])
            .reshape([batch, units]);

        for (j, layer) in self.dense.iter().enumerate() {
            x = relu(layer.forward(x));
            if j == 0 {
                x = self.dense_dropout.forward(x);
            }
        }
        self.head.forward(x)
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Inference-side classifier with the architecture it was built from
#[derive(Debug, Clone)]
pub struct SequenceClassifier {
    architecture: ArchitectureConfig,
    network: BurnoutNetwork<InferenceBackend>,
}

impl SequenceClassifier {
    /// Fresh, untrained network. `seed` fixes the backend RNG used for
    /// initialisation and dropout.
    pub fn build(architecture: &ArchitectureConfig, seed: Option<u64>) -> PredictorResult<Self> {
        architecture.validate()?;
        if let Some(seed) = seed {
            <InferenceBackend as Backend>::seed(seed);
        }

        let model = Self {
            architecture: architecture.clone(),
            network: BurnoutNetwork::new(architecture, &device()),
        };
        log::info!(
            "Built classifier lstm={:?} dense={:?} ({} parameters)",
            architecture.lstm_units,
            architecture.dense_units,
            model.param_count()
        );
        Ok(model)
    }

    pub fn architecture(&self) -> &ArchitectureConfig {
        &self.architecture
    }

    pub fn param_count(&self) -> usize {
        self.network.num_params()
    }

    /// Class probabilities for already-scaled sequences
    pub fn predict_proba(&self, batch: &[Vec<DayVector>]) -> PredictorResult<Vec<Probabilities>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let input = to_input::<InferenceBackend>(batch, &device())?;
        to_probabilities(softmax(self.network.forward(input), 1))
    }

    /// Full-precision record of the weights
    pub fn to_bytes(&self) -> PredictorResult<Vec<u8>> {
        let record = self.network.clone().into_record();
        <WeightRecorder as Recorder<InferenceBackend>>::record(&WeightRecorder::default(), record, ())
            .map_err(|e| PredictorError::Backend(format!("recording weights: {}", e)))
    }

    /// Rebuild from `to_bytes` output; the record must fit `architecture`
    pub fn from_bytes(architecture: &ArchitectureConfig, bytes: Vec<u8>) -> PredictorResult<Self> {
        architecture.validate()?;
        Ok(Self {
            architecture: architecture.clone(),
            network: load_network(architecture, bytes)?,
        })
    }

    /// Trainable copy of the current weights
    pub(crate) fn to_training(&self) -> PredictorResult<BurnoutNetwork<TrainingBackend>> {
        load_network(&self.architecture, self.to_bytes()?)
    }

    pub(crate) fn from_training(architecture: &ArchitectureConfig, network: &BurnoutNetwork<TrainingBackend>) -> Self {
        Self {
            architecture: architecture.clone(),
            network: network.valid(),
        }
    }
}

fn load_network<B: Backend>(architecture: &ArchitectureConfig, bytes: Vec<u8>) -> PredictorResult<BurnoutNetwork<B>> {
    let device = B::Device::default();
    let fresh = BurnoutNetwork::<B>::new(architecture, &device);
    let expected = fresh.num_params();

    let record = <WeightRecorder as Recorder<B>>::load(&WeightRecorder::default(), bytes, &device)
        .map_err(|e| PredictorError::Backend(format!("loading weights: {}", e)))?;
    let network = fresh.load_record(record);

    if network.num_params() != expected {
        return Err(PredictorError::ShapeMismatch(format!(
            "weights hold {} parameters, architecture expects {}",
            network.num_params(),
            expected
        )));
    }
    Ok(network)
}

// ============================================================================
// TENSOR CONVERSION
// ============================================================================

/// Stack sequences into a `[batch, SEQUENCE_LENGTH, FEATURE_COUNT]` tensor
pub(crate) fn to_input<B: Backend>(batch: &[Vec<DayVector>], device: &B::Device) -> PredictorResult<Tensor<B, 3>> {
    if let Some(bad) = batch.iter().find(|s| s.len() != SEQUENCE_LENGTH) {
        return Err(PredictorError::InvalidSequence {
            expected: SEQUENCE_LENGTH,
            actual: bad.len(),
        });
    }
    let values: Vec<f32> = batch.iter().flatten().flat_map(|day| day.iter().copied()).collect();
    let data = TensorData::new(values, [batch.len(), SEQUENCE_LENGTH, FEATURE_COUNT]);
    Ok(Tensor::from_data(data, device))
}

/// Class indices for the cross-entropy loss
pub(crate) fn to_targets<B: Backend>(labels: &[Label], device: &B::Device) -> Tensor<B, 1, Int> {
    let classes: Vec<i64> = labels.iter().map(|label| label.class().index() as i64).collect();
    Tensor::from_data(TensorData::new(classes, [labels.len()]), device)
}

pub(crate) fn to_probabilities<B: Backend>(probabilities: Tensor<B, 2>) -> PredictorResult<Vec<Probabilities>> {
    let values = probabilities
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| PredictorError::Backend(format!("reading probabilities: {:?}", e)))?;

    Ok(values
        .chunks_exact(RISK_CLASS_COUNT)
        .map(|row| {
            let mut p = [0.0f32; RISK_CLASS_COUNT];
            p.copy_from_slice(row);
            p
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::SequenceGenerator;
    use crate::logic::model::scaler::FeatureScaler;

    fn tiny() -> ArchitectureConfig {
        ArchitectureConfig {
            lstm_units: vec![6, 4],
            dense_units: vec![5],
            recurrent_dropout: 0.3,
            dense_dropout: 0.2,
        }
    }

    #[test]
    fn test_default_param_count() {
        let model = SequenceClassifier::build(&ArchitectureConfig::default(), Some(0)).unwrap();
        // Each LSTM gate carries an input and a hidden bias: 4h(in + h + 2)
        let lstm = 4 * 128 * (8 + 128 + 2) + 4 * 64 * (128 + 64 + 2) + 4 * 32 * (64 + 32 + 2);
        let dense = (32 * 64 + 64) + (64 * 32 + 32) + (32 * 4 + 4);
        assert_eq!(model.param_count(), lstm + dense);
    }

    #[test]
    fn test_predict_proba_is_distribution() {
        let model = SequenceClassifier::build(&tiny(), Some(1)).unwrap();
        let (sequences, _) = SequenceGenerator::with_seed(1).unwrap().generate(3);
        let scaler = FeatureScaler::fit(&sequences);
        let batch: Vec<_> = sequences.iter().map(|s| scaler.transform(s)).collect();

        let probs = model.predict_proba(&batch).unwrap();
        assert_eq!(probs.len(), 3);
        for p in probs {
            assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-5);
            assert!(p.iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn test_rejects_short_sequences() {
        let model = SequenceClassifier::build(&tiny(), Some(1)).unwrap();
        let err = model.predict_proba(&[vec![[0.0; FEATURE_COUNT]; 5]]).unwrap_err();
        assert!(matches!(err, PredictorError::InvalidSequence { expected: 30, actual: 5 }));
    }

    #[test]
    fn test_inference_ignores_dropout() {
        let model = SequenceClassifier::build(&tiny(), Some(2)).unwrap();
        let batch = vec![vec![[0.5; FEATURE_COUNT]; SEQUENCE_LENGTH]];
        assert_eq!(model.predict_proba(&batch).unwrap(), model.predict_proba(&batch).unwrap());
    }

    #[test]
    fn test_bytes_roundtrip_keeps_predictions() {
        let model = SequenceClassifier::build(&tiny(), Some(4)).unwrap();
        let back = SequenceClassifier::from_bytes(&tiny(), model.to_bytes().unwrap()).unwrap();
        assert_eq!(back.param_count(), model.param_count());

        let batch = vec![vec![[0.1; FEATURE_COUNT]; SEQUENCE_LENGTH]];
        assert_eq!(model.predict_proba(&batch).unwrap(), back.predict_proba(&batch).unwrap());
    }

    #[test]
    fn test_training_copy_matches_inference() {
        let model = SequenceClassifier::build(&tiny(), Some(6)).unwrap();
        let trainable = model.to_training().unwrap();
        let back = SequenceClassifier::from_training(&tiny(), &trainable);

        let batch = vec![vec![[0.3; FEATURE_COUNT]; SEQUENCE_LENGTH]];
        assert_eq!(model.predict_proba(&batch).unwrap(), back.predict_proba(&batch).unwrap());
    }
}
