//! Trump classifier contract and a small MLP that fulfils it from JSON weights.

use jass_core::model::card::DECK_SIZE;
use jass_core::model::hand::Hand;
use jass_core::model::trump::TRUMP_CLASSES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

const HIDDEN1: usize = 128;
const HIDDEN2: usize = 64;

/// Maps a hand to a probability for each trump class, in `Trump::ALL` order.
pub trait TrumpClassifier: Send + Sync {
    fn predict_distribution(&self, hand: &Hand) -> [f32; TRUMP_CLASSES];
}

#[derive(Debug)]
pub enum ClassifierError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Shape {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierError::Io(err) => write!(f, "failed to read weight file: {err}"),
            ClassifierError::Parse(err) => write!(f, "failed to parse weight JSON: {err}"),
            ClassifierError::Shape {
                layer,
                expected,
                actual,
            } => write!(f, "{layer} has wrong size: expected {expected}, got {actual}"),
        }
    }
}

impl std::error::Error for ClassifierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClassifierError::Io(err) => Some(err),
            ClassifierError::Parse(err) => Some(err),
            ClassifierError::Shape { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerWeights {
    /// Row-major `outputs x inputs`.
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

/// 36 -> 128 -> 64 -> 6 ReLU network with a softmax head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpTrumpClassifier {
    pub schema_version: String,
    pub layer1: LayerWeights,
    pub layer2: LayerWeights,
    pub layer3: LayerWeights,
}

impl MlpTrumpClassifier {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let contents = fs::read_to_string(path).map_err(ClassifierError::Io)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ClassifierError> {
        let model: MlpTrumpClassifier =
            serde_json::from_str(json).map_err(ClassifierError::Parse)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        let layers = [
            ("layer1", &self.layer1, DECK_SIZE, HIDDEN1),
            ("layer2", &self.layer2, HIDDEN1, HIDDEN2),
            ("layer3", &self.layer3, HIDDEN2, TRUMP_CLASSES),
        ];
        for (name, layer, inputs, outputs) in layers {
            check(name, layer.weights.len(), inputs * outputs)?;
            check(name, layer.biases.len(), outputs)?;
        }
        Ok(())
    }

    /// All-zero weights: a uniform distribution for every hand.
    pub fn zeroed() -> Self {
        let layer = |inputs: usize, outputs: usize| LayerWeights {
            weights: vec![0.0; inputs * outputs],
            biases: vec![0.0; outputs],
        };
        Self {
            schema_version: "1".to_string(),
            layer1: layer(DECK_SIZE, HIDDEN1),
            layer2: layer(HIDDEN1, HIDDEN2),
            layer3: layer(HIDDEN2, TRUMP_CLASSES),
        }
    }
}

impl TrumpClassifier for MlpTrumpClassifier {
    fn predict_distribution(&self, hand: &Hand) -> [f32; TRUMP_CLASSES] {
        let input = hand.to_one_hot();

        let mut hidden1 = [0.0f32; HIDDEN1];
        matmul_add_bias(&input, &self.layer1, &mut hidden1);
        relu(&mut hidden1);

        let mut hidden2 = [0.0f32; HIDDEN2];
        matmul_add_bias(&hidden1, &self.layer2, &mut hidden2);
        relu(&mut hidden2);

        let mut logits = [0.0f32; TRUMP_CLASSES];
        matmul_add_bias(&hidden2, &self.layer3, &mut logits);
        softmax(&logits)
    }
}

fn check(layer: &'static str, actual: usize, expected: usize) -> Result<(), ClassifierError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ClassifierError::Shape {
            layer,
            expected,
            actual,
        })
    }
}

fn matmul_add_bias(input: &[f32], layer: &LayerWeights, output: &mut [f32]) {
    let inputs = input.len();
    debug_assert_eq!(layer.weights.len(), output.len() * inputs);
    for (j, slot) in output.iter_mut().enumerate() {
        let row = &layer.weights[j * inputs..(j + 1) * inputs];
        *slot = layer.biases[j] + row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>();
    }
}

fn relu(values: &mut [f32]) {
    for value in values.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
}

fn softmax(logits: &[f32; TRUMP_CLASSES]) -> [f32; TRUMP_CLASSES] {
    let max_logit = logits
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);

    let mut probs = [0.0f32; TRUMP_CLASSES];
    let mut sum = 0.0;
    for (prob, logit) in probs.iter_mut().zip(logits) {
        if logit.is_finite() {
            *prob = (logit - max_logit).exp();
            sum += *prob;
        }
    }
    if sum > 0.0 {
        for prob in probs.iter_mut() {
            *prob /= sum;
        }
    }
    probs
}
