//! Estimator model-function contract.
//!
//! Every architecture in this crate is usable through the same contract: a
//! features mapping, optional labels, an execution [`Mode`] and a
//! [`ModelParams`] bundle go in, a mode-specific [`EstimatorSpec`] comes out.
//! Predict mode yields bare predictions; train and evaluate mode additionally
//! yield the scalar loss and evaluation metrics. The optimizer step itself
//! lives in [`super::train::EstimatorTrainer`].

use std::collections::HashMap;

use burn::tensor::{activation, backend::Backend, Int, Tensor};

use super::cnn::Cnn;
use super::config::ModelParams;
use super::loss_utils;
use super::metrics::{self, EvalMetrics};
use super::recurrent::{Cnn2xLstm, CnnLstm};

/// Key under which the features mapping carries the input batch.
pub const FEATURE_KEY: &str = "X";

/// Features mapping handed to a model function. The `"X"` entry holds one
/// batch of input windows, `[batch, rows, cols]`.
pub type FeatureMap<B> = HashMap<String, Tensor<B, 3>>;

/// Execution mode of a model function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
    Predict,
}

impl Mode {
    /// Whether dropout and other train-only behavior is active.
    pub fn is_training(self) -> bool {
        matches!(self, Mode::Train)
    }

    /// Whether this mode computes a loss and therefore requires labels.
    pub fn needs_labels(self) -> bool {
        !matches!(self, Mode::Predict)
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Mode::Train),
            "eval" | "evaluate" => Ok(Mode::Eval),
            "predict" | "infer" => Ok(Mode::Predict),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

/// Per-sample outputs present in every mode.
#[derive(Debug, Clone)]
pub struct Predictions<B: Backend> {
    /// Predicted class index per sample, `[batch]`, values in [0, n_classes).
    pub classes: Tensor<B, 1, Int>,
    /// Softmax class probabilities, `[batch, n_classes]`.
    pub probabilities: Tensor<B, 2>,
}

/// Mode-specific result of a model function.
#[derive(Debug, Clone)]
pub enum EstimatorSpec<B: Backend> {
    /// Predict mode: predictions only.
    Predict { predictions: Predictions<B> },
    /// Train/evaluate mode: predictions plus loss and metrics.
    Fit {
        loss: Tensor<B, 1>,
        predictions: Predictions<B>,
        metrics: EvalMetrics,
    },
}

impl<B: Backend> EstimatorSpec<B> {
    pub fn predictions(&self) -> &Predictions<B> {
        match self {
            EstimatorSpec::Predict { predictions } => predictions,
            EstimatorSpec::Fit { predictions, .. } => predictions,
        }
    }

    pub fn loss(&self) -> Option<&Tensor<B, 1>> {
        match self {
            EstimatorSpec::Predict { .. } => None,
            EstimatorSpec::Fit { loss, .. } => Some(loss),
        }
    }

    pub fn metrics(&self) -> Option<EvalMetrics> {
        match self {
            EstimatorSpec::Predict { .. } => None,
            EstimatorSpec::Fit { metrics, .. } => Some(*metrics),
        }
    }
}

/// A classifier usable through the estimator contract.
pub trait EstimatorModel<B: Backend> {
    /// Logits `[batch, n_classes]` for one batch of input windows
    /// `[batch, rows, cols]`. `training` gates dropout.
    fn forward(&self, input: Tensor<B, 3>, training: bool) -> Tensor<B, 2>;
}

/// Run `model` under the estimator contract.
///
/// Validates the features mapping and labels against `params`, runs the
/// forward pass with dropout gated on `mode`, and assembles the mode-specific
/// specification: softmax probabilities and tie-broken argmax classes always,
/// sparse cross-entropy loss and accuracy in train/evaluate mode.
pub fn estimator_spec<B: Backend, M: EstimatorModel<B>>(
    model: &M,
    features: &FeatureMap<B>,
    labels: Option<&Tensor<B, 1, Int>>,
    mode: Mode,
    params: &ModelParams,
) -> Result<EstimatorSpec<B>, String> {
    params.validate()?;

    let input = features
        .get(FEATURE_KEY)
        .ok_or_else(|| format!("features map is missing required key {:?}", FEATURE_KEY))?
        .clone();

    let [batch, rows, cols] = input.dims();
    if batch == 0 {
        return Err("SHAPE ERROR: input batch must be non-empty".to_string());
    }
    if rows != params.input_rows || cols != params.input_cols {
        return Err(format!(
            "SHAPE ERROR: input windows must be [batch, {}, {}], got [{}, {}, {}]",
            params.input_rows, params.input_cols, batch, rows, cols
        ));
    }

    let logits = model.forward(input, mode.is_training());
    let logits_dims = logits.dims();
    if logits_dims != [batch, params.n_classes] {
        return Err(format!(
            "SHAPE ERROR: model produced logits {:?}, expected [{}, {}]",
            logits_dims, batch, params.n_classes
        ));
    }

    let probabilities = activation::softmax(logits.clone(), 1);
    let classes = loss_utils::argmax_with_tie_break_smallest(probabilities.clone());
    let predictions = Predictions {
        classes,
        probabilities,
    };

    if !mode.needs_labels() {
        return Ok(EstimatorSpec::Predict { predictions });
    }

    let targets = labels.ok_or_else(|| format!("{:?} mode requires labels", mode))?;
    let target_dims = targets.dims();
    if target_dims[0] != batch {
        return Err(format!(
            "SHAPE ERROR: labels length {} must match batch size {}",
            target_dims[0], batch
        ));
    }
    validate_label_range(targets, params.n_classes)?;

    let loss = loss_utils::sparse_cross_entropy(logits, targets.clone());
    let accuracy = metrics::accuracy(&predictions.classes, targets);

    Ok(EstimatorSpec::Fit {
        loss,
        predictions,
        metrics: EvalMetrics { accuracy },
    })
}

fn validate_label_range<B: Backend>(
    targets: &Tensor<B, 1, Int>,
    n_classes: usize,
) -> Result<(), String> {
    // iter() converts the backend's int element, so the check holds on
    // backends whose int representation is not i64.
    for (i, label) in targets.to_data().iter::<i64>().enumerate() {
        if label < 0 || label >= n_classes as i64 {
            return Err(format!(
                "label {} at position {} is outside the valid class range [0, {})",
                label, i, n_classes
            ));
        }
    }
    Ok(())
}

/// Model function for the plain convolutional classifier.
///
/// Initializes a fresh [`Cnn`] on `device` and runs it under the estimator
/// contract. Use [`super::train::EstimatorTrainer`] to keep the parameters
/// across optimizer steps.
pub fn cnn_model_fn<B: Backend>(
    features: &FeatureMap<B>,
    labels: Option<&Tensor<B, 1, Int>>,
    mode: Mode,
    params: &ModelParams,
    device: &B::Device,
) -> Result<EstimatorSpec<B>, String> {
    params.validate()?;
    let model = Cnn::new(params, device);
    estimator_spec(&model, features, labels, mode, params)
}

/// Model function for the convolutional + bidirectional-LSTM classifier.
pub fn cnn_lstm_model_fn<B: Backend>(
    features: &FeatureMap<B>,
    labels: Option<&Tensor<B, 1, Int>>,
    mode: Mode,
    params: &ModelParams,
    device: &B::Device,
) -> Result<EstimatorSpec<B>, String> {
    params.validate()?;
    let model = CnnLstm::new(params, device);
    estimator_spec(&model, features, labels, mode, params)
}

/// Model function for the double convolution stack + bidirectional-LSTM
/// classifier.
///
/// Pools twice, so the window must survive two halvings.
pub fn cnn_2x_lstm_model_fn<B: Backend>(
    features: &FeatureMap<B>,
    labels: Option<&Tensor<B, 1, Int>>,
    mode: Mode,
    params: &ModelParams,
    device: &B::Device,
) -> Result<EstimatorSpec<B>, String> {
    params.validate_for_stages(2)?;
    let model = Cnn2xLstm::new(params, device);
    estimator_spec(&model, features, labels, mode, params)
}
