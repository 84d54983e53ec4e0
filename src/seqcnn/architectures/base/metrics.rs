//! Evaluation metrics and the training logging hook.

use burn::tensor::{backend::Backend, Int, Tensor};
use serde::{Deserialize, Serialize};

use crate::seqcnn::settings::settings;

/// Metrics bundle attached to a train/evaluate estimator specification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    /// Fraction of predictions matching the labels, in [0, 1].
    pub accuracy: f32,
}

/// Classification accuracy between predicted and true class indices.
///
/// # Panics
///
/// Panics with a `SHAPE ERROR:` message when the two tensors disagree in
/// length or the batch is empty.
pub fn accuracy<B: Backend>(
    predictions: &Tensor<B, 1, Int>,
    targets: &Tensor<B, 1, Int>,
) -> f32 {
    let pred_dims = predictions.dims();
    let target_dims = targets.dims();
    if pred_dims[0] != target_dims[0] {
        panic!(
            "SHAPE ERROR: predictions length {} must match targets length {}",
            pred_dims[0], target_dims[0]
        );
    }
    if pred_dims[0] == 0 {
        panic!("SHAPE ERROR: accuracy of an empty batch is undefined");
    }

    let matches = predictions
        .clone()
        .equal(targets.clone())
        .float()
        .mean();
    matches
        .to_data()
        .as_slice::<f32>()
        .expect("accuracy mean should be f32")[0]
}

/// Periodic logging of training scalars, the estimator logging-hook analog.
///
/// Emits one `tracing` event every `every_n_iter` optimizer steps.
#[derive(Debug, Clone)]
pub struct LoggingHook {
    every_n_iter: usize,
}

impl LoggingHook {
    pub fn new(every_n_iter: usize) -> Self {
        Self {
            every_n_iter: every_n_iter.max(1),
        }
    }

    /// Hook with the cadence configured in the global settings.
    pub fn from_settings() -> Self {
        Self::new(settings().logging.every_n_iter)
    }

    pub fn on_step(&self, iteration: usize, loss: f32, accuracy: f32) {
        if iteration % self.every_n_iter == 0 {
            tracing::info!(iteration, loss, accuracy, "train step");
        }
    }
}

impl Default for LoggingHook {
    fn default() -> Self {
        Self::from_settings()
    }
}
