//! Optimizer wiring for the estimator model functions.
//!
//! The estimator contract produces a loss; this module turns it into
//! parameter updates. [`EstimatorTrainer`] owns a classifier module together
//! with an Adam optimizer and performs forward, loss, backward and optimizer
//! step per call, logging scalars through the periodic [`LoggingHook`].

use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, Int, Tensor},
};

use super::config::ModelParams;
use super::estimator::{estimator_spec, EstimatorModel, EstimatorSpec, FeatureMap, Mode, Predictions};
use super::loss_utils;
use super::metrics::{EvalMetrics, LoggingHook};

/// Result of one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct EvalReport {
    pub loss: f32,
    pub metrics: EvalMetrics,
}

/// Owns a classifier and its Adam optimizer across training steps.
pub struct EstimatorTrainer<B, M>
where
    B: AutodiffBackend,
    M: EstimatorModel<B> + AutodiffModule<B>,
{
    pub model: M,
    pub params: ModelParams,
    pub iteration: usize,
    optimizer: OptimizerAdaptor<Adam, M, B>,
    hook: LoggingHook,
}

impl<B, M> EstimatorTrainer<B, M>
where
    B: AutodiffBackend,
    M: EstimatorModel<B> + AutodiffModule<B>,
{
    pub fn new(model: M, params: ModelParams) -> Result<Self, String> {
        params.validate()?;

        let adam_config = AdamConfig::new().with_beta_1(0.9).with_beta_2(0.999);
        let optimizer = OptimizerAdaptor::from(adam_config.init());

        Ok(Self {
            model,
            params,
            iteration: 0,
            optimizer,
            hook: LoggingHook::from_settings(),
        })
    }

    /// Replace the logging hook, e.g. to change the cadence in tests.
    pub fn with_hook(mut self, hook: LoggingHook) -> Self {
        self.hook = hook;
        self
    }

    /// Execute one optimizer step on a labelled batch.
    ///
    /// Runs the model in train mode, validates the loss, backpropagates and
    /// applies Adam with the configured learning rate. Returns the loss value
    /// for monitoring.
    pub fn train_step(
        &mut self,
        features: &FeatureMap<B>,
        labels: &Tensor<B, 1, Int>,
    ) -> Result<f32, String> {
        let spec = estimator_spec(&self.model, features, Some(labels), Mode::Train, &self.params)?;
        let EstimatorSpec::Fit { loss, metrics, .. } = spec else {
            return Err("train mode must produce a fit specification".to_string());
        };

        loss_utils::validate_loss_value(&loss, self.iteration);
        let loss_value = loss
            .to_data()
            .as_slice::<f32>()
            .map_err(|err| format!("loss tensor is not f32: {:?}", err))?[0];

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self
            .optimizer
            .step(self.params.learning_rate, self.model.clone(), grads);

        self.hook.on_step(self.iteration, loss_value, metrics.accuracy);
        self.iteration += 1;

        Ok(loss_value)
    }

    /// Evaluate a labelled batch without updating parameters.
    pub fn eval_step(
        &self,
        features: &FeatureMap<B>,
        labels: &Tensor<B, 1, Int>,
    ) -> Result<EvalReport, String> {
        let spec = estimator_spec(&self.model, features, Some(labels), Mode::Eval, &self.params)?;
        let EstimatorSpec::Fit { loss, metrics, .. } = spec else {
            return Err("evaluate mode must produce a fit specification".to_string());
        };

        let loss_value = loss
            .to_data()
            .as_slice::<f32>()
            .map_err(|err| format!("loss tensor is not f32: {:?}", err))?[0];

        Ok(EvalReport {
            loss: loss_value,
            metrics,
        })
    }

    /// Predict class indices and probabilities for an unlabelled batch.
    pub fn predict(&self, features: &FeatureMap<B>) -> Result<Predictions<B>, String> {
        let spec = estimator_spec(&self.model, features, None, Mode::Predict, &self.params)?;
        match spec {
            EstimatorSpec::Predict { predictions } => Ok(predictions),
            EstimatorSpec::Fit { .. } => {
                Err("predict mode must not produce a fit specification".to_string())
            }
        }
    }
}
