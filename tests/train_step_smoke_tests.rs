//! Trainer smoke tests on the autodiff backend.

use std::collections::HashMap;

use burn::tensor::{Distribution, Int, Tensor};
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;

use seq_cnn_rs::seqcnn::architectures::base::{
    cnn::Cnn,
    config::ModelParams,
    estimator::{FeatureMap, FEATURE_KEY},
    metrics::LoggingHook,
    recurrent::{Cnn2xLstm, CnnLstm},
    train::EstimatorTrainer,
};

type TestBackend = Autodiff<NdArray<f32>>;

fn tiny_params() -> ModelParams {
    let mut params = ModelParams::new(2);
    params.input_rows = 8;
    params.input_cols = 4;
    params.dense_units = 8;
    params.lstm_hidden = 4;
    params
}

fn batch(
    params: &ModelParams,
    batch_size: usize,
) -> (FeatureMap<TestBackend>, Tensor<TestBackend, 1, Int>) {
    let device = Default::default();
    let mut features = HashMap::new();
    features.insert(
        FEATURE_KEY.to_string(),
        Tensor::random(
            [batch_size, params.input_rows, params.input_cols],
            Distribution::Normal(0.0, 1.0),
            &device,
        ),
    );
    let labels: Vec<i64> = (0..batch_size as i64)
        .map(|i| i % params.n_classes as i64)
        .collect();
    (features, Tensor::from_ints(labels.as_slice(), &device))
}

#[test]
fn test_cnn_train_steps_produce_finite_losses() {
    let params = tiny_params();
    let device = Default::default();
    let model = Cnn::<TestBackend>::new(&params, &device);
    let mut trainer = EstimatorTrainer::new(model, params.clone())
        .unwrap()
        .with_hook(LoggingHook::new(1));

    let (features, labels) = batch(&params, 4);
    for _ in 0..3 {
        let loss = trainer.train_step(&features, &labels).expect("train step");
        assert!(loss.is_finite());
        assert!(loss >= 0.0);
    }
    assert_eq!(trainer.iteration, 3);
}

#[test]
fn test_cnn_eval_and_predict_after_training() {
    let params = tiny_params();
    let device = Default::default();
    let model = Cnn::<TestBackend>::new(&params, &device);
    let mut trainer = EstimatorTrainer::new(model, params.clone()).unwrap();

    let (features, labels) = batch(&params, 4);
    trainer.train_step(&features, &labels).expect("train step");

    let report = trainer.eval_step(&features, &labels).expect("eval step");
    assert!(report.loss.is_finite());
    assert!(report.loss >= 0.0);
    assert!((0.0..=1.0).contains(&report.metrics.accuracy));

    let predictions = trainer.predict(&features).expect("predict");
    assert_eq!(predictions.classes.dims(), [4]);
    let class_data = predictions.classes.to_data();
    for &class in class_data.as_slice::<i64>().unwrap() {
        assert!((0..params.n_classes as i64).contains(&class));
    }
}

#[test]
fn test_training_changes_the_model_output() {
    let params = tiny_params();
    let device = Default::default();
    let model = Cnn::<TestBackend>::new(&params, &device);
    let mut trainer = EstimatorTrainer::new(model, params.clone()).unwrap();

    let (features, labels) = batch(&params, 4);
    let before = trainer.predict(&features).expect("predict before");

    for _ in 0..5 {
        trainer.train_step(&features, &labels).expect("train step");
    }
    let after = trainer.predict(&features).expect("predict after");

    let diff: f32 = before
        .probabilities
        .sub(after.probabilities)
        .abs()
        .max()
        .into_scalar();
    assert!(diff > 0.0, "optimizer steps should update the parameters");
}

#[test]
fn test_cnn_lstm_train_step() {
    let params = tiny_params();
    let device = Default::default();
    let model = CnnLstm::<TestBackend>::new(&params, &device);
    let mut trainer = EstimatorTrainer::new(model, params.clone()).unwrap();

    let (features, labels) = batch(&params, 2);
    let loss = trainer.train_step(&features, &labels).expect("train step");
    assert!(loss.is_finite());
    assert_eq!(trainer.iteration, 1);
}

#[test]
fn test_cnn_2x_lstm_train_step_with_double_pooling() {
    let params = tiny_params();
    let device = Default::default();
    let model = Cnn2xLstm::<TestBackend>::new(&params, &device);
    let mut trainer = EstimatorTrainer::new(model, params.clone()).unwrap();

    // Gradients must flow through both non-square pooled feature maps.
    let (features, labels) = batch(&params, 2);
    let loss = trainer.train_step(&features, &labels).expect("train step");
    assert!(loss.is_finite());
    assert!(loss >= 0.0);
}

#[test]
fn test_trainer_rejects_invalid_params() {
    let mut params = tiny_params();
    let device = Default::default();
    let model = Cnn::<TestBackend>::new(&params, &device);
    params.learning_rate = -1.0;
    assert!(EstimatorTrainer::new(model, params).is_err());
}
