//! Convolutional-recurrent classifiers.
//!
//! Both variants run their convolution stack over the full window, re-lay the
//! result out as a sequence along the row axis (`[batch, rows, ch * cols]`)
//! and feed it to a forward-backward LSTM. The last timestep of the
//! concatenated directions feeds the same dense head as the plain CNN.

use burn::{
    module::{Ignored, Module},
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BiLstm, BiLstmConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation,
};

use super::cnn::{halving_max_pool, CONV1_FILTERS};
use super::config::ModelParams;
use super::estimator::EstimatorModel;

/// Filters of the second convolution layer in the recurrent variants.
pub(crate) const CONV2_WIDE_FILTERS: usize = 64;

fn conv_pair<B: Backend>(in_channels: usize, device: &B::Device) -> (Conv2d<B>, Conv2d<B>) {
    let first = Conv2dConfig::new([in_channels, CONV1_FILTERS], [3, 3])
        .with_padding(PaddingConfig2d::Same)
        .init(device);
    let second = Conv2dConfig::new([CONV1_FILTERS, CONV2_WIDE_FILTERS], [5, 5])
        .with_padding(PaddingConfig2d::Same)
        .init(device);
    (first, second)
}

/// Conv output `[batch, ch, rows, cols]` as a row-axis sequence
/// `[batch, rows, ch * cols]`.
fn to_sequence<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 3> {
    x.swap_dims(1, 2).flatten::<3>(2, 3)
}

/// Last timestep of a `[batch, steps, features]` sequence as 2D.
fn last_step<B: Backend>(sequence: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, steps, features] = sequence.dims();
    sequence
        .slice([0..batch, steps - 1..steps, 0..features])
        .reshape([batch, features])
}

/// Two ReLU convolution layers (30 filters 3x3, 64 filters 5x5), optional
/// pooling, then a bidirectional LSTM over the row axis.
#[derive(Module, Debug)]
pub struct CnnLstm<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pooling: Ignored<bool>,
    lstm: BiLstm<B>,
    dense1: Linear<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> CnnLstm<B> {
    pub fn new(params: &ModelParams, device: &B::Device) -> Self {
        let (conv1, conv2) = conv_pair(1, device);

        let (_, cols) = params.pooled_dims(1);
        let lstm =
            BiLstmConfig::new(CONV2_WIDE_FILTERS * cols, params.lstm_hidden, true).init(device);

        let dense1 = LinearConfig::new(2 * params.lstm_hidden, params.dense_units).init(device);
        let dropout = DropoutConfig::new(params.dropout_rate).init();
        let output = LinearConfig::new(params.dense_units, params.n_classes).init(device);

        Self {
            conv1,
            conv2,
            pooling: Ignored(params.pooling),
            lstm,
            dense1,
            dropout,
            output,
        }
    }
}

impl<B: Backend> EstimatorModel<B> for CnnLstm<B> {
    fn forward(&self, input: Tensor<B, 3>, training: bool) -> Tensor<B, 2> {
        let [batch, rows, cols] = input.dims();
        let x = input.reshape([batch, 1, rows, cols]);

        let x = activation::relu(self.conv1.forward(x));
        let x = activation::relu(self.conv2.forward(x));
        let x = if self.pooling.0 { halving_max_pool(x) } else { x };

        let (sequence_out, _state) = self.lstm.forward(to_sequence(x), None);
        let x = last_step(sequence_out);

        let x = activation::relu(self.dense1.forward(x));
        let x = if training { self.dropout.forward(x) } else { x };
        self.output.forward(x)
    }
}

/// Two series of two convolution layers, each series optionally pooled, then
/// the same bidirectional LSTM head as [`CnnLstm`].
#[derive(Module, Debug)]
pub struct Cnn2xLstm<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    conv4: Conv2d<B>,
    pooling: Ignored<bool>,
    lstm: BiLstm<B>,
    dense1: Linear<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> Cnn2xLstm<B> {
    pub fn new(params: &ModelParams, device: &B::Device) -> Self {
        let (conv1, conv2) = conv_pair(1, device);
        let (conv3, conv4) = conv_pair(CONV2_WIDE_FILTERS, device);

        let (_, cols) = params.pooled_dims(2);
        let lstm =
            BiLstmConfig::new(CONV2_WIDE_FILTERS * cols, params.lstm_hidden, true).init(device);

        let dense1 = LinearConfig::new(2 * params.lstm_hidden, params.dense_units).init(device);
        let dropout = DropoutConfig::new(params.dropout_rate).init();
        let output = LinearConfig::new(params.dense_units, params.n_classes).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            conv4,
            pooling: Ignored(params.pooling),
            lstm,
            dense1,
            dropout,
            output,
        }
    }
}

impl<B: Backend> EstimatorModel<B> for Cnn2xLstm<B> {
    fn forward(&self, input: Tensor<B, 3>, training: bool) -> Tensor<B, 2> {
        let [batch, rows, cols] = input.dims();
        let x = input.reshape([batch, 1, rows, cols]);

        let x = activation::relu(self.conv1.forward(x));
        let x = activation::relu(self.conv2.forward(x));
        let x = if self.pooling.0 { halving_max_pool(x) } else { x };

        let x = activation::relu(self.conv3.forward(x));
        let x = activation::relu(self.conv4.forward(x));
        let x = if self.pooling.0 { halving_max_pool(x) } else { x };

        let (sequence_out, _state) = self.lstm.forward(to_sequence(x), None);
        let x = last_step(sequence_out);

        let x = activation::relu(self.dense1.forward(x));
        let x = if training { self.dropout.forward(x) } else { x };
        self.output.forward(x)
    }
}
