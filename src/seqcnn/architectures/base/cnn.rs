//! Plain convolutional classifier.

use burn::{
    module::{Ignored, Module},
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation,
};

use super::config::ModelParams;
use super::estimator::EstimatorModel;

/// Filters of the first convolution layer.
pub(crate) const CONV1_FILTERS: usize = 30;
/// Filters of the second convolution layer in the plain CNN.
pub(crate) const CONV2_FILTERS: usize = 30;

/// 2x2 stride-2 max pooling expressed through reshape and block maxima.
///
/// Folds both spatial axes into blocks of two and takes the maximum over the
/// block axes, which matches stride-2 max pooling with floor division on odd
/// axes (trailing odd rows/columns are dropped).
pub(crate) fn halving_max_pool<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [batch, channels, height, width] = x.dims();
    let (pooled_rows, pooled_cols) = (height / 2, width / 2);

    let x = x.slice([
        0..batch,
        0..channels,
        0..pooled_rows * 2,
        0..pooled_cols * 2,
    ]);
    // Keep every max over the last axis: burn-ndarray's scatter backward only
    // supports indices that differ in the last dimension.
    let x = x.reshape([batch, channels, pooled_rows, 2, pooled_cols, 2]);
    let x = x.max_dim(5);
    let x = x.reshape([batch, channels, pooled_rows, 2, pooled_cols]);
    let x = x.swap_dims(3, 4);
    let x = x.max_dim(4);
    x.reshape([batch, channels, pooled_rows, pooled_cols])
}

/// Two ReLU convolution layers (3x3 then 5x5, "same" padding), optional 2x2
/// stride-2 max pooling, then a dense head with dropout.
///
/// Input windows arrive as `[batch, rows, cols]` and are expanded to a single
/// channel before the first convolution. The dense head size is derived from
/// the pooled geometry in [`ModelParams`], so the module only builds for the
/// window it was configured with.
#[derive(Module, Debug)]
pub struct Cnn<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pooling: Ignored<bool>,
    dense1: Linear<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> Cnn<B> {
    pub fn new(params: &ModelParams, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([1, CONV1_FILTERS], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let conv2 = Conv2dConfig::new([CONV1_FILTERS, CONV2_FILTERS], [5, 5])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let (rows, cols) = params.pooled_dims(1);
        let dense1 =
            LinearConfig::new(CONV2_FILTERS * rows * cols, params.dense_units).init(device);
        let dropout = DropoutConfig::new(params.dropout_rate).init();
        let output = LinearConfig::new(params.dense_units, params.n_classes).init(device);

        Self {
            conv1,
            conv2,
            pooling: Ignored(params.pooling),
            dense1,
            dropout,
            output,
        }
    }
}

impl<B: Backend> EstimatorModel<B> for Cnn<B> {
    fn forward(&self, input: Tensor<B, 3>, training: bool) -> Tensor<B, 2> {
        let [batch, rows, cols] = input.dims();
        let x = input.reshape([batch, 1, rows, cols]);

        let x = activation::relu(self.conv1.forward(x));
        let x = activation::relu(self.conv2.forward(x));
        let x = if self.pooling.0 { halving_max_pool(x) } else { x };

        let x = x.flatten::<2>(1, 3);
        let x = activation::relu(self.dense1.forward(x));
        // Dropout is active in train mode only.
        let x = if training { self.dropout.forward(x) } else { x };
        self.output.forward(x)
    }
}
