//! Loss and argmax helpers shared by the estimator model functions.

use burn::{
    nn::loss::CrossEntropyLoss,
    tensor::{backend::Backend, Int, Tensor},
};

/// Sparse softmax cross-entropy, averaged over the batch.
///
/// Equivalent to taking softmax over the class axis of `logits` and the mean
/// negative log-likelihood of the integer `targets`.
///
/// # Shape Requirements
/// - logits: [N, C] where N is the batch size, C the number of classes
/// - targets: [N] with values in [0, C)
///
/// # Panics
///
/// Panics with a `SHAPE ERROR:` message when the batch dimensions disagree
/// or the class dimension is empty. Callers are expected to have validated
/// target values beforehand.
pub fn sparse_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let logits_dims = logits.dims();
    let targets_dims = targets.dims();

    if logits_dims[0] != targets_dims[0] {
        panic!(
            "SHAPE ERROR: logits batch dimension {} must match targets batch dimension {}",
            logits_dims[0], targets_dims[0]
        );
    }
    if logits_dims[1] == 0 {
        panic!("SHAPE ERROR: logits must have at least one class column");
    }

    let device = logits.device();
    CrossEntropyLoss::new(None, &device).forward(logits, targets)
}

/// Validate a scalar loss for training stability.
///
/// # Panics
///
/// Panics if the loss is NaN, infinite, or negative. Cross-entropy is
/// non-negative, so any of these indicates a broken pipeline rather than a
/// recoverable condition.
pub fn validate_loss_value<B: Backend>(loss: &Tensor<B, 1>, iteration: usize) {
    let loss_data = loss.to_data();
    let loss_value = if let Ok(slice) = loss_data.as_slice::<f32>() {
        slice[0]
    } else {
        return;
    };

    if !loss_value.is_finite() {
        panic!(
            "TRAINING FAILURE: loss is {} at iteration {}. Check the learning rate and input scaling.",
            loss_value, iteration
        );
    }
    if loss_value < 0.0 {
        panic!(
            "LOSS ERROR: loss is negative ({:.6}) at iteration {}. Cross-entropy must be non-negative.",
            loss_value, iteration
        );
    }
}

/// Argmax over the class axis with deterministic tie-breaking.
///
/// When several classes share the maximum score, the smallest class index
/// wins. Implemented with the small-offset trick so the whole computation
/// stays on device: each class column is biased down by `index * eps` with
/// `eps` scaled to the input magnitude, then a plain argmax is taken.
///
/// # Arguments
/// * `scores` - Tensor with shape [N, C] (logits or probabilities)
///
/// # Returns
/// * Tensor with shape [N] containing class indices in [0, C)
pub fn argmax_with_tie_break_smallest<B: Backend>(scores: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    let [batch, classes] = scores.dims();
    if classes == 0 {
        panic!("SHAPE ERROR: argmax requires at least one class column");
    }
    let device = scores.device();

    let max_abs = scores.clone().abs().max();
    let one = Tensor::<B, 1>::ones([1], &device);
    let eps = Tensor::<B, 1>::from_floats([1e-6f32], &device) * (one + max_abs);

    let class_indices_data: Vec<f32> = (0..classes).map(|i| i as f32).collect();
    let class_indices = Tensor::<B, 1>::from_floats(class_indices_data.as_slice(), &device)
        .unsqueeze_dim::<2>(0); // [1, C]

    let adjusted = scores - class_indices * eps.unsqueeze_dim::<2>(0);

    adjusted.argmax(1).reshape([batch])
}
