//! seq-cnn-rs: convolutional and convolutional-recurrent classifiers for
//! fixed-size two-dimensional sequence windows.
//!
//! Each architecture is a burn `Module` plus a `model_fn`-style entry point
//! that, given a features mapping, optional labels, an execution [`Mode`] and
//! a hyperparameter bundle, returns a mode-specific estimator specification.
//!
//! [`Mode`]: seqcnn::architectures::base::estimator::Mode

pub mod seqcnn;

pub use seqcnn::settings::{settings, Settings};
