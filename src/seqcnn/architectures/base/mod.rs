//! Base architecture modules.

pub mod cnn;
pub mod config;
pub mod estimator;
pub mod loss_utils;
pub mod metrics;
pub mod recurrent;
pub mod train;
