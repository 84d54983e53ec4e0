//! Hyperparameter bundle shared by all model functions.

use serde::{Deserialize, Serialize};

/// Hyperparameters accepted by every model function.
///
/// Mirrors the `params` mapping handed to an estimator model function: the
/// pooling flag, the number of output classes and the optimizer learning
/// rate, plus the input window geometry and the dense/recurrent head sizes.
/// The window defaults to 1000 rows by 20 columns; tests shrink it to keep
/// the dense head small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    /// Number of output classes. Must be set by the caller, at least 2.
    pub n_classes: usize,

    /// Whether to insert a 2x2 stride-2 max pooling layer after the
    /// convolution stack.
    #[serde(default = "default_true")]
    pub pooling: bool,

    /// Adam learning rate.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Rows of one input window (sequence positions).
    #[serde(default = "default_input_rows")]
    pub input_rows: usize,

    /// Columns of one input window (channels per position).
    #[serde(default = "default_input_cols")]
    pub input_cols: usize,

    /// Width of the penultimate dense layer.
    #[serde(default = "default_dense_units")]
    pub dense_units: usize,

    /// Dropout probability applied to the dense layer in train mode.
    #[serde(default = "default_dropout_rate")]
    pub dropout_rate: f64,

    /// Hidden size of each LSTM direction in the recurrent variants.
    #[serde(default = "default_lstm_hidden")]
    pub lstm_hidden: usize,
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_learning_rate() -> f64 {
    1e-3
}
fn default_input_rows() -> usize {
    1000
}
fn default_input_cols() -> usize {
    20
}
fn default_dense_units() -> usize {
    1024
}
fn default_dropout_rate() -> f64 {
    0.4
}
fn default_lstm_hidden() -> usize {
    128
}

impl ModelParams {
    /// Params for a given class count, everything else at its default.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            pooling: default_true(),
            learning_rate: default_learning_rate(),
            input_rows: default_input_rows(),
            input_cols: default_input_cols(),
            dense_units: default_dense_units(),
            dropout_rate: default_dropout_rate(),
            lstm_hidden: default_lstm_hidden(),
        }
    }

    /// Input geometry after `stages` optional pooling layers.
    ///
    /// Each stage halves both axes (stride-2 2x2 max pooling, floor
    /// division). When pooling is disabled the geometry is unchanged.
    pub fn pooled_dims(&self, stages: usize) -> (usize, usize) {
        let mut rows = self.input_rows;
        let mut cols = self.input_cols;
        if self.pooling {
            for _ in 0..stages {
                rows /= 2;
                cols /= 2;
            }
        }
        (rows, cols)
    }

    /// Validate that the bundle describes a buildable model.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_classes < 2 {
            return Err(format!(
                "n_classes must be at least 2 for classification, got {}",
                self.n_classes
            ));
        }
        if self.input_rows == 0 || self.input_cols == 0 {
            return Err(format!(
                "input window must be non-empty, got {}x{}",
                self.input_rows, self.input_cols
            ));
        }
        if self.pooling && (self.input_rows < 2 || self.input_cols < 2) {
            return Err(format!(
                "pooling requires both input axes >= 2, got {}x{}",
                self.input_rows, self.input_cols
            ));
        }
        if self.dense_units == 0 {
            return Err("dense_units must be positive".to_string());
        }
        if self.lstm_hidden == 0 {
            return Err("lstm_hidden must be positive".to_string());
        }
        if !(self.learning_rate > 0.0) {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(format!(
                "dropout_rate must be in [0, 1), got {}",
                self.dropout_rate
            ));
        }
        Ok(())
    }

    /// Validate that the window survives `stages` rounds of pooling.
    ///
    /// Each stage halves both axes, so with pooling enabled both axes must be
    /// at least `2^stages` for the deepest feature map to stay non-empty.
    pub fn validate_for_stages(&self, stages: usize) -> Result<(), String> {
        self.validate()?;
        if self.pooling {
            let minimum = 1usize << stages;
            if self.input_rows < minimum || self.input_cols < minimum {
                return Err(format!(
                    "{} pooling stages require both input axes >= {}, got {}x{}",
                    stages, minimum, self.input_rows, self.input_cols
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_window() {
        let params = ModelParams::new(4);
        assert_eq!(params.input_rows, 1000);
        assert_eq!(params.input_cols, 20);
        assert_eq!(params.dense_units, 1024);
        assert!((params.dropout_rate - 0.4).abs() < 1e-12);
        assert!((params.learning_rate - 1e-3).abs() < 1e-12);
        assert!(params.pooling);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_pooled_dims() {
        let mut params = ModelParams::new(3);
        assert_eq!(params.pooled_dims(1), (500, 10));
        assert_eq!(params.pooled_dims(2), (250, 5));

        params.pooling = false;
        assert_eq!(params.pooled_dims(1), (1000, 20));
        assert_eq!(params.pooled_dims(2), (1000, 20));
    }

    #[test]
    fn test_validation_rejects_bad_bundles() {
        assert!(ModelParams::new(1).validate().is_err());

        let mut params = ModelParams::new(3);
        params.learning_rate = 0.0;
        assert!(params.validate().is_err());

        let mut params = ModelParams::new(3);
        params.dropout_rate = 1.0;
        assert!(params.validate().is_err());

        let mut params = ModelParams::new(3);
        params.input_cols = 0;
        assert!(params.validate().is_err());

        let mut params = ModelParams::new(3);
        params.pooling = true;
        params.input_cols = 1;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_stage_validation_scales_with_pool_depth() {
        let mut params = ModelParams::new(3);
        params.input_rows = 3;
        params.input_cols = 4;

        // One pooling stage fits a 3x4 window; two do not.
        assert!(params.validate().is_ok());
        assert!(params.validate_for_stages(1).is_ok());
        assert!(params.validate_for_stages(2).is_err());

        params.pooling = false;
        assert!(params.validate_for_stages(2).is_ok());
    }

    #[test]
    fn test_serde_round_trip_with_defaults() {
        // Only n_classes is required; everything else takes its default.
        let params: ModelParams =
            serde_json::from_str(r#"{"n_classes": 5, "pooling": false}"#)
                .expect("Should deserialize from JSON");
        assert_eq!(params.n_classes, 5);
        assert!(!params.pooling);
        assert_eq!(params.lstm_hidden, 128);

        let json = serde_json::to_string(&params).expect("Should serialize to JSON");
        let back: ModelParams =
            serde_json::from_str(&json).expect("Should deserialize from JSON");
        assert_eq!(back.n_classes, params.n_classes);
        assert_eq!(back.pooling, params.pooling);
        assert_eq!(back.dense_units, params.dense_units);
    }
}
