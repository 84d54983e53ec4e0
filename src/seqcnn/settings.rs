//! Settings module for crate-wide configuration.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// How many optimizer steps pass between two logged scalar events.
    pub every_n_iter: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { every_n_iter: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Scalar logging settings
    pub logging: LoggingSettings,
}

impl Settings {
    /// Create a new Settings instance from environment variables and config
    /// files. Environment variables are prefixed with "SEQCNN_".
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("logging.every_n_iter", 10)?
            // Add configuration from .env file if it exists
            .add_source(File::with_name(".env").required(false))
            // Add environment variables with SEQCNN_ prefix
            .add_source(Environment::with_prefix("SEQCNN").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

/// Global settings instance
static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Get the global settings instance, initializing it if necessary.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| Settings::new().unwrap_or_else(|_| Settings::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.logging.every_n_iter, 10);
    }

    #[test]
    fn test_settings_new_with_defaults() {
        let settings = Settings::new().unwrap_or_else(|_| Settings::default());
        assert_eq!(settings.logging.every_n_iter, 10);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();

        let json = serde_json::to_string(&settings).expect("Should serialize to JSON");
        assert!(json.contains("every_n_iter"));

        let deserialized: Settings =
            serde_json::from_str(&json).expect("Should deserialize from JSON");
        assert_eq!(
            deserialized.logging.every_n_iter,
            settings.logging.every_n_iter
        );
    }

    #[test]
    fn test_global_settings_singleton() {
        let settings1 = settings();
        let settings2 = settings();

        assert_eq!(settings1 as *const Settings, settings2 as *const Settings);
        assert!(settings1.logging.every_n_iter >= 1);
    }
}
