//! Configuration Loader
//!
//! Layered configuration loading: compiled defaults, then an optional
//! `rideflow.toml` (path overridable via `RIDEFLOW_CONFIG_PATH`), then
//! `RIDEFLOW_`-prefixed environment variables. Every load is validated
//! before it is handed to callers.

use std::sync::Arc;

use config::{Config, Environment, File, FileFormat};

use super::RideflowConfig;
use crate::error::{Result, RideflowError};

/// Owns a validated [`RideflowConfig`] for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<RideflowConfig>,
}

impl ConfigManager {
    /// Load configuration from defaults, optional file, and environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var("RIDEFLOW_CONFIG_PATH")
            .unwrap_or_else(|_| "rideflow.toml".to_string());
        Self::load_from_path(&path)
    }

    /// Load configuration with an explicit file path (missing file is fine;
    /// defaults plus environment still apply).
    pub fn load_from_path(path: &str) -> Result<Self> {
        let defaults = Config::try_from(&RideflowConfig::default()).map_err(|e| {
            RideflowError::Configuration {
                message: format!("failed to serialize default config: {e}"),
            }
        })?;

        let loaded = Config::builder()
            .add_source(defaults)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("RIDEFLOW").separator("__"))
            .build()
            .map_err(|e| RideflowError::Configuration {
                message: format!("failed to build configuration: {e}"),
            })?;

        let config: RideflowConfig =
            loaded
                .try_deserialize()
                .map_err(|e| RideflowError::Configuration {
                    message: format!("failed to deserialize configuration: {e}"),
                })?;

        config.validate()?;

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Access the validated configuration.
    pub fn config(&self) -> &RideflowConfig {
        &self.config
    }
}
