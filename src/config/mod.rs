//! # Configuration System
//!
//! Explicit, validated configuration for the rideflow core. All tunables come
//! from a layered load (defaults, optional file, environment overrides) rather
//! than hardcoded fallbacks scattered through the codebase.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rideflow_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().dispatch.batch_size;
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};

pub use loader::ConfigManager;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RideflowConfig {
    /// Database connection and pooling
    pub database: DatabaseConfig,

    /// Driver fanout behavior
    pub dispatch: DispatchConfig,

    /// Nearest-driver queries and pricing
    pub geo: GeoConfig,

    /// Workflow engine limits
    pub workflow: WorkflowConfig,
}

impl Default for RideflowConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            dispatch: DispatchConfig::default(),
            geo: GeoConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool: u32,
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/rideflow".to_string(),
            pool: 10,
            connect_timeout_seconds: 10,
        }
    }
}

/// Driver fanout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Drivers fetched per skip-locked batch
    pub batch_size: i64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { batch_size: 300 }
    }
}

/// Geo index and pricing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Default search radius for nearest-driver queries, in kilometers
    pub max_radius_km: f64,
    /// Default result count for nearest-driver queries
    pub nearest_limit: usize,
    /// Base tariff applied per trip kilometer before vehicle coefficients
    pub price_per_km: f64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            max_radius_km: 10.0,
            nearest_limit: 5,
            price_per_km: 1.2,
        }
    }
}

/// Workflow engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Hard cap on steps executed in a single run, to bound jump cycles
    pub max_steps_per_run: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_steps_per_run: 1000,
        }
    }
}

impl RideflowConfig {
    /// Validate configuration values that have no sensible zero state.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.database.url.is_empty() {
            return Err(crate::error::RideflowError::Configuration {
                message: "database.url must not be empty".to_string(),
            });
        }
        if self.dispatch.batch_size <= 0 {
            return Err(crate::error::RideflowError::Configuration {
                message: format!(
                    "dispatch.batch_size must be positive, got {}",
                    self.dispatch.batch_size
                ),
            });
        }
        if self.geo.max_radius_km <= 0.0 || self.geo.price_per_km < 0.0 {
            return Err(crate::error::RideflowError::Configuration {
                message: "geo.max_radius_km must be positive and geo.price_per_km non-negative"
                    .to_string(),
            });
        }
        if self.workflow.max_steps_per_run == 0 {
            return Err(crate::error::RideflowError::Configuration {
                message: "workflow.max_steps_per_run must be positive".to_string(),
            });
        }
        Ok(())
    }
}
