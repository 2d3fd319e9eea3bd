//! Domain-specific configuration modules

pub mod logging;
pub mod reconnect;
pub mod runner;
pub mod stats;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Drover configuration combining all domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DroverConfig {
    pub stats: stats::StatsConfig,
    pub reconnect: reconnect::ReconnectConfig,
    pub logging: logging::LoggingConfig,
    pub runner: runner::RunnerConfig,
}

impl DroverConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.stats.validate()?;
        self.reconnect.validate()?;
        self.logging.validate()?;
        self.runner.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample = Self {
            reconnect: reconnect::ReconnectConfig {
                enabled: true,
                ..Default::default()
            },
            runner: runner::RunnerConfig {
                concurrent_users: 10,
                iterations: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        serde_yaml::to_string(&sample).unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
