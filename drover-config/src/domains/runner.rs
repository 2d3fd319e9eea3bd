//! Runner configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Number of simulated users running in parallel
    #[serde(default = "crate::domains::utils::default_one")]
    pub concurrent_users: usize,

    /// Times each user runs the script
    #[serde(default = "crate::domains::utils::default_one")]
    pub iterations: usize,

    /// Seconds between starting two consecutive users
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub rampup: Duration,

    /// Stop the script of a user at its first failing action
    #[serde(default = "crate::domains::utils::default_false")]
    pub stop_on_error: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrent_users: 1,
            iterations: 1,
            rampup: Duration::ZERO,
            stop_on_error: false,
        }
    }
}

impl Validatable for RunnerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.concurrent_users, "concurrent_users", self.domain_name())?;
        validate_positive(self.iterations, "iterations", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "runner"
    }
}
