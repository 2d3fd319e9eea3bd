//! Reconnect configuration

use drover_resilience::retry::DEFAULT_RECONNECT_BACKOFF;
use drover_resilience::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::Validatable;

/// Longest single reconnect delay accepted
const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(600);

/// Reconnect configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Reconnect and restart the action after a transport disconnect
    pub enabled: bool,

    /// Seconds to wait before each reconnect attempt
    #[serde(with = "crate::domains::utils::serde_duration_list")]
    pub backoff: Vec<Duration>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backoff: DEFAULT_RECONNECT_BACKOFF.to_vec(),
        }
    }
}

impl ReconnectConfig {
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: self.enabled,
            backoff: self.backoff.clone(),
        }
    }
}

impl Validatable for ReconnectConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.backoff.is_empty() {
            return Err(self.validation_error("backoff needs at least one entry when reconnect is enabled"));
        }
        if let Some(too_long) = self.backoff.iter().find(|d| **d > MAX_BACKOFF_DELAY) {
            return Err(self.validation_error(format!(
                "backoff entry of {}s exceeds {}s",
                too_long.as_secs_f64(),
                MAX_BACKOFF_DELAY.as_secs()
            )));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "reconnect"
    }
}
