//! `thinktime`: simulated user pause

use async_trait::async_trait;
use drover_core::ActionError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::context::ActionContext;
use crate::settings::{ActionSettings, Capabilities};

/// Pause for `delay` seconds, varied uniformly by up to `jitter` seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkTimeSettings {
    pub delay: f64,
    pub jitter: f64,
}

impl ThinkTimeSettings {
    pub fn new(delay: f64, jitter: f64) -> Self {
        Self { delay, jitter }
    }

    /// Pick the duration of one pause
    pub fn pick_delay(&self) -> Duration {
        let offset = if self.jitter > 0.0 {
            rand::thread_rng().gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        let seconds = (self.delay + offset).max(0.0);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
impl ActionSettings for ThinkTimeSettings {
    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        let delay = self.pick_delay();
        debug!("Thinking for {:?}", delay);
        let abort = ctx.session.abort_signal();
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = abort.cancelled() => Err(ActionError::Aborted),
        }
    }

    fn validate(&self) -> Result<Vec<String>, ActionError> {
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(ActionError::Validation(format!("delay must be >= 0, got {}", self.delay)));
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(ActionError::Validation(format!("jitter must be >= 0, got {}", self.jitter)));
        }

        let mut warnings = Vec::new();
        if self.delay == 0.0 && self.jitter == 0.0 {
            warnings.push("think time has no delay".to_string());
        }
        Ok(warnings)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::THINK_TIME
    }
}
