//! Statistics configuration

use drover_stats::{SampleSettings, StatsCollector, StatsLevel};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

/// Statistics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// off, on or full
    pub level: StatsLevel,

    /// Samples buffered per collector before they are merged
    pub buffer_capacity: usize,

    /// Seconds after which buffered samples are merged anyway
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub purge_interval: Duration,
}

impl Default for StatsConfig {
    fn default() -> Self {
        let samples = SampleSettings::default();
        Self {
            level: StatsLevel::On,
            buffer_capacity: samples.buffer_capacity,
            purge_interval: samples.purge_interval,
        }
    }
}

impl StatsConfig {
    pub fn sample_settings(&self) -> SampleSettings {
        SampleSettings {
            buffer_capacity: self.buffer_capacity,
            purge_interval: self.purge_interval,
        }
    }

    /// Build a collector for this configuration
    pub fn build_collector(&self) -> StatsCollector {
        StatsCollector::with_sample_settings(self.level, self.sample_settings())
    }
}

impl Validatable for StatsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.buffer_capacity, "buffer_capacity", self.domain_name())?;
        if self.purge_interval.is_zero() {
            return Err(self.validation_error("purge_interval must be greater than 0"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "stats"
    }
}
