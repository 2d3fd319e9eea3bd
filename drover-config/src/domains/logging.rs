//! Logging configuration

use drover_logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, Validatable};

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or `tracing` filter directive, e.g. `info` or `drover_execution=debug`
    pub level: String,

    pub format: LogFormat,

    /// Write the structured action log as JSON lines to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_log: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            action_log: None,
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber for this configuration
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        drover_logging::init_tracing(&self.level, self.format)
    }
}

impl Validatable for LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.level.is_empty() {
            return Err(self.validation_error("level cannot be empty"));
        }
        // Filter directives are checked by the subscriber itself
        if !self.level.contains('=') {
            validate_enum_choice(&self.level.to_lowercase(), &LEVELS, "level", self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "logging"
    }
}
