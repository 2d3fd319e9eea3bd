//! Configuration loading and environment variable handling

use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::domains::DroverConfig;
use crate::error::{ConfigError, ConfigResult};

/// Configuration loader with environment variable support
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with the `DROVER` prefix
    pub fn new() -> Self {
        Self {
            prefix: "DROVER".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML or JSON file with environment overrides
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<DroverConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        debug!("Loading configuration from {}", path.display());
        let mut config: DroverConfig = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<DroverConfig> {
        let mut config = DroverConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load from a file when one is given, from the environment otherwise
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<DroverConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut DroverConfig) -> ConfigResult<()> {
        if let Some(level) = self.parse_env_var("STATS_LEVEL")? {
            config.stats.level = level;
        }

        if let Some(enabled) = self.parse_env_var("RECONNECT_ENABLED")? {
            config.reconnect.enabled = enabled;
        }

        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(format) = self.parse_env_var("LOG_FORMAT")? {
            config.logging.format = format;
        }

        if let Some(users) = self.parse_env_var("CONCURRENT_USERS")? {
            config.runner.concurrent_users = users;
        }

        if let Some(iterations) = self.parse_env_var("ITERATIONS")? {
            config.runner.iterations = iterations;
        }

        Ok(())
    }

    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
