//! Configuration for Drover
//!
//! One struct per domain (statistics, reconnect, logging, runner) combined
//! into [`DroverConfig`]. Files are YAML or JSON; `DROVER_*` environment
//! variables override file values and every domain is validated after
//! loading.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

pub use domains::logging::LoggingConfig;
pub use domains::reconnect::ReconnectConfig;
pub use domains::runner::RunnerConfig;
pub use domains::stats::StatsConfig;
pub use domains::DroverConfig;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;
