//! Drover execution engine
//!
//! Actions, the registry that builds them from scripts, the per-action
//! lifecycle scheduler, sessions and the script runner.

pub mod action;
pub mod builtins;
pub mod connection;
pub mod context;
pub mod error;
pub mod registry;
pub mod report;
pub mod runner;
pub mod session;
pub mod settings;

pub use action::Action;
pub use connection::{Connection, Connector, OfflineConnection};
pub use context::ActionContext;
pub use error::{RegistryError, RunError};
pub use registry::ActionRegistry;
pub use runner::{run_script, RunReport, Runner, SessionOutcome};
pub use session::{MetricsSnapshot, RequestMetrics, Session, SessionBuilder};
pub use settings::{ActionSettings, Capabilities, SettingsFactory, TypedFactory};
