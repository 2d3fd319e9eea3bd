//! The contract every action type implements

use async_trait::async_trait;
use bitflags::bitflags;
use drover_core::ActionError;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::context::ActionContext;
use crate::error::RegistryError;
use crate::registry::ActionRegistry;

bitflags! {
    /// Optional behaviours an action type can declare
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Runs other actions; reported as one `containeractionend` entry
        /// and never restarted after a disconnect
        const CONTAINER = 0b0000_0001;
        /// Think time; keeps its own name and label when reported after a reconnect
        const THINK_TIME = 0b0000_0010;
    }
}

/// Business logic of one action type
///
/// `execute` may issue synchronous requests through the session, queue
/// asynchronous ones, and report failures either by returning an error or by
/// adding errors to `ctx.state`. The scheduler waits for every queued request
/// before the action is reported.
#[async_trait]
pub trait ActionSettings: Send + Sync + Debug {
    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError>;

    /// Check the settings without executing; returns warnings
    fn validate(&self) -> Result<Vec<String>, ActionError> {
        Ok(Vec::new())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }
}

/// Builds settings values for one registered action type
pub trait SettingsFactory: Send + Sync {
    /// A new zero-valued instance of the settings type
    fn instantiate(&self) -> Box<dyn ActionSettings>;

    /// Settings populated from the `settings` object of a script action
    fn parse(
        &self,
        registry: &ActionRegistry,
        action_type: &str,
        settings: JsonValue,
    ) -> Result<Box<dyn ActionSettings>, RegistryError>;
}

/// Factory for settings types that deserialize directly
pub struct TypedFactory<T>(PhantomData<fn() -> T>);

impl<T> TypedFactory<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for TypedFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SettingsFactory for TypedFactory<T>
where
    T: ActionSettings + Default + DeserializeOwned + 'static,
{
    fn instantiate(&self) -> Box<dyn ActionSettings> {
        Box::new(T::default())
    }

    fn parse(
        &self,
        _registry: &ActionRegistry,
        action_type: &str,
        settings: JsonValue,
    ) -> Result<Box<dyn ActionSettings>, RegistryError> {
        // Missing or null settings mean "all defaults"
        let settings = match settings {
            JsonValue::Null => return Ok(self.instantiate()),
            other => other,
        };
        let parsed: T = serde_json::from_value(settings).map_err(|source| RegistryError::InvalidSettings {
            action_type: action_type.to_string(),
            source,
        })?;
        Ok(Box::new(parsed))
    }
}
