//! `iterated`: run nested actions a number of times

use async_trait::async_trait;
use drover_core::{classify, ActionError, MultiError};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::action::Action;
use crate::context::ActionContext;
use crate::error::RegistryError;
use crate::registry::ActionRegistry;
use crate::settings::{ActionSettings, Capabilities, SettingsFactory};

/// Container running `actions` `iterations` times
///
/// Errors of the nested actions are collected and returned together. An
/// aborted nested action ends the loop and only the abort is returned.
#[derive(Debug)]
pub struct IteratedSettings {
    pub iterations: usize,
    pub stop_on_error: bool,
    pub actions: Vec<Action>,
}

impl Default for IteratedSettings {
    fn default() -> Self {
        Self {
            iterations: 1,
            stop_on_error: false,
            actions: Vec::new(),
        }
    }
}

impl IteratedSettings {
    pub fn new(iterations: usize, actions: Vec<Action>) -> Self {
        Self {
            iterations,
            actions,
            ..Self::default()
        }
    }

    pub fn stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }
}

#[async_trait]
impl ActionSettings for IteratedSettings {
    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        let mut errors = MultiError::new();

        for iteration in 0..self.iterations {
            debug!("Iteration {} of {}", iteration + 1, self.iterations);
            for action in &self.actions {
                if ctx.session.is_abort_triggered() {
                    return Err(ActionError::Aborted);
                }

                let Err(error) = action.execute(ctx.session, ctx.connection).await else {
                    continue;
                };
                let classified = classify(&error);
                if classified.aborted {
                    return Err(classified.error);
                }
                errors.push(classified.error);
                if self.stop_on_error {
                    return errors.into_error().map_or(Ok(()), Err);
                }
            }
        }

        errors.into_error().map_or(Ok(()), Err)
    }

    fn validate(&self) -> Result<Vec<String>, ActionError> {
        let mut warnings = Vec::new();
        if self.iterations == 0 {
            warnings.push("iterated runs zero iterations".to_string());
        }
        if self.actions.is_empty() {
            warnings.push("iterated has no actions".to_string());
        }

        let mut errors = MultiError::new();
        for action in &self.actions {
            match action.validate() {
                Ok(nested) => warnings.extend(nested),
                Err(e) => errors.push(e.context(format!("nested action {}", action.action_type))),
            }
        }
        match errors.into_error() {
            Some(error) => Err(error),
            None => Ok(warnings),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CONTAINER
    }
}

/// Script form of [`IteratedSettings`]
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawIterated {
    iterations: usize,
    stop_on_error: bool,
    actions: Vec<JsonValue>,
}

impl Default for RawIterated {
    fn default() -> Self {
        Self {
            iterations: 1,
            stop_on_error: false,
            actions: Vec::new(),
        }
    }
}

/// Factory parsing the nested actions through the registry
#[derive(Debug, Clone, Copy, Default)]
pub struct IteratedFactory;

impl SettingsFactory for IteratedFactory {
    fn instantiate(&self) -> Box<dyn ActionSettings> {
        Box::new(IteratedSettings::default())
    }

    fn parse(
        &self,
        registry: &ActionRegistry,
        action_type: &str,
        settings: JsonValue,
    ) -> Result<Box<dyn ActionSettings>, RegistryError> {
        let raw: RawIterated = match settings {
            JsonValue::Null => RawIterated::default(),
            other => serde_json::from_value(other).map_err(|source| RegistryError::InvalidSettings {
                action_type: action_type.to_string(),
                source,
            })?,
        };
        Ok(Box::new(IteratedSettings {
            iterations: raw.iterations,
            stop_on_error: raw.stop_on_error,
            actions: registry.parse_actions(raw.actions)?,
        }))
    }
}
