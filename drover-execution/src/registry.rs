//! Action type registry and script parsing

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::action::Action;
use crate::builtins;
use crate::error::RegistryError;
use crate::settings::{ActionSettings, SettingsFactory, TypedFactory};

static GLOBAL_REGISTRY: Lazy<ActionRegistry> = Lazy::new(ActionRegistry::with_builtins);

/// Action definition as it appears in a script
#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    action_type: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    settings: JsonValue,
}

/// A script is either a bare list of actions or an object holding one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScript {
    List(Vec<JsonValue>),
    Object { actions: Vec<JsonValue> },
}

/// Maps action type names to settings factories
///
/// Names are case-insensitive and stored lower-cased. Registration normally
/// happens during startup; lookups are concurrent.
#[derive(Default)]
pub struct ActionRegistry {
    factories: RwLock<HashMap<String, Arc<dyn SettingsFactory>>>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry").field("types", &self.list()).finish()
    }
}

impl ActionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in action types
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        builtins::register_all(&registry);
        registry
    }

    /// Process-wide registry, created with the built-in types on first use
    pub fn global() -> &'static ActionRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a factory under `name`
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] when the name is taken
    /// and `override_existing` is false.
    pub fn register(
        &self,
        name: &str,
        factory: Arc<dyn SettingsFactory>,
        override_existing: bool,
    ) -> Result<(), RegistryError> {
        let key = name.to_lowercase();
        let mut factories = self.factories.write();
        if factories.contains_key(&key) && !override_existing {
            return Err(RegistryError::AlreadyRegistered(key));
        }
        debug!("Registering action type {}", key);
        factories.insert(key, factory);
        Ok(())
    }

    /// Register a settings type that deserializes directly from the script
    pub fn register_settings<T>(&self, name: &str, override_existing: bool) -> Result<(), RegistryError>
    where
        T: ActionSettings + Default + DeserializeOwned + 'static,
    {
        self.register(name, Arc::new(TypedFactory::<T>::new()), override_existing)
    }

    fn factory(&self, name: &str) -> Option<Arc<dyn SettingsFactory>> {
        self.factories.read().get(&name.to_lowercase()).cloned()
    }

    /// A zero-valued settings instance of the type registered under `name`
    pub fn instantiate(&self, name: &str) -> Option<Box<dyn ActionSettings>> {
        self.factory(name).map(|factory| factory.instantiate())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Build one action from its script definition
    pub fn parse_action(&self, value: JsonValue) -> Result<Action, RegistryError> {
        let raw: RawAction =
            serde_json::from_value(value).map_err(|e| RegistryError::InvalidAction(e.to_string()))?;
        let action_type = raw.action_type.to_lowercase();
        let factory = self
            .factory(&action_type)
            .ok_or_else(|| RegistryError::UnknownActionType(raw.action_type.clone()))?;
        // Not under the lock; container factories parse through the registry again
        let settings = factory.parse(self, &action_type, raw.settings)?;

        Ok(Action {
            action_type,
            label: raw.label,
            disabled: raw.disabled,
            settings,
        })
    }

    /// Build a list of actions from a JSON value
    pub fn parse_actions(&self, values: Vec<JsonValue>) -> Result<Vec<Action>, RegistryError> {
        values.into_iter().map(|value| self.parse_action(value)).collect()
    }

    /// Parse a script: a JSON array of actions or an object with an `actions` array
    pub fn parse_script(&self, json: &str) -> Result<Vec<Action>, RegistryError> {
        let script: RawScript = serde_json::from_str(json)?;
        let values = match script {
            RawScript::List(values) => values,
            RawScript::Object { actions } => actions,
        };
        self.parse_actions(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ActionContext;
    use async_trait::async_trait;
    use drover_core::ActionError;

    #[derive(Debug, Default, Deserialize)]
    struct OpenApp {
        #[serde(default)]
        app: String,
    }

    #[async_trait]
    impl ActionSettings for OpenApp {
        async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
            ctx.session.set_app_context(self.app.clone());
            Ok(())
        }
    }

    #[derive(Debug, Default, Deserialize)]
    struct OpenAppV2;

    #[async_trait]
    impl ActionSettings for OpenAppV2 {
        async fn execute(&self, _ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
            Ok(())
        }

        fn validate(&self) -> Result<Vec<String>, ActionError> {
            Ok(vec!["v2".to_string()])
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = ActionRegistry::new();
        registry.register_settings::<OpenApp>("openapp", false).unwrap();

        let err = registry.register_settings::<OpenApp>("OpenApp", false).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(name) if name == "openapp"));
    }

    #[test]
    fn test_override_replaces_variant() {
        let registry = ActionRegistry::new();
        registry.register_settings::<OpenApp>("openapp", false).unwrap();
        registry.register_settings::<OpenAppV2>("openapp", true).unwrap();

        let settings = registry.instantiate("openapp").unwrap();
        assert_eq!(settings.validate().unwrap(), vec!["v2".to_string()]);
        assert!(registry.instantiate("missing").is_none());
    }

    #[test]
    fn test_parse_action() {
        let registry = ActionRegistry::new();
        registry.register_settings::<OpenApp>("openapp", false).unwrap();

        let action = registry
            .parse_action(serde_json::json!({
                "type": "OpenApp",
                "label": "open",
                "settings": {"app": "sales.qvf"}
            }))
            .unwrap();
        assert_eq!(action.action_type, "openapp");
        assert_eq!(action.label, "open");
        assert!(!action.disabled);

        let err = registry
            .parse_action(serde_json::json!({"type": "nope"}))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownActionType(_)));

        let err = registry
            .parse_action(serde_json::json!({"type": "openapp", "settings": {"app": 5}}))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSettings { .. }));
    }

    #[test]
    fn test_parse_script_forms() {
        let registry = ActionRegistry::with_builtins();
        let list = registry
            .parse_script(r#"[{"type": "thinktime", "settings": {"delay": 0.5}}]"#)
            .unwrap();
        assert_eq!(list.len(), 1);

        let object = registry
            .parse_script(r#"{"actions": [{"type": "thinktime"}, {"type": "setscriptvar", "settings": {"name": "x", "value": 1}}]}"#)
            .unwrap();
        assert_eq!(object.len(), 2);

        assert!(registry.parse_script("not json").is_err());
    }

    #[test]
    fn test_global_has_builtins() {
        let names = ActionRegistry::global().list();
        assert!(names.contains(&"iterated".to_string()));
        assert!(names.contains(&"thinktime".to_string()));
        assert!(names.contains(&"setscriptvar".to_string()));
    }
}
