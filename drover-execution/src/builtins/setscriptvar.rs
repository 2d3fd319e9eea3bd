//! `setscriptvar`: store a value in the session

use async_trait::async_trait;
use drover_core::ActionError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::context::ActionContext;
use crate::settings::ActionSettings;

/// Set session variable `name` to `value`; produces no result entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetScriptVarSettings {
    pub name: String,
    pub value: JsonValue,
}

#[async_trait]
impl ActionSettings for SetScriptVarSettings {
    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        ctx.state.no_results = true;
        ctx.session.set_variable(self.name.clone(), self.value.clone());
        Ok(())
    }

    fn validate(&self) -> Result<Vec<String>, ActionError> {
        if self.name.trim().is_empty() {
            return Err(ActionError::Validation("variable name is empty".to_string()));
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::connection::{Connection, OfflineConnection};
    use crate::session::Session;
    use drover_logging::MemoryLogger;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sets_variable_without_result() {
        let logger = Arc::new(MemoryLogger::new());
        let session = Session::builder().logger(logger.clone()).build();
        let connection: Arc<dyn Connection> = Arc::new(OfflineConnection);
        let action = Action::new(
            "setscriptvar",
            SetScriptVarSettings {
                name: "sheet".to_string(),
                value: serde_json::json!("overview"),
            },
        );

        action.execute(&session, &connection).await.unwrap();
        assert_eq!(session.variable("sheet"), Some(serde_json::json!("overview")));
        assert!(logger.results().is_empty());
    }

    #[test]
    fn test_empty_name_is_invalid() {
        assert!(SetScriptVarSettings::default().validate().is_err());
    }
}
