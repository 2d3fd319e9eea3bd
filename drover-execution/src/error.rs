//! Error types for script parsing and runs

use thiserror::Error;

/// Action registry and script parsing errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("action type '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("unknown action type '{0}'")]
    UnknownActionType(String),

    #[error("invalid action definition: {0}")]
    InvalidAction(String),

    #[error("invalid settings for action type '{action_type}': {source}")]
    InvalidSettings {
        action_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse script: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runner errors
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid runner settings: {0}")]
    InvalidSettings(String),

    #[error("script is empty")]
    EmptyScript,

    #[error("failed to open action log: {0}")]
    ActionLog(String),
}
