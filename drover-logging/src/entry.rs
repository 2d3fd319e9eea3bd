//! Structured action log entries

use chrono::{DateTime, Utc};
use drover_core::{ActionId, SessionId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which session wrote an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub user: String,
}

/// Which action attempt an entry belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub action_id: ActionId,
    pub name: String,
    pub label: String,
    pub app_context: String,
}

/// Payload of a log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryKind {
    /// An action attempt started
    Start,
    /// Business logic restarted its own timing
    Reset,
    /// Pass/fail result of an action attempt
    Result {
        success: bool,
        details: String,
        #[serde(with = "humantime_serde")]
        response_time: Duration,
        sent: u64,
        received: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Informational entry, e.g. `aborted` or `containeractionend`
    Info { info_type: String, message: String },
    Warning { message: String },
    Error { message: String },
}

impl EntryKind {
    pub fn info(info_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Info {
            info_type: info_type.into(),
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntryKind::Start => "start",
            EntryKind::Reset => "reset",
            EntryKind::Result { .. } => "result",
            EntryKind::Info { .. } => "info",
            EntryKind::Warning { .. } => "warning",
            EntryKind::Error { .. } => "error",
        }
    }
}

/// One line of the structured action log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub session: SessionInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionInfo>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl LogEntry {
    pub fn new(session: SessionInfo, action: Option<ActionInfo>, kind: EntryKind) -> Self {
        Self {
            timestamp: Utc::now(),
            session,
            action,
            kind,
        }
    }

    /// Name of the action the entry belongs to, if any
    pub fn action_name(&self) -> Option<&str> {
        self.action.as_ref().map(|a| a.name.as_str())
    }

    pub fn is_result(&self) -> bool {
        matches!(self.kind, EntryKind::Result { .. })
    }

    /// `Some(success)` for result entries
    pub fn success(&self) -> Option<bool> {
        match &self.kind {
            EntryKind::Result { success, .. } => Some(*success),
            _ => None,
        }
    }

    /// `info_type` for info entries
    pub fn info_type(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Info { info_type, .. } => Some(info_type),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionInfo {
        SessionInfo {
            session_id: SessionId::new(),
            user: "user_1".to_string(),
        }
    }

    #[test]
    fn test_result_entry_serializes_flat() {
        let entry = LogEntry::new(
            session(),
            Some(ActionInfo {
                action_id: ActionId(7),
                name: "openapp".to_string(),
                label: "open".to_string(),
                app_context: "app-1".to_string(),
            }),
            EntryKind::Result {
                success: false,
                details: "".to_string(),
                response_time: Duration::from_millis(250),
                sent: 10,
                received: 20,
                error: Some("boom".to_string()),
            },
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "result");
        assert_eq!(json["success"], false);
        assert_eq!(json["response_time"], "250ms");
        assert_eq!(json["action"]["action_id"], 7);
        assert_eq!(json["error"], "boom");

        let back: LogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_accessors() {
        let entry = LogEntry::new(session(), None, EntryKind::info("aborted", "action aborted"));
        assert_eq!(entry.info_type(), Some("aborted"));
        assert_eq!(entry.success(), None);
        assert!(!entry.is_result());
        assert_eq!(entry.kind.name(), "info");

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("action").is_none());
    }
}
