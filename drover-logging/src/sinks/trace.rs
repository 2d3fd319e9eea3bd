use tracing::{debug, error, info, warn};

use crate::entry::{EntryKind, LogEntry};
use crate::ActionLogger;

/// Emits every entry as a `tracing` event with structured fields
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl ActionLogger for TracingLogger {
    fn log(&self, entry: LogEntry) {
        let session = &entry.session.session_id;
        let user = entry.session.user.as_str();
        let (action_id, action, label) = match &entry.action {
            Some(a) => (a.action_id.0, a.name.as_str(), a.label.as_str()),
            None => (0, "", ""),
        };

        match &entry.kind {
            EntryKind::Start => debug!(session = %session, user, action_id, action, label, "action start"),
            EntryKind::Reset => debug!(session = %session, user, action_id, action, label, "action reset"),
            EntryKind::Result {
                success: true,
                response_time,
                sent,
                received,
                ..
            } => info!(
                session = %session,
                user,
                action_id,
                action,
                label,
                response_ms = response_time.as_secs_f64() * 1000.0,
                sent,
                received,
                "action succeeded"
            ),
            EntryKind::Result {
                success: false,
                details,
                error,
                ..
            } => warn!(
                session = %session,
                user,
                action_id,
                action,
                label,
                details = details.as_str(),
                error = error.as_deref().unwrap_or(""),
                "action failed"
            ),
            EntryKind::Info { info_type, message } => {
                info!(session = %session, user, action_id, action, label, info_type = info_type.as_str(), "{}", message)
            }
            EntryKind::Warning { message } => warn!(session = %session, user, action_id, action, label, "{}", message),
            EntryKind::Error { message } => error!(session = %session, user, action_id, action, label, "{}", message),
        }
    }
}
