//! Actions and the per-action lifecycle scheduler

use drover_core::{classify, next_action_id, ActionError, ActionState};
use drover_logging::ActionInfo;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::context::ActionContext;
use crate::report::{reconnect_info, report_end};
use crate::session::Session;
use crate::settings::{ActionSettings, Capabilities};

/// One scripted step
///
/// Immutable after parse. Script form:
/// `{"type": "...", "label": "...", "disabled": false, "settings": {...}}`.
#[derive(Debug)]
pub struct Action {
    pub action_type: String,
    pub label: String,
    pub disabled: bool,
    pub settings: Box<dyn ActionSettings>,
}

/// Outcome of one attempt
enum Attempt {
    Done(Result<(), ActionError>),
    Restart(ActionState),
}

impl Action {
    pub fn new(action_type: impl Into<String>, settings: impl ActionSettings + 'static) -> Self {
        Self {
            action_type: action_type.into().to_lowercase(),
            label: String::new(),
            disabled: false,
            settings: Box::new(settings),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.settings.capabilities()
    }

    pub fn is_container(&self) -> bool {
        self.capabilities().contains(Capabilities::CONTAINER)
    }

    /// Check the settings without executing; returns warnings
    ///
    /// Disabled actions are not checked.
    pub fn validate(&self) -> Result<Vec<String>, ActionError> {
        if self.disabled {
            return Ok(Vec::new());
        }
        self.settings.validate()
    }

    /// Run the action for `session`, restarting it after a successful reconnect
    ///
    /// Disabled actions succeed immediately without logging or statistics.
    /// The returned error is flattened; an aborted run returns an error that
    /// classifies as aborted.
    pub async fn execute(&self, session: &Arc<Session>, connection: &Arc<dyn Connection>) -> Result<(), ActionError> {
        if self.disabled {
            debug!("Skipping disabled action {}", self.action_type);
            return Ok(());
        }

        let mut carried = None;
        loop {
            match self.execute_attempt(session, connection, carried.take()).await {
                Attempt::Done(result) => return result,
                Attempt::Restart(state) => {
                    info!("Restarting {} after reconnect", self.action_type);
                    carried = Some(state);
                }
            }
        }
    }

    async fn execute_attempt(
        &self,
        session: &Arc<Session>,
        connection: &Arc<dyn Connection>,
        carried: Option<ActionState>,
    ) -> Attempt {
        session.await_reconnect().await;

        let mut state = carried.unwrap_or_default();
        let info = ActionInfo {
            action_id: next_action_id(),
            name: self.action_type.clone(),
            label: self.label.clone(),
            app_context: session.app_context(),
        };
        session.begin_action(info.clone());

        let outcome = {
            let mut ctx = ActionContext::new(session, &mut state, connection, &self.label);
            AssertUnwindSafe(self.settings.execute(&mut ctx)).catch_unwind().await
        };
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => state.add_error(error),
            Err(payload) => {
                let error = ActionError::from_panic(payload);
                warn!("Recovered {} in action {}", error, self.action_type);
                state.add_error(error);
            }
        }
        session.wait_for_pending(&mut state).await;

        let mut restart = None;
        let mut reported = info.clone();
        if self.should_reconnect(session, &state) {
            let reconnected = session.reconnect(connection).await;
            if session.is_abort_triggered() {
                state.add_error(session.last_reconnect_error().unwrap_or(ActionError::ConnectionClosed));
            } else {
                match reconnected {
                    Ok(()) => {
                        // The failed attempt is reported as a clean reconnect
                        state = ActionState::carry_over(&state);
                        restart = Some(ActionState::carry_over(&state));
                        if !self.capabilities().contains(Capabilities::THINK_TIME) {
                            reported = reconnect_info(&info);
                        }
                    }
                    Err(error) => state.add_error(error.context("reconnect failed")),
                }
            }
        }

        report_end(session, &reported, &state, self.is_container());
        session.end_action();

        match restart {
            Some(next) => Attempt::Restart(next),
            None => Attempt::Done(state.take_error().map_or(Ok(()), Err)),
        }
    }

    fn should_reconnect(&self, session: &Session, state: &ActionState) -> bool {
        if !state.failed
            || state.no_restart_on_disconnect
            || self.is_container()
            || !session.reconnect_policy().enabled
            || session.is_abort_triggered()
        {
            return false;
        }
        match state.error() {
            Some(error) => !classify(&error).aborted && error.is_disconnect(),
            None => false,
        }
    }
}
