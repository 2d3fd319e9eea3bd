//! What business logic sees while it runs

use drover_core::{ActionError, ActionState};
use std::sync::Arc;

use crate::connection::Connection;
use crate::session::Session;

/// Handles passed to [`ActionSettings::execute`](crate::ActionSettings::execute)
pub struct ActionContext<'a> {
    pub session: &'a Arc<Session>,
    pub state: &'a mut ActionState,
    pub connection: &'a Arc<dyn Connection>,
    pub label: &'a str,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        session: &'a Arc<Session>,
        state: &'a mut ActionState,
        connection: &'a Arc<dyn Connection>,
        label: &'a str,
    ) -> Self {
        Self {
            session,
            state,
            connection,
            label,
        }
    }

    /// Restart the timing of this action, e.g. after warm-up requests
    pub fn reset(&mut self) {
        self.session.reset_action();
    }

    /// Attach an error to this action and mark it failed
    pub fn fail(&mut self, error: ActionError) {
        self.state.add_error(error);
    }

    /// Run a request to completion and record its error on failure
    pub async fn request<F, T>(&mut self, request: F) -> Option<T>
    where
        F: std::future::Future<Output = Result<T, ActionError>>,
    {
        match self.session.send_request(request).await {
            Ok(value) => Some(value),
            Err(error) => {
                self.state.add_error(error);
                None
            }
        }
    }
}
