//! Reconnect coordination for one session

use drover_core::ActionError;
use drover_resilience::{AbortSignal, ReconnectPolicy, RetryError, RetryExecutor};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::connection::Connection;

/// At most one reconnect runs per session; everyone else waits for it
#[derive(Debug)]
pub(crate) struct ReconnectState {
    in_progress: watch::Sender<bool>,
    last_error: Mutex<Option<ActionError>>,
    reconnects: AtomicU64,
}

impl ReconnectState {
    pub(crate) fn new() -> Self {
        let (in_progress, _) = watch::channel(false);
        Self {
            in_progress,
            last_error: Mutex::new(None),
            reconnects: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_reconnecting(&self) -> bool {
        *self.in_progress.borrow()
    }

    /// Error of the latest reconnect, if it failed or was aborted after a failed attempt
    pub(crate) fn last_error(&self) -> Option<ActionError> {
        self.last_error.lock().clone()
    }

    /// Successful reconnects so far
    pub(crate) fn count(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    /// Wait until no reconnect is in flight, or until abort
    pub(crate) async fn wait(&self, abort: &AbortSignal) {
        let mut receiver = self.in_progress.subscribe();
        tokio::select! {
            _ = receiver.wait_for(|reconnecting| !*reconnecting) => {}
            _ = abort.cancelled() => {}
        }
    }

    /// Re-establish `connection`, or wait for the reconnect already in flight
    pub(crate) async fn reconnect(
        &self,
        connection: &Arc<dyn Connection>,
        policy: &ReconnectPolicy,
        abort: &AbortSignal,
    ) -> Result<(), ActionError> {
        let started_here = self.in_progress.send_if_modified(|reconnecting| {
            if *reconnecting {
                false
            } else {
                *reconnecting = true;
                true
            }
        });

        if !started_here {
            self.wait(abort).await;
            if abort.is_triggered() {
                return Err(ActionError::Aborted);
            }
            return match self.last_error() {
                Some(error) => Err(error),
                None => Ok(()),
            };
        }

        let _in_progress = InProgressGuard(&self.in_progress);
        *self.last_error.lock() = None;

        info!("Reconnecting, up to {} attempts", policy.backoff.len());
        let executor = RetryExecutor::new(policy.retry_policy()).with_abort(abort.clone());
        let result = executor
            .execute_with_context(|attempt| {
                info!("Reconnect attempt {}", attempt);
                connection.reconnect()
            })
            .await;

        match result {
            Ok(()) => {
                self.reconnects.fetch_add(1, Ordering::Relaxed);
                info!("Reconnected");
                Ok(())
            }
            Err(RetryError::Aborted { last_error, .. }) => {
                *self.last_error.lock() = last_error;
                Err(ActionError::Aborted)
            }
            Err(RetryError::NoAttempts) => {
                let error = ActionError::ConnectionClosed;
                *self.last_error.lock() = Some(error.clone());
                Err(error)
            }
            Err(RetryError::MaxAttemptsExceeded { last_error, .. }) | Err(RetryError::NonRetryableError(last_error)) => {
                warn!("Reconnect failed: {}", last_error);
                *self.last_error.lock() = Some(last_error.clone());
                Err(last_error)
            }
        }
    }
}

/// Clears the in-progress flag when the reconnect ends, even by panic
struct InProgressGuard<'a>(&'a watch::Sender<bool>);

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}
