//! One simulated user: identity, sinks, sub-request join point and reconnect state

mod metrics;
mod reconnect;

pub use metrics::{MetricsSnapshot, RequestMetrics};

use drover_core::{ActionError, ActionState, SessionId};
use drover_logging::{ActionInfo, ActionLogger, EntryKind, LogEntry, SessionInfo};
use drover_resilience::{AbortSignal, ReconnectPolicy};
use drover_stats::{MetricsExporter, NoopExporter, StatsCollector};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::connection::Connection;
use reconnect::ReconnectState;

/// Diagnostic lines kept per action
const TRACE_CAPACITY: usize = 256;

/// Execution context of one simulated user
///
/// Shared as `Arc<Session>` between the session task, the actions it runs and
/// the sub-requests those actions queue. Actions of one session never
/// overlap, so the per-action fields describe the action currently running.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    user: String,
    app_context: RwLock<String>,
    stats: Option<Arc<StatsCollector>>,
    logger: Arc<dyn ActionLogger>,
    exporter: Arc<dyn MetricsExporter>,
    abort: AbortSignal,
    reconnect_policy: ReconnectPolicy,
    reconnect: ReconnectState,
    pending: Mutex<Vec<JoinHandle<Result<(), ActionError>>>>,
    metrics: RequestMetrics,
    actions: Mutex<Vec<ActionInfo>>,
    variables: RwLock<HashMap<String, JsonValue>>,
    trace: Mutex<VecDeque<String>>,
}

/// Builder for [`Session`]
#[derive(Debug, Default)]
pub struct SessionBuilder {
    user: Option<String>,
    stats: Option<Arc<StatsCollector>>,
    logger: Option<Arc<dyn ActionLogger>>,
    exporter: Option<Arc<dyn MetricsExporter>>,
    abort: Option<AbortSignal>,
    reconnect_policy: ReconnectPolicy,
}

impl SessionBuilder {
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn stats(mut self, stats: Arc<StatsCollector>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn ActionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn exporter(mut self, exporter: Arc<dyn MetricsExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn abort(mut self, abort: AbortSignal) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    pub fn build(self) -> Arc<Session> {
        let id = SessionId::new();
        Arc::new(Session {
            id,
            user: self.user.unwrap_or_else(|| format!("user_{}", id)),
            app_context: RwLock::new(String::new()),
            stats: self.stats,
            logger: self.logger.unwrap_or_else(drover_logging::logger),
            exporter: self.exporter.unwrap_or_else(|| Arc::new(NoopExporter)),
            abort: self.abort.unwrap_or_default(),
            reconnect_policy: self.reconnect_policy,
            reconnect: ReconnectState::new(),
            pending: Mutex::new(Vec::new()),
            metrics: RequestMetrics::default(),
            actions: Mutex::new(Vec::new()),
            variables: RwLock::new(HashMap::new()),
            trace: Mutex::new(VecDeque::new()),
        })
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// The app the session is currently working in; part of the statistics identity
    pub fn app_context(&self) -> String {
        self.app_context.read().clone()
    }

    pub fn set_app_context(&self, app_context: impl Into<String>) {
        *self.app_context.write() = app_context.into();
    }

    pub fn stats(&self) -> Option<&Arc<StatsCollector>> {
        self.stats.as_ref()
    }

    pub fn exporter(&self) -> &Arc<dyn MetricsExporter> {
        &self.exporter
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    pub fn is_abort_triggered(&self) -> bool {
        self.abort.is_triggered()
    }

    pub fn reconnect_policy(&self) -> &ReconnectPolicy {
        &self.reconnect_policy
    }

    // Reconnect

    /// Block until an in-flight reconnect has finished
    pub async fn await_reconnect(&self) {
        if self.reconnect.is_reconnecting() {
            debug!("Session {} waiting for reconnect", self.id);
            self.reconnect.wait(&self.abort).await;
        }
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnect.is_reconnecting()
    }

    /// Re-establish the connection following the session's reconnect policy
    ///
    /// When another reconnect is already running this waits for it and
    /// returns its outcome. Returns `ActionError::Aborted` when the run is
    /// aborted first.
    pub async fn reconnect(&self, connection: &Arc<dyn Connection>) -> Result<(), ActionError> {
        self.reconnect
            .reconnect(connection, &self.reconnect_policy, &self.abort)
            .await
    }

    /// Error of the latest reconnect, if it failed
    pub fn last_reconnect_error(&self) -> Option<ActionError> {
        self.reconnect.last_error()
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect.count()
    }

    // Requests

    /// Run a request to completion, unless the run is aborted first
    pub async fn send_request<F, T>(&self, request: F) -> Result<T, ActionError>
    where
        F: Future<Output = Result<T, ActionError>>,
    {
        if self.abort.is_triggered() {
            return Err(ActionError::Aborted);
        }
        tokio::select! {
            result = request => result,
            _ = self.abort.cancelled() => Err(ActionError::Aborted),
        }
    }

    /// Start a request in the background; its outcome is collected by
    /// [`Session::wait_for_pending`]
    ///
    /// A panic inside the request is recovered and reported as
    /// `ActionError::Panic`.
    pub fn queue_request<F>(&self, request: F)
    where
        F: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        let abort = self.abort.clone();
        let handle = tokio::spawn(async move {
            let guarded = AssertUnwindSafe(request).catch_unwind();
            tokio::select! {
                result = guarded => result.unwrap_or_else(|payload| Err(ActionError::from_panic(payload))),
                _ = abort.cancelled() => Err(ActionError::Aborted),
            }
        });
        self.pending.lock().push(handle);
    }

    /// Number of queued requests not yet collected
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Wait for every queued request, including ones queued while waiting,
    /// and attach their errors to `state`; returns whether any failed
    pub async fn wait_for_pending(&self, state: &mut ActionState) -> bool {
        let mut had_error = false;
        loop {
            let handles = std::mem::take(&mut *self.pending.lock());
            if handles.is_empty() {
                return had_error;
            }

            for handle in handles {
                let outcome = match handle.await {
                    Ok(result) => result,
                    Err(join_error) if join_error.is_panic() => Err(ActionError::from_panic(join_error.into_panic())),
                    Err(join_error) => Err(ActionError::failed(format!("request cancelled: {}", join_error))),
                };
                if let Err(error) = outcome {
                    had_error = true;
                    state.add_error(error);
                }
            }
        }
    }

    /// Record a completed request of the running action
    ///
    /// Request statistics are only kept when the collector runs at `full`.
    pub fn record_request(&self, method: &str, path: &str, elapsed: Duration, sent: u64, received: u64) {
        self.metrics.record_request(elapsed, sent, received);
        if let Some(stats) = self.stats.as_ref().and_then(|s| s.get_or_add_request_stats(method, path)) {
            stats.record(elapsed, sent, received);
        }
    }

    /// Request metrics of the running action so far
    pub fn request_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) fn take_request_metrics(&self) -> MetricsSnapshot {
        self.metrics.take()
    }

    // Action bookkeeping

    pub(crate) fn begin_action(&self, action: ActionInfo) {
        self.metrics.take();
        self.trace.lock().clear();
        self.log_entry(Some(action.clone()), EntryKind::Start);
        self.actions.lock().push(action);
    }

    pub(crate) fn end_action(&self) {
        self.trace.lock().clear();
        self.actions.lock().pop();
    }

    /// Restart timing of the running action and log a `reset` entry
    pub(crate) fn reset_action(&self) {
        self.metrics.reset_timing();
        self.log_entry(self.current_action(), EntryKind::Reset);
    }

    /// The innermost action currently running
    pub fn current_action(&self) -> Option<ActionInfo> {
        self.actions.lock().last().cloned()
    }

    // Logging

    pub(crate) fn log_entry(&self, action: Option<ActionInfo>, kind: EntryKind) {
        let session = SessionInfo {
            session_id: self.id,
            user: self.user.clone(),
        };
        self.logger.log(LogEntry::new(session, action, kind));
    }

    /// Free-form informational entry for the running action
    pub fn log_info(&self, info_type: &str, message: impl Into<String>) {
        self.log_entry(self.current_action(), EntryKind::info(info_type, message));
    }

    /// Warning for the running action; counted in its statistics
    pub fn log_warning(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(session = %self.id, "{}", message);
        self.metrics.add_warning();
        self.log_entry(self.current_action(), EntryKind::warning(message));
    }

    /// Error for the running action; counted in its statistics
    pub fn log_error(&self, message: impl Into<String>) {
        self.metrics.add_error();
        self.log_entry(self.current_action(), EntryKind::error(message));
    }

    /// Add a diagnostic line to the running action; logged if it fails
    pub fn trace(&self, line: impl Into<String>) {
        let mut trace = self.trace.lock();
        if trace.len() >= TRACE_CAPACITY {
            trace.pop_front();
        }
        trace.push_back(line.into());
    }

    pub(crate) fn take_trace(&self) -> Vec<String> {
        self.trace.lock().drain(..).collect()
    }

    // Variables

    pub fn set_variable(&self, name: impl Into<String>, value: JsonValue) {
        self.variables.write().insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Option<JsonValue> {
        self.variables.read().get(name).cloned()
    }
}
