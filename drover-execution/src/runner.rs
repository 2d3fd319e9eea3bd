//! Script runner: sessions in parallel, actions in sequence

use drover_config::{DroverConfig, RunnerConfig, Validatable};
use drover_core::{classify, ActionError, MultiError, SessionId};
use drover_logging::{ActionLogger, JsonLinesLogger};
use drover_resilience::{AbortSignal, ReconnectPolicy};
use drover_stats::{MetricsExporter, NoopExporter, StatsCollector, Summary};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::connection::{Connection, Connector};
use crate::error::RunError;
use crate::session::Session;

/// Run `actions` in order for one session
///
/// Errors of every action are collected. With `stop_on_error` the script ends
/// at the first failing action. An abort ends the script immediately and only
/// the abort is returned.
pub async fn run_script(
    session: &Arc<Session>,
    connection: &Arc<dyn Connection>,
    actions: &[Action],
    stop_on_error: bool,
) -> Result<(), ActionError> {
    let mut errors = MultiError::new();
    for action in actions {
        if session.is_abort_triggered() {
            return Err(ActionError::Aborted);
        }
        let Err(error) = action.execute(session, connection).await else {
            continue;
        };
        let classified = classify(&error);
        if classified.aborted {
            return Err(classified.error);
        }
        errors.push(classified.error);
        if stop_on_error {
            break;
        }
    }
    errors.into_error().map_or(Ok(()), Err)
}

/// How one session ended
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session_id: Option<SessionId>,
    pub user: String,
    /// Script iterations that ran to the end
    pub iterations: usize,
    pub aborted: bool,
    pub error: Option<ActionError>,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        !self.aborted && self.error.is_none()
    }
}

/// Result of [`Runner::run`]
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<SessionOutcome>,
    pub summary: Summary,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn failed_sessions(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

/// Runs one script for a number of simulated users
pub struct Runner {
    script: Arc<Vec<Action>>,
    connector: Arc<dyn Connector>,
    settings: RunnerConfig,
    reconnect: ReconnectPolicy,
    stats: Option<Arc<StatsCollector>>,
    logger: Option<Arc<dyn ActionLogger>>,
    exporter: Arc<dyn MetricsExporter>,
    abort: AbortSignal,
}

impl Runner {
    pub fn new(script: Vec<Action>, connector: Arc<dyn Connector>) -> Self {
        Self {
            script: Arc::new(script),
            connector,
            settings: RunnerConfig::default(),
            reconnect: ReconnectPolicy::default(),
            stats: None,
            logger: None,
            exporter: Arc::new(NoopExporter),
            abort: AbortSignal::new(),
        }
    }

    /// Runner set up from a loaded configuration
    ///
    /// Creates the statistics collector and opens the action log file when
    /// one is configured.
    pub fn from_config(
        config: &DroverConfig,
        script: Vec<Action>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, RunError> {
        config
            .validate_all()
            .map_err(|e| RunError::InvalidSettings(e.to_string()))?;

        let mut runner = Self::new(script, connector)
            .with_settings(config.runner.clone())
            .with_reconnect_policy(config.reconnect.policy())
            .with_stats(Arc::new(config.stats.build_collector()));

        if let Some(path) = &config.logging.action_log {
            let logger = JsonLinesLogger::open(path).map_err(|e| RunError::ActionLog(e.to_string()))?;
            runner = runner.with_logger(Arc::new(logger));
        }
        Ok(runner)
    }

    pub fn with_settings(mut self, settings: RunnerConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn with_stats(mut self, stats: Arc<StatsCollector>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ActionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn MetricsExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    pub fn stats(&self) -> Option<&Arc<StatsCollector>> {
        self.stats.as_ref()
    }

    /// Validate every action of the script; returns the collected warnings
    pub fn validate(&self) -> Result<Vec<String>, ActionError> {
        let mut warnings = Vec::new();
        let mut errors = MultiError::new();
        for action in self.script.iter() {
            match action.validate() {
                Ok(w) => warnings.extend(w),
                Err(e) => errors.push(e),
            }
        }
        match errors.into_error() {
            Some(error) => Err(error),
            None => Ok(warnings),
        }
    }

    /// Run every session to completion
    ///
    /// Sessions start `rampup` apart. Every started session is joined before
    /// returning, including after an abort.
    pub async fn run(&self) -> Result<RunReport, RunError> {
        self.settings
            .validate()
            .map_err(|e| RunError::InvalidSettings(e.to_string()))?;
        if self.script.is_empty() {
            return Err(RunError::EmptyScript);
        }

        let started = Instant::now();
        info!(
            "Starting {} sessions, {} iterations each",
            self.settings.concurrent_users, self.settings.iterations
        );

        let mut handles = Vec::with_capacity(self.settings.concurrent_users);
        for index in 0..self.settings.concurrent_users {
            if index > 0 && !self.settings.rampup.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.rampup) => {}
                    _ = self.abort.cancelled() => {}
                }
            }
            if self.abort.is_triggered() {
                debug!("Abort before starting session {}", index + 1);
                break;
            }

            let user = format!("user_{}", index + 1);
            let session = self.build_session(&user);
            let task = SessionTask {
                session,
                connector: Arc::clone(&self.connector),
                script: Arc::clone(&self.script),
                iterations: self.settings.iterations,
                stop_on_error: self.settings.stop_on_error,
            };
            handles.push((user, tokio::spawn(task.run())));
        }

        let (users, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let outcomes = users
            .into_iter()
            .zip(join_all(tasks).await)
            .map(|(user, joined)| {
                joined.unwrap_or_else(|join_error| {
                    warn!("Session task of {} did not finish: {}", user, join_error);
                    SessionOutcome {
                        session_id: None,
                        user,
                        iterations: 0,
                        aborted: false,
                        error: Some(ActionError::failed(format!("session task failed: {}", join_error))),
                    }
                })
            })
            .collect::<Vec<_>>();

        if let Some(logger) = &self.logger {
            if let Err(e) = logger.flush() {
                warn!("Failed to flush action log: {}", e);
            }
        }

        let summary = self
            .stats
            .as_deref()
            .map(Summary::from_collector)
            .unwrap_or_default();
        let report = RunReport {
            outcomes,
            summary,
            elapsed: started.elapsed(),
        };
        info!(
            "Run finished in {:?}: {} sessions, {} failed",
            report.elapsed,
            report.outcomes.len(),
            report.failed_sessions()
        );
        Ok(report)
    }

    fn build_session(&self, user: &str) -> Arc<Session> {
        let mut builder = Session::builder()
            .user(user)
            .exporter(Arc::clone(&self.exporter))
            .abort(self.abort.clone())
            .reconnect_policy(self.reconnect.clone());
        if let Some(stats) = &self.stats {
            builder = builder.stats(Arc::clone(stats));
        }
        if let Some(logger) = &self.logger {
            builder = builder.logger(Arc::clone(logger));
        }
        builder.build()
    }
}

/// Everything one spawned session needs
struct SessionTask {
    session: Arc<Session>,
    connector: Arc<dyn Connector>,
    script: Arc<Vec<Action>>,
    iterations: usize,
    stop_on_error: bool,
}

impl SessionTask {
    async fn run(self) -> SessionOutcome {
        let mut outcome = SessionOutcome {
            session_id: Some(self.session.id()),
            user: self.session.user().to_string(),
            iterations: 0,
            aborted: false,
            error: None,
        };

        let connection = match self.connector.connect(&self.session).await {
            Ok(connection) => connection,
            Err(error) => {
                warn!("Session {} failed to connect: {}", outcome.user, error);
                outcome.aborted = classify(&error).aborted;
                outcome.error = Some(error);
                return outcome;
            }
        };

        let mut errors = MultiError::new();
        for iteration in 0..self.iterations {
            debug!("Session {} iteration {}", outcome.user, iteration + 1);
            match run_script(&self.session, &connection, &self.script, self.stop_on_error).await {
                Ok(()) => outcome.iterations += 1,
                Err(error) => {
                    let classified = classify(&error);
                    if classified.aborted {
                        outcome.aborted = true;
                        break;
                    }
                    errors.push(classified.error);
                    outcome.iterations += 1;
                    if self.stop_on_error {
                        break;
                    }
                }
            }
        }

        outcome.error = errors.into_error();
        outcome
    }
}
