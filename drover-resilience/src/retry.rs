//! Retry policy and executor for reconnect attempts

use drover_core::ActionError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::abort::AbortSignal;
use crate::backoff::BackoffCalculator;

/// Default reconnect schedule: immediately, then every two seconds five times
pub const DEFAULT_RECONNECT_BACKOFF: [Duration; 6] = [
    Duration::ZERO,
    Duration::from_secs(2),
    Duration::from_secs(2),
    Duration::from_secs(2),
    Duration::from_secs(2),
    Duration::from_secs(2),
];

/// Retry policy: one attempt per backoff entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: BackoffCalculator,
}

impl RetryPolicy {
    /// One attempt per schedule entry, each preceded by its delay
    pub fn from_schedule(delays: &[Duration]) -> Self {
        Self {
            backoff: BackoffCalculator::new(delays.to_vec()),
        }
    }

    /// Maximum number of attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.backoff.attempts() as u32
    }

    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_before_attempt(attempt)
    }
}

/// Session reconnect policy
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Reconnect after a transport disconnect and restart the action
    pub enabled: bool,
    /// Delay before each reconnect attempt; one attempt per entry
    pub backoff: Vec<Duration>,
}

impl ReconnectPolicy {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_schedule(&self.backoff)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            backoff: DEFAULT_RECONNECT_BACKOFF.to_vec(),
        }
    }
}

/// Trait for errors that can be retried
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ActionError {
    /// Only a dropped transport is worth another attempt
    fn is_retryable(&self) -> bool {
        matches!(self.root_cause(), ActionError::Disconnected(_))
    }
}

/// Retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    abort: Option<AbortSignal>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, abort: None }
    }

    /// Stop between attempts, or during a backoff delay, once `abort` triggers
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a function with retry logic and the attempt number
    pub async fn execute_with_context<F, Fut, T, E>(&self, mut f: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let max_attempts = self.policy.max_attempts();
        if max_attempts == 0 {
            return Err(RetryError::NoAttempts);
        }

        let mut attempt = 1;
        let mut last_error = None;

        loop {
            if !self.wait(self.policy.delay_before_attempt(attempt)).await {
                return Err(RetryError::Aborted {
                    attempts: attempt - 1,
                    last_error,
                });
            }

            debug!("Executing attempt {} of {}", attempt, max_attempts);

            match f(attempt).await {
                Ok(result) => {
                    if attempt > 1 {
                        info!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_retryable() {
                        warn!("Operation failed with non-retryable error: {}", error);
                        return Err(RetryError::NonRetryableError(error));
                    }

                    if attempt >= max_attempts {
                        warn!("Operation failed after {} attempts: {}", attempt, error);
                        return Err(RetryError::MaxAttemptsExceeded {
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    warn!(
                        "Attempt {} failed: {}. Retrying in {:?}",
                        attempt,
                        error,
                        self.policy.delay_before_attempt(attempt + 1)
                    );
                    attempt += 1;
                    last_error = Some(error);
                }
            }
        }
    }

    /// Sleep for `delay`; `false` when aborted first
    async fn wait(&self, delay: Duration) -> bool {
        match &self.abort {
            Some(abort) => {
                if abort.is_triggered() {
                    return false;
                }
                if delay.is_zero() {
                    return true;
                }
                tokio::select! {
                    _ = tokio::time::sleep(delay) => !abort.is_triggered(),
                    _ = abort.cancelled() => false,
                }
            }
            None => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                true
            }
        }
    }
}

/// Retry error types
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Maximum retry attempts ({attempts}) exceeded. Last error: {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: E },

    #[error("Non-retryable error: {0}")]
    NonRetryableError(E),

    /// `last_error` is the error of the latest failed attempt, if any ran
    #[error("Aborted after {attempts} attempts")]
    Aborted { attempts: u32, last_error: Option<E> },

    #[error("Retry policy allows no attempts")]
    NoAttempts,
}

impl<E> RetryError<E> {
    /// The last error returned by the operation, if any
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::MaxAttemptsExceeded { last_error, .. } => Some(last_error),
            RetryError::NonRetryableError(error) => Some(error),
            RetryError::Aborted { last_error, .. } => last_error,
            RetryError::NoAttempts => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RetryError::Aborted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn immediate(attempts: u32) -> RetryPolicy {
        RetryPolicy::from_schedule(&vec![Duration::ZERO; attempts as usize])
    }

    #[tokio::test]
    async fn test_retry_success_after_disconnects() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(immediate(3));

        let result = executor
            .execute_with_context(|_| {
                let count = counter.fetch_add(1, Ordering::Relaxed);
                async move {
                    if count < 2 {
                        Err(ActionError::disconnected("socket reset"))
                    } else {
                        Ok("connected")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_max_attempts_exceeded() {
        let executor = RetryExecutor::new(immediate(2));
        let result: Result<(), _> = executor
            .execute_with_context(|_| async { Err(ActionError::disconnected("down")) })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            RetryError::MaxAttemptsExceeded { attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_plain_failure_is_not_retried() {
        let counter = AtomicU32::new(0);
        let executor = RetryExecutor::new(immediate(5));
        let result: Result<(), _> = executor
            .execute_with_context(|_| {
                counter.fetch_add(1, Ordering::Relaxed);
                async { Err(ActionError::failed("401 unauthorized")) }
            })
            .await;

        assert!(matches!(result.unwrap_err(), RetryError::NonRetryableError(_)));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_empty_schedule_makes_no_attempt() {
        let executor = RetryExecutor::new(RetryPolicy::from_schedule(&[]));
        let result: Result<(), RetryError<ActionError>> = executor.execute_with_context(|_| async { Ok(()) }).await;
        assert!(matches!(result.unwrap_err(), RetryError::NoAttempts));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_delays_each_attempt() {
        let delays = vec![Duration::ZERO, Duration::from_secs(2), Duration::from_secs(2)];
        let executor = RetryExecutor::new(RetryPolicy::from_schedule(&delays));
        let start = tokio::time::Instant::now();

        let result = executor
            .execute_with_context(|attempt| async move {
                if attempt < 3 {
                    Err(ActionError::disconnected("down"))
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_during_backoff() {
        let abort = AbortSignal::new();
        let executor = RetryExecutor::new(ReconnectPolicy::enabled().retry_policy()).with_abort(abort.clone());

        let trigger = {
            let abort = abort.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                abort.trigger();
            })
        };

        let result: Result<(), _> = executor
            .execute_with_context(|_| async { Err(ActionError::disconnected("down")) })
            .await;
        trigger.await.unwrap();

        let err = result.unwrap_err();
        assert!(err.is_aborted());
        assert!(matches!(err, RetryError::Aborted { attempts: 1, .. }));
        let last = err.into_inner().expect("first attempt failed");
        assert_eq!(last.to_string(), ActionError::disconnected("down").to_string());
    }

    #[test]
    fn test_default_reconnect_policy() {
        let policy = ReconnectPolicy::default();
        assert!(!policy.enabled);
        assert_eq!(policy.backoff.len(), 6);
        let retry = policy.retry_policy();
        assert_eq!(retry.max_attempts(), 6);
        assert_eq!(retry.delay_before_attempt(1), Duration::ZERO);
        assert_eq!(retry.delay_before_attempt(2), Duration::from_secs(2));
    }

    #[test]
    fn test_retryable_action_errors() {
        assert!(ActionError::disconnected("x").is_retryable());
        assert!(ActionError::disconnected("x").context("reconnect").is_retryable());
        assert!(!ActionError::ConnectionClosed.is_retryable());
        assert!(!ActionError::Aborted.is_retryable());
    }
}
