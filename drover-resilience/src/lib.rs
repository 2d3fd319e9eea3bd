//! Resilience patterns for Drover
//!
//! Reconnect backoff schedules, an abort-aware retry executor used to
//! re-establish dropped connections, and the process-wide abort signal that
//! every suspension point of a session observes.

pub mod abort;
pub mod backoff;
pub mod retry;

pub use abort::AbortSignal;
pub use backoff::BackoffCalculator;
pub use retry::{ReconnectPolicy, RetryError, RetryExecutor, RetryPolicy, Retryable};
