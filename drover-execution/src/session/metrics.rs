//! Per-action request accounting

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Request metrics accumulated by the running action of a session
///
/// Written by the action and its queued sub-requests concurrently; read and
/// reset by the scheduler when the action ends.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    elapsed_nanos: AtomicU64,
    requests: AtomicU64,
    sent: AtomicU64,
    received: AtomicU64,
    warnings: AtomicU64,
    errors: AtomicU64,
}

/// Values taken out of [`RequestMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Sum of the response times of every recorded request
    pub elapsed: Duration,
    pub requests: u64,
    pub sent: u64,
    pub received: u64,
    pub warnings: u64,
    pub errors: u64,
}

impl RequestMetrics {
    pub fn record_request(&self, elapsed: Duration, sent: u64, received: u64) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.sent.fetch_add(sent, Ordering::Relaxed);
        self.received.fetch_add(received, Ordering::Relaxed);
    }

    pub fn add_warning(&self) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values without resetting
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            elapsed: Duration::from_nanos(self.elapsed_nanos.load(Ordering::Relaxed)),
            requests: self.requests.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Current values, leaving every counter at zero
    pub fn take(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            elapsed: Duration::from_nanos(self.elapsed_nanos.swap(0, Ordering::Relaxed)),
            requests: self.requests.swap(0, Ordering::Relaxed),
            sent: self.sent.swap(0, Ordering::Relaxed),
            received: self.received.swap(0, Ordering::Relaxed),
            warnings: self.warnings.swap(0, Ordering::Relaxed),
            errors: self.errors.swap(0, Ordering::Relaxed),
        }
    }

    /// Restart timing and traffic accounting; warnings and errors are kept
    pub fn reset_timing(&self) {
        self.elapsed_nanos.store(0, Ordering::Relaxed);
        self.requests.store(0, Ordering::Relaxed);
        self.sent.store(0, Ordering::Relaxed);
        self.received.store(0, Ordering::Relaxed);
    }
}
