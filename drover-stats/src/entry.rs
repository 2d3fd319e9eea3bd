//! Per-action and per-request statistics entries

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::sample::SampleCollector;
use crate::summary::{ActionStatsSnapshot, RequestStatsSnapshot};

/// Identity of an [`ActionStats`] entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionKey {
    pub name: String,
    pub label: String,
    pub app_context: String,
}

impl ActionKey {
    pub fn new(name: impl Into<String>, label: impl Into<String>, app_context: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            app_context: app_context.into(),
        }
    }
}

/// Identity of a [`RequestStats`] entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub path: String,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

/// Statistics for one `(name, label, app context)`
///
/// Created once by the [`StatsCollector`](crate::StatsCollector) and updated
/// by every session that runs the same action; all updates go through atomics
/// or the response-time collector's own lock.
#[derive(Debug)]
pub struct ActionStats {
    key: ActionKey,
    response_time: SampleCollector,
    requests: AtomicU64,
    sent: AtomicU64,
    received: AtomicU64,
    warnings: AtomicU64,
    errors: AtomicU64,
    failed: AtomicU64,
}

impl ActionStats {
    pub fn new(key: ActionKey, response_time: SampleCollector) -> Self {
        Self {
            key,
            response_time,
            requests: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    /// Response times of successful runs, in nanoseconds
    pub fn response_time(&self) -> &SampleCollector {
        &self.response_time
    }

    /// Record the response time of a successful run
    pub fn record_success(&self, elapsed: Duration) {
        self.response_time.add_sample(elapsed.as_nanos() as u64);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the traffic of one action run
    pub fn record_traffic(&self, requests: u64, sent: u64, received: u64) {
        self.requests.fetch_add(requests, Ordering::Relaxed);
        self.sent.fetch_add(sent, Ordering::Relaxed);
        self.received.fetch_add(received, Ordering::Relaxed);
    }

    pub fn add_warnings(&self, count: u64) {
        self.warnings.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_errors(&self, count: u64) {
        self.errors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn warnings(&self) -> u64 {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ActionStatsSnapshot {
        let (avg_ns, successful) = self.response_time.average();
        ActionStatsSnapshot {
            name: self.key.name.clone(),
            label: self.key.label.clone(),
            app_context: self.key.app_context.clone(),
            avg_response_ms: avg_ns / 1_000_000.0,
            successful,
            failed: self.failed(),
            requests: self.requests(),
            sent: self.sent(),
            received: self.received(),
            warnings: self.warnings(),
            errors: self.errors(),
        }
    }
}

/// Statistics for one `(method, path)`
#[derive(Debug)]
pub struct RequestStats {
    key: RequestKey,
    response_time: SampleCollector,
    requests: AtomicU64,
    sent: AtomicU64,
    received: AtomicU64,
}

impl RequestStats {
    pub fn new(key: RequestKey, response_time: SampleCollector) -> Self {
        Self {
            key,
            response_time,
            requests: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    pub fn response_time(&self) -> &SampleCollector {
        &self.response_time
    }

    /// Record one completed request
    pub fn record(&self, elapsed: Duration, sent: u64, received: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.sent.fetch_add(sent, Ordering::Relaxed);
        self.received.fetch_add(received, Ordering::Relaxed);
        self.response_time.add_sample(elapsed.as_nanos() as u64);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> RequestStatsSnapshot {
        let (avg_ns, _) = self.response_time.average();
        RequestStatsSnapshot {
            method: self.key.method.clone(),
            path: self.key.path.clone(),
            avg_response_ms: avg_ns / 1_000_000.0,
            requests: self.requests(),
            sent: self.sent(),
            received: self.received(),
        }
    }
}
