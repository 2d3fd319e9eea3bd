//! Point-in-time snapshots and the end-of-run summary

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collector::StatsCollector;

/// Snapshot of one [`ActionStats`](crate::ActionStats) entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStatsSnapshot {
    pub name: String,
    pub label: String,
    pub app_context: String,
    /// Mean response time of successful runs in milliseconds
    pub avg_response_ms: f64,
    pub successful: u64,
    pub failed: u64,
    pub requests: u64,
    pub sent: u64,
    pub received: u64,
    pub warnings: u64,
    pub errors: u64,
}

/// Snapshot of one [`RequestStats`](crate::RequestStats) entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStatsSnapshot {
    pub method: String,
    pub path: String,
    pub avg_response_ms: f64,
    pub requests: u64,
    pub sent: u64,
    pub received: u64,
}

/// Totals across all action entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub successful: u64,
    pub failed: u64,
    pub requests: u64,
    pub sent: u64,
    pub received: u64,
    pub warnings: u64,
    pub errors: u64,
}

/// End-of-run summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub actions: Vec<ActionStatsSnapshot>,
    pub requests: Vec<RequestStatsSnapshot>,
    pub totals: SummaryTotals,
}

impl Summary {
    pub fn from_collector(collector: &StatsCollector) -> Self {
        Self::new(collector.action_snapshots(), collector.request_snapshots())
    }

    pub fn new(actions: Vec<ActionStatsSnapshot>, requests: Vec<RequestStatsSnapshot>) -> Self {
        let totals = actions.iter().fold(SummaryTotals::default(), |mut acc, a| {
            acc.successful += a.successful;
            acc.failed += a.failed;
            acc.requests += a.requests;
            acc.sent += a.sent;
            acc.received += a.received;
            acc.warnings += a.warnings;
            acc.errors += a.errors;
            acc
        });
        Self {
            actions,
            requests,
            totals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.requests.is_empty()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<24} {:<24} {:>10} {:>8} {:>8} {:>10} {:>12} {:>12} {:>6} {:>6}",
            "action", "label", "avg ms", "ok", "failed", "requests", "sent", "received", "warn", "err"
        )?;
        for a in &self.actions {
            writeln!(
                f,
                "{:<24} {:<24} {:>10.2} {:>8} {:>8} {:>10} {:>12} {:>12} {:>6} {:>6}",
                a.name, a.label, a.avg_response_ms, a.successful, a.failed, a.requests, a.sent, a.received, a.warnings, a.errors
            )?;
        }
        let t = &self.totals;
        writeln!(
            f,
            "{:<24} {:<24} {:>10} {:>8} {:>8} {:>10} {:>12} {:>12} {:>6} {:>6}",
            "total", "", "", t.successful, t.failed, t.requests, t.sent, t.received, t.warnings, t.errors
        )?;

        if !self.requests.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{:<8} {:<48} {:>10} {:>10} {:>12} {:>12}",
                "method", "path", "avg ms", "requests", "sent", "received"
            )?;
            for r in &self.requests {
                writeln!(
                    f,
                    "{:<8} {:<48} {:>10.2} {:>10} {:>12} {:>12}",
                    r.method, r.path, r.avg_response_ms, r.requests, r.sent, r.received
                )?;
            }
        }
        Ok(())
    }
}
