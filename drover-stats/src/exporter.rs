//! External metrics exporter hook

use std::fmt::Debug;
use std::sync::Arc;

/// Sink for per-action outcomes, e.g. a Prometheus pusher
///
/// Called once per finished, non-container, non-aborted action after the
/// statistics registry has been updated. Implementations must be cheap; they
/// run on the session task.
pub trait MetricsExporter: Send + Sync + Debug {
    /// A successful action together with its response time in seconds
    fn report_success(&self, name: &str, label: &str, seconds: f64);

    /// A failed action
    fn report_failure(&self, name: &str, label: &str);
}

/// Exporter that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExporter;

impl MetricsExporter for NoopExporter {
    fn report_success(&self, _name: &str, _label: &str, _seconds: f64) {}

    fn report_failure(&self, _name: &str, _label: &str) {}
}

impl<T: MetricsExporter + ?Sized> MetricsExporter for Arc<T> {
    fn report_success(&self, name: &str, label: &str, seconds: f64) {
        (**self).report_success(name, label, seconds)
    }

    fn report_failure(&self, name: &str, label: &str) {
        (**self).report_failure(name, label)
    }
}
