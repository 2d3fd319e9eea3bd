//! End-of-action reporting

use drover_core::{classify, ActionState};
use drover_logging::{ActionInfo, EntryKind};
use std::time::Duration;
use tracing::debug;

use crate::session::Session;

/// Info type of the entry written for an aborted action
pub const INFO_ABORTED: &str = "aborted";
/// Info type of the entry written when a container action ends
pub const INFO_CONTAINER_END: &str = "containeractionend";
/// Info type of the diagnostic lines written before a failed result
pub const INFO_TRACE: &str = "trace";

/// Identity under which an attempt that ended in a successful reconnect is reported
pub(crate) fn reconnect_info(info: &ActionInfo) -> ActionInfo {
    let label = if info.label.is_empty() {
        String::new()
    } else {
        format!("Reconnect({})", info.label)
    };
    ActionInfo {
        action_id: info.action_id,
        name: format!("Reconnect({})", info.name),
        label,
        app_context: info.app_context.clone(),
    }
}

/// Report a finished attempt
///
/// Writes exactly one of: an `aborted` info entry, nothing (`no_results`), a
/// `containeractionend` info entry, or a result entry followed by the
/// statistics and exporter updates.
pub(crate) fn report_end(session: &Session, info: &ActionInfo, state: &ActionState, container: bool) {
    let error = state.error();
    let metrics = session.take_request_metrics();

    if let Some(error) = &error {
        let classified = classify(error);
        if classified.aborted {
            debug!("Action {} aborted", info.name);
            session.log_entry(Some(info.clone()), EntryKind::info(INFO_ABORTED, classified.error.to_string()));
            return;
        }
    }

    if state.no_results {
        return;
    }

    if container {
        session.log_entry(Some(info.clone()), EntryKind::info(INFO_CONTAINER_END, info.name.clone()));
        return;
    }

    let success = !state.failed;
    if !success {
        for line in session.take_trace() {
            session.log_entry(Some(info.clone()), EntryKind::info(INFO_TRACE, line));
        }
    }

    session.log_entry(
        Some(info.clone()),
        EntryKind::Result {
            success,
            details: state.details.clone(),
            response_time: metrics.elapsed,
            sent: metrics.sent,
            received: metrics.received,
            error: error.as_ref().map(ToString::to_string),
        },
    );

    let Some(stats) = session
        .stats()
        .and_then(|stats| stats.get_or_add_action_stats(&info.name, &info.label, &info.app_context))
    else {
        return;
    };

    stats.record_traffic(metrics.requests, metrics.sent, metrics.received);
    stats.add_warnings(metrics.warnings);
    stats.add_errors(metrics.errors + u64::from(!success));

    if success {
        if metrics.elapsed > Duration::ZERO {
            stats.record_success(metrics.elapsed);
            session
                .exporter()
                .report_success(&info.name, &info.label, metrics.elapsed.as_secs_f64());
        }
    } else {
        stats.record_failure();
        session.exporter().report_failure(&info.name, &info.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drover_core::{next_action_id, ActionError};
    use drover_logging::MemoryLogger;
    use drover_stats::{MetricsExporter, StatsCollector, StatsLevel};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct RecordingExporter {
        calls: Mutex<Vec<String>>,
    }

    impl MetricsExporter for RecordingExporter {
        fn report_success(&self, name: &str, label: &str, seconds: f64) {
            self.calls.lock().push(format!("ok {} {} {:.3}", name, label, seconds));
        }

        fn report_failure(&self, name: &str, label: &str) {
            self.calls.lock().push(format!("fail {} {}", name, label));
        }
    }

    struct Fixture {
        session: Arc<Session>,
        logger: Arc<MemoryLogger>,
        stats: Arc<StatsCollector>,
        exporter: Arc<RecordingExporter>,
        info: ActionInfo,
    }

    fn fixture() -> Fixture {
        let logger = Arc::new(MemoryLogger::new());
        let stats = Arc::new(StatsCollector::new(StatsLevel::On));
        let exporter = Arc::new(RecordingExporter::default());
        let session = Session::builder()
            .logger(logger.clone())
            .stats(Arc::clone(&stats))
            .exporter(exporter.clone())
            .build();
        Fixture {
            session,
            logger,
            stats,
            exporter,
            info: ActionInfo {
                action_id: next_action_id(),
                name: "select".to_string(),
                label: "pick".to_string(),
                app_context: "app-1".to_string(),
            },
        }
    }

    #[test]
    fn test_success_updates_stats_and_exporter() {
        let f = fixture();
        f.session.record_request("GET", "/fields", Duration::from_millis(250), 10, 20);
        f.session.log_warning("slow");

        report_end(&f.session, &f.info, &ActionState::new(), false);

        assert_eq!(f.logger.results().len(), 1);
        let snapshot = &f.stats.action_snapshots()[0];
        assert_eq!(snapshot.app_context, "app-1");
        assert_eq!(snapshot.successful, 1);
        assert_eq!(snapshot.warnings, 1);
        assert_eq!(snapshot.errors, 0);
        assert_eq!(f.exporter.calls.lock().clone(), vec!["ok select pick 0.250".to_string()]);
        assert_eq!(f.session.request_metrics().requests, 0);
    }

    #[test]
    fn test_success_without_requests_takes_no_sample() {
        let f = fixture();
        report_end(&f.session, &f.info, &ActionState::new(), false);

        let snapshot = &f.stats.action_snapshots()[0];
        assert_eq!(snapshot.successful, 0);
        assert_eq!(snapshot.failed, 0);
        assert!(f.exporter.calls.lock().is_empty());
    }

    #[test]
    fn test_failure_logs_trace_before_result() {
        let f = fixture();
        f.session.trace("GET /fields 500");
        let mut state = ActionState::new();
        state.add_error(ActionError::failed("500"));

        report_end(&f.session, &f.info, &state, false);

        let entries = f.logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].info_type(), Some(INFO_TRACE));
        assert_eq!(entries[1].success(), Some(false));
        let snapshot = &f.stats.action_snapshots()[0];
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(f.exporter.calls.lock().clone(), vec!["fail select pick".to_string()]);
    }

    #[test]
    fn test_aborted_is_informational_only() {
        let f = fixture();
        let mut state = ActionState::new();
        state.add_error(ActionError::failed("timeout"));
        state.add_error(ActionError::Aborted);

        report_end(&f.session, &f.info, &state, false);

        assert_eq!(f.logger.infos(INFO_ABORTED).len(), 1);
        assert!(f.logger.results().is_empty());
        assert_eq!(f.stats.action_count(), 0);
    }

    #[test]
    fn test_no_results_and_container() {
        let f = fixture();
        let mut state = ActionState::new();
        state.no_results = true;
        report_end(&f.session, &f.info, &state, false);
        assert!(f.logger.is_empty());

        report_end(&f.session, &f.info, &ActionState::new(), true);
        assert_eq!(f.logger.infos(INFO_CONTAINER_END).len(), 1);
        assert_eq!(f.stats.action_count(), 0);
    }

    #[test]
    fn test_reconnect_info_wraps_name_and_label() {
        let f = fixture();
        let renamed = reconnect_info(&f.info);
        assert_eq!(renamed.name, "Reconnect(select)");
        assert_eq!(renamed.label, "Reconnect(pick)");

        let unlabelled = ActionInfo {
            label: String::new(),
            ..f.info.clone()
        };
        assert_eq!(reconnect_info(&unlabelled).label, "");
    }
}
