//! Statistics under concurrent sessions

use anyhow::Result;
use async_trait::async_trait;
use drover_config::RunnerConfig;
use drover_core::ActionError;
use drover_execution::{Action, ActionContext, ActionSettings, OfflineConnection, Runner};
use drover_stats::{MetricsExporter, SampleCollector, StatsCollector, StatsLevel};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Issues one request with a response time that depends on the user
#[derive(Debug)]
struct GetObject {
    fail_every: u64,
}

#[async_trait]
impl ActionSettings for GetObject {
    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        let user_number: u64 = ctx
            .session
            .user()
            .trim_start_matches("user_")
            .parse()
            .unwrap_or(1);
        ctx.session
            .record_request("GET", "/api/v1/objects", Duration::from_millis(user_number * 10), 40, 400);
        if self.fail_every > 0 && user_number % self.fail_every == 0 {
            ctx.session.log_warning("object missing");
            return Err(ActionError::failed("object not found"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CountingExporter {
    successes: Mutex<Vec<f64>>,
    failures: Mutex<u64>,
}

impl MetricsExporter for CountingExporter {
    fn report_success(&self, _name: &str, _label: &str, seconds: f64) {
        self.successes.lock().push(seconds);
    }

    fn report_failure(&self, _name: &str, _label: &str) {
        *self.failures.lock() += 1;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_aggregate_into_one_entry() -> Result<()> {
    let stats = Arc::new(StatsCollector::new(StatsLevel::Full));
    let exporter = Arc::new(CountingExporter::default());
    let runner = Runner::new(
        vec![Action::new("getobject", GetObject { fail_every: 4 }).with_label("chart")],
        Arc::new(OfflineConnection),
    )
    .with_settings(RunnerConfig {
        concurrent_users: 8,
        iterations: 5,
        ..RunnerConfig::default()
    })
    .with_stats(Arc::clone(&stats))
    .with_exporter(exporter.clone());

    let report = runner.run().await?;
    println!("{}", report.summary);

    // users 4 and 8 fail every iteration
    assert_eq!(report.failed_sessions(), 2);

    let actions = &report.summary.actions;
    assert_eq!(actions.len(), 1);
    let entry = &actions[0];
    assert_eq!(entry.name, "getobject");
    assert_eq!(entry.label, "chart");
    assert_eq!(entry.successful, 30);
    assert_eq!(entry.failed, 10);
    assert_eq!(entry.requests, 40);
    assert_eq!(entry.sent, 40 * 40);
    assert_eq!(entry.received, 40 * 400);
    assert_eq!(entry.warnings, 10);
    assert_eq!(entry.errors, 10);

    // successful users are 1, 2, 3, 5, 6, 7: mean 40ms
    assert!((entry.avg_response_ms - 40.0).abs() < 1e-6);

    assert_eq!(exporter.successes.lock().len(), 30);
    assert_eq!(*exporter.failures.lock(), 10);

    let requests = &report.summary.requests;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].requests, 40);
    assert!((requests[0].avg_response_ms - 45.0).abs() < 1e-6);
    Ok(())
}

#[tokio::test]
async fn test_stats_off_records_nothing() -> Result<()> {
    let stats = Arc::new(StatsCollector::new(StatsLevel::Off));
    let runner = Runner::new(
        vec![Action::new("getobject", GetObject { fail_every: 0 })],
        Arc::new(OfflineConnection),
    )
    .with_stats(Arc::clone(&stats));

    let report = runner.run().await?;
    assert!(report.summary.is_empty());
    assert_eq!(stats.action_count(), 0);

    stats.set_level(StatsLevel::On);
    runner.run().await?;
    assert_eq!(stats.action_count(), 1);
    assert_eq!(stats.request_count(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sample_collector_mean_under_concurrency() -> Result<()> {
    let collector = SampleCollector::with_settings(7, Duration::from_millis(1));

    let mut handles = Vec::new();
    for task in 0..16u64 {
        let collector = collector.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..500u64 {
                collector.add_sample(task * 1000 + i);
                if i % 50 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    futures::future::try_join_all(handles).await?;

    let (mean, count) = collector.average();
    assert_eq!(count, 16 * 500);
    let expected = (0..16u64)
        .flat_map(|task| (0..500u64).map(move |i| (task * 1000 + i) as f64))
        .sum::<f64>()
        / (16.0 * 500.0);
    assert!((mean - expected).abs() / expected < 1e-9);
    Ok(())
}
