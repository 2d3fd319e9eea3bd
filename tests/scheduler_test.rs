//! Action lifecycle scenarios across sessions: panics, errors, disabled actions and nesting

use anyhow::Result;
use async_trait::async_trait;
use drover_core::{classify, ActionError, MultiError};
use drover_execution::builtins::IteratedSettings;
use drover_execution::{
    run_script, Action, ActionContext, ActionSettings, Connection, OfflineConnection, Session,
};
use drover_logging::{EntryKind, MemoryLogger};
use drover_stats::{StatsCollector, StatsLevel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Ways an action can fail
#[derive(Debug, Clone, Copy, PartialEq)]
enum Failure {
    None,
    Panic,
    QueuedPanic,
    Error,
    QueuedError,
}

#[derive(Debug)]
struct Faulty {
    failure: Failure,
    runs: Arc<AtomicUsize>,
}

impl Faulty {
    fn action(failure: Failure, runs: &Arc<AtomicUsize>) -> Action {
        Action::new(
            "faulty",
            Faulty {
                failure,
                runs: Arc::clone(runs),
            },
        )
    }
}

#[async_trait]
impl ActionSettings for Faulty {
    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Failure::None => Ok(()),
            Failure::Panic => panic!("direct panic"),
            Failure::QueuedPanic => {
                ctx.session.queue_request(async {
                    if true {
                        panic!("queued panic");
                    }
                    Ok(())
                });
                Ok(())
            }
            Failure::Error => Err(ActionError::failed("plain error")),
            Failure::QueuedError => {
                ctx.session.queue_request(async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Err(ActionError::failed("queued error"))
                });
                Ok(())
            }
        }
    }
}

/// Queues a slow sub-request that records traffic
#[derive(Debug)]
struct SlowQueued;

#[async_trait]
impl ActionSettings for SlowQueued {
    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        let session = Arc::clone(ctx.session);
        ctx.session.queue_request(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            session.record_request("GET", "/api/v1/data", Duration::from_millis(30), 12, 3400);
            Ok(())
        });
        Ok(())
    }
}

fn offline() -> Arc<dyn Connection> {
    Arc::new(OfflineConnection)
}

#[tokio::test]
async fn test_four_sessions_recover_panics_and_errors() -> Result<()> {
    let logger = Arc::new(MemoryLogger::new());
    let stats = Arc::new(StatsCollector::new(StatsLevel::On));
    let runs = Arc::new(AtomicUsize::new(0));

    let cases = [
        (Failure::Panic, "panic: direct panic"),
        (Failure::QueuedPanic, "panic: queued panic"),
        (Failure::Error, "plain error"),
        (Failure::QueuedError, "queued error"),
    ];

    let mut handles = Vec::new();
    for (failure, expected) in cases {
        let session = Session::builder()
            .logger(logger.clone())
            .stats(Arc::clone(&stats))
            .build();
        let action = Faulty::action(failure, &runs);
        handles.push(tokio::spawn(async move {
            let result = action.execute(&session, &offline()).await;
            (expected, result)
        }));
    }

    for handle in handles {
        let (expected, result) = handle.await?;
        let error = result.expect_err("every case fails");
        assert_eq!(error.to_string(), expected);
        assert!(!classify(&error).aborted);
    }

    let results = logger.results();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|entry| entry.success() == Some(false)));
    assert_eq!(runs.load(Ordering::SeqCst), 4);

    let snapshot = &stats.action_snapshots()[0];
    assert_eq!(snapshot.failed, 4);
    assert_eq!(snapshot.errors, 4);
    Ok(())
}

#[tokio::test]
async fn test_session_continues_after_panic() -> Result<()> {
    let logger = Arc::new(MemoryLogger::new());
    let session = Session::builder().logger(logger.clone()).build();
    let runs = Arc::new(AtomicUsize::new(0));
    let script = vec![
        Faulty::action(Failure::Panic, &runs),
        Faulty::action(Failure::None, &runs),
    ];

    let error = run_script(&session, &offline(), &script, false).await.unwrap_err();
    assert!(error.is_panic());
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    let results = logger.results();
    assert_eq!(results[0].success(), Some(false));
    assert_eq!(results[1].success(), Some(true));
    Ok(())
}

#[tokio::test]
async fn test_disabled_actions_leave_no_trace() -> Result<()> {
    let logger = Arc::new(MemoryLogger::new());
    let stats = Arc::new(StatsCollector::new(StatsLevel::Full));
    let session = Session::builder()
        .logger(logger.clone())
        .stats(Arc::clone(&stats))
        .build();
    let runs = Arc::new(AtomicUsize::new(0));
    let script = vec![
        Faulty::action(Failure::Error, &runs).disabled(true),
        Faulty::action(Failure::None, &runs).disabled(true),
    ];

    assert!(script.iter().all(|action| action.validate().unwrap().is_empty()));
    run_script(&session, &offline(), &script, true).await?;

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(logger.is_empty());
    assert_eq!(stats.action_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_result_waits_for_queued_requests() -> Result<()> {
    let logger = Arc::new(MemoryLogger::new());
    let session = Session::builder().logger(logger.clone()).build();

    Action::new("slow", SlowQueued).execute(&session, &offline()).await?;

    let results = logger.results();
    assert_eq!(results.len(), 1);
    match &results[0].kind {
        EntryKind::Result {
            success,
            received,
            response_time,
            ..
        } => {
            assert!(*success);
            assert_eq!(*received, 3400);
            assert_eq!(*response_time, Duration::from_millis(30));
        }
        other => panic!("expected a result entry, got {:?}", other),
    }
    assert_eq!(session.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_doubly_nested_errors_are_flattened() -> Result<()> {
    let logger = Arc::new(MemoryLogger::new());
    let session = Session::builder().logger(logger.clone()).build();
    let runs = Arc::new(AtomicUsize::new(0));

    let inner = Action::new(
        "iterated",
        IteratedSettings::new(2, vec![Faulty::action(Failure::Error, &runs)]),
    );
    let outer = Action::new(
        "iterated",
        IteratedSettings::new(
            1,
            vec![inner, Faulty::action(Failure::QueuedError, &runs)],
        ),
    );

    let error = outer.execute(&session, &offline()).await.unwrap_err();
    let classified = classify(&error);
    assert!(!classified.aborted);
    match classified.error {
        ActionError::Multi(multi) => {
            assert_eq!(multi.len(), 3);
            assert!(multi.iter().all(|e| !matches!(e, ActionError::Multi(_))));
        }
        other => panic!("expected a flat multi error, got {:?}", other),
    }
    assert_eq!(logger.infos("containeractionend").len(), 2);
    Ok(())
}

#[test]
fn test_abort_inside_doubly_nested_multi_error_wins() {
    let mut innermost = MultiError::new();
    innermost.push(ActionError::failed("404"));
    innermost.push(ActionError::Aborted.context("select"));

    let mut middle = MultiError::new();
    middle.push(ActionError::Multi(innermost));
    middle.push(ActionError::failed("timeout"));

    let mut outer = MultiError::new();
    outer.push(ActionError::Multi(middle));
    outer.push(ActionError::Multi(MultiError::new()));

    let classified = classify(&ActionError::Multi(outer));
    assert!(classified.aborted);
    assert!(classified.error.is_aborted());
}

#[test]
fn test_single_nested_member_is_unwrapped() {
    let mut inner = MultiError::new();
    inner.push(ActionError::failed("only"));
    let mut outer = MultiError::new();
    outer.push(ActionError::Multi(inner));
    outer.push(ActionError::Multi(MultiError::new()));

    let classified = classify(&ActionError::Multi(outer));
    assert!(!classified.aborted);
    assert_eq!(classified.error.to_string(), "only");
}
