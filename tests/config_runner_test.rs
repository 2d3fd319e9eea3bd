//! End to end: configuration file, script parsing, run and the JSON lines action log

use anyhow::Result;
use drover_config::{ConfigLoader, DroverConfig};
use drover_execution::{ActionRegistry, OfflineConnection, RunError, Runner};
use drover_logging::LogEntry;
use drover_stats::StatsLevel;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SCRIPT: &str = r#"{
    "actions": [
        {"type": "setscriptvar", "settings": {"name": "round", "value": 1}},
        {"type": "ThinkTime", "label": "warm up", "settings": {"delay": 0.01}},
        {"type": "iterated", "label": "loop", "settings": {
            "iterations": 2,
            "actions": [
                {"type": "thinktime", "settings": {"delay": 0.01, "jitter": 0.005}},
                {"type": "thinktime", "disabled": true, "settings": {"delay": 3600}}
            ]
        }}
    ]
}"#;

fn write_config(dir: &TempDir, action_log: &std::path::Path) -> Result<std::path::PathBuf> {
    let path = dir.path().join("drover.yaml");
    let mut file = std::fs::File::create(&path)?;
    writeln!(
        file,
        r#"stats:
  level: full
  buffer_capacity: 10
  purge_interval: 0.5
reconnect:
  enabled: true
  backoff: [0, 1.5]
logging:
  level: debug
  format: json
  action_log: {}
runner:
  concurrent_users: 3
  iterations: 2
  rampup: 0.01
"#,
        action_log.display()
    )?;
    Ok(path)
}

#[tokio::test]
async fn test_run_from_config_file() -> Result<()> {
    let dir = TempDir::new()?;
    let action_log = dir.path().join("actions.jsonl");
    let config_path = write_config(&dir, &action_log)?;

    let config = ConfigLoader::new().from_file(&config_path)?;
    assert_eq!(config.stats.level, StatsLevel::Full);
    assert_eq!(config.reconnect.backoff, vec![Duration::ZERO, Duration::from_millis(1500)]);
    assert_eq!(config.runner.concurrent_users, 3);

    let script = ActionRegistry::global().parse_script(SCRIPT)?;
    let runner = Runner::from_config(&config, script, Arc::new(OfflineConnection))?;
    assert!(runner.validate()?.is_empty());

    let report = runner.run().await?;
    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes.iter().all(|o| o.is_success() && o.iterations == 2));

    let stats = runner.stats().expect("stats configured");
    assert_eq!(stats.level(), StatsLevel::Full);

    // the runner still holds the log open; its entries are already flushed
    let content = std::fs::read_to_string(&action_log)?;
    let entries = content
        .lines()
        .map(serde_json::from_str::<LogEntry>)
        .collect::<Result<Vec<_>, _>>()?;

    // per user and iteration: 4 starts, 3 thinktime results and one container end
    let results = entries.iter().filter(|e| e.is_result()).count();
    assert_eq!(results, 3 * 2 * 3);
    let container_ends = entries
        .iter()
        .filter(|e| e.info_type() == Some("containeractionend"))
        .count();
    assert_eq!(container_ends, 3 * 2);
    assert!(entries
        .iter()
        .filter(|e| e.is_result())
        .all(|e| e.success() == Some(true)));
    assert!(!entries.iter().any(|e| e.action_name() == Some("setscriptvar") && e.is_result()));
    Ok(())
}

#[tokio::test]
async fn test_invalid_config_is_rejected() -> Result<()> {
    let mut config = DroverConfig::default();
    config.runner.concurrent_users = 0;

    let script = ActionRegistry::global().parse_script(r#"[{"type": "thinktime"}]"#)?;
    let result = Runner::from_config(&config, script, Arc::new(OfflineConnection));
    assert!(matches!(result, Err(RunError::InvalidSettings(_))));
    Ok(())
}

#[test]
fn test_unknown_action_type_fails_parsing() {
    let result = ActionRegistry::global().parse_script(r#"[{"type": "openapp"}]"#);
    let error = result.unwrap_err();
    assert_eq!(error.to_string(), "unknown action type 'openapp'");
}
