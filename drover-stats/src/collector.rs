//! Statistics registry

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::entry::{ActionKey, ActionStats, RequestKey, RequestStats};
use crate::sample::{SampleCollector, DEFAULT_BUFFER_CAPACITY, DEFAULT_PURGE_INTERVAL};
use crate::summary::{ActionStatsSnapshot, RequestStatsSnapshot};

static GLOBAL_COLLECTOR: OnceCell<Arc<StatsCollector>> = OnceCell::new();

/// How much the collector records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsLevel {
    /// Nothing is recorded
    #[default]
    Off,
    /// Per-action statistics
    On,
    /// Per-action and per-request statistics
    Full,
}

impl StatsLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsLevel::Off => "off",
            StatsLevel::On => "on",
            StatsLevel::Full => "full",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => StatsLevel::On,
            2 => StatsLevel::Full,
            _ => StatsLevel::Off,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            StatsLevel::Off => 0,
            StatsLevel::On => 1,
            StatsLevel::Full => 2,
        }
    }
}

impl std::fmt::Display for StatsLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatsLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(StatsLevel::Off),
            "on" => Ok(StatsLevel::On),
            "full" => Ok(StatsLevel::Full),
            _ => Err(format!("Invalid stats level: {}", s)),
        }
    }
}

/// Tuning of the sample collectors created by a [`StatsCollector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSettings {
    pub buffer_capacity: usize,
    pub purge_interval: Duration,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }
}

impl SampleSettings {
    fn collector(&self) -> SampleCollector {
        SampleCollector::with_settings(self.buffer_capacity, self.purge_interval)
    }
}

/// Thread-safe registry of action and request statistics
///
/// Entries are created lazily, first writer wins, and are never removed
/// during a run. Lookups and creation go through a sharded concurrent map;
/// updates after lookup touch only the entry itself.
#[derive(Debug)]
pub struct StatsCollector {
    level: AtomicU8,
    samples: SampleSettings,
    actions: DashMap<ActionKey, Arc<ActionStats>>,
    requests: DashMap<RequestKey, Arc<RequestStats>>,
}

impl StatsCollector {
    /// Create a new collector at the given level
    pub fn new(level: StatsLevel) -> Self {
        Self::with_sample_settings(level, SampleSettings::default())
    }

    /// Create a new collector with custom sample collector tuning
    pub fn with_sample_settings(level: StatsLevel, samples: SampleSettings) -> Self {
        Self {
            level: AtomicU8::new(level.as_u8()),
            samples,
            actions: DashMap::new(),
            requests: DashMap::new(),
        }
    }

    /// Install the process default collector
    ///
    /// Fails with the rejected collector when a default is already installed.
    pub fn install_global(collector: Arc<StatsCollector>) -> Result<(), Arc<StatsCollector>> {
        GLOBAL_COLLECTOR.set(collector)
    }

    /// The process default collector, if one was installed
    pub fn global() -> Option<Arc<StatsCollector>> {
        GLOBAL_COLLECTOR.get().cloned()
    }

    pub fn level(&self) -> StatsLevel {
        StatsLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: StatsLevel) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.level() != StatsLevel::Off
    }

    /// Get or create the entry for an action; `None` when statistics are off
    pub fn get_or_add_action_stats(
        &self,
        name: &str,
        label: &str,
        app_context: &str,
    ) -> Option<Arc<ActionStats>> {
        if !self.is_enabled() {
            return None;
        }

        let key = ActionKey::new(name, label, app_context);
        if let Some(existing) = self.actions.get(&key) {
            return Some(Arc::clone(existing.value()));
        }

        let entry = self.actions.entry(key.clone()).or_insert_with(|| {
            debug!(
                "Creating action stats for {} ({}) in app {}",
                key.name, key.label, key.app_context
            );
            Arc::new(ActionStats::new(key, self.samples.collector()))
        });
        Some(Arc::clone(entry.value()))
    }

    /// Get or create the entry for a request; `None` unless the level is `Full`
    pub fn get_or_add_request_stats(&self, method: &str, path: &str) -> Option<Arc<RequestStats>> {
        if self.level() != StatsLevel::Full {
            return None;
        }

        let key = RequestKey::new(method, path);
        if let Some(existing) = self.requests.get(&key) {
            return Some(Arc::clone(existing.value()));
        }

        let entry = self
            .requests
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RequestStats::new(key, self.samples.collector())));
        Some(Arc::clone(entry.value()))
    }

    /// Visit every action entry
    pub fn for_each_action<F>(&self, mut f: F)
    where
        F: FnMut(&ActionStats),
    {
        for entry in self.actions.iter() {
            f(entry.value());
        }
    }

    /// Visit every request entry
    pub fn for_each_request<F>(&self, mut f: F)
    where
        F: FnMut(&RequestStats),
    {
        for entry in self.requests.iter() {
            f(entry.value());
        }
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Snapshots of every action entry, sorted by key
    pub fn action_snapshots(&self) -> Vec<ActionStatsSnapshot> {
        let mut snapshots = Vec::with_capacity(self.actions.len());
        self.for_each_action(|stats| snapshots.push(stats.snapshot()));
        snapshots.sort_by(|a, b| {
            (&a.name, &a.label, &a.app_context).cmp(&(&b.name, &b.label, &b.app_context))
        });
        snapshots
    }

    /// Snapshots of every request entry, sorted by key
    pub fn request_snapshots(&self) -> Vec<RequestStatsSnapshot> {
        let mut snapshots = Vec::with_capacity(self.requests.len());
        self.for_each_request(|stats| snapshots.push(stats.snapshot()));
        snapshots.sort_by(|a, b| (&a.method, &a.path).cmp(&(&b.method, &b.path)));
        snapshots
    }

    /// Drop every entry, keeping the level
    pub fn reset(&self) {
        self.actions.clear();
        self.requests.clear();
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new(StatsLevel::On)
    }
}

/// Shared stats collector
pub type SharedStatsCollector = Arc<StatsCollector>;
