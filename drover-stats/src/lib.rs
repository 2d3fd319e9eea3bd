//! Concurrent statistics for Drover
//!
//! Every finished action writes one result into a [`StatsCollector`]. The
//! collector is shared by all simulated sessions, so the write path is built to
//! avoid a global lock:
//! - entries are created once per identity in a concurrent map,
//! - counters on an entry are plain atomics,
//! - response times go through a [`SampleCollector`] with its own small lock
//!   and a hot buffer that batches merges into the running average.

pub mod collector;
pub mod entry;
pub mod exporter;
pub mod sample;
pub mod summary;

pub use collector::{SampleSettings, SharedStatsCollector, StatsCollector, StatsLevel};
pub use entry::{ActionKey, ActionStats, RequestKey, RequestStats};
pub use exporter::{MetricsExporter, NoopExporter};
pub use sample::SampleCollector;
pub use summary::{ActionStatsSnapshot, RequestStatsSnapshot, Summary, SummaryTotals};
