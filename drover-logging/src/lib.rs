//! Structured action logging for Drover
//!
//! Two layers:
//! - operational diagnostics go through `tracing`, set up by [`init_tracing`]
//! - the action log (start, reset, result, info, warning, error entries keyed
//!   by session and action) goes through an [`ActionLogger`] sink

pub mod entry;
pub mod init;
pub mod sinks;

pub use entry::{ActionInfo, EntryKind, LogEntry, SessionInfo};
pub use init::{init_simple_tracing, init_tracing, LogFormat, LogFormatParseError};
pub use sinks::{FanoutLogger, JsonLinesLogger, MemoryLogger, TracingLogger};

use once_cell::sync::OnceCell;
use std::fmt::Debug;
use std::sync::Arc;

/// Sink for structured action log entries
pub trait ActionLogger: Send + Sync + Debug {
    fn log(&self, entry: LogEntry);

    /// Push buffered entries to their destination
    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<T: ActionLogger + ?Sized> ActionLogger for Arc<T> {
    fn log(&self, entry: LogEntry) {
        (**self).log(entry)
    }

    fn flush(&self) -> std::io::Result<()> {
        (**self).flush()
    }
}

static GLOBAL_LOGGER: OnceCell<Arc<dyn ActionLogger>> = OnceCell::new();

/// Initialize the global action logger
pub fn init_logger(logger: Arc<dyn ActionLogger>) -> Result<(), &'static str> {
    GLOBAL_LOGGER.set(logger).map_err(|_| "Logger already initialized")
}

/// The global action logger, falling back to [`TracingLogger`]
pub fn logger() -> Arc<dyn ActionLogger> {
    GLOBAL_LOGGER
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(TracingLogger))
}
