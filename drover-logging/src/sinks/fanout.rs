use std::sync::Arc;

use crate::entry::LogEntry;
use crate::ActionLogger;

/// Forwards each entry to several loggers in order
#[derive(Debug, Default, Clone)]
pub struct FanoutLogger {
    sinks: Vec<Arc<dyn ActionLogger>>,
}

impl FanoutLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn ActionLogger>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ActionLogger for FanoutLogger {
    fn log(&self, entry: LogEntry) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.log(entry.clone());
            }
            last.log(entry);
        }
    }

    /// Flushes every sink; the first error is returned
    fn flush(&self) -> std::io::Result<()> {
        let mut result = Ok(());
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}
