use parking_lot::Mutex;

use crate::entry::LogEntry;
use crate::ActionLogger;

/// Keeps every entry in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every entry logged so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Result entries only
    pub fn results(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().filter(|e| e.is_result()).cloned().collect()
    }

    /// Info entries of the given type
    pub fn infos(&self, info_type: &str) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.info_type() == Some(info_type))
            .cloned()
            .collect()
    }

    pub fn take(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl ActionLogger for MemoryLogger {
    fn log(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }
}
