use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::entry::LogEntry;
use crate::ActionLogger;

/// Writes one JSON object per entry to a file or any writer
pub struct JsonLinesLogger {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesLogger {
    /// Append to the file at `path`, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file: File = OpenOptions::new().create(true).append(true).open(path.as_ref())?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl fmt::Debug for JsonLinesLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLinesLogger").finish_non_exhaustive()
    }
}

impl ActionLogger for JsonLinesLogger {
    fn log(&self, entry: LogEntry) {
        let mut writer = self.writer.lock();
        let written = serde_json::to_writer(&mut *writer, &entry)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.write_all(b"\n"));
        if let Err(e) = written {
            tracing::warn!("Failed to write action log entry: {}", e);
        }
    }

    fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().flush()
    }
}

impl Drop for JsonLinesLogger {
    fn drop(&mut self) {
        let _ = self.writer.get_mut().flush();
    }
}
