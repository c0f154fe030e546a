//! Human-readable report sink

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use super::{ReportEvent, ReportSink};

/// Writes one plain-text line per event (`OK`, `FAIL <path>`, ...).
pub struct ConsoleSink<W: Write + Send = io::Stdout> {
    writer: Mutex<W>,
}

impl ConsoleSink<io::Stdout> {
    /// Console sink on stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Console sink over any writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ReportSink for ConsoleSink<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    fn emit(&self, event: &ReportEvent) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", event.human_line())?;
        writer.flush()
    }

    fn flush(&self) -> io::Result<()> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}
