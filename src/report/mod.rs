//! Integrity report sinks
//!
//! The monitor emits one report per integrity event:
//! - one `Baseline` per file while the catalog is built
//! - per cycle, either a single `AllClear` or one `Changed` per path
//! - `Unreadable` for files skipped under the skip-and-report policy
//! - `Fatal` once, before the monitor gives up
//!
//! Every event is fanned out to all configured sinks. A failing sink is
//! logged and never stops monitoring.

mod console;
mod event;
mod journal;
mod memory;

pub use console::ConsoleSink;
pub use event::ReportEvent;
pub use journal::JournalSink;
pub use memory::MemorySink;

use std::io;

use crate::observability::Logger;

/// Destination for integrity reports.
pub trait ReportSink: Send + Sync {
    /// Short sink name for diagnostics
    fn name(&self) -> &'static str;

    /// Write one event. Must be visible to readers once this returns.
    fn emit(&self, event: &ReportEvent) -> io::Result<()>;

    /// Flush any buffered output.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Fan-out over every configured sink, in registration order.
#[derive(Default)]
pub struct Reporter {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Reporter {
    /// Reporter with no sinks; events are dropped
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of registered sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver an event to every sink
    pub fn emit(&self, event: &ReportEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event) {
                let reason = e.to_string();
                Logger::error(
                    "REPORT_SINK_FAILED",
                    &[("sink", sink.name()), ("event", event.as_str()), ("reason", &reason)],
                );
            }
        }
    }

    /// Flush every sink before shutdown
    pub fn close(&self) {
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                let reason = e.to_string();
                Logger::error("REPORT_SINK_FLUSH_FAILED", &[("sink", sink.name()), ("reason", &reason)]);
            }
        }
    }
}
