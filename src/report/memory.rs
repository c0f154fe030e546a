//! In-memory report sink for testing and embedding

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use super::{ReportEvent, ReportSink};

/// Records every event. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded events
    pub fn events(&self) -> Vec<ReportEvent> {
        self.lock().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of recorded events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&ReportEvent) -> bool) -> usize {
        self.lock().iter().filter(|e| predicate(e)).count()
    }

    /// Forget all recorded events
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReportEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReportSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn emit(&self, event: &ReportEvent) -> io::Result<()> {
        self.lock().push(event.clone());
        Ok(())
    }
}
