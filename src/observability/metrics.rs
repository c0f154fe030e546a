//! Metrics registry for the monitor
//!
//! - Counters only, plus the fixed catalog size
//! - Monotonic increase
//! - Reset only on process start
//! - Shared across threads (tests observe a running monitor through it)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics registry containing all operational counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Files in the catalog (fixed after build)
    files_tracked: AtomicU64,
    /// Completed verification cycles
    cycles_completed: AtomicU64,
    /// Cycles started by a force request
    forced_cycles: AtomicU64,
    /// Mismatches reported across all cycles
    files_changed: AtomicU64,
    /// Files skipped as unreadable across all cycles
    files_unreadable: AtomicU64,
    /// Bytes folded into checksums, baseline pass included
    bytes_hashed: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the catalog size
    pub fn set_files_tracked(&self, count: u64) {
        self.files_tracked.store(count, Ordering::Relaxed);
    }

    /// Increment completed cycles
    pub fn increment_cycles(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment forced cycles
    pub fn increment_forced_cycles(&self) {
        self.forced_cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Add reported mismatches
    pub fn add_files_changed(&self, count: u64) {
        self.files_changed.fetch_add(count, Ordering::Relaxed);
    }

    /// Add skipped unreadable files
    pub fn add_files_unreadable(&self, count: u64) {
        self.files_unreadable.fetch_add(count, Ordering::Relaxed);
    }

    /// Add hashed bytes
    pub fn add_bytes_hashed(&self, bytes: u64) {
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Completed cycles so far
    pub fn cycles(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"files_tracked":{},"cycles":{},"forced_cycles":{},"files_changed":{},"files_unreadable":{},"bytes_hashed":{}}}"#,
            s.files_tracked,
            s.cycles,
            s.forced_cycles,
            s.files_changed,
            s.files_unreadable,
            s.bytes_hashed,
        )
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_tracked: self.files_tracked.load(Ordering::Relaxed),
            cycles: self.cycles_completed.load(Ordering::Relaxed),
            forced_cycles: self.forced_cycles.load(Ordering::Relaxed),
            files_changed: self.files_changed.load(Ordering::Relaxed),
            files_unreadable: self.files_unreadable.load(Ordering::Relaxed),
            bytes_hashed: self.bytes_hashed.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub files_tracked: u64,
    pub cycles: u64,
    pub forced_cycles: u64,
    pub files_changed: u64,
    pub files_unreadable: u64,
    pub bytes_hashed: u64,
}
