//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` with `elapsed_ms` on `complete`
//! - Logs `{name}_FAILED` on `fail` / `fail_fatal`
//! - Logs `{name}_INCOMPLETE` if dropped without either

use std::time::{Duration, Instant};

use super::logger::{Logger, Severity};

/// A scope that automatically logs begin and complete events
///
/// ```ignore
/// let scope = ObservationScope::with_fields("CYCLE", &[("cycle", "4")]);
/// // ... verify files ...
/// scope.complete_with_fields(&[("changed", "0")]);
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: bool,
    fields: Vec<(&'a str, String)>,
    timer: Timer,
    begin_severity: Severity,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope, logging `{name}_BEGIN` at INFO
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a new observation scope with fields repeated on every record
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        Self::open(name, fields, Severity::Info)
    }

    /// Like `with_fields`, but the BEGIN record is TRACE
    pub fn quiet(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        Self::open(name, fields, Severity::Trace)
    }

    fn open(name: &'a str, fields: &[(&'a str, &str)], begin_severity: Severity) -> Self {
        Logger::log(begin_severity, &format!("{}_BEGIN", name), fields);

        Self {
            name,
            completed: false,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            timer: Timer::new(),
            begin_severity,
        }
    }

    /// Time spent inside the scope so far
    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    /// Mark the scope as successfully completed
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(mut self, extra_fields: &[(&str, &str)]) {
        self.completed = true;
        let elapsed = self.timer.elapsed_ms();

        let mut all_fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all_fields.extend(extra_fields.iter().copied());
        all_fields.push(("elapsed_ms", elapsed.as_str()));

        let severity = self.begin_severity.max(Severity::Info);
        Logger::log(severity, &format!("{}_COMPLETE", self.name), &all_fields);
    }

    /// Mark the scope as failed, logging at ERROR
    pub fn fail(self, reason: &str) {
        self.fail_at(Severity::Error, reason);
    }

    /// Mark the scope as failed, logging at FATAL
    pub fn fail_fatal(self, reason: &str) {
        self.fail_at(Severity::Fatal, reason);
    }

    fn fail_at(mut self, severity: Severity, reason: &str) {
        self.completed = true;
        let mut all_fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all_fields.push(("reason", reason));
        Logger::log(severity, &format!("{}_FAILED", self.name), &all_fields);
    }

    /// Check if the scope has been completed
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed {
            let event = format!("{}_INCOMPLETE", self.name);
            Logger::warn(&event, &[("reason", "scope dropped without completion")]);
        }
    }
}

/// A monotonic duration timer
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since creation
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get elapsed milliseconds as a string
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
