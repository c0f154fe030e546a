//! Observability subsystem
//!
//! - Structured logging (JSON lines on stderr)
//! - Monotonic counters
//! - Lifecycle event tracing
//!
//! Observability is read-only: it never changes what the monitor does,
//! and a logging failure never stops it.
//!
//! ```ignore
//! use crcwatch::observability::{Logger, Event, log_event_with_fields};
//!
//! Logger::info("CYCLE_COMPLETE", &[("changed", "0")]);
//! log_event_with_fields(Event::FileChanged, &[("path", "/etc/app.conf")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
