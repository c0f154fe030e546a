//! Observable lifecycle events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events in the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Monitor startup begins
    MonitorStart,
    /// First cycle is about to run
    MonitorReady,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete, handles released
    ShutdownComplete,

    // Configuration
    /// Configuration resolved from file, flags and environment
    ConfigLoaded,

    // Catalog
    /// A regular file was discovered in the target directory
    FileDiscovered,
    /// Catalog handles released
    CatalogReleased,

    // Control
    /// Forced cycle requested by an external actor
    ForceCycleRequested,
    /// Termination requested by an external actor
    TerminateRequested,
    /// A signal was caught and deliberately ignored
    SignalIgnored,
    /// Signal listener could not be installed
    SignalListenerFailed,

    // Cycle
    /// A file's checksum changed since the previous cycle
    FileChanged,
    /// A file could not be read and was skipped
    FileUnreadable,
    /// Cycle failed on a read error (FATAL)
    CycleFailed,

    /// Internal fault, process aborts (FATAL)
    InternalFault,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::MonitorStart => "MONITOR_STARTUP_BEGIN",
            Event::MonitorReady => "MONITOR_READY",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::FileDiscovered => "FILE_DISCOVERED",
            Event::CatalogReleased => "CATALOG_RELEASED",

            Event::ForceCycleRequested => "FORCE_CYCLE_REQUESTED",
            Event::TerminateRequested => "TERMINATE_REQUESTED",
            Event::SignalIgnored => "SIGNAL_IGNORED",
            Event::SignalListenerFailed => "SIGNAL_LISTENER_FAILED",

            Event::FileChanged => "FILE_CHANGED",
            Event::FileUnreadable => "FILE_UNREADABLE",
            Event::CycleFailed => "CYCLE_FAILED",

            Event::InternalFault => "INTERNAL_FAULT",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::CycleFailed | Event::InternalFault)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
