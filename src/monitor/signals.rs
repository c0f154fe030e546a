//! Process signal wiring
//!
//! Signals are received on a dedicated thread running a current-thread
//! tokio runtime. The listener only flips [`ControlFlags`]; it never
//! touches the catalog.
//!
//! | Signal            | Effect          |
//! |-------------------|-----------------|
//! | SIGUSR1           | force a cycle   |
//! | SIGTERM           | terminate       |
//! | SIGINT            | terminate       |
//! | SIGHUP, SIGQUIT   | logged, ignored |
//! | SIGCONT           | default action  |
//!
//! SIGINT terminating is a deliberate departure from the classic monitor,
//! which ignored SIGINT and also caught SIGCONT. Ctrl-C in a terminal now
//! gets the same clean teardown as SIGTERM. SIGCONT is not intercepted.
//!
//! The listener is meant to be installed before the catalog is built so
//! that no handled signal falls back to its default action during startup.
//!
//! On other platforms Ctrl-C terminates.

use std::io;
use std::panic;
use std::sync::Arc;
use std::thread;

use tokio::runtime::{Builder, Runtime};

use super::control::ControlFlags;
use crate::observability::{log_event_with_fields, Event};

/// Installs the listener and returns once every handler is registered.
///
/// # Errors
///
/// Fails if the runtime cannot be created, a handler cannot be
/// registered, or the listener thread cannot be spawned.
pub fn spawn_signal_listener(control: Arc<ControlFlags>) -> io::Result<thread::JoinHandle<()>> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let signals = {
        let _guard = runtime.enter();
        Signals::register()?
    };

    thread::Builder::new()
        .name("crcwatch-signals".to_string())
        .spawn(move || listen(runtime, signals, control))
}

fn listen(runtime: Runtime, signals: Signals, control: Arc<ControlFlags>) {
    runtime.block_on(signals.dispatch(&control));
}

fn request_terminate(control: &ControlFlags, signal: &str) {
    log_event_with_fields(Event::TerminateRequested, &[("signal", signal)]);
    control.request_terminate();
}

#[cfg(unix)]
struct Signals {
    usr1: tokio::signal::unix::Signal,
    term: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
    hup: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            usr1: signal(SignalKind::user_defined1())?,
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
            hup: signal(SignalKind::hangup())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    async fn dispatch(mut self, control: &ControlFlags) {
        loop {
            tokio::select! {
                Some(()) = self.usr1.recv() => {
                    log_event_with_fields(Event::ForceCycleRequested, &[("signal", "SIGUSR1")]);
                    control.request_force_cycle();
                }
                Some(()) = self.term.recv() => request_terminate(control, "SIGTERM"),
                Some(()) = self.int.recv() => request_terminate(control, "SIGINT"),
                Some(()) = self.hup.recv() => {
                    log_event_with_fields(Event::SignalIgnored, &[("signal", "SIGHUP")]);
                }
                Some(()) = self.quit.recv() => {
                    log_event_with_fields(Event::SignalIgnored, &[("signal", "SIGQUIT")]);
                }
                else => return,
            }
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn dispatch(self, control: &ControlFlags) {
        while tokio::signal::ctrl_c().await.is_ok() {
            request_terminate(control, "CTRL_C");
        }
    }
}

/// Replaces the panic hook: log `INTERNAL_FAULT` and abort.
///
/// An internal fault bypasses the scheduler and teardown entirely.
pub fn install_fault_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let reason = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "panic".to_string()
        };

        log_event_with_fields(
            Event::InternalFault,
            &[("location", &location), ("reason", &reason)],
        );
        std::process::abort();
    }));
}
