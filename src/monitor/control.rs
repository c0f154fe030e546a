//! Control flags shared between the monitor loop and external actors
//!
//! - `force_cycle`: consumed and cleared exactly once by the loop
//! - `terminate`: terminal, never cleared
//!
//! Setters are safe from any thread. The loop only observes the flags at
//! wait and cycle boundaries, never in the middle of a checksum read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Instant;

/// Why a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The deadline passed
    Elapsed,
    /// A forced cycle was requested (flag now cleared)
    Forced,
    /// Termination was requested
    Terminate,
}

/// Shared control state with an interruptible wait.
#[derive(Debug, Default)]
pub struct ControlFlags {
    force_cycle: AtomicBool,
    terminate: AtomicBool,
    lock: Mutex<()>,
    wakeup: Condvar,
}

impl ControlFlags {
    /// Both flags clear
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for an immediate verification cycle
    pub fn request_force_cycle(&self) {
        self.force_cycle.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Ask the loop to exit at its next boundary
    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Whether a forced cycle is pending
    pub fn force_pending(&self) -> bool {
        self.force_cycle.load(Ordering::SeqCst)
    }

    /// Whether termination was requested
    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    /// Clears and returns the force flag
    pub fn take_force(&self) -> bool {
        self.force_cycle.swap(false, Ordering::SeqCst)
    }

    /// Blocks until `deadline`, a force request or a terminate request.
    ///
    /// Terminate wins over force. A pending force request returns
    /// immediately and is cleared.
    pub fn wait_until(&self, deadline: Instant) -> Wake {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if self.is_terminated() {
                return Wake::Terminate;
            }
            if self.take_force() {
                return Wake::Forced;
            }

            let now = Instant::now();
            if now >= deadline {
                return Wake::Elapsed;
            }

            guard = self
                .wakeup
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn notify(&self) {
        // Taking the lock orders the store before the waiter's re-check
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.wakeup.notify_all();
    }
}
