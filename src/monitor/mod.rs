//! Periodic integrity monitoring
//!
//! - `cycle`: one verification pass over the catalog
//! - `schedule`: drift-corrected timing between passes
//! - `control`: force and terminate flags with an interruptible wait
//! - `runner`: the single-threaded loop that ties them together
//! - `signals`: OS signal and panic wiring
//!
//! The loop is the only owner of the catalog's handles. Other threads
//! interact with it exclusively through [`ControlFlags`].

mod control;
mod cycle;
mod runner;
mod schedule;
mod signals;

pub use control::{ControlFlags, Wake};
pub use cycle::{run_cycle, CycleResult, ReadFailurePolicy};
pub use runner::{Monitor, MonitorSettings};
pub use schedule::{corrected_wait, SchedulePhase, ScheduleState};
pub use signals::{install_fault_hook, spawn_signal_listener};
