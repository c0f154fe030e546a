//! Drift-corrected cycle scheduling
//!
//! Two phases, `Waiting` and `Running`. The wait after a cycle is the
//! configured interval minus the time the cycle itself took, clamped at
//! zero, so cycle starts stay aligned to the interval instead of drifting
//! by the cycle's execution time.
//!
//! All transitions take explicit `Instant`s from a monotonic clock.

use std::time::{Duration, Instant};

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePhase {
    /// Between cycles
    Waiting,
    /// A verification cycle is executing
    Running,
}

/// Next wait for a cycle that took `elapsed`: `max(0, interval - elapsed)`.
pub fn corrected_wait(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Cycle timing state, persisted across cycles.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    interval: Duration,
    phase: SchedulePhase,
    cycle_started: Option<Instant>,
    last_cycle_elapsed: Duration,
    cycles_completed: u64,
}

impl ScheduleState {
    /// Fresh state: `Waiting`, no cycle run yet
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            phase: SchedulePhase::Waiting,
            cycle_started: None,
            last_cycle_elapsed: Duration::ZERO,
            cycles_completed: 0,
        }
    }

    /// Configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current phase
    pub fn phase(&self) -> SchedulePhase {
        self.phase
    }

    /// Execution time of the most recent completed cycle
    pub fn last_cycle_elapsed(&self) -> Duration {
        self.last_cycle_elapsed
    }

    /// Start of the running or most recent cycle
    pub fn last_cycle_started(&self) -> Option<Instant> {
        self.cycle_started
    }

    /// Number of completed cycles
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// `Waiting -> Running`
    pub fn begin_cycle(&mut self, now: Instant) {
        debug_assert_eq!(self.phase, SchedulePhase::Waiting);
        self.phase = SchedulePhase::Running;
        self.cycle_started = Some(now);
    }

    /// `Running -> Waiting`. Returns the corrected wait before the next cycle.
    pub fn end_cycle(&mut self, now: Instant) -> Duration {
        debug_assert_eq!(self.phase, SchedulePhase::Running);
        let started = self.cycle_started.unwrap_or(now);
        self.last_cycle_elapsed = now.saturating_duration_since(started);
        self.phase = SchedulePhase::Waiting;
        self.cycles_completed += 1;
        self.next_wait()
    }

    /// Wait owed before the next cycle, based on the last cycle's duration
    pub fn next_wait(&self) -> Duration {
        corrected_wait(self.interval, self.last_cycle_elapsed)
    }
}
