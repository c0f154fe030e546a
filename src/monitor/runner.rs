//! The monitor loop
//!
//! Owns the catalog for its whole lifetime:
//! - first cycle runs immediately after the catalog is built
//! - wait (interruptible), cycle, report, repeat
//! - terminate is observed only at wait and cycle boundaries
//! - teardown closes the report sinks, then releases every handle
//!
//! A fatal cycle error writes one `FATAL` report, tears down the same way
//! and is returned to the caller.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::control::{ControlFlags, Wake};
use super::cycle::{run_cycle, CycleResult, ReadFailurePolicy};
use super::schedule::ScheduleState;
use crate::catalog::Catalog;
use crate::checksum::{ChecksumAlgorithm, ChecksumEngine, Crc32};
use crate::errors::IntegrityResult;
use crate::observability::{
    log_event, log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot, ObservationScope,
};
use crate::report::{ReportEvent, Reporter};

/// Runtime settings for a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Nominal time between cycle starts
    pub interval: Duration,
    /// Mid-cycle read failure handling
    pub policy: ReadFailurePolicy,
}

impl MonitorSettings {
    /// Fail-fast settings with the given interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            policy: ReadFailurePolicy::FailFast,
        }
    }

    /// Override the read failure policy
    pub fn with_policy(mut self, policy: ReadFailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A built catalog plus everything needed to keep verifying it.
pub struct Monitor<A: ChecksumAlgorithm = Crc32> {
    catalog: Catalog<A::Output>,
    engine: ChecksumEngine<A>,
    schedule: ScheduleState,
    policy: ReadFailurePolicy,
    control: Arc<ControlFlags>,
    metrics: Arc<MetricsRegistry>,
    reporter: Reporter,
}

impl<A: ChecksumAlgorithm> Monitor<A> {
    /// Builds the catalog for `directory` and reports every baseline.
    ///
    /// A build failure is reported as `FATAL` to `reporter` before it is
    /// returned; no catalog exists afterwards.
    pub fn start(
        directory: &Path,
        engine: ChecksumEngine<A>,
        reporter: Reporter,
        settings: MonitorSettings,
    ) -> IntegrityResult<Self> {
        let control = Arc::new(ControlFlags::new());
        Self::start_with_control(directory, engine, reporter, settings, control)
    }

    /// Like [`Monitor::start`], with control flags created by the caller.
    ///
    /// Lets signal handlers be installed before the catalog is built. A
    /// terminate raised during the build is honored before the first cycle.
    pub fn start_with_control(
        directory: &Path,
        mut engine: ChecksumEngine<A>,
        reporter: Reporter,
        settings: MonitorSettings,
        control: Arc<ControlFlags>,
    ) -> IntegrityResult<Self> {
        let folder = directory.display().to_string();
        log_event_with_fields(Event::MonitorStart, &[("folder", &folder)]);

        let catalog = match Catalog::build(directory, &mut engine) {
            Ok(catalog) => catalog,
            Err(e) => {
                reporter.emit(&ReportEvent::Fatal {
                    reason: e.report_reason(),
                });
                reporter.close();
                return Err(e);
            }
        };

        catalog.report_baselines(engine.algorithm(), &reporter);

        let metrics = Arc::new(MetricsRegistry::new());
        metrics.set_files_tracked(catalog.len() as u64);
        metrics.add_bytes_hashed(catalog.baseline_bytes());

        Ok(Self {
            catalog,
            engine,
            schedule: ScheduleState::new(settings.interval),
            policy: settings.policy,
            control,
            metrics,
            reporter,
        })
    }

    /// Control handle for signal listeners and tests
    pub fn control(&self) -> Arc<ControlFlags> {
        Arc::clone(&self.control)
    }

    /// Shared counters, readable while the monitor runs
    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    /// The tracked files
    pub fn catalog(&self) -> &Catalog<A::Output> {
        &self.catalog
    }

    /// Runs until terminated or until a cycle fails fatally.
    ///
    /// Returns the final counters on orderly termination.
    pub fn run(mut self) -> IntegrityResult<MetricsSnapshot> {
        let files = self.catalog.len().to_string();
        let interval = self.schedule.interval().as_secs_f64().to_string();
        log_event_with_fields(
            Event::MonitorReady,
            &[("files", &files), ("interval_secs", &interval)],
        );

        let outcome = self.run_loop();
        self.shutdown(outcome)
    }

    fn run_loop(&mut self) -> IntegrityResult<()> {
        let mut deadline = Instant::now();

        loop {
            let forced = match self.control.wait_until(deadline) {
                Wake::Terminate => return Ok(()),
                Wake::Forced => true,
                Wake::Elapsed => false,
            };

            deadline = self.cycle(forced)?;

            if self.control.is_terminated() {
                return Ok(());
            }
        }
    }

    /// One scheduled cycle: verify, report, account. Returns the next deadline.
    fn cycle(&mut self, forced: bool) -> IntegrityResult<Instant> {
        let number = (self.schedule.cycles_completed() + 1).to_string();
        let scope = ObservationScope::quiet(
            "CYCLE",
            &[("cycle", &number), ("forced", if forced { "true" } else { "false" })],
        );

        self.schedule.begin_cycle(Instant::now());

        let result = match run_cycle(&mut self.catalog, &mut self.engine, self.policy) {
            Ok(result) => result,
            Err(e) => {
                scope.fail_fatal(&e.to_string());
                return Err(e);
            }
        };

        result.report(&self.reporter);
        let finished = Instant::now();
        let wait = self.schedule.end_cycle(finished);
        self.record(&result, forced);

        let changed = result.mismatch_count().to_string();
        let bytes = result.bytes_read.to_string();
        scope.complete_with_fields(&[("bytes", &bytes), ("changed", &changed)]);

        Ok(deadline_after(finished, wait))
    }

    fn record(&self, result: &CycleResult, forced: bool) {
        if forced {
            self.metrics.increment_forced_cycles();
        }
        self.metrics.add_files_changed(result.mismatches.len() as u64);
        self.metrics.add_files_unreadable(result.unreadable.len() as u64);
        self.metrics.add_bytes_hashed(result.bytes_read);
        self.metrics.increment_cycles();
    }

    fn shutdown(self, outcome: IntegrityResult<()>) -> IntegrityResult<MetricsSnapshot> {
        log_event(Event::ShutdownStart);

        let Monitor {
            catalog,
            metrics,
            reporter,
            ..
        } = self;

        if let Err(ref e) = outcome {
            let reason = e.report_reason();
            log_event_with_fields(
                Event::CycleFailed,
                &[("code", e.code().code()), ("reason", &reason)],
            );
            reporter.emit(&ReportEvent::Fatal { reason });
        }

        reporter.close();
        catalog.close();

        log_event_with_fields(Event::ShutdownComplete, &[("metrics", &metrics.to_json())]);
        outcome.map(|()| metrics.snapshot())
    }
}

/// `now + wait`, saturating to a far-future deadline instead of overflowing.
fn deadline_after(now: Instant, wait: Duration) -> Instant {
    now.checked_add(wait)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Stand-in for "never" when an interval does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    const LONG: Duration = Duration::from_secs(3600);

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn start(dir: &TempDir, interval: Duration) -> (Monitor, MemorySink) {
        let sink = MemorySink::new();
        let reporter = Reporter::new().with_sink(sink.clone());
        let monitor = Monitor::start(
            dir.path(),
            ChecksumEngine::with_chunk_size(32),
            reporter,
            MonitorSettings::new(interval),
        )
        .unwrap();
        (monitor, sink)
    }

    #[test]
    fn test_start_reports_baselines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"alpha").unwrap();

        let (monitor, sink) = start(&dir, LONG);

        assert_eq!(monitor.catalog().len(), 1);
        assert_eq!(
            sink.events(),
            vec![ReportEvent::Baseline {
                path: dir.path().join("a"),
                algorithm: "CRC32",
                checksum: format!("{:08X}", crc32fast::hash(b"alpha")),
            }]
        );
        assert_eq!(monitor.metrics().snapshot().bytes_hashed, 5);
    }

    #[test]
    fn test_start_failure_reports_fatal() {
        let dir = TempDir::new().unwrap();
        let sink = MemorySink::new();
        let reporter = Reporter::new().with_sink(sink.clone());

        let result = Monitor::start(
            &dir.path().join("missing"),
            ChecksumEngine::new(),
            reporter,
            MonitorSettings::new(LONG),
        );

        assert!(result.is_err());
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ReportEvent::Fatal { reason }
            if reason.starts_with("CRCW_DIRECTORY_UNAVAILABLE")));
    }

    #[test]
    fn test_terminate_before_run_skips_all_cycles() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let (monitor, sink) = start(&dir, LONG);

        monitor.control().request_terminate();
        let snapshot = monitor.run().unwrap();

        assert_eq!(snapshot.cycles, 0);
        assert_eq!(sink.count(|e| *e == ReportEvent::AllClear), 0);
    }

    #[test]
    fn test_first_cycle_immediate_then_terminate_during_wait() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let (monitor, sink) = start(&dir, LONG);
        let control = monitor.control();
        let metrics = monitor.metrics();

        let handle = thread::spawn(move || monitor.run());

        wait_for(|| metrics.cycles() == 1);
        control.request_terminate();
        let snapshot = handle.join().unwrap().unwrap();

        assert_eq!(snapshot.cycles, 1);
        assert_eq!(sink.count(|e| *e == ReportEvent::AllClear), 1);
    }

    #[test]
    fn test_force_starts_cycle_and_detects_change() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"before").unwrap();
        let (monitor, sink) = start(&dir, LONG);
        let control = monitor.control();
        let metrics = monitor.metrics();

        let handle = thread::spawn(move || monitor.run());
        wait_for(|| metrics.cycles() == 1);

        fs::write(dir.path().join("a"), b"after").unwrap();
        control.request_force_cycle();
        wait_for(|| metrics.cycles() == 2);

        assert!(!control.force_pending());
        control.request_terminate();
        let snapshot = handle.join().unwrap().unwrap();

        assert_eq!(snapshot.forced_cycles, 1);
        assert_eq!(snapshot.files_changed, 1);
        assert_eq!(
            sink.count(|e| *e == ReportEvent::Changed { path: dir.path().join("a") }),
            1
        );
    }

    #[test]
    fn test_short_interval_keeps_cycling() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let (monitor, _sink) = start(&dir, Duration::from_millis(10));
        let control = monitor.control();
        let metrics = monitor.metrics();

        let handle = thread::spawn(move || monitor.run());
        wait_for(|| metrics.cycles() >= 3);
        control.request_terminate();

        let snapshot = handle.join().unwrap().unwrap();
        assert!(snapshot.cycles >= 3);
        assert_eq!(snapshot.forced_cycles, 0);
    }

    #[test]
    fn test_start_with_control_shares_flags() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let control = Arc::new(ControlFlags::new());

        let monitor = Monitor::start_with_control(
            dir.path(),
            ChecksumEngine::with_chunk_size(32),
            Reporter::new(),
            MonitorSettings::new(LONG),
            Arc::clone(&control),
        )
        .unwrap();

        assert!(Arc::ptr_eq(&control, &monitor.control()));
    }

    #[test]
    fn test_terminate_raised_before_build_skips_first_cycle() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let sink = MemorySink::new();
        let control = Arc::new(ControlFlags::new());

        // As if SIGTERM arrived while the catalog was being built
        control.request_terminate();
        let monitor = Monitor::start_with_control(
            dir.path(),
            ChecksumEngine::with_chunk_size(32),
            Reporter::new().with_sink(sink.clone()),
            MonitorSettings::new(LONG),
            control,
        )
        .unwrap();
        let snapshot = monitor.run().unwrap();

        assert_eq!(snapshot.cycles, 0);
        assert_eq!(sink.count(|e| matches!(e, ReportEvent::Baseline { .. })), 1);
        assert_eq!(sink.count(|e| *e == ReportEvent::AllClear), 0);
    }

    #[test]
    fn test_force_raised_before_build_runs_one_forced_cycle() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let control = Arc::new(ControlFlags::new());

        control.request_force_cycle();
        let monitor = Monitor::start_with_control(
            dir.path(),
            ChecksumEngine::with_chunk_size(32),
            Reporter::new(),
            MonitorSettings::new(LONG),
            Arc::clone(&control),
        )
        .unwrap();
        let metrics = monitor.metrics();

        let handle = thread::spawn(move || monitor.run());
        wait_for(|| metrics.cycles() == 1);
        control.request_terminate();
        let snapshot = handle.join().unwrap().unwrap();

        assert_eq!(snapshot.cycles, 1);
        assert_eq!(snapshot.forced_cycles, 1);
    }

    #[test]
    fn test_deadline_after_adds_wait() {
        let now = Instant::now();
        assert_eq!(deadline_after(now, LONG), now + LONG);
        assert_eq!(deadline_after(now, Duration::ZERO), now);
    }

    #[test]
    fn test_deadline_after_saturates_on_overflow() {
        let now = Instant::now();

        let deadline = deadline_after(now, Duration::MAX);
        assert!(deadline >= now);

        let deadline = deadline_after(now, Duration::from_secs(u64::MAX));
        assert!(deadline >= now);
    }

    #[test]
    fn test_next_deadline_is_cycle_start_plus_interval() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let (mut monitor, _sink) = start(&dir, LONG);

        let deadline = monitor.cycle(false).unwrap();

        let started = monitor.schedule.last_cycle_started().unwrap();
        assert_eq!(deadline, started + LONG);
    }

    #[test]
    fn test_unbounded_interval_runs_first_cycle_and_terminates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        let (monitor, sink) = start(&dir, Duration::from_secs(u64::MAX));
        let control = monitor.control();
        let metrics = monitor.metrics();

        let handle = thread::spawn(move || monitor.run());
        wait_for(|| metrics.cycles() == 1);
        control.request_terminate();
        let snapshot = handle.join().unwrap().unwrap();

        assert_eq!(snapshot.cycles, 1);
        assert_eq!(sink.count(|e| *e == ReportEvent::AllClear), 1);
    }
}
