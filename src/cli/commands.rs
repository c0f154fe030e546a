//! CLI command implementations
//!
//! `watch` startup sequence:
//! 1. Configuration load and validation
//! 2. Report sinks (stdout, optional journal)
//! 3. Signal listener
//! 4. Catalog build and baseline report
//! 5. Monitor loop until terminated
//!
//! A failure in steps 1-4 exits before any cycle runs. Signals that arrive
//! during the catalog build are held in the control flags.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::checksum::ChecksumEngine;
use crate::monitor::{
    install_fault_hook, spawn_signal_listener, ControlFlags, Monitor, MonitorSettings,
};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::report::{ConsoleSink, JournalSink, ReportEvent, Reporter};

use super::args::{Command, ScanArgs, WatchArgs};
use super::config::{MonitorConfig, WatchConfig};
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    install_fault_hook();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Watch(args) => watch(&args),
        Command::Scan(args) => scan(&args),
    }
}

/// Monitor a directory until SIGTERM/SIGINT
pub fn watch(args: &WatchArgs) -> CliResult<()> {
    let config = MonitorConfig::load_optional(args.config.as_deref())?
        .merge_watch(args)
        .resolve_watch()?;

    Logger::set_min_severity(config.log_level);
    log_config(&config);

    let reporter = build_reporter(&config)?;
    let settings = MonitorSettings::new(config.interval).with_policy(config.policy);
    let engine = ChecksumEngine::with_chunk_size(config.chunk_size);

    let control = Arc::new(ControlFlags::new());
    if let Err(e) = spawn_signal_listener(Arc::clone(&control)) {
        let reason = e.to_string();
        log_event_with_fields(Event::SignalListenerFailed, &[("reason", &reason)]);
        reporter.close();
        return Err(CliError::io_error(format!(
            "Failed to install signal handlers: {}",
            reason
        )));
    }

    let monitor = Monitor::start_with_control(&config.folder, engine, reporter, settings, control)?;
    monitor.run()?;
    Ok(())
}

/// Build the catalog, print each baseline and exit
pub fn scan(args: &ScanArgs) -> CliResult<()> {
    let config = MonitorConfig::load_optional(args.config.as_deref())?
        .merge_scan(args)
        .resolve_scan()?;

    let reporter = Reporter::new().with_sink(ConsoleSink::stdout());
    let mut engine = ChecksumEngine::with_chunk_size(config.chunk_size);

    let catalog = match Catalog::build(&config.folder, &mut engine) {
        Ok(catalog) => catalog,
        Err(e) => {
            reporter.emit(&ReportEvent::Fatal {
                reason: e.report_reason(),
            });
            return Err(e.into());
        }
    };

    catalog.report_baselines(engine.algorithm(), &reporter);
    reporter.close();
    catalog.close();
    Ok(())
}

fn build_reporter(config: &WatchConfig) -> CliResult<Reporter> {
    let reporter = Reporter::new().with_sink(ConsoleSink::stdout());

    let Some(ref path) = config.journal else {
        return Ok(reporter);
    };

    let journal = JournalSink::open(path).map_err(|e| {
        CliError::io_error(format!("Failed to open journal {}: {}", path.display(), e))
    })?;
    Ok(reporter.with_sink(journal))
}

fn log_config(config: &WatchConfig) {
    let folder = config.folder.display().to_string();
    let interval = config.interval.as_secs().to_string();
    let chunk_size = config.chunk_size.to_string();
    let journal = config
        .journal
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string());

    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("chunk_size", &chunk_size),
            ("folder", &folder),
            ("interval_secs", &interval),
            ("journal", &journal),
            ("read_failure_policy", config.policy.as_str()),
        ],
    );
}
