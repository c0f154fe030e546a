//! CLI module for crcwatch
//!
//! Provides command-line interface for:
//! - watch: build the catalog and verify it periodically
//! - scan: build the catalog, print baselines, exit

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command, ScanArgs, WatchArgs};
pub use commands::{run, run_command, scan, watch};
pub use config::{ConfigError, MonitorConfig, ScanConfig, WatchConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
