//! CLI argument definitions using clap
//!
//! Commands:
//! - crcwatch watch --folder <dir> --interval <secs>
//! - crcwatch scan --folder <dir>
//!
//! `--folder` and `--interval` fall back to `CHECK_FOLDER` and
//! `CHECK_FOLDER_TIME`. Anything left unset comes from `--config`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// crcwatch - CRC32 integrity monitor for a directory of files
#[derive(Parser, Debug)]
#[command(name = "crcwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the catalog, then verify it periodically until terminated
    Watch(WatchArgs),

    /// Build the catalog, print every baseline and exit
    Scan(ScanArgs),
}

/// Options for `watch`
#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Directory to monitor
    #[arg(short = 'f', long, env = "CHECK_FOLDER")]
    pub folder: Option<PathBuf>,

    /// Seconds between cycle starts
    #[arg(short = 't', long = "interval", env = "CHECK_FOLDER_TIME")]
    pub interval_secs: Option<u64>,

    /// Path to JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append JSON-lines reports to this file
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Read chunk size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Report unreadable files and keep going instead of stopping
    #[arg(long)]
    pub skip_unreadable: bool,

    /// Minimum log severity (trace, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Options for `scan`
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(short = 'f', long, env = "CHECK_FOLDER")]
    pub folder: Option<PathBuf>,

    /// Path to JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Read chunk size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
