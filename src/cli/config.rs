//! Configuration file and resolution
//!
//! Sources, highest precedence first:
//! 1. command-line flags
//! 2. environment (`CHECK_FOLDER`, `CHECK_FOLDER_TIME`, through clap)
//! 3. the JSON file given with `--config`
//! 4. built-in defaults
//!
//! Resolution validates the merged result; nothing is started with an
//! invalid configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::args::{ScanArgs, WatchArgs};
use crate::checksum::DEFAULT_CHUNK_SIZE;
use crate::monitor::ReadFailurePolicy;
use crate::observability::Severity;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No folder given: use --folder, CHECK_FOLDER or \"folder\" in the config file")]
    MissingFolder,

    #[error("No interval given: use --interval, CHECK_FOLDER_TIME or \"interval_secs\" in the config file")]
    MissingInterval,

    #[error("interval_secs must be > 0")]
    ZeroInterval,

    #[error("chunk_size must be > 0")]
    ZeroChunkSize,

    #[error("Invalid log_level: {0}")]
    InvalidLogLevel(String),
}

/// Configuration file structure
///
/// ```json
/// {
///   "folder": "/etc/myapp",
///   "interval_secs": 60,
///   "chunk_size": 1048576,
///   "journal": "/var/log/crcwatch.jsonl",
///   "read_failure_policy": "fail_fast",
///   "log_level": "info"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Directory to monitor
    #[serde(default)]
    pub folder: Option<PathBuf>,

    /// Seconds between cycle starts
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Read chunk size in bytes (default 1 MiB)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Optional JSON-lines journal
    #[serde(default)]
    pub journal: Option<PathBuf>,

    /// Mid-cycle read failure handling (default fail_fast)
    #[serde(default)]
    pub read_failure_policy: ReadFailurePolicy,

    /// Minimum log severity (default info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            folder: None,
            interval_secs: None,
            chunk_size: default_chunk_size(),
            journal: None,
            read_failure_policy: ReadFailurePolicy::default(),
            log_level: default_log_level(),
        }
    }
}

/// Fully resolved settings for `watch`
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    pub folder: PathBuf,
    pub interval: Duration,
    pub chunk_size: usize,
    pub journal: Option<PathBuf>,
    pub policy: ReadFailurePolicy,
    pub log_level: Severity,
}

/// Fully resolved settings for `scan`
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub folder: PathBuf,
    pub chunk_size: usize,
}

impl MonitorConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// File named by `config`, or defaults when none is given
    pub fn load_optional(config: Option<&Path>) -> Result<Self, ConfigError> {
        match config {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Overlay `watch` flags onto file values
    pub fn merge_watch(mut self, args: &WatchArgs) -> Self {
        if let Some(ref folder) = args.folder {
            self.folder = Some(folder.clone());
        }
        if let Some(secs) = args.interval_secs {
            self.interval_secs = Some(secs);
        }
        if let Some(size) = args.chunk_size {
            self.chunk_size = size;
        }
        if let Some(ref journal) = args.journal {
            self.journal = Some(journal.clone());
        }
        if args.skip_unreadable {
            self.read_failure_policy = ReadFailurePolicy::SkipAndReport;
        }
        if let Some(ref level) = args.log_level {
            self.log_level = level.clone();
        }
        self
    }

    /// Overlay `scan` flags onto file values
    pub fn merge_scan(mut self, args: &ScanArgs) -> Self {
        if let Some(ref folder) = args.folder {
            self.folder = Some(folder.clone());
        }
        if let Some(size) = args.chunk_size {
            self.chunk_size = size;
        }
        self
    }

    /// Validate and resolve for `watch`
    pub fn resolve_watch(self) -> Result<WatchConfig, ConfigError> {
        let folder = self.resolved_folder()?;
        let secs = self.interval_secs.ok_or(ConfigError::MissingInterval)?;
        if secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        let log_level = self
            .log_level
            .parse::<Severity>()
            .map_err(ConfigError::InvalidLogLevel)?;

        Ok(WatchConfig {
            folder,
            interval: Duration::from_secs(secs),
            chunk_size: self.chunk_size,
            journal: self.journal,
            policy: self.read_failure_policy,
            log_level,
        })
    }

    /// Validate and resolve for `scan`
    pub fn resolve_scan(self) -> Result<ScanConfig, ConfigError> {
        let folder = self.resolved_folder()?;
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(ScanConfig {
            folder,
            chunk_size: self.chunk_size,
        })
    }

    fn resolved_folder(&self) -> Result<PathBuf, ConfigError> {
        match self.folder {
            Some(ref folder) if !folder.as_os_str().is_empty() => Ok(folder.clone()),
            _ => Err(ConfigError::MissingFolder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn watch_args(folder: &str, secs: u64) -> WatchArgs {
        WatchArgs {
            folder: Some(PathBuf::from(folder)),
            interval_secs: Some(secs),
            ..WatchArgs::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.read_failure_policy, ReadFailurePolicy::FailFast);
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crcwatch.json");
        fs::write(
            &path,
            r#"{"folder": "/srv", "interval_secs": 5, "read_failure_policy": "skip_and_report"}"#,
        )
        .unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        let resolved = config.resolve_watch().unwrap();

        assert_eq!(resolved.folder, PathBuf::from("/srv"));
        assert_eq!(resolved.interval, Duration::from_secs(5));
        assert_eq!(resolved.policy, ReadFailurePolicy::SkipAndReport);
        assert_eq!(resolved.log_level, Severity::Info);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = MonitorConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ folder: ").unwrap();
        assert!(matches!(
            MonitorConfig::load(&path).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_flags_override_file() {
        let file = MonitorConfig {
            folder: Some(PathBuf::from("/from/file")),
            interval_secs: Some(60),
            chunk_size: 512,
            ..MonitorConfig::default()
        };

        let args = WatchArgs {
            chunk_size: Some(64),
            skip_unreadable: true,
            ..watch_args("/from/flag", 7)
        };
        let resolved = file.merge_watch(&args).resolve_watch().unwrap();

        assert_eq!(resolved.folder, PathBuf::from("/from/flag"));
        assert_eq!(resolved.interval, Duration::from_secs(7));
        assert_eq!(resolved.chunk_size, 64);
        assert_eq!(resolved.policy, ReadFailurePolicy::SkipAndReport);
    }

    #[test]
    fn test_file_fills_unset_flags() {
        let file = MonitorConfig {
            interval_secs: Some(60),
            journal: Some(PathBuf::from("/var/log/j.jsonl")),
            ..MonitorConfig::default()
        };
        let args = WatchArgs {
            folder: Some(PathBuf::from("/srv")),
            ..WatchArgs::default()
        };

        let resolved = file.merge_watch(&args).resolve_watch().unwrap();
        assert_eq!(resolved.interval, Duration::from_secs(60));
        assert_eq!(resolved.journal, Some(PathBuf::from("/var/log/j.jsonl")));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = MonitorConfig::default()
            .merge_watch(&watch_args("/srv", 0))
            .resolve_watch()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroInterval));
    }

    #[test]
    fn test_missing_values_rejected() {
        let err = MonitorConfig::default().resolve_watch().unwrap_err();
        assert!(matches!(err, ConfigError::MissingFolder));

        let args = WatchArgs {
            folder: Some(PathBuf::from("/srv")),
            ..WatchArgs::default()
        };
        let err = MonitorConfig::default()
            .merge_watch(&args)
            .resolve_watch()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingInterval));
    }

    #[test]
    fn test_empty_folder_rejected() {
        let err = MonitorConfig::default()
            .merge_watch(&watch_args("", 5))
            .resolve_watch()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFolder));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let args = ScanArgs {
            folder: Some(PathBuf::from("/srv")),
            chunk_size: Some(0),
            ..ScanArgs::default()
        };
        let err = MonitorConfig::default()
            .merge_scan(&args)
            .resolve_scan()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroChunkSize));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let args = WatchArgs {
            log_level: Some("loud".to_string()),
            ..watch_args("/srv", 5)
        };
        let err = MonitorConfig::default()
            .merge_watch(&args)
            .resolve_watch()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }
}
