//! Integrity report events

use std::fmt;
use std::path::PathBuf;

/// One reportable integrity event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// Initial checksum captured while building the catalog
    Baseline {
        path: PathBuf,
        algorithm: &'static str,
        checksum: String,
    },
    /// A cycle found no changed files
    AllClear,
    /// A file's checksum differs from its previous baseline
    Changed { path: PathBuf },
    /// A file could not be read during a cycle (skip-and-report only)
    Unreadable { path: PathBuf, reason: String },
    /// The monitor hit an unrecoverable condition
    Fatal { reason: String },
}

impl ReportEvent {
    /// Event name used by structured sinks
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportEvent::Baseline { .. } => "BASELINE",
            ReportEvent::AllClear => "OK",
            ReportEvent::Changed { .. } => "FAIL",
            ReportEvent::Unreadable { .. } => "UNREADABLE",
            ReportEvent::Fatal { .. } => "FATAL",
        }
    }

    /// Human-readable report line
    pub fn human_line(&self) -> String {
        match self {
            ReportEvent::Baseline {
                path,
                algorithm,
                checksum,
            } => format!("{} {} {}", algorithm, checksum, path.display()),
            ReportEvent::AllClear => "OK".to_string(),
            ReportEvent::Changed { path } => format!("FAIL {}", path.display()),
            ReportEvent::Unreadable { path, reason } => {
                format!("UNREADABLE {}: {}", path.display(), reason)
            }
            ReportEvent::Fatal { reason } => format!("FATAL {}", reason),
        }
    }

    /// Whether this event signals a detected change
    pub fn is_change(&self) -> bool {
        matches!(self, ReportEvent::Changed { .. })
    }
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.human_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_lines() {
        let baseline = ReportEvent::Baseline {
            path: PathBuf::from("/etc/app/app.conf"),
            algorithm: "CRC32",
            checksum: "CBF43926".to_string(),
        };
        assert_eq!(baseline.human_line(), "CRC32 CBF43926 /etc/app/app.conf");
        assert_eq!(ReportEvent::AllClear.human_line(), "OK");
        assert_eq!(
            ReportEvent::Changed {
                path: PathBuf::from("/etc/app/app.conf")
            }
            .to_string(),
            "FAIL /etc/app/app.conf"
        );
    }

    #[test]
    fn test_only_changed_is_change() {
        assert!(ReportEvent::Changed {
            path: PathBuf::from("x")
        }
        .is_change());
        assert!(!ReportEvent::AllClear.is_change());
    }
}
