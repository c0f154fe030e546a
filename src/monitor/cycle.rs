//! Verification cycle
//!
//! One pass over the catalog, in catalog order:
//! - Recompute each file's checksum on its held handle
//! - Record the path if it differs from the baseline
//! - Overwrite the baseline with the new value, changed or not
//!
//! A cycle therefore detects change since the previous cycle only. A file
//! modified once is reported once.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::checksum::{format_checksum, ChecksumAlgorithm, ChecksumEngine};
use crate::errors::IntegrityResult;
use crate::observability::{log_event_with_fields, Event, Timer};
use crate::report::{ReportEvent, Reporter};

/// What a cycle does when a previously readable file fails to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFailurePolicy {
    /// Abort the cycle and the monitor with `CRCW_UNREADABLE`
    #[default]
    FailFast,
    /// Report the file as unreadable, keep its baseline, continue
    SkipAndReport,
}

impl ReadFailurePolicy {
    /// Name as written in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadFailurePolicy::FailFast => "fail_fast",
            ReadFailurePolicy::SkipAndReport => "skip_and_report",
        }
    }
}

/// Outcome of one verification cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleResult {
    /// Paths whose checksum changed, in catalog order
    pub mismatches: Vec<PathBuf>,
    /// Paths skipped as unreadable, with the reason (skip-and-report only)
    pub unreadable: Vec<(PathBuf, String)>,
    /// Bytes folded during the cycle
    pub bytes_read: u64,
    /// Wall time spent in the cycle
    pub elapsed: Duration,
}

impl CycleResult {
    /// Number of changed files
    pub fn mismatch_count(&self) -> usize {
        self.mismatches.len()
    }

    /// True when nothing changed and nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && self.unreadable.is_empty()
    }

    /// Deliver the cycle's reports: `OK` when no file changed,
    /// otherwise one `FAIL` per changed path in catalog order.
    pub fn report(&self, reporter: &Reporter) {
        for (path, reason) in &self.unreadable {
            reporter.emit(&ReportEvent::Unreadable {
                path: path.clone(),
                reason: reason.clone(),
            });
        }

        if self.mismatches.is_empty() {
            reporter.emit(&ReportEvent::AllClear);
            return;
        }

        for path in &self.mismatches {
            reporter.emit(&ReportEvent::Changed { path: path.clone() });
        }
    }
}

/// Runs one verification cycle over `catalog`.
///
/// # Errors
///
/// Under `FailFast`, returns `CRCW_UNREADABLE` for the first file that
/// cannot be read. Baselines of files already verified in this cycle have
/// been updated; the rest are untouched.
pub fn run_cycle<A>(
    catalog: &mut Catalog<A::Output>,
    engine: &mut ChecksumEngine<A>,
    policy: ReadFailurePolicy,
) -> IntegrityResult<CycleResult>
where
    A: ChecksumAlgorithm,
{
    let timer = Timer::new();
    let mut result = CycleResult::default();

    for entry in catalog.entries_mut() {
        let (checksum, bytes) = match engine.compute_counted(entry.handle_mut()) {
            Ok(computed) => computed,
            Err(e) => {
                let e = e.at_path(entry.path());
                match policy {
                    ReadFailurePolicy::FailFast => return Err(e),
                    ReadFailurePolicy::SkipAndReport => {
                        let path = entry.path().display().to_string();
                        let reason = e.to_string();
                        log_event_with_fields(
                            Event::FileUnreadable,
                            &[("path", &path), ("reason", &reason)],
                        );
                        result.unreadable.push((entry.path().to_path_buf(), reason));
                        continue;
                    }
                }
            }
        };

        result.bytes_read += bytes;

        if checksum != entry.baseline() {
            let path = entry.path().display().to_string();
            log_event_with_fields(
                Event::FileChanged,
                &[
                    ("new", &format_checksum(checksum)),
                    ("old", &format_checksum(entry.baseline())),
                    ("path", &path),
                ],
            );
            result.mismatches.push(entry.path().to_path_buf());
        }

        entry.set_baseline(checksum);
    }

    result.elapsed = timer.elapsed();
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use std::fs;
    use tempfile::TempDir;

    fn catalog_with(files: &[(&str, &[u8])]) -> (TempDir, Catalog, ChecksumEngine) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let mut engine = ChecksumEngine::with_chunk_size(16);
        let catalog = Catalog::build(dir.path(), &mut engine).unwrap();
        (dir, catalog, engine)
    }

    #[test]
    fn test_unchanged_catalog_is_clean() {
        let (_dir, mut catalog, mut engine) =
            catalog_with(&[("a", b"alpha"), ("b", b"beta")]);

        let result = run_cycle(&mut catalog, &mut engine, ReadFailurePolicy::FailFast).unwrap();

        assert!(result.is_clean());
        assert_eq!(result.mismatch_count(), 0);
        assert_eq!(result.bytes_read, 9);
    }

    #[test]
    fn test_change_is_reported_once_and_baseline_updated() {
        let (dir, mut catalog, mut engine) = catalog_with(&[("a", b"alpha"), ("b", b"beta")]);
        let a = dir.path().join("a");

        fs::write(&a, b"ALPHA").unwrap();

        let first = run_cycle(&mut catalog, &mut engine, ReadFailurePolicy::FailFast).unwrap();
        assert_eq!(first.mismatches, vec![a.clone()]);
        assert_eq!(catalog.get(&a).unwrap().baseline(), crc32fast::hash(b"ALPHA"));

        let second = run_cycle(&mut catalog, &mut engine, ReadFailurePolicy::FailFast).unwrap();
        assert!(second.mismatches.is_empty());
    }

    #[test]
    fn test_mismatches_follow_catalog_order() {
        let (dir, mut catalog, mut engine) =
            catalog_with(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);
        for name in ["a", "b", "c"] {
            fs::write(dir.path().join(name), b"changed").unwrap();
        }

        let expected: Vec<PathBuf> = catalog.iter().map(|e| e.path().to_path_buf()).collect();
        let result = run_cycle(&mut catalog, &mut engine, ReadFailurePolicy::FailFast).unwrap();
        assert_eq!(result.mismatches, expected);
    }

    #[test]
    fn test_report_all_clear() {
        let sink = MemorySink::new();
        let reporter = Reporter::new().with_sink(sink.clone());

        CycleResult::default().report(&reporter);

        assert_eq!(sink.events(), vec![ReportEvent::AllClear]);
    }

    #[test]
    fn test_report_changes_without_all_clear() {
        let sink = MemorySink::new();
        let reporter = Reporter::new().with_sink(sink.clone());
        let result = CycleResult {
            mismatches: vec![PathBuf::from("/w/a"), PathBuf::from("/w/b")],
            ..CycleResult::default()
        };

        result.report(&reporter);

        assert_eq!(
            sink.events(),
            vec![
                ReportEvent::Changed {
                    path: PathBuf::from("/w/a")
                },
                ReportEvent::Changed {
                    path: PathBuf::from("/w/b")
                },
            ]
        );
    }

    #[test]
    fn test_report_unreadable_before_outcome() {
        let sink = MemorySink::new();
        let reporter = Reporter::new().with_sink(sink.clone());
        let result = CycleResult {
            unreadable: vec![(PathBuf::from("/w/gone"), "I/O error".to_string())],
            ..CycleResult::default()
        };

        result.report(&reporter);

        assert!(!result.is_clean());
        assert_eq!(
            sink.events(),
            vec![
                ReportEvent::Unreadable {
                    path: PathBuf::from("/w/gone"),
                    reason: "I/O error".to_string(),
                },
                ReportEvent::AllClear,
            ]
        );
    }

    #[test]
    fn test_policy_serde_names() {
        let policy: ReadFailurePolicy = serde_json::from_str("\"skip_and_report\"").unwrap();
        assert_eq!(policy, ReadFailurePolicy::SkipAndReport);
        assert_eq!(ReadFailurePolicy::default(), ReadFailurePolicy::FailFast);
    }
}
