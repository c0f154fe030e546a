//! File catalog
//!
//! The fixed set of monitored files, built once at startup:
//! - Regular files only (symlinks, directories, devices excluded)
//! - Exactly one entry per file, no rescans
//! - One open handle per entry for the catalog's lifetime
//! - Order is the directory listing order, stable thereafter
//!
//! Any failure while building is fatal; a partial catalog is never returned.

mod builder;
mod entry;

pub use builder::MAX_PATH_LEN;
pub use entry::TrackedFile;

use std::path::{Path, PathBuf};
use std::slice;

use crate::checksum::{format_checksum, ChecksumAlgorithm};
use crate::observability::{log_event_with_fields, Event};
use crate::report::{ReportEvent, Reporter};

/// Ordered, fixed-length collection of tracked files.
#[derive(Debug)]
pub struct Catalog<O = u32> {
    directory: PathBuf,
    entries: Vec<TrackedFile<O>>,
    baseline_bytes: u64,
}

impl<O: Copy + std::fmt::UpperHex> Catalog<O> {
    /// Directory the catalog was built from
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of tracked files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no regular files were found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in catalog order
    pub fn iter(&self) -> slice::Iter<'_, TrackedFile<O>> {
        self.entries.iter()
    }

    /// Bytes hashed while capturing baselines
    pub fn baseline_bytes(&self) -> u64 {
        self.baseline_bytes
    }

    /// Look up an entry by path
    pub fn get(&self, path: &Path) -> Option<&TrackedFile<O>> {
        self.entries.iter().find(|e| e.path() == path)
    }

    pub(crate) fn entries_mut(&mut self) -> slice::IterMut<'_, TrackedFile<O>> {
        self.entries.iter_mut()
    }

    /// Emit one baseline report per file, in catalog order
    pub fn report_baselines<A>(&self, algorithm: &A, reporter: &Reporter)
    where
        A: ChecksumAlgorithm<Output = O>,
    {
        for entry in &self.entries {
            reporter.emit(&ReportEvent::Baseline {
                path: entry.path().to_path_buf(),
                algorithm: algorithm.name(),
                checksum: format_checksum(entry.baseline()),
            });
        }
    }

    /// Release every handle. Dropping the catalog does the same silently.
    pub fn close(self) {
        let count = self.entries.len().to_string();
        let folder = self.directory.display().to_string();
        drop(self.entries);
        log_event_with_fields(Event::CatalogReleased, &[("files", &count), ("folder", &folder)]);
    }
}

impl<'a, O> IntoIterator for &'a Catalog<O> {
    type Item = &'a TrackedFile<O>;
    type IntoIter = slice::Iter<'a, TrackedFile<O>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
