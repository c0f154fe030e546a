//! A single monitored file

use std::fs::File;
use std::path::{Path, PathBuf};

/// One monitored regular file.
///
/// The read handle is opened once and held until the catalog is dropped,
/// so the path is never re-resolved. A file replaced in place is read
/// correctly; a file deleted and recreated under the same name keeps
/// being read through the original inode.
#[derive(Debug)]
pub struct TrackedFile<O> {
    path: PathBuf,
    handle: File,
    baseline: O,
}

impl<O: Copy> TrackedFile<O> {
    pub(crate) fn new(path: PathBuf, handle: File, baseline: O) -> Self {
        Self {
            path,
            handle,
            baseline,
        }
    }

    /// Path fixed at catalog-build time
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checksum the next cycle compares against
    pub fn baseline(&self) -> O {
        self.baseline
    }

    pub(crate) fn handle_mut(&mut self) -> &mut File {
        &mut self.handle
    }

    pub(crate) fn set_baseline(&mut self, checksum: O) {
        self.baseline = checksum;
    }
}
