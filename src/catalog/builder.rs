//! One-shot catalog construction

use std::fs::{self, File};
use std::path::Path;

use super::entry::TrackedFile;
use super::Catalog;
use crate::checksum::{format_checksum, ChecksumAlgorithm, ChecksumEngine};
use crate::errors::{IntegrityError, IntegrityResult};
use crate::observability::{Event, Logger, ObservationScope};

/// Platform path-length limit in bytes, terminating NUL included.
#[cfg(windows)]
pub const MAX_PATH_LEN: usize = 260;

/// Platform path-length limit in bytes, terminating NUL included.
#[cfg(not(windows))]
pub const MAX_PATH_LEN: usize = 4096;

impl<O: Copy + std::fmt::UpperHex> Catalog<O> {
    /// Builds the catalog for `directory` under the platform path limit.
    ///
    /// # Errors
    ///
    /// - `CRCW_DIRECTORY_UNAVAILABLE` if the directory cannot be listed
    /// - `CRCW_PATH_TOO_LONG` if any joined path exceeds [`MAX_PATH_LEN`]
    /// - `CRCW_CANNOT_OPEN` if any regular file cannot be opened
    /// - `CRCW_UNREADABLE` if any baseline checksum fails
    pub fn build<A>(directory: &Path, engine: &mut ChecksumEngine<A>) -> IntegrityResult<Self>
    where
        A: ChecksumAlgorithm<Output = O>,
    {
        Self::build_with_path_limit(directory, MAX_PATH_LEN, engine)
    }

    /// Builds the catalog with an explicit path-length limit.
    pub fn build_with_path_limit<A>(
        directory: &Path,
        path_limit: usize,
        engine: &mut ChecksumEngine<A>,
    ) -> IntegrityResult<Self>
    where
        A: ChecksumAlgorithm<Output = O>,
    {
        let folder = directory.display().to_string();
        let scope = ObservationScope::with_fields("CATALOG_BUILD", &[("folder", &folder)]);

        match Self::collect(directory, path_limit, engine) {
            Ok(catalog) => {
                let files = catalog.len().to_string();
                let bytes = catalog.baseline_bytes.to_string();
                scope.complete_with_fields(&[("files", &files), ("bytes", &bytes)]);
                Ok(catalog)
            }
            Err(e) => {
                scope.fail_fatal(&e.to_string());
                Err(e)
            }
        }
    }

    fn collect<A>(
        directory: &Path,
        path_limit: usize,
        engine: &mut ChecksumEngine<A>,
    ) -> IntegrityResult<Self>
    where
        A: ChecksumAlgorithm<Output = O>,
    {
        let listing = fs::read_dir(directory)
            .map_err(|e| IntegrityError::directory_unavailable(directory, e))?;

        let mut entries = Vec::new();
        let mut baseline_bytes = 0u64;

        for dir_entry in listing {
            let dir_entry =
                dir_entry.map_err(|e| IntegrityError::directory_unavailable(directory, e))?;

            // file_type() does not follow symlinks
            let file_type = dir_entry
                .file_type()
                .map_err(|e| IntegrityError::directory_unavailable(directory, e))?;
            if !file_type.is_file() {
                continue;
            }

            let path = directory.join(dir_entry.file_name());
            check_path_length(&path, path_limit)?;

            let mut handle = File::open(&path).map_err(|e| IntegrityError::cannot_open(&path, e))?;
            let (checksum, bytes) = engine
                .compute_counted(&mut handle)
                .map_err(|e| e.at_path(&path))?;

            Logger::trace(
                Event::FileDiscovered.as_str(),
                &[
                    ("checksum", &format_checksum(checksum)),
                    ("path", &path.display().to_string()),
                ],
            );

            baseline_bytes += bytes;
            entries.push(TrackedFile::new(path, handle, checksum));
        }

        Ok(Catalog {
            directory: directory.to_path_buf(),
            entries,
            baseline_bytes,
        })
    }
}

fn check_path_length(path: &Path, limit: usize) -> IntegrityResult<()> {
    let length = path_byte_len(path) + 1;
    if length > limit {
        return Err(IntegrityError::path_too_long(path, length, limit));
    }
    Ok(())
}

#[cfg(unix)]
fn path_byte_len(path: &Path) -> usize {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().len()
}

#[cfg(not(unix))]
fn path_byte_len(path: &Path) -> usize {
    path.as_os_str().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IntegrityErrorCode;
    use std::fs;
    use tempfile::TempDir;

    fn engine() -> ChecksumEngine {
        ChecksumEngine::with_chunk_size(64)
    }

    #[test]
    fn test_build_captures_baselines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.conf"), b"alpha").unwrap();
        fs::write(dir.path().join("b.conf"), b"beta").unwrap();

        let catalog = Catalog::build(dir.path(), &mut engine()).unwrap();

        assert_eq!(catalog.len(), 2);
        let a = catalog.get(&dir.path().join("a.conf")).unwrap();
        assert_eq!(a.baseline(), crc32fast::hash(b"alpha"));
        let b = catalog.get(&dir.path().join("b.conf")).unwrap();
        assert_eq!(b.baseline(), crc32fast::hash(b"beta"));
        assert_eq!(catalog.baseline_bytes(), 9);
    }

    #[test]
    fn test_build_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("inner.conf"), b"x").unwrap();
        fs::write(dir.path().join("top.conf"), b"y").unwrap();

        let catalog = Catalog::build(dir.path(), &mut engine()).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.iter().next().unwrap().path(), dir.path().join("top.conf"));
    }

    #[cfg(unix)]
    #[test]
    fn test_build_skips_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("real.conf"), b"real").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.conf"), dir.path().join("link.conf"))
            .unwrap();

        let catalog = Catalog::build(dir.path(), &mut engine()).unwrap();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(&dir.path().join("link.conf")).is_none());
    }

    #[test]
    fn test_empty_directory_builds_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::build(dir.path(), &mut engine()).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = Catalog::build(&dir.path().join("absent"), &mut engine()).unwrap_err();
        assert_eq!(err.code(), IntegrityErrorCode::DirectoryUnavailable);
    }

    #[test]
    fn test_path_limit_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("short"), b"s").unwrap();
        let name = "n".repeat(100);
        fs::write(dir.path().join(&name), b"l").unwrap();

        // Room for "<dir>/short\0" but not for the long name
        let limit = dir.path().join("short").as_os_str().len() + 1 + 10;
        let err = Catalog::build_with_path_limit(dir.path(), limit, &mut engine()).unwrap_err();

        assert_eq!(err.code(), IntegrityErrorCode::PathTooLong);
        assert_eq!(err.path(), Some(dir.path().join(&name).as_path()));
    }

    #[test]
    fn test_exact_limit_is_accepted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f"), b"data").unwrap();

        let limit = dir.path().join("f").as_os_str().len() + 1;
        let catalog = Catalog::build_with_path_limit(dir.path(), limit, &mut engine()).unwrap();
        assert_eq!(catalog.len(), 1);

        let err =
            Catalog::build_with_path_limit(dir.path(), limit - 1, &mut engine()).unwrap_err();
        assert_eq!(err.code(), IntegrityErrorCode::PathTooLong);
    }

    #[test]
    fn test_order_is_stable() {
        let dir = TempDir::new().unwrap();
        for i in 0..8 {
            fs::write(dir.path().join(format!("f{}", i)), format!("{}", i)).unwrap();
        }

        let catalog = Catalog::build(dir.path(), &mut engine()).unwrap();
        let first: Vec<_> = catalog.iter().map(|e| e.path().to_path_buf()).collect();
        let second: Vec<_> = (&catalog).into_iter().map(|e| e.path().to_path_buf()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
    }
}
