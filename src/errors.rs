//! Integrity error types
//!
//! Error codes:
//! - CRCW_UNREADABLE (FATAL) - checksum read failed on an open handle
//! - CRCW_CANNOT_OPEN (FATAL) - file could not be opened while building the catalog
//! - CRCW_PATH_TOO_LONG (FATAL) - joined path exceeds the platform limit
//! - CRCW_DIRECTORY_UNAVAILABLE (FATAL) - target directory cannot be listed
//!
//! Every kind is fatal during catalog construction. During verification
//! cycles `CRCW_UNREADABLE` stays fatal unless the monitor runs with
//! `ReadFailurePolicy::SkipAndReport`.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Severity levels for integrity errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Reported, monitoring continues
    Error,
    /// The monitor must terminate
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Integrity error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityErrorCode {
    /// Read failure on a previously opened handle
    Unreadable,
    /// File could not be opened at catalog-build time
    CannotOpen,
    /// Constructed path exceeds the platform path-length limit
    PathTooLong,
    /// Target directory cannot be listed
    DirectoryUnavailable,
}

impl IntegrityErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IntegrityErrorCode::Unreadable => "CRCW_UNREADABLE",
            IntegrityErrorCode::CannotOpen => "CRCW_CANNOT_OPEN",
            IntegrityErrorCode::PathTooLong => "CRCW_PATH_TOO_LONG",
            IntegrityErrorCode::DirectoryUnavailable => "CRCW_DIRECTORY_UNAVAILABLE",
        }
    }

    /// Returns the severity level for this error.
    ///
    /// All four kinds terminate the monitor when they surface as errors.
    /// A skip-and-report cycle never raises `Unreadable`; it records it.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for IntegrityErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Integrity error with the path involved and the underlying I/O cause
#[derive(Debug)]
pub struct IntegrityError {
    /// Error code
    code: IntegrityErrorCode,
    /// Human-readable message
    message: String,
    /// Path the error refers to, if any
    path: Option<PathBuf>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl IntegrityError {
    /// Checksum read failed mid-stream or the handle is unusable
    pub fn unreadable(path: Option<&Path>, source: io::Error) -> Self {
        Self {
            code: IntegrityErrorCode::Unreadable,
            message: "Failed to read file for checksum".to_string(),
            path: path.map(Path::to_path_buf),
            source: Some(source),
        }
    }

    /// File could not be opened for reading
    pub fn cannot_open(path: &Path, source: io::Error) -> Self {
        Self {
            code: IntegrityErrorCode::CannotOpen,
            message: "Can't open file".to_string(),
            path: Some(path.to_path_buf()),
            source: Some(source),
        }
    }

    /// Joined path is longer than the platform allows
    pub fn path_too_long(path: &Path, length: usize, limit: usize) -> Self {
        Self {
            code: IntegrityErrorCode::PathTooLong,
            message: format!(
                "The file path is too long: {} bytes, limit is {}",
                length, limit
            ),
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Directory could not be opened or listed
    pub fn directory_unavailable(path: &Path, source: io::Error) -> Self {
        Self {
            code: IntegrityErrorCode::DirectoryUnavailable,
            message: "Can't open folder".to_string(),
            path: Some(path.to_path_buf()),
            source: Some(source),
        }
    }

    /// Attaches a path to an error raised below the catalog layer
    pub fn at_path(mut self, path: &Path) -> Self {
        if self.path.is_none() {
            self.path = Some(path.to_path_buf());
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> IntegrityErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the path involved, if known
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns whether this error requires process termination
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// One-line reason for a `FATAL` report: code, message and path
    pub fn report_reason(&self) -> String {
        match self.path {
            Some(ref path) => format!(
                "{}: {} ({})",
                self.code.code(),
                self.message,
                path.display()
            ),
            None => format!("{}: {}", self.code.code(), self.message),
        }
    }
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref path) = self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for IntegrityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for integrity operations
pub type IntegrityResult<T> = Result<T, IntegrityError>;
