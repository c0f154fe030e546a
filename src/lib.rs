//! crcwatch - CRC32 integrity monitor for a directory of files
//!
//! Builds a fixed catalog of the regular files in one directory, records a
//! CRC32 baseline for each, then re-verifies every file on a fixed,
//! drift-corrected interval and reports the ones whose contents changed.

pub mod catalog;
pub mod checksum;
pub mod cli;
pub mod errors;
pub mod monitor;
pub mod observability;
pub mod report;
