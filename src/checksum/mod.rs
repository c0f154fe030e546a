//! Checksum engine for monitored files
//!
//! Streams a file's bytes through a fixed-size scratch buffer and folds them
//! into a running accumulator using a pluggable algorithm.
//!
//! # Contract
//!
//! - The handle is rewound to the start before every computation
//! - Reads are bounded by the engine's chunk size (1 MiB by default)
//! - A zero-length read terminates the loop (end of file)
//! - A failed read is `CRCW_UNREADABLE`, never a short checksum
//! - The result does not depend on the chunk size
//!
//! Uses CRC32 (IEEE polynomial) via crc32fast by default.

mod algorithm;
mod engine;

pub use algorithm::{ChecksumAlgorithm, Crc32};
pub use engine::{format_checksum, ChecksumEngine, DEFAULT_CHUNK_SIZE};
