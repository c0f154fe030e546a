//! Checksum algorithm primitive
//!
//! The engine depends only on the `initial_value` / `update` / `finalize`
//! contract, so any polynomial checksum can be substituted.

use std::fmt;

use crc32fast::Hasher;

/// A streaming checksum algorithm.
///
/// `update` must be associative over concatenation: folding `a` then `b`
/// yields the same accumulator as folding `a ++ b`.
pub trait ChecksumAlgorithm {
    /// Running state between chunks
    type Accumulator: Copy;
    /// Finalized checksum value
    type Output: Copy + Eq + fmt::Debug + fmt::UpperHex + Send + 'static;

    /// Short algorithm name used in reports (e.g. `CRC32`)
    fn name(&self) -> &'static str;

    /// Seed value of the accumulator
    fn initial_value(&self) -> Self::Accumulator;

    /// Fold one chunk into the accumulator
    fn update(&self, accumulator: Self::Accumulator, buffer: &[u8]) -> Self::Accumulator;

    /// Apply the output transform
    fn finalize(&self, accumulator: Self::Accumulator) -> Self::Output;
}

/// CRC-32 with the IEEE reflected polynomial (0xEDB88320).
///
/// The accumulator is the raw shift register: seeded with `0xFFFFFFFF` and
/// finalized with an XOR of `0xFFFFFFFF`. The checksum of empty input is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32;

impl Crc32 {
    /// Register seed and final XOR mask
    pub const MASK: u32 = 0xFFFF_FFFF;
}

impl ChecksumAlgorithm for Crc32 {
    type Accumulator = u32;
    type Output = u32;

    fn name(&self) -> &'static str {
        "CRC32"
    }

    fn initial_value(&self) -> u32 {
        Self::MASK
    }

    fn update(&self, accumulator: u32, buffer: &[u8]) -> u32 {
        // crc32fast keeps its state in finalized form
        let mut hasher = Hasher::new_with_initial(accumulator ^ Self::MASK);
        hasher.update(buffer);
        hasher.finalize() ^ Self::MASK
    }

    fn finalize(&self, accumulator: u32) -> u32 {
        accumulator ^ Self::MASK
    }
}
