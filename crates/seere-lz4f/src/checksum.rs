//! xxHash32 checksums for frame headers, blocks, and streams.
//!
//! The frame format uses xxHash32 with seed 0 everywhere: one-shot for
//! the header-check byte and per-block trailers, incrementally for the
//! stream checksum that covers the uncompressed payload in input order.

use xxhash_rust::xxh32::{xxh32, Xxh32};

/// Seed for every checksum in the frame format.
pub const CHECKSUM_SEED: u32 = 0;

/// Compute the one-shot xxHash32 of `data`.
pub fn xxh32_digest(data: &[u8]) -> u32 {
    xxh32(data, CHECKSUM_SEED)
}

/// Extract the header-check byte from an xxHash32 value (bits 8..15).
#[inline]
pub fn header_check_byte(hash: u32) -> u8 {
    ((hash >> 8) & 0xFF) as u8
}

/// Incremental xxHash32 state for the stream checksum.
///
/// `digest` is a peek: it can be called repeatedly and the state stays
/// usable for further updates.
#[derive(Clone)]
pub struct StreamHasher {
    state: Xxh32,
}

impl StreamHasher {
    /// Create a hasher with the frame-format seed.
    pub fn new() -> Self {
        Self {
            state: Xxh32::new(CHECKSUM_SEED),
        }
    }

    /// Fold `data` into the running hash.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Current digest of everything folded so far.
    pub fn digest(&self) -> u32 {
        self.state.digest()
    }
}

impl Default for StreamHasher {
    fn default() -> Self {
        Self::new()
    }
}
