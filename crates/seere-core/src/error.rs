//! Error types for frame codec operations.

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Frame codec error types.
///
/// Every variant is cheap to clone so the first error can be stored in a
/// shared cell and handed back to every caller that asks for it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The stream does not start with the LZ4 frame magic number.
    #[error("invalid magic number 0x{0:08x}")]
    InvalidMagicNumber(u32),

    /// The frame header is malformed or truncated.
    #[error("invalid frame header")]
    InvalidHeader,

    /// The frame descriptor carries an unknown version.
    #[error("invalid frame version {0}")]
    InvalidVersion(u8),

    /// The block-maximum-size field is outside the valid 4..=7 range.
    #[error("invalid block maximum size id {0}")]
    InvalidBlockMaximumSize(u8),

    /// The header-checksum byte does not match the descriptor bytes.
    #[error("header checksum mismatch: stored 0x{expected:02x}, computed 0x{actual:02x}")]
    InvalidHeaderChecksum { expected: u8, actual: u8 },

    /// The frame requests a preset dictionary.
    #[error("preset dictionary is not supported")]
    PresetDictionaryUnsupported,

    /// The frame requests dependent blocks.
    #[error("block dependence is not supported")]
    BlockDependenceUnsupported,

    /// The frame header could not be written to the sink.
    #[error("cannot write frame header")]
    CannotWriteHeader,

    /// The end-of-stream marker could not be written.
    #[error("cannot write end-of-stream marker")]
    CannotWriteEos,

    /// The trailing stream checksum could not be written.
    #[error("cannot write stream checksum")]
    CannotWriteStreamChecksum,

    /// A block-size field could not be read.
    #[error("cannot read block size")]
    CannotReadBlockSize,

    /// A block payload could not be read in full.
    #[error("cannot read block data")]
    CannotReadBlockData,

    /// A per-block checksum trailer could not be read.
    #[error("cannot read block checksum")]
    CannotReadBlockChecksum,

    /// The trailing stream checksum could not be read.
    #[error("cannot read stream checksum")]
    CannotReadStreamChecksum,

    /// The stream checksum does not cover the decoded payload.
    #[error("stream checksum mismatch: stored 0x{expected:08x}, computed 0x{actual:08x}")]
    StreamChecksumMismatch { expected: u32, actual: u32 },

    /// A block checksum does not cover the block payload.
    #[error("block checksum mismatch: stored 0x{expected:08x}, computed 0x{actual:08x}")]
    BlockChecksumMismatch { expected: u32, actual: u32 },

    /// The block decompressor reported failure.
    #[error("block decode failed: decompressor returned {0}")]
    BlockDecodeFailed(i32),

    /// A stream operation failed without a more specific code.
    #[error("stream operation failed")]
    Failed,
}

impl Error {
    /// Check whether the error reports an unsupported frame feature
    /// rather than corruption.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::PresetDictionaryUnsupported | Error::BlockDependenceUnsupported
        )
    }

    /// Get error category for diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidMagicNumber(_)
            | Error::InvalidHeader
            | Error::InvalidVersion(_)
            | Error::InvalidBlockMaximumSize(_)
            | Error::InvalidHeaderChecksum { .. } => "structural",
            Error::PresetDictionaryUnsupported | Error::BlockDependenceUnsupported => {
                "unsupported"
            }
            Error::CannotWriteHeader
            | Error::CannotWriteEos
            | Error::CannotWriteStreamChecksum
            | Error::CannotReadBlockSize
            | Error::CannotReadBlockData
            | Error::CannotReadBlockChecksum
            | Error::CannotReadStreamChecksum => "io",
            Error::StreamChecksumMismatch { .. }
            | Error::BlockChecksumMismatch { .. }
            | Error::BlockDecodeFailed(_) => "integrity",
            Error::Failed => "generic",
        }
    }
}
