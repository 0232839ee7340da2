//! # Seere LZ4F
//!
//! Parallel streaming compression and decompression of the LZ4 frame
//! format.
//!
//! An LZ4 frame is a sequence of independently compressed blocks, which
//! makes it a natural fit for block-level parallelism: the pipelines
//! here compress (or decompress) blocks concurrently while keeping the
//! output byte-for-byte identical to a sequential codec - writes are
//! serialized per block index, and the stream checksum is folded in
//! input order.
//!
//! The raw LZ4 block codec is a seam: the context carries three plain
//! function hooks (bounded compress, worst-case bound, decompress),
//! defaulted to `lz4_flex`. I/O is a seam too - see
//! [`FrameSource`](seere_core::FrameSource) and
//! [`FrameSink`](seere_core::FrameSink).
//!
//! ## Example
//!
//! ```
//! use seere_lz4f::{compress_to_vec, decompress_to_vec, Mode, StreamDescriptor};
//!
//! let input = b"a tale of many blocks, told one frame at a time";
//! let sd = StreamDescriptor::new();
//!
//! let frame = compress_to_vec(input, &sd, Mode::Parallel)?;
//! let output = decompress_to_vec(&frame, Mode::Parallel)?;
//! assert_eq!(output, input);
//! # Ok::<(), seere_lz4f::Error>(())
//! ```

pub mod checksum;
pub mod compress;
pub mod context;
pub mod decompress;
pub mod descriptor;
pub mod header;

pub use seere_core::{Error, FrameSink, FrameSource, Result, SliceSource, VecSink};

pub use checksum::{StreamHasher, CHECKSUM_SEED};
pub use compress::compress_frame;
pub use context::{
    CodecContext, CompressBoundFn, CompressFn, DecompressFn, Mode,
};
pub use decompress::decompress_frames;
pub use descriptor::{BlockDescriptor, FrameFlags, StreamDescriptor};
pub use header::{read_frame_header, write_frame_header};

/// LZ4 frame magic number (little-endian on the wire).
pub const LZ4F_MAGIC: u32 = 0x184D2204;

/// Skippable frame magic range: 0x184D2A50 to 0x184D2A5F.
pub const SKIPPABLE_MAGIC_LOW: u32 = 0x184D2A50;
pub const SKIPPABLE_MAGIC_HIGH: u32 = 0x184D2A5F;

/// End-of-stream marker: a zero block-size field.
pub const EOS_MARKER: u32 = 0;

/// High bit of the block-size field: the payload is stored verbatim.
pub const INCOMPRESSIBLE_BIT: u32 = 1 << 31;

/// Largest possible header: magic + FLG + BD + stream size + dict id +
/// check byte.
pub const MAX_HEADER_SIZE: usize = 4 + 2 + 8 + 4 + 1;

/// Whether `magic` identifies a skippable frame.
pub fn is_skippable_magic(magic: u32) -> bool {
    (SKIPPABLE_MAGIC_LOW..=SKIPPABLE_MAGIC_HIGH).contains(&magic)
}

/// Compress `input` into a single in-memory frame.
pub fn compress_to_vec(input: &[u8], sd: &StreamDescriptor, mode: Mode) -> Result<Vec<u8>> {
    let ctx = CodecContext::new(SliceSource::new(input), VecSink::new()).with_mode(mode);
    compress_frame(&ctx, sd)?;
    let (_, sink) = ctx.into_parts();
    Ok(sink.into_inner())
}

/// Decompress every frame in `input` into one in-memory buffer.
pub fn decompress_to_vec(input: &[u8], mode: Mode) -> Result<Vec<u8>> {
    let ctx = CodecContext::new(SliceSource::new(input), VecSink::new()).with_mode(mode);
    decompress_frames(&ctx)?;
    let (_, sink) = ctx.into_parts();
    Ok(sink.into_inner())
}
