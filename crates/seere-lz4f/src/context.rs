//! Shared codec context: I/O ends, block-codec hooks, sticky status.
//!
//! The context is created once per stream and shared read-mostly between
//! the producer and its workers. The source and sink sit behind mutexes;
//! sink writes are already serialized by the per-block order gates, so
//! the locks see next to no contention. The wire helpers mirror the
//! sticky discipline of the result cell: once a failure is recorded,
//! every later read or write is a no-op.

use std::sync::Mutex;

use seere_core::{Error, FrameSink, FrameSource, StatusCell};
use serde::{Deserialize, Serialize};

/// Bounded-output block compressor.
///
/// Compresses the source into a destination of fixed capacity. A return
/// value of zero or less means the block does not fit, i.e. it is
/// incompressible at this bound.
pub type CompressFn = fn(src: &[u8], dst: &mut [u8]) -> i32;

/// Worst-case compressed size helper for a given source length.
pub type CompressBoundFn = fn(src_len: usize) -> usize;

/// Block decompressor. Returns the decoded byte count, negative on
/// failure.
pub type DecompressFn = fn(src: &[u8], dst: &mut [u8]) -> i32;

/// Execution mode for the block pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// One worker task per block, writes serialized by order gates.
    #[default]
    Parallel,
    /// Worker bodies run inline on the producer thread.
    Sequential,
}

/// Default bounded-output compressor backed by `lz4_flex`.
///
/// The destination is sized to the source, so a block that does not
/// shrink reports as incompressible.
pub fn lz4_compress_bounded(src: &[u8], dst: &mut [u8]) -> i32 {
    match lz4_flex::block::compress_into(src, dst) {
        Ok(written) => written as i32,
        Err(_) => 0,
    }
}

/// Default worst-case bound backed by `lz4_flex`.
pub fn lz4_compress_bound(src_len: usize) -> usize {
    lz4_flex::block::get_maximum_output_size(src_len)
}

/// Default block decompressor backed by `lz4_flex`.
pub fn lz4_decompress_bounded(src: &[u8], dst: &mut [u8]) -> i32 {
    match lz4_flex::block::decompress_into(src, dst) {
        Ok(written) => written as i32,
        Err(_) => -1,
    }
}

/// Shared state for one compression or decompression run.
pub struct CodecContext<R, W> {
    source: Mutex<R>,
    sink: Mutex<W>,
    status: StatusCell,
    mode: Mode,
    compress: CompressFn,
    compress_bound: CompressBoundFn,
    decompress: DecompressFn,
}

impl<R: FrameSource, W: FrameSink> CodecContext<R, W> {
    /// Create a context with the default mode and the `lz4_flex` block
    /// codec hooks.
    pub fn new(source: R, sink: W) -> Self {
        Self {
            source: Mutex::new(source),
            sink: Mutex::new(sink),
            status: StatusCell::new(),
            mode: Mode::default(),
            compress: lz4_compress_bounded,
            compress_bound: lz4_compress_bound,
            decompress: lz4_decompress_bounded,
        }
    }

    /// Select the execution mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the block codec hooks.
    pub fn with_block_codec(
        mut self,
        compress: CompressFn,
        compress_bound: CompressBoundFn,
        decompress: DecompressFn,
    ) -> Self {
        self.compress = compress;
        self.compress_bound = compress_bound;
        self.decompress = decompress;
        self
    }

    /// Current execution mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The sticky status cell for this run.
    pub fn status(&self) -> &StatusCell {
        &self.status
    }

    /// Worst-case compressed size for `src_len` input bytes, per the
    /// installed bound hook. Useful for pre-sizing sinks.
    pub fn compress_bound(&self, src_len: usize) -> usize {
        (self.compress_bound)(src_len)
    }

    /// Unwrap the source and sink.
    pub fn into_parts(self) -> (R, W) {
        (
            self.source.into_inner().unwrap(),
            self.sink.into_inner().unwrap(),
        )
    }

    /// Record `err` into the sticky cell; hands back the winner.
    pub(crate) fn fail(&self, err: Error) -> Error {
        self.status.record(err)
    }

    pub(crate) fn block_compress(&self, src: &[u8], dst: &mut [u8]) -> i32 {
        (self.compress)(src, dst)
    }

    pub(crate) fn block_decompress(&self, src: &[u8], dst: &mut [u8]) -> i32 {
        (self.decompress)(src, dst)
    }

    pub(crate) fn source_eof(&self) -> bool {
        self.source.lock().unwrap().is_eof()
    }

    pub(crate) fn seek_source(&self, delta: i64) -> bool {
        self.source.lock().unwrap().seek_relative(delta)
    }

    pub(crate) fn read_skippable(&self, magic: u32, size: u32) -> i64 {
        self.source.lock().unwrap().read_skippable(magic, size)
    }

    /// Plain block read: partial fills are fine, the caller decides
    /// what a short count means.
    pub(crate) fn read_block(&self, buf: &mut [u8]) -> usize {
        self.source.lock().unwrap().read(buf)
    }

    /// Read exactly `buf.len()` bytes. A short read marks the status
    /// transient and reports failure.
    pub(crate) fn read_exact(&self, buf: &mut [u8]) -> bool {
        if self.status.is_err() {
            return false;
        }
        if self.source.lock().unwrap().read(buf) != buf.len() {
            self.status.mark_transient();
            return false;
        }
        true
    }

    /// Read a little-endian u32, sticky-disciplined.
    pub(crate) fn read_u32(&self) -> Option<u32> {
        let mut bytes = [0u8; 4];
        if !self.read_exact(&mut bytes) {
            return None;
        }
        Some(u32::from_le_bytes(bytes))
    }

    /// Write all of `data`. A short write marks the status transient.
    pub(crate) fn write_all(&self, data: &[u8]) -> bool {
        if self.status.is_err() {
            return false;
        }
        if self.sink.lock().unwrap().write(data) != data.len() {
            self.status.mark_transient();
            return false;
        }
        true
    }

    /// Write a little-endian u32, sticky-disciplined.
    pub(crate) fn write_u32(&self, value: u32) -> bool {
        self.write_all(&value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seere_core::{SliceSource, VecSink};

    #[test]
    fn test_wire_u32_round_trip() {
        let ctx = CodecContext::new(SliceSource::new(&[]), VecSink::new());
        assert!(ctx.write_u32(0x184D2204));
        let (_, sink) = ctx.into_parts();
        let wire = sink.into_inner();
        assert_eq!(wire, [0x04, 0x22, 0x4D, 0x18]);

        let ctx = CodecContext::new(SliceSource::new(&wire), VecSink::new());
        assert_eq!(ctx.read_u32(), Some(0x184D2204));
    }

    #[test]
    fn test_short_read_marks_transient() {
        let ctx = CodecContext::new(SliceSource::new(&[1, 2]), VecSink::new());
        assert_eq!(ctx.read_u32(), None);
        assert!(ctx.status().is_err());
        // Sticky: later reads refuse to run.
        assert_eq!(ctx.read_u32(), None);
    }

    #[test]
    fn test_writes_refuse_after_failure() {
        let ctx = CodecContext::new(SliceSource::new(&[]), VecSink::new());
        ctx.fail(Error::CannotWriteHeader);
        assert!(!ctx.write_u32(7));
        let (_, sink) = ctx.into_parts();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_default_block_codec_round_trip() {
        let src = b"round and round and round the codec goes";
        let mut compressed = vec![0u8; lz4_compress_bound(src.len())];
        let written = lz4_compress_bounded(src, &mut compressed);
        assert!(written > 0);

        let mut decoded = vec![0u8; src.len()];
        let decoded_len = lz4_decompress_bounded(&compressed[..written as usize], &mut decoded);
        assert_eq!(decoded_len as usize, src.len());
        assert_eq!(&decoded, src);
    }

    #[test]
    fn test_default_compressor_reports_incompressible() {
        // A single byte cannot shrink: the bounded compressor must
        // report it rather than overrun the destination.
        let src = [0x42u8];
        let mut dst = [0u8; 1];
        assert!(lz4_compress_bounded(&src, &mut dst) <= 0);
    }

    #[test]
    fn test_default_decompressor_reports_failure() {
        // Token asks for literals the input does not carry.
        let src = [0xF0u8, 0xFF];
        let mut dst = [0u8; 64];
        assert!(lz4_decompress_bounded(&src, &mut dst) < 0);
    }

    #[test]
    fn test_compress_bound_accessor() {
        let ctx = CodecContext::new(SliceSource::new(&[]), VecSink::new());
        assert!(ctx.compress_bound(1 << 16) >= 1 << 16);
    }
}
