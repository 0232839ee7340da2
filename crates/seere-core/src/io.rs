//! Caller-supplied I/O seams for the frame codec.
//!
//! The codec core never touches a file descriptor. It reads from a
//! [`FrameSource`] and writes to a [`FrameSink`]; the caller owns the
//! underlying handles, buffering, and error reporting policy. Counts are
//! the contract: a short read means end of input, a short write means
//! failure.

use std::io::{Read, Seek, SeekFrom, Write};

/// Byte source for frame encoding input or decoding input.
pub trait FrameSource {
    /// Read up to `buf.len()` bytes. Short reads are permitted only at
    /// true end of input.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Whether the source has been exhausted.
    ///
    /// Sampled after reads: a failed read followed by `is_eof() == true`
    /// is a clean end of stream, anything else is truncation.
    fn is_eof(&self) -> bool;

    /// Reposition the source relative to the current offset. Returns
    /// `false` when the source cannot seek there.
    fn seek_relative(&mut self, delta: i64) -> bool;

    /// Consume the payload of a skippable frame.
    ///
    /// `magic` identifies the chunk (`0x184D2A50..=0x184D2A5F`) and
    /// `size` is its payload length. Returns the number of bytes
    /// consumed, negative on failure. The default implementation drains
    /// the payload through [`read`](FrameSource::read).
    fn read_skippable(&mut self, magic: u32, size: u32) -> i64 {
        let _ = magic;
        let mut chunk = [0u8; 4096];
        let mut remaining = size as usize;
        while remaining > 0 {
            let want = remaining.min(chunk.len());
            let got = self.read(&mut chunk[..want]);
            if got == 0 {
                return -1;
            }
            remaining -= got;
        }
        size as i64
    }
}

/// Byte sink for frame encoding output or decoding output.
pub trait FrameSink {
    /// Write all of `buf`. Anything short of `buf.len()` is failure.
    fn write(&mut self, buf: &[u8]) -> usize;
}

/// In-memory source over a borrowed slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Create a source reading from the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl FrameSource for SliceSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn seek_relative(&mut self, delta: i64) -> bool {
        let target = self.pos as i64 + delta;
        if target < 0 || target > self.data.len() as i64 {
            return false;
        }
        self.pos = target as usize;
        true
    }

    fn read_skippable(&mut self, _magic: u32, size: u32) -> i64 {
        let size = size as usize;
        if self.data.len() - self.pos < size {
            self.pos = self.data.len();
            return -1;
        }
        self.pos += size;
        size as i64
    }
}

/// Source adapter over any `Read + Seek`.
///
/// Tracks end-of-input as observed: `is_eof` only reports true after a
/// read has actually hit the end.
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
    eof: bool,
}

impl<R: Read + Seek> ReadSource<R> {
    /// Wrap a `Read + Seek` value.
    pub fn new(inner: R) -> Self {
        Self { inner, eof: false }
    }

    /// Get a reference to the inner reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Get a mutable reference to the inner reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwrap the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> FrameSource for ReadSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        filled
    }

    fn is_eof(&self) -> bool {
        self.eof
    }

    fn seek_relative(&mut self, delta: i64) -> bool {
        match self.inner.seek(SeekFrom::Current(delta)) {
            Ok(_) => {
                if delta < 0 {
                    self.eof = false;
                }
                true
            }
            Err(_) => false,
        }
    }
}

/// In-memory sink collecting into a `Vec<u8>`.
#[derive(Debug, Default)]
pub struct VecSink {
    data: Vec<u8>,
}

impl VecSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// View the collected bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes collected so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Unwrap the collected bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl FrameSink for VecSink {
    fn write(&mut self, buf: &[u8]) -> usize {
        self.data.extend_from_slice(buf);
        buf.len()
    }
}

/// Sink adapter over any `Write`.
#[derive(Debug)]
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    /// Wrap a `Write` value.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Get a reference to the inner writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FrameSink for WriteSink<W> {
    fn write(&mut self, buf: &[u8]) -> usize {
        match self.inner.write_all(buf) {
            Ok(()) => buf.len(),
            Err(_) => 0,
        }
    }
}
