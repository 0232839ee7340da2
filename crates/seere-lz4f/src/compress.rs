//! Block-parallel frame compression.
//!
//! The producer thread reads fixed-size blocks from the source, folds
//! the stream checksum in input order before dispatch, and hands each
//! block to a worker. Workers compress concurrently; their writes are
//! serialized by a chain of completion channels, so block `i` reaches
//! the sink strictly after block `i - 1` and the output is byte-for-byte
//! identical to a sequential encoder's.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::debug;

use seere_core::{Error, FrameSink, FrameSource, Result};

use crate::checksum::{xxh32_digest, StreamHasher};
use crate::context::{CodecContext, Mode};
use crate::descriptor::StreamDescriptor;
use crate::header::write_frame_header;
use crate::{EOS_MARKER, INCOMPRESSIBLE_BIT};

/// Compress the whole source into one frame described by `sd`.
///
/// Writes the header, the block sequence, the end-of-stream marker, and
/// the optional stream checksum. The first failure recorded by any
/// worker is the result; later failures are dropped.
pub fn compress_frame<R, W>(ctx: &CodecContext<R, W>, sd: &StreamDescriptor) -> Result<()>
where
    R: FrameSource + Send,
    W: FrameSink + Send,
{
    write_frame_header(ctx, sd)?;

    let block_maximum_size = sd.block_size_bytes();
    let block_checksum = sd.flags.block_checksum;
    let stream_checksum = sd.flags.stream_checksum;
    let sequential = ctx.mode() == Mode::Sequential;

    let mut hasher = StreamHasher::new();
    let mut blocks = 0u64;

    thread::scope(|scope| {
        let mut gate: Option<Receiver<()>> = None;

        while !ctx.source_eof() && !ctx.status().is_err() {
            let mut src = vec![0u8; block_maximum_size];
            let read = ctx.read_block(&mut src);
            if read == 0 {
                break;
            }
            src.truncate(read);

            // Input order makes the stream hash free of synchronization:
            // fold before the block is handed off.
            if stream_checksum {
                hasher.update(&src);
            }

            let (done, next_gate) = mpsc::channel();
            let prev = gate.replace(next_gate);
            if sequential {
                compress_block(ctx, src, block_checksum, prev, done);
            } else {
                scope.spawn(move || compress_block(ctx, src, block_checksum, prev, done));
            }
            blocks += 1;
        }
    });

    debug!(blocks, "block dispatch complete");

    if !ctx.write_u32(EOS_MARKER) {
        return Err(ctx.fail(Error::CannotWriteEos));
    }
    if stream_checksum && !ctx.write_u32(hasher.digest()) {
        return Err(ctx.fail(Error::CannotWriteStreamChecksum));
    }
    ctx.status().snapshot()
}

/// Worker body for one block.
///
/// The compute phase runs concurrently with its neighbors; the three
/// write steps happen only after the predecessor's channel closes. On a
/// sticky error the worker returns without touching the sink - dropping
/// `done` is enough to release the successor.
fn compress_block<R, W>(
    ctx: &CodecContext<R, W>,
    src: Vec<u8>,
    block_checksum: bool,
    gate: Option<Receiver<()>>,
    done: Sender<()>,
) where
    R: FrameSource,
    W: FrameSink,
{
    if ctx.status().is_err() {
        return;
    }

    let mut dst = vec![0u8; src.len()];
    let written = ctx.block_compress(&src, &mut dst);

    // A non-positive count means the block would not shrink: store the
    // original bytes and flag the size field.
    let incompressible = written <= 0;
    let payload: &[u8] = if incompressible {
        &src
    } else {
        &dst[..written as usize]
    };
    let block_hash = block_checksum.then(|| xxh32_digest(payload));

    if let Some(prev) = gate {
        let _ = prev.recv();
    }

    let mut size_field = payload.len() as u32;
    if incompressible {
        size_field |= INCOMPRESSIBLE_BIT;
    }
    ctx.write_u32(size_field);
    ctx.write_all(payload);
    if let Some(hash) = block_hash {
        ctx.write_u32(hash);
    }

    let _ = done.send(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use seere_core::{SliceSource, VecSink};

    use crate::checksum::xxh32_digest;

    fn compress_with(input: &[u8], sd: &StreamDescriptor, mode: Mode) -> Vec<u8> {
        let ctx = CodecContext::new(SliceSource::new(input), VecSink::new()).with_mode(mode);
        compress_frame(&ctx, sd).unwrap();
        let (_, sink) = ctx.into_parts();
        sink.into_inner()
    }

    #[test]
    fn test_empty_input_layout() {
        let sd = StreamDescriptor::new();
        let wire = compress_with(&[], &sd, Mode::Sequential);

        // header(7) + EOS(4) + stream hash(4)
        assert_eq!(wire.len(), 15);
        assert_eq!(&wire[7..11], &EOS_MARKER.to_le_bytes());
        assert_eq!(&wire[11..15], &xxh32_digest(&[]).to_le_bytes());
    }

    #[test]
    fn test_no_stream_checksum_trailer_when_disabled() {
        let sd = StreamDescriptor::new().with_stream_checksum(false);
        let wire = compress_with(&[], &sd, Mode::Sequential);
        assert_eq!(wire.len(), 11);
        assert_eq!(&wire[7..11], &EOS_MARKER.to_le_bytes());
    }

    #[test]
    fn test_compressible_block_layout() {
        let input = vec![0u8; 4096];
        let sd = StreamDescriptor::new()
            .with_block_maximum_size(4)
            .with_stream_checksum(false);
        let wire = compress_with(&input, &sd, Mode::Sequential);

        let size_field = u32::from_le_bytes(wire[7..11].try_into().unwrap());
        assert_eq!(size_field & INCOMPRESSIBLE_BIT, 0);
        let payload_len = size_field as usize;
        assert!(payload_len < input.len());
        // block header + payload + EOS
        assert_eq!(wire.len(), 11 + payload_len + 4);
    }

    #[test]
    fn test_incompressible_block_stored_verbatim() {
        // High-entropy bytes from a fixed recurrence; one 64 KiB block.
        let mut state = 0x9E3779B97F4A7C15u64;
        let input: Vec<u8> = (0..65536)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                (state >> 56) as u8
            })
            .collect();
        let sd = StreamDescriptor::new()
            .with_block_maximum_size(4)
            .with_stream_checksum(false);
        let wire = compress_with(&input, &sd, Mode::Sequential);

        let size_field = u32::from_le_bytes(wire[7..11].try_into().unwrap());
        assert_ne!(size_field & INCOMPRESSIBLE_BIT, 0);
        assert_eq!((size_field & !INCOMPRESSIBLE_BIT) as usize, input.len());
        assert_eq!(&wire[11..11 + input.len()], &input[..]);
    }

    #[test]
    fn test_block_checksum_trailer() {
        let input = vec![7u8; 65536];
        let sd = StreamDescriptor::new()
            .with_block_maximum_size(4)
            .with_block_checksum(true)
            .with_stream_checksum(false);
        let wire = compress_with(&input, &sd, Mode::Sequential);

        let size_field = u32::from_le_bytes(wire[7..11].try_into().unwrap());
        let payload_len = (size_field & !INCOMPRESSIBLE_BIT) as usize;
        let payload = &wire[11..11 + payload_len];
        let trailer = u32::from_le_bytes(
            wire[11 + payload_len..11 + payload_len + 4]
                .try_into()
                .unwrap(),
        );
        assert_eq!(trailer, xxh32_digest(payload));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        // 20 blocks at the smallest block size.
        let input: Vec<u8> = (0..20 * 65536u32).map(|i| (i % 251) as u8).collect();
        let sd = StreamDescriptor::new()
            .with_block_maximum_size(4)
            .with_block_checksum(true);

        let sequential = compress_with(&input, &sd, Mode::Sequential);
        let parallel = compress_with(&input, &sd, Mode::Parallel);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_exact_block_multiple_has_no_empty_tail() {
        let input = vec![3u8; 2 * 65536];
        let sd = StreamDescriptor::new()
            .with_block_maximum_size(4)
            .with_stream_checksum(false);
        let wire = compress_with(&input, &sd, Mode::Sequential);

        // Walk the two blocks, then expect EOS directly.
        let mut offset = 7;
        for _ in 0..2 {
            let size_field = u32::from_le_bytes(wire[offset..offset + 4].try_into().unwrap());
            offset += 4 + (size_field & !INCOMPRESSIBLE_BIT) as usize;
        }
        assert_eq!(&wire[offset..offset + 4], &EOS_MARKER.to_le_bytes());
        assert_eq!(wire.len(), offset + 4);
    }

    #[test]
    fn test_invalid_descriptor_rejected_before_io() {
        let sd = StreamDescriptor::new().with_block_maximum_size(2);
        let ctx = CodecContext::new(SliceSource::new(&[]), VecSink::new());
        assert_eq!(
            compress_frame(&ctx, &sd).unwrap_err(),
            Error::InvalidBlockMaximumSize(2)
        );
        let (_, sink) = ctx.into_parts();
        assert!(sink.is_empty());
    }
}
