//! Block-parallel frame decompression.
//!
//! The producer parses block headers in input order and hands each
//! payload to a worker. Workers verify the optional block checksum and
//! decompress concurrently; the order gate (the predecessor's completion
//! channel) serializes the writes, and the stream hash is folded right
//! after the gate under a mutex, so the hasher sees the uncompressed
//! bytes in strict input order even though decoding is parallel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread;

use tracing::{debug, warn};

use seere_core::{Error, FrameSink, FrameSource, Result};

use crate::checksum::{xxh32_digest, StreamHasher};
use crate::context::{CodecContext, Mode};
use crate::descriptor::StreamDescriptor;
use crate::header::read_frame_header;
use crate::{EOS_MARKER, INCOMPRESSIBLE_BIT};

/// One parsed block, ready for a worker.
struct BlockJob {
    src: Vec<u8>,
    incompressible: bool,
    block_hash: u32,
}

/// Decompress every frame in the source until clean end of input.
///
/// Skippable chunks between frames are handed to the source's
/// `read_skippable`. The first error terminates the run.
pub fn decompress_frames<R, W>(ctx: &CodecContext<R, W>) -> Result<()>
where
    R: FrameSource + Send,
    W: FrameSink + Send,
{
    loop {
        let sd = match read_frame_header(ctx)? {
            Some(sd) => sd,
            None => break,
        };
        decompress_frame(ctx, &sd)?;
    }
    ctx.status().snapshot()
}

/// Decompress the block sequence and trailer of one frame whose header
/// has already been parsed.
fn decompress_frame<R, W>(ctx: &CodecContext<R, W>, sd: &StreamDescriptor) -> Result<()>
where
    R: FrameSource + Send,
    W: FrameSink + Send,
{
    let block_maximum_size = sd.block_size_bytes();
    let block_checksum = sd.flags.block_checksum;
    let stream_checksum = sd.flags.stream_checksum;
    let sequential = ctx.mode() == Mode::Sequential;

    let hasher = Mutex::new(StreamHasher::new());
    let quit = AtomicBool::new(false);
    let mut blocks = 0u64;

    thread::scope(|scope| {
        let hasher = &hasher;
        let quit = &quit;
        let mut gate: Option<Receiver<()>> = None;
        let mut handles = Vec::new();

        while !quit.load(Ordering::Acquire) {
            let Some(size_field) = ctx.read_u32() else {
                ctx.fail(Error::CannotReadBlockSize);
                break;
            };
            if size_field == EOS_MARKER {
                break;
            }

            let incompressible = size_field & INCOMPRESSIBLE_BIT != 0;
            let src_size = (size_field & !INCOMPRESSIBLE_BIT) as usize;
            let mut src = vec![0u8; src_size];
            if !ctx.read_exact(&mut src) {
                ctx.fail(Error::CannotReadBlockData);
                break;
            }

            let block_hash = if block_checksum {
                match ctx.read_u32() {
                    Some(hash) => hash,
                    None => {
                        ctx.fail(Error::CannotReadBlockChecksum);
                        break;
                    }
                }
            } else {
                0
            };

            let job = BlockJob {
                src,
                incompressible,
                block_hash,
            };
            let (done, next_gate) = mpsc::channel();
            let prev = gate.replace(next_gate);
            if sequential {
                if let Err(e) = decompress_block(
                    ctx,
                    job,
                    block_maximum_size,
                    block_checksum,
                    stream_checksum,
                    prev,
                    done,
                    hasher,
                    quit,
                ) {
                    ctx.fail(e);
                }
            } else {
                handles.push(scope.spawn(move || {
                    decompress_block(
                        ctx,
                        job,
                        block_maximum_size,
                        block_checksum,
                        stream_checksum,
                        prev,
                        done,
                        hasher,
                        quit,
                    )
                }));
            }
            blocks += 1;
        }

        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    ctx.fail(e);
                }
                Err(_) => {
                    ctx.status().mark_transient();
                }
            }
        }
    });

    debug!(blocks, "frame blocks drained");

    if !ctx.status().is_err() && stream_checksum {
        let Some(expected) = ctx.read_u32() else {
            return Err(ctx.fail(Error::CannotReadStreamChecksum));
        };
        let actual = hasher.lock().unwrap().digest();
        if expected != actual {
            warn!(expected, actual, "stream checksum mismatch");
            return Err(ctx.fail(Error::StreamChecksumMismatch { expected, actual }));
        }
    }
    ctx.status().snapshot()
}

/// Worker body for one block.
///
/// The block checksum is verified before the order gate so corrupt
/// blocks are caught while neighbors are still decoding; the write and
/// the stream-hash fold happen after the gate, which is what keeps the
/// hash update sequence in input order.
#[allow(clippy::too_many_arguments)]
fn decompress_block<R, W>(
    ctx: &CodecContext<R, W>,
    job: BlockJob,
    block_maximum_size: usize,
    block_checksum: bool,
    stream_checksum: bool,
    gate: Option<Receiver<()>>,
    done: Sender<()>,
    hasher: &Mutex<StreamHasher>,
    quit: &AtomicBool,
) -> Result<()>
where
    R: FrameSource,
    W: FrameSink,
{
    if ctx.status().is_err() || quit.load(Ordering::Acquire) {
        return Ok(());
    }

    if block_checksum {
        let actual = xxh32_digest(&job.src);
        if actual != job.block_hash {
            quit.store(true, Ordering::Release);
            warn!(expected = job.block_hash, actual, "block checksum mismatch");
            return Err(Error::BlockChecksumMismatch {
                expected: job.block_hash,
                actual,
            });
        }
    }

    if job.incompressible {
        if let Some(prev) = gate {
            let _ = prev.recv();
        }
        ctx.write_all(&job.src);
        if stream_checksum {
            hasher.lock().unwrap().update(&job.src);
        }
    } else {
        let mut dst = vec![0u8; block_maximum_size];
        let decoded = ctx.block_decompress(&job.src, &mut dst);
        drop(job.src);
        if decoded < 0 {
            quit.store(true, Ordering::Release);
            return Err(Error::BlockDecodeFailed(decoded));
        }
        let decoded = decoded as usize;
        if let Some(prev) = gate {
            let _ = prev.recv();
        }
        ctx.write_all(&dst[..decoded]);
        if stream_checksum {
            hasher.lock().unwrap().update(&dst[..decoded]);
        }
    }

    let _ = done.send(());
    Ok(())
}
