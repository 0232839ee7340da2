//! Frame header writing and reading.
//!
//! The header is `MAGIC, FLG, BD, [stream_size], [dict_id], HC` where HC
//! is bits 8..15 of the xxHash32 over the descriptor bytes. The reader
//! also owns the stream-level concerns around the header: clean
//! end-of-input detection, skippable chunks, and the 4-byte rewind when
//! a foreign magic number shows up.

use tracing::debug;

use seere_core::{Error, FrameSink, FrameSource, Result};

use crate::checksum::{header_check_byte, xxh32_digest};
use crate::context::CodecContext;
use crate::descriptor::{BlockDescriptor, FrameFlags, StreamDescriptor};
use crate::{is_skippable_magic, LZ4F_MAGIC, MAX_HEADER_SIZE};

/// Write one frame header to the sink in a single call.
pub fn write_frame_header<R, W>(ctx: &CodecContext<R, W>, sd: &StreamDescriptor) -> Result<()>
where
    R: FrameSource,
    W: FrameSink,
{
    sd.validate().map_err(|e| ctx.fail(e))?;

    let mut header = Vec::with_capacity(MAX_HEADER_SIZE);
    header.extend_from_slice(&LZ4F_MAGIC.to_le_bytes());

    let descriptor_start = header.len();
    header.push(sd.flags.to_byte());
    header.push(sd.bd.to_byte());
    if sd.flags.stream_size {
        header.extend_from_slice(&sd.stream_size.unwrap_or(0).to_le_bytes());
    }
    if sd.flags.preset_dictionary {
        header.extend_from_slice(&sd.dict_id.unwrap_or(0).to_le_bytes());
    }
    let check = header_check_byte(xxh32_digest(&header[descriptor_start..]));
    header.push(check);

    if !ctx.write_all(&header) {
        return Err(ctx.fail(Error::CannotWriteHeader));
    }
    debug!(bytes = header.len(), "frame header written");
    Ok(())
}

/// Read the next frame header.
///
/// Skippable chunks are consumed via the source and the loop continues
/// to the next magic. Returns `Ok(None)` on clean end of input. A magic
/// number that is neither a frame nor a skippable chunk rewinds the
/// source by 4 bytes and fails with `InvalidMagicNumber`.
pub fn read_frame_header<R, W>(ctx: &CodecContext<R, W>) -> Result<Option<StreamDescriptor>>
where
    R: FrameSource,
    W: FrameSink,
{
    loop {
        if ctx.status().is_err() || ctx.source_eof() {
            return ctx.status().snapshot().map(|_| None);
        }

        let magic = match ctx.read_u32() {
            Some(magic) => magic,
            None => {
                if ctx.source_eof() {
                    // The stream ended exactly on a frame boundary.
                    ctx.status().resolve_transient();
                    return Ok(None);
                }
                return Err(ctx.fail(Error::InvalidHeader));
            }
        };

        if is_skippable_magic(magic) {
            let size = match ctx.read_u32() {
                Some(size) => size,
                None => return Err(ctx.fail(Error::InvalidHeader)),
            };
            debug!(magic, size, "skippable chunk");
            let consumed = ctx.read_skippable(magic, size);
            if consumed < 0 || ctx.status().is_err() {
                return Err(ctx.fail(Error::InvalidHeader));
            }
            continue;
        }

        if magic != LZ4F_MAGIC {
            ctx.seek_source(-4);
            return Err(ctx.fail(Error::InvalidMagicNumber(magic)));
        }

        let mut descriptor = [0u8; 2];
        if !ctx.read_exact(&mut descriptor) {
            return Err(ctx.fail(Error::InvalidHeader));
        }
        let flags = FrameFlags::from_byte(descriptor[0]);
        let bd = BlockDescriptor::from_byte(descriptor[1]);
        let mut sd = StreamDescriptor {
            flags,
            bd,
            stream_size: None,
            dict_id: None,
        };
        sd.validate().map_err(|e| ctx.fail(e))?;

        // Optional fields plus the trailing header-check byte.
        let ext_len =
            (flags.stream_size as usize) * 8 + (flags.preset_dictionary as usize) * 4 + 1;
        let mut ext = [0u8; 13];
        if !ctx.read_exact(&mut ext[..ext_len]) {
            return Err(ctx.fail(Error::InvalidHeader));
        }

        let mut offset = 0;
        if flags.stream_size {
            sd.stream_size = Some(u64::from_le_bytes(ext[..8].try_into().unwrap()));
            offset += 8;
        }
        if flags.preset_dictionary {
            sd.dict_id = Some(u32::from_le_bytes(ext[offset..offset + 4].try_into().unwrap()));
            offset += 4;
        }

        let mut covered = Vec::with_capacity(2 + offset);
        covered.extend_from_slice(&descriptor);
        covered.extend_from_slice(&ext[..offset]);
        let expected = ext[offset];
        let actual = header_check_byte(xxh32_digest(&covered));
        if expected != actual {
            return Err(ctx.fail(Error::InvalidHeaderChecksum { expected, actual }));
        }

        debug!(
            block_maximum_size = sd.bd.block_maximum_size,
            block_checksum = sd.flags.block_checksum,
            stream_checksum = sd.flags.stream_checksum,
            "frame header parsed"
        );
        return Ok(Some(sd));
    }
}
