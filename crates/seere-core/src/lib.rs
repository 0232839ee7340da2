//! # Seere Core
//!
//! Shared plumbing for the Seere parallel LZ4 frame codec.
//!
//! Seere is named after the 70th spirit of the Ars Goetia, who crosses
//! the earth in the twinkling of an eye - as this codec crosses a stream
//! with many blocks in flight at once.
//!
//! This crate carries the pieces every codec crate needs:
//!
//! - [`Error`] / [`Result`] - the complete result taxonomy
//! - [`StatusCell`] - the sticky first-error cell shared between the
//!   producer and its workers
//! - [`FrameSource`] / [`FrameSink`] - the caller-supplied I/O seams,
//!   plus in-memory and `std::io` adapters
//!
//! ## Example
//!
//! ```
//! use seere_core::{FrameSink, FrameSource, SliceSource, VecSink};
//!
//! let mut source = SliceSource::new(b"payload");
//! let mut sink = VecSink::new();
//!
//! let mut buf = [0u8; 4];
//! let n = source.read(&mut buf);
//! sink.write(&buf[..n]);
//! assert_eq!(sink.as_slice(), b"payl");
//! ```

pub mod error;
pub mod io;
pub mod status;

pub use error::{Error, Result};
pub use io::{FrameSink, FrameSource, ReadSource, SliceSource, VecSink, WriteSink};
pub use status::StatusCell;
