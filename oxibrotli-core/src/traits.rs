//! Core traits for stream transports and codec engines.
//!
//! Encoders and decoders are generic over two capabilities: a [`ByteSink`]
//! that accepts compressed bytes and a [`ByteSource`] that yields them. Both
//! are implemented for every `std::io` writer/reader, so in-memory buffers,
//! pipes, sockets and files all work unchanged.
//!
//! The compression primitive itself sits behind [`ChunkCompressor`] and
//! [`ChunkDecompressor`].

use crate::error::{OxiBrotliError, Result};
use std::io::{self, Read, Write};

/// Status of a streaming decompression call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressStatus {
    /// All supplied input was consumed; the stream has not ended yet.
    NeedsInput,
    /// The output batch limit was reached; call again (with any unconsumed
    /// input, possibly none) before supplying more.
    NeedsOutput,
    /// The end-of-stream marker was consumed.
    Done,
}

/// Flush mode for compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// No flush - buffer data for best compression.
    #[default]
    None,
    /// Sync flush - emit every pending byte so the output so far is decodable.
    Sync,
    /// Finish - emit pending bytes and the end-of-stream marker.
    Finish,
}

/// A destination for compressed (or decompressed) bytes.
pub trait ByteSink {
    /// Write some bytes, returning how many were accepted.
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Push buffered bytes to the underlying transport.
    fn flush_sink(&mut self) -> io::Result<()>;

    /// Write every byte of `buf`.
    ///
    /// A sink that accepts zero bytes is reported as [`io::ErrorKind::WriteZero`].
    fn write_all_bytes(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write_bytes(buf) {
                Ok(0) => {
                    return Err(OxiBrotliError::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "sink accepted zero bytes",
                    )));
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> ByteSink for W {
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf)
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// An origin of bytes.
pub trait ByteSource {
    /// Read some bytes into `buf`. `Ok(0)` signals end of data.
    ///
    /// May block until bytes are available.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Read, retrying on [`io::ErrorKind::Interrupted`].
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.read_bytes(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read + ?Sized> ByteSource for R {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// A stateful compression session.
///
/// Output is appended to a caller supplied vector so the caller owns (and can
/// reuse) the allocation.
pub trait ChunkCompressor {
    /// Compress `input`, appending produced bytes to `output`.
    ///
    /// With [`FlushMode::Sync`] every byte submitted so far must be decodable
    /// from the output produced so far. With [`FlushMode::Finish`] the
    /// end-of-stream marker is appended and the session becomes finished.
    fn compress_chunk(
        &mut self,
        input: &[u8],
        flush: FlushMode,
        output: &mut Vec<u8>,
    ) -> Result<()>;

    /// Reset the compressor to its initial state.
    fn reset(&mut self);

    /// Check if the compressor has emitted the end-of-stream marker.
    fn is_finished(&self) -> bool;
}

/// A stateful decompression session.
pub trait ChunkDecompressor {
    /// Decompress from `input`, appending to `output`.
    ///
    /// Implementations append a bounded batch per call and report
    /// [`DecompressStatus::NeedsOutput`] when more output is ready, so a
    /// small compressed input cannot inflate into an unbounded buffer.
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, status). With
    /// [`DecompressStatus::NeedsInput`] all of `input` was consumed. When the
    /// status is [`DecompressStatus::Done`], unconsumed input lies beyond the
    /// end of the stream.
    fn decompress_chunk(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
    ) -> Result<(usize, DecompressStatus)>;

    /// Reset the decompressor to its initial state.
    fn reset(&mut self);

    /// Check if the decompressor has consumed the end-of-stream marker.
    fn is_finished(&self) -> bool;
}
