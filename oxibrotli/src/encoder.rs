//! Streaming Brotli encoder.
//!
//! Writes are buffered and handed to the codec engine once the configured
//! threshold is crossed. [`BrotliEncoder::flush`] turns everything written so
//! far into a *segment*: once it returns, a decoder reading only the bytes in
//! the sink reconstructs every byte written, even if nothing else ever
//! arrives. [`BrotliEncoder::close`] emits the end-of-stream marker.

use crate::engine::BrotliChunkCompressor;
use oxibrotli_core::error::Result;
use oxibrotli_core::options::EncoderOptions;
use oxibrotli_core::session::Session;
use oxibrotli_core::traits::{ByteSink, ChunkCompressor, FlushMode};
use std::io;
use tracing::debug;

/// Brotli stream encoder bound to a [`ByteSink`].
///
/// # Example
///
/// ```rust
/// use oxibrotli::{BrotliEncoder, EncoderOptions};
///
/// let mut encoder = BrotliEncoder::new(Vec::new(), EncoderOptions::new(5)).unwrap();
/// encoder.write(b"hello").unwrap();
/// encoder.flush().unwrap();
/// encoder.write(b" world").unwrap();
/// let compressed = encoder.finish().unwrap();
///
/// assert_eq!(oxibrotli::decode_all(&compressed).unwrap(), b"hello world");
/// ```
pub struct BrotliEncoder<S: ByteSink> {
    session: Session<S>,
    engine: BrotliChunkCompressor,
    options: EncoderOptions,
    /// Input written but not yet passed to the engine.
    buffered: Vec<u8>,
    /// Engine output waiting to be written to the sink.
    compressed: Vec<u8>,
    segments: u64,
}

impl<S: ByteSink> BrotliEncoder<S> {
    /// Create an open encoder writing to `sink`.
    ///
    /// Fails with `InvalidOption` if `options` are out of range.
    pub fn new(sink: S, options: EncoderOptions) -> Result<Self> {
        let options = options.validate()?;
        let engine = BrotliChunkCompressor::new(&options)?;
        Ok(Self {
            session: Session::open(sink),
            engine,
            options,
            buffered: Vec::new(),
            compressed: Vec::new(),
            segments: 0,
        })
    }

    /// Create an encoder with the given quality and default window.
    pub fn with_quality(sink: S, quality: u32) -> Result<Self> {
        Self::new(sink, EncoderOptions::new(quality))
    }

    /// The resolved options this encoder was built with.
    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Whether [`close`](Self::close) has been called since the last reset.
    pub fn is_closed(&self) -> bool {
        !self.session.is_open()
    }

    /// Number of bytes written but not yet handed to the engine.
    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    /// Get a reference to the sink.
    pub fn get_ref(&self) -> &S {
        self.session.get_ref()
    }

    /// Get a mutable reference to the sink.
    ///
    /// Writing to it directly interleaves bytes with the compressed stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.session.get_mut()
    }

    /// Consume the encoder and return the sink without closing the stream.
    pub fn into_inner(self) -> S {
        self.session.into_inner()
    }

    /// Accept `data` for compression, returning the number of bytes consumed.
    ///
    /// Compressed bytes may reach the sink before the next flush once the
    /// buffer threshold is crossed; that output is not a decodable boundary.
    /// Writing an empty slice to an open encoder returns `Ok(0)`; on a closed
    /// encoder it fails like any other write.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.session.ensure_open("write")?;
        if data.is_empty() {
            return Ok(0);
        }

        if self.buffered.is_empty() && data.len() >= self.options.buffer_size {
            self.emit(data, FlushMode::None)?;
        } else {
            self.buffered.extend_from_slice(data);
            if self.buffered.len() >= self.options.buffer_size {
                self.drain(FlushMode::None)?;
            }
        }
        Ok(data.len())
    }

    /// Emit a segment: push all buffered input through the engine and write
    /// the result to the sink.
    ///
    /// Flushing with nothing new written succeeds and never repeats bytes
    /// already emitted.
    pub fn flush(&mut self) -> Result<()> {
        self.session.ensure_open("flush")?;
        let input_bytes = self.buffered.len();
        self.drain(FlushMode::Sync)?;
        self.session.get_mut().flush_sink()?;

        self.segments += 1;
        debug!(
            segment = self.segments,
            input_bytes,
            output_bytes = self.compressed.len(),
            "flushed segment"
        );
        Ok(())
    }

    /// Emit remaining input plus the end-of-stream marker.
    ///
    /// After this, [`write`](Self::write), [`flush`](Self::flush) and a second
    /// `close` fail with `ClosedStream` until [`reset`](Self::reset). If the
    /// sink fails, the encoder stays closed.
    pub fn close(&mut self) -> Result<()> {
        self.session.close("close")?;
        let input_bytes = self.buffered.len();
        self.drain(FlushMode::Finish)?;
        self.session.get_mut().flush_sink()?;

        debug!(
            segments = self.segments + 1,
            input_bytes,
            output_bytes = self.compressed.len(),
            "closed stream"
        );
        Ok(())
    }

    /// Close the stream and return the sink.
    pub fn finish(mut self) -> Result<S> {
        self.close()?;
        Ok(self.session.into_inner())
    }

    /// Discard unwritten input, bind to `sink` and reopen.
    ///
    /// Works from both open and closed states. The detached sink is returned
    /// untouched: no end-of-stream marker is written to it. Output after a
    /// reset is byte-identical to a fresh encoder with the same options.
    pub fn reset(&mut self, sink: S) -> S {
        let discarded = self.buffered.len();
        self.buffered.clear();
        self.compressed.clear();
        self.engine.reset();
        self.segments = 0;
        let old = self.session.rebind(sink);
        debug!(
            discarded,
            generation = self.session.generation(),
            "encoder reset"
        );
        old
    }

    /// Run the buffered input through the engine, keeping the allocation.
    fn drain(&mut self, flush: FlushMode) -> Result<()> {
        let pending = std::mem::take(&mut self.buffered);
        let result = self.emit(&pending, flush);
        self.buffered = pending;
        self.buffered.clear();
        result
    }

    fn emit(&mut self, input: &[u8], flush: FlushMode) -> Result<()> {
        self.compressed.clear();
        self.engine
            .compress_chunk(input, flush, &mut self.compressed)?;
        if !self.compressed.is_empty() {
            self.session.get_mut().write_all_bytes(&self.compressed)?;
        }
        Ok(())
    }
}

impl<S: ByteSink> io::Write for BrotliEncoder<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        BrotliEncoder::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        BrotliEncoder::flush(self).map_err(io::Error::from)
    }
}

impl<S: ByteSink> std::fmt::Debug for BrotliEncoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrotliEncoder")
            .field("options", &self.options)
            .field("state", &self.session.state())
            .field("buffered", &self.buffered.len())
            .field("segments", &self.segments)
            .finish()
    }
}

/// Compress `data` into a complete stream appended to `out`.
pub(crate) fn encode_into(data: &[u8], options: &EncoderOptions, out: &mut Vec<u8>) -> Result<()> {
    let mut encoder = BrotliEncoder::new(out, *options)?;
    encoder.write(data)?;
    encoder.close()
}
