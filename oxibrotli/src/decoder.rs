//! Streaming Brotli decoder.
//!
//! The decoder pulls compressed bytes from its source only when no decoded
//! output is pending, so a reader fed one flushed segment gets that segment's
//! bytes back without waiting for the next one. Once the end-of-stream marker
//! is consumed the source must be exhausted; any further byte is reported as
//! trailing data.
//!
//! Data errors are sticky: after a `CorruptedData` or `TrailingData` failure
//! every read returns the same error until [`BrotliDecoder::reset`]. I/O
//! errors from the source are passed through and the read may be retried.

use crate::engine::BrotliChunkDecompressor;
use oxibrotli_core::error::{OxiBrotliError, Result};
use oxibrotli_core::options::DecoderOptions;
use oxibrotli_core::session::Session;
use oxibrotli_core::traits::{ByteSource, ChunkDecompressor, DecompressStatus};
use std::io;
use tracing::{debug, trace};

/// Brotli stream decoder bound to a [`ByteSource`].
pub struct BrotliDecoder<R: ByteSource> {
    session: Session<R>,
    engine: BrotliChunkDecompressor,
    options: DecoderOptions,
    input: Vec<u8>,
    input_start: usize,
    input_end: usize,
    /// Decoded bytes not yet handed to the caller.
    pending: Vec<u8>,
    pending_pos: usize,
    /// The engine holds decoded output it could not fit in the last batch.
    engine_has_output: bool,
    saw_end: bool,
    end_verified: bool,
    sticky: Option<OxiBrotliError>,
    /// Compressed bytes consumed by the engine.
    consumed: u64,
}

impl<R: ByteSource> BrotliDecoder<R> {
    /// Create a decoder reading from `source` with default options.
    pub fn new(source: R) -> Self {
        Self::build(source, DecoderOptions::default())
    }

    /// Create a decoder with explicit options.
    pub fn with_options(source: R, options: DecoderOptions) -> Result<Self> {
        let options = options.validate()?;
        Ok(Self::build(source, options))
    }

    fn build(source: R, options: DecoderOptions) -> Self {
        Self {
            session: Session::open(source),
            engine: BrotliChunkDecompressor::new(),
            options,
            input: vec![0u8; options.buffer_size],
            input_start: 0,
            input_end: 0,
            pending: Vec::new(),
            pending_pos: 0,
            engine_has_output: false,
            saw_end: false,
            end_verified: false,
            sticky: None,
            consumed: 0,
        }
    }

    /// Decoder options in use.
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Whether the end-of-stream marker has been consumed.
    ///
    /// Decoded bytes may still be pending delivery.
    pub fn is_finished(&self) -> bool {
        self.saw_end
    }

    /// Compressed bytes consumed since construction or the last reset.
    pub fn total_in(&self) -> u64 {
        self.consumed
    }

    /// Get a reference to the source.
    pub fn get_ref(&self) -> &R {
        self.session.get_ref()
    }

    /// Get a mutable reference to the source.
    ///
    /// Reading from it directly desynchronizes the decoder.
    pub fn get_mut(&mut self) -> &mut R {
        self.session.get_mut()
    }

    /// Consume the decoder and return the source.
    ///
    /// Bytes already pulled into the decoder's input buffer are lost.
    pub fn into_inner(self) -> R {
        self.session.into_inner()
    }

    /// Read decoded bytes into `buf`.
    ///
    /// Returns `Ok(0)` at the end of the stream, after verifying the source
    /// holds nothing past the end-of-stream marker. Blocks while the source
    /// has no bytes ready. A zero-length `buf` returns `Ok(0)` without
    /// touching the source.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(err) = &self.sticky {
            return Err(err.clone());
        }
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let available = self.pending.len() - self.pending_pos;
            if available > 0 {
                let n = available.min(buf.len());
                buf[..n].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                self.pending_pos += n;
                if self.pending_pos == self.pending.len() {
                    self.pending.clear();
                    self.pending_pos = 0;
                }
                return Ok(n);
            }

            if self.saw_end {
                if !self.end_verified {
                    self.check_trailing()?;
                    self.end_verified = true;
                }
                return Ok(0);
            }

            self.decode_more()?;
        }
    }

    /// Read the rest of the stream into `out`, returning the byte count.
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let start = out.len();
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                return Ok(out.len() - start);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }

    /// Discard all state, bind to `source` and return the previous source.
    ///
    /// Clears a sticky error. Decoding afterwards is identical to a freshly
    /// constructed decoder.
    pub fn reset(&mut self, source: R) -> R {
        self.engine.reset();
        self.input_start = 0;
        self.input_end = 0;
        self.pending.clear();
        self.pending_pos = 0;
        self.engine_has_output = false;
        self.saw_end = false;
        self.end_verified = false;
        self.sticky = None;
        self.consumed = 0;
        let old = self.session.rebind(source);
        debug!(generation = self.session.generation(), "decoder reset");
        old
    }

    /// Pull from the source if needed and run one engine call.
    ///
    /// Each call appends at most one engine batch to `pending`.
    fn decode_more(&mut self) -> Result<()> {
        if self.input_start == self.input_end && !self.engine_has_output {
            self.input_start = 0;
            self.input_end = 0;
            let n = self.session.get_mut().read_some(&mut self.input)?;
            trace!(pulled = n, "source read");
            if n == 0 {
                return Err(self.fail(OxiBrotliError::corrupted(
                    self.consumed,
                    "unexpected end of input before end of stream",
                )));
            }
            self.input_end = n;
        }

        let result = self.engine.decompress_chunk(
            &self.input[self.input_start..self.input_end],
            &mut self.pending,
        );
        match result {
            Ok((used, status)) => {
                self.input_start += used;
                self.consumed += used as u64;
                self.engine_has_output = status == DecompressStatus::NeedsOutput;
                match status {
                    DecompressStatus::Done => {
                        self.saw_end = true;
                        debug!(total_in = self.consumed, "end of stream");
                    }
                    // The engine must take everything it was given before asking for more.
                    DecompressStatus::NeedsInput if self.input_start < self.input_end => {
                        return Err(self.fail(OxiBrotliError::corrupted(
                            self.consumed,
                            "decoder stalled on buffered input",
                        )));
                    }
                    DecompressStatus::NeedsInput | DecompressStatus::NeedsOutput => {}
                }
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Reject input left in the buffer or still in the source.
    fn check_trailing(&mut self) -> Result<()> {
        if self.input_start < self.input_end {
            return Err(self.fail(OxiBrotliError::trailing_data(self.consumed)));
        }
        let mut probe = [0u8; 1];
        if self.session.get_mut().read_some(&mut probe)? > 0 {
            return Err(self.fail(OxiBrotliError::trailing_data(self.consumed)));
        }
        Ok(())
    }

    fn fail(&mut self, err: OxiBrotliError) -> OxiBrotliError {
        debug!(error = %err, "decoder failed");
        self.sticky = Some(err.clone());
        err
    }
}

impl<R: ByteSource> io::Read for BrotliDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        BrotliDecoder::read(self, buf).map_err(io::Error::from)
    }
}

impl<R: ByteSource> std::fmt::Debug for BrotliDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrotliDecoder")
            .field("options", &self.options)
            .field("pending", &(self.pending.len() - self.pending_pos))
            .field("saw_end", &self.saw_end)
            .field("sticky", &self.sticky)
            .field("total_in", &self.consumed)
            .finish()
    }
}
