//! Brotli codec engine sessions.
//!
//! The entropy coder and match finder come from the `brotli` crate. This
//! module only adapts its streaming primitives to [`ChunkCompressor`] and
//! [`ChunkDecompressor`]: a sync flush maps to Brotli's `FLUSH` operation,
//! which closes the current meta-block on a byte boundary so everything
//! written so far can be decoded without the rest of the stream.

use brotli::writer::StandardAlloc;
use brotli::{BrotliDecompressStream, BrotliResult, BrotliState, CompressorWriter};
use oxibrotli_core::error::{OxiBrotliError, Result};
use oxibrotli_core::options::EncoderOptions;
use oxibrotli_core::traits::{ChunkCompressor, ChunkDecompressor, DecompressStatus, FlushMode};
use std::io::Write;
use tracing::trace;

/// Internal buffer size handed to the brotli encoder.
const ENGINE_BUFFER_SIZE: usize = 4096;

/// Output batch size: the most one `decompress_chunk` call appends.
pub const DECODE_BATCH_SIZE: usize = 32 * 1024;

/// A Brotli compression session.
pub struct BrotliChunkCompressor {
    writer: Option<CompressorWriter<Vec<u8>>>,
    /// Output vector recovered from a finished session, kept for reuse.
    spare: Vec<u8>,
    quality: u32,
    window_log: u32,
}

impl BrotliChunkCompressor {
    /// Create a compression session for validated options.
    pub fn new(options: &EncoderOptions) -> Result<Self> {
        let options = options.validate()?;
        Ok(Self {
            writer: Some(Self::open_writer(
                Vec::new(),
                options.quality,
                options.window_log,
            )),
            spare: Vec::new(),
            quality: options.quality,
            window_log: options.window_log,
        })
    }

    fn open_writer(buffer: Vec<u8>, quality: u32, window_log: u32) -> CompressorWriter<Vec<u8>> {
        CompressorWriter::new(buffer, ENGINE_BUFFER_SIZE, quality, window_log)
    }

    /// Quality of this session.
    pub fn quality(&self) -> u32 {
        self.quality
    }

    /// Window size (log2) of this session.
    pub fn window_log(&self) -> u32 {
        self.window_log
    }
}

impl ChunkCompressor for BrotliChunkCompressor {
    fn compress_chunk(
        &mut self,
        input: &[u8],
        flush: FlushMode,
        output: &mut Vec<u8>,
    ) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(OxiBrotliError::closed_stream("compress after finish"));
        };

        writer.write_all(input)?;
        if flush == FlushMode::Sync {
            writer.flush()?;
        }

        if flush == FlushMode::Finish {
            if let Some(writer) = self.writer.take() {
                // into_inner runs the FINISH operation.
                let mut produced = writer.into_inner();
                output.extend_from_slice(&produced);
                produced.clear();
                self.spare = produced;
            }
        } else {
            let produced = writer.get_mut();
            output.extend_from_slice(produced);
            produced.clear();
        }

        trace!(
            input = input.len(),
            output = output.len(),
            ?flush,
            "brotli compress"
        );
        Ok(())
    }

    /// Start a new stream with the same parameters.
    ///
    /// The output vector is reused. The encoder state itself is rebuilt: the
    /// `brotli` writer has no in-place reset.
    fn reset(&mut self) {
        let mut buffer = match self.writer.take() {
            Some(writer) => writer.into_inner(),
            None => std::mem::take(&mut self.spare),
        };
        buffer.clear();
        self.writer = Some(Self::open_writer(buffer, self.quality, self.window_log));
    }

    fn is_finished(&self) -> bool {
        self.writer.is_none()
    }
}

/// A Brotli decompression session.
pub struct BrotliChunkDecompressor {
    state: BrotliState<StandardAlloc, StandardAlloc, StandardAlloc>,
    scratch: Vec<u8>,
    total_in: u64,
    finished: bool,
    failed: bool,
}

impl Default for BrotliChunkDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl BrotliChunkDecompressor {
    /// Create a new decompression session.
    pub fn new() -> Self {
        Self {
            state: Self::fresh_state(),
            scratch: vec![0u8; DECODE_BATCH_SIZE],
            total_in: 0,
            finished: false,
            failed: false,
        }
    }

    fn fresh_state() -> BrotliState<StandardAlloc, StandardAlloc, StandardAlloc> {
        BrotliState::new(
            StandardAlloc::default(),
            StandardAlloc::default(),
            StandardAlloc::default(),
        )
    }

    /// Compressed bytes consumed since construction or the last reset.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }
}

impl ChunkDecompressor for BrotliChunkDecompressor {
    fn decompress_chunk(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
    ) -> Result<(usize, DecompressStatus)> {
        if self.failed {
            return Err(OxiBrotliError::corrupted(
                self.total_in,
                "decoder already failed on corrupt input",
            ));
        }
        if self.finished {
            return Ok((0, DecompressStatus::Done));
        }

        let mut available_in = input.len();
        let mut input_offset = 0usize;
        let mut total_out = 0usize;
        let mut available_out = self.scratch.len();
        let mut output_offset = 0usize;
        let result = BrotliDecompressStream(
            &mut available_in,
            &mut input_offset,
            input,
            &mut available_out,
            &mut output_offset,
            &mut self.scratch,
            &mut total_out,
            &mut self.state,
        );
        output.extend_from_slice(&self.scratch[..output_offset]);
        self.total_in += input_offset as u64;

        match result {
            BrotliResult::NeedsMoreOutput if output_offset > 0 => {
                trace!(
                    consumed = input_offset,
                    produced = output_offset,
                    "brotli output batch full"
                );
                Ok((input_offset, DecompressStatus::NeedsOutput))
            }
            BrotliResult::NeedsMoreOutput => {
                self.failed = true;
                Err(OxiBrotliError::corrupted(
                    self.total_in,
                    "decoder made no progress",
                ))
            }
            BrotliResult::NeedsMoreInput => {
                trace!(
                    consumed = input_offset,
                    produced = output_offset,
                    "brotli needs input"
                );
                Ok((input_offset, DecompressStatus::NeedsInput))
            }
            BrotliResult::ResultSuccess => {
                self.finished = true;
                trace!(
                    consumed = input_offset,
                    produced = output_offset,
                    "brotli stream end"
                );
                Ok((input_offset, DecompressStatus::Done))
            }
            BrotliResult::ResultFailure => {
                self.failed = true;
                Err(OxiBrotliError::corrupted(
                    self.total_in,
                    "invalid brotli stream",
                ))
            }
        }
    }

    /// Start a new stream. The scratch buffer is kept; the decoder state is
    /// rebuilt because `BrotliState` has no in-place reset.
    fn reset(&mut self) {
        self.state = Self::fresh_state();
        self.total_in = 0;
        self.finished = false;
        self.failed = false;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
