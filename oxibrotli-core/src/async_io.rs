//! Async I/O support for OxiBrotli streams.
//!
//! Wraps any [`ChunkCompressor`] / [`ChunkDecompressor`] so it can pump data
//! between Tokio's `AsyncRead` and `AsyncWrite`. Termination rules match the
//! synchronous decoder: input ending before the end-of-stream marker is
//! corrupt, bytes after it are trailing data.
//!
//! Timeouts are left to the caller, e.g. `tokio::time::timeout` around the
//! returned future.
//!
//! # Feature Flag
//!
//! This module is only available when the `async-io` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! oxibrotli-core = { version = "0.1.0", features = ["async-io"] }
//! ```

use crate::error::{OxiBrotliError, Result};
use crate::traits::{ChunkCompressor, ChunkDecompressor, DecompressStatus, FlushMode};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// Default buffer size for async operations (32KB).
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// An async wrapper around a synchronous compressor.
pub struct AsyncCompressorWrapper<C> {
    inner: C,
    input_buffer: Vec<u8>,
    output_buffer: Vec<u8>,
    sync_flush: bool,
}

impl<C: ChunkCompressor> AsyncCompressorWrapper<C> {
    /// Create a new async compressor wrapper with default buffer size.
    pub fn new(compressor: C) -> Self {
        Self::with_buffer_size(compressor, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new async compressor wrapper with a custom buffer size.
    pub fn with_buffer_size(compressor: C, buffer_size: usize) -> Self {
        Self {
            inner: compressor,
            input_buffer: vec![0u8; buffer_size.max(1)],
            output_buffer: Vec::new(),
            sync_flush: false,
        }
    }

    /// Sync-flush after every read so the peer can decode each chunk as it
    /// arrives.
    #[must_use]
    pub fn sync_flush(mut self, enabled: bool) -> Self {
        self.sync_flush = enabled;
        self
    }

    /// Get a reference to the inner compressor.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Get a mutable reference to the inner compressor.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Consume the wrapper and return the inner compressor.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Reset the compressor to its initial state.
    pub fn reset(&mut self) {
        self.inner.reset();
        self.output_buffer.clear();
    }

    /// Compress everything `input` yields into `output`, finishing the stream
    /// at end of input.
    ///
    /// # Returns
    ///
    /// The total number of bytes written to the output.
    pub async fn compress_async<R, W>(&mut self, input: &mut R, output: &mut W) -> Result<usize>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut total_written = 0usize;

        loop {
            let bytes_read = input.read(&mut self.input_buffer).await?;
            let flush = match bytes_read {
                0 => FlushMode::Finish,
                _ if self.sync_flush => FlushMode::Sync,
                _ => FlushMode::None,
            };

            self.output_buffer.clear();
            self.inner.compress_chunk(
                &self.input_buffer[..bytes_read],
                flush,
                &mut self.output_buffer,
            )?;
            trace!(bytes_read, produced = self.output_buffer.len(), "async compress step");

            if !self.output_buffer.is_empty() {
                output.write_all(&self.output_buffer).await?;
                total_written += self.output_buffer.len();
            }
            if flush != FlushMode::None {
                output.flush().await?;
            }
            if flush == FlushMode::Finish {
                debug!(total_written, "async compression finished");
                return Ok(total_written);
            }
        }
    }
}

/// An async wrapper around a synchronous decompressor.
pub struct AsyncDecompressorWrapper<D> {
    inner: D,
    input_buffer: Vec<u8>,
    output_buffer: Vec<u8>,
}

impl<D: ChunkDecompressor> AsyncDecompressorWrapper<D> {
    /// Create a new async decompressor wrapper with default buffer size.
    pub fn new(decompressor: D) -> Self {
        Self::with_buffer_size(decompressor, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new async decompressor wrapper with a custom buffer size.
    pub fn with_buffer_size(decompressor: D, buffer_size: usize) -> Self {
        Self {
            inner: decompressor,
            input_buffer: vec![0u8; buffer_size.max(1)],
            output_buffer: Vec::new(),
        }
    }

    /// Get a reference to the inner decompressor.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Get a mutable reference to the inner decompressor.
    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    /// Consume the wrapper and return the inner decompressor.
    pub fn into_inner(self) -> D {
        self.inner
    }

    /// Reset the decompressor to its initial state.
    pub fn reset(&mut self) {
        self.inner.reset();
        self.output_buffer.clear();
    }

    /// Decompress one stream from `input` into `output`.
    ///
    /// Decoded bytes are written as soon as each read is decoded, so a
    /// sync-flushed peer is followed without waiting for the end marker.
    ///
    /// # Returns
    ///
    /// The total number of bytes written to the output.
    pub async fn decompress_async<R, W>(&mut self, input: &mut R, output: &mut W) -> Result<usize>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut total_written = 0usize;
        let mut total_in = 0u64;
        let mut start = 0usize;
        let mut end = 0usize;
        let mut has_output = false;

        loop {
            if start == end && !has_output {
                start = 0;
                end = input.read(&mut self.input_buffer).await?;
                if end == 0 {
                    return Err(OxiBrotliError::corrupted(
                        total_in,
                        "unexpected end of input before end of stream",
                    ));
                }
            }

            self.output_buffer.clear();
            let (consumed, status) = self
                .inner
                .decompress_chunk(&self.input_buffer[start..end], &mut self.output_buffer)?;
            start += consumed;
            total_in += consumed as u64;
            has_output = status == DecompressStatus::NeedsOutput;

            if !self.output_buffer.is_empty() {
                output.write_all(&self.output_buffer).await?;
                output.flush().await?;
                total_written += self.output_buffer.len();
            }

            match status {
                DecompressStatus::Done => {
                    if start < end {
                        return Err(OxiBrotliError::trailing_data(total_in));
                    }
                    if input.read(&mut self.input_buffer).await? > 0 {
                        return Err(OxiBrotliError::trailing_data(total_in));
                    }
                    debug!(total_written, "async decompression finished");
                    return Ok(total_written);
                }
                DecompressStatus::NeedsInput if start < end => {
                    return Err(OxiBrotliError::corrupted(
                        total_in,
                        "decoder stalled on buffered input",
                    ));
                }
                DecompressStatus::NeedsInput | DecompressStatus::NeedsOutput => {
                    trace!(consumed, ?status, "async decompress step");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    const BLOCK: u8 = 1;
    const END: u8 = 0;

    /// Stored-block codec: `BLOCK len:u32be data` per chunk, `END` to finish.
    struct StoredCompressor {
        finished: bool,
    }

    impl ChunkCompressor for StoredCompressor {
        fn compress_chunk(
            &mut self,
            input: &[u8],
            flush: FlushMode,
            output: &mut Vec<u8>,
        ) -> Result<()> {
            if !input.is_empty() {
                output.push(BLOCK);
                output.extend_from_slice(&(input.len() as u32).to_be_bytes());
                output.extend_from_slice(input);
            }
            if flush == FlushMode::Finish {
                output.push(END);
                self.finished = true;
            }
            Ok(())
        }

        fn reset(&mut self) {
            self.finished = false;
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    /// Decoder for the stored codec that hands out at most `batch` bytes per call.
    struct StoredDecompressor {
        pending: Vec<u8>,
        ready: Vec<u8>,
        batch: usize,
        saw_end: bool,
        finished: bool,
    }

    impl StoredDecompressor {
        fn new() -> Self {
            Self::batched(usize::MAX)
        }

        fn batched(batch: usize) -> Self {
            Self {
                pending: Vec::new(),
                ready: Vec::new(),
                batch,
                saw_end: false,
                finished: false,
            }
        }

        fn parse(&mut self, input: &[u8]) -> Result<usize> {
            let start = self.pending.len();
            self.pending.extend_from_slice(input);
            let mut pos = 0;
            while pos < self.pending.len() {
                match self.pending[pos] {
                    END => {
                        self.saw_end = true;
                        let consumed = (pos + 1).saturating_sub(start);
                        self.pending.clear();
                        return Ok(consumed);
                    }
                    BLOCK => {
                        if pos + 5 > self.pending.len() {
                            break;
                        }
                        let mut len = [0u8; 4];
                        len.copy_from_slice(&self.pending[pos + 1..pos + 5]);
                        let len = u32::from_be_bytes(len) as usize;
                        if pos + 5 + len > self.pending.len() {
                            break;
                        }
                        self.ready
                            .extend_from_slice(&self.pending[pos + 5..pos + 5 + len]);
                        pos += 5 + len;
                    }
                    other => {
                        return Err(OxiBrotliError::corrupted(
                            pos as u64,
                            format!("unknown block type {other}"),
                        ));
                    }
                }
            }
            self.pending.drain(..pos);
            Ok(input.len())
        }
    }

    impl ChunkDecompressor for StoredDecompressor {
        fn decompress_chunk(
            &mut self,
            input: &[u8],
            output: &mut Vec<u8>,
        ) -> Result<(usize, DecompressStatus)> {
            if self.finished {
                return Ok((0, DecompressStatus::Done));
            }
            // Output is handed out before more input is accepted.
            let consumed = if self.ready.is_empty() && !self.saw_end {
                self.parse(input)?
            } else {
                0
            };

            let n = self.ready.len().min(self.batch);
            output.extend(self.ready.drain(..n));
            if !self.ready.is_empty() {
                Ok((consumed, DecompressStatus::NeedsOutput))
            } else if self.saw_end {
                self.finished = true;
                Ok((consumed, DecompressStatus::Done))
            } else {
                Ok((consumed, DecompressStatus::NeedsInput))
            }
        }

        fn reset(&mut self) {
            self.pending.clear();
            self.ready.clear();
            self.saw_end = false;
            self.finished = false;
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    /// Claims to need input without taking any.
    struct StuckDecompressor;

    impl ChunkDecompressor for StuckDecompressor {
        fn decompress_chunk(
            &mut self,
            _input: &[u8],
            _output: &mut Vec<u8>,
        ) -> Result<(usize, DecompressStatus)> {
            Ok((0, DecompressStatus::NeedsInput))
        }

        fn reset(&mut self) {}

        fn is_finished(&self) -> bool {
            false
        }
    }

    async fn compress(data: &[u8]) -> Vec<u8> {
        let mut wrapper = AsyncCompressorWrapper::with_buffer_size(
            StoredCompressor { finished: false },
            7,
        );
        let mut input = Cursor::new(data.to_vec());
        let mut output = Vec::new();
        let written = wrapper
            .compress_async(&mut input, &mut output)
            .await
            .expect("compress failed");
        assert_eq!(written, output.len());
        assert!(wrapper.inner().is_finished());
        output
    }

    #[tokio::test]
    async fn test_async_roundtrip() {
        let data = b"Hello, async world! ".repeat(20);
        let compressed = compress(&data).await;

        let mut wrapper = AsyncDecompressorWrapper::with_buffer_size(StoredDecompressor::new(), 5);
        let mut output = Vec::new();
        let written = wrapper
            .decompress_async(&mut Cursor::new(compressed), &mut output)
            .await
            .expect("decompress failed");
        assert_eq!(written, data.len());
        assert_eq!(output, data);
    }

    #[tokio::test]
    async fn test_async_batched_output() {
        let data = b"batched output ".repeat(30);
        let compressed = compress(&data).await;

        // The whole stream arrives in one read; output comes out 16 bytes at a time.
        let mut wrapper = AsyncDecompressorWrapper::new(StoredDecompressor::batched(16));
        let mut output = Vec::new();
        let written = wrapper
            .decompress_async(&mut Cursor::new(compressed), &mut output)
            .await
            .expect("decompress failed");
        assert_eq!(written, data.len());
        assert_eq!(output, data);
    }

    #[tokio::test]
    async fn test_async_unconsumed_input_is_corrupt() {
        let mut wrapper = AsyncDecompressorWrapper::new(StuckDecompressor);
        let err = wrapper
            .decompress_async(&mut Cursor::new(vec![BLOCK, 0, 0]), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }

    #[tokio::test]
    async fn test_async_empty_input() {
        let compressed = compress(b"").await;
        assert_eq!(compressed, vec![END]);

        let mut wrapper = AsyncDecompressorWrapper::new(StoredDecompressor::new());
        let mut output = Vec::new();
        let written = wrapper
            .decompress_async(&mut Cursor::new(compressed), &mut output)
            .await
            .expect("decompress failed");
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_async_truncated_input() {
        let mut compressed = compress(b"some data").await;
        compressed.pop();

        let mut wrapper = AsyncDecompressorWrapper::new(StoredDecompressor::new());
        let err = wrapper
            .decompress_async(&mut Cursor::new(compressed), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }

    #[tokio::test]
    async fn test_async_trailing_data() {
        let mut compressed = compress(b"some data").await;
        compressed.push(0xAA);

        let mut wrapper = AsyncDecompressorWrapper::new(StoredDecompressor::new());
        let err = wrapper
            .decompress_async(&mut Cursor::new(compressed), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TrailingData);
    }

    #[tokio::test]
    async fn test_async_trailing_data_in_later_read() {
        let compressed = compress(b"abc").await;
        let stream_len = compressed.len();
        let mut padded = compressed;
        padded.extend_from_slice(&[7u8; 4]);

        // Buffer ends exactly at the end marker, so the excess arrives later.
        let mut wrapper =
            AsyncDecompressorWrapper::with_buffer_size(StoredDecompressor::new(), stream_len);
        let err = wrapper
            .decompress_async(&mut Cursor::new(padded), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OxiBrotliError::TrailingData { offset } if offset == stream_len as u64));
    }

    #[tokio::test]
    async fn test_async_sync_flush_over_duplex() {
        let (mut producer, mut consumer) = tokio::io::duplex(64);
        let mut compressor =
            AsyncCompressorWrapper::new(StoredCompressor { finished: false }).sync_flush(true);

        let writer = tokio::spawn(async move {
            let mut input = Cursor::new(b"streamed through a duplex pipe".to_vec());
            compressor
                .compress_async(&mut input, &mut producer)
                .await
                .expect("compress failed")
        });

        let mut decompressor = AsyncDecompressorWrapper::new(StoredDecompressor::new());
        let mut output = Vec::new();
        let decoded = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            decompressor.decompress_async(&mut consumer, &mut output),
        )
        .await
        .expect("timed out")
        .expect("decompress failed");

        writer.await.expect("writer task panicked");
        assert_eq!(decoded, output.len());
        assert_eq!(output, b"streamed through a duplex pipe");
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let mut wrapper = AsyncDecompressorWrapper::new(StoredDecompressor::new());
        let first = compress(b"one").await;
        let mut output = Vec::new();
        wrapper
            .decompress_async(&mut Cursor::new(first), &mut output)
            .await
            .expect("decompress failed");
        assert!(wrapper.inner().is_finished());

        wrapper.reset();
        assert!(!wrapper.inner().is_finished());

        let second = compress(b"two").await;
        output.clear();
        wrapper
            .decompress_async(&mut Cursor::new(second), &mut output)
            .await
            .expect("decompress after reset failed");
        assert_eq!(output, b"two");
    }
}
