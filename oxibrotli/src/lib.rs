//! # OxiBrotli: Streaming Brotli Compression
//!
//! A streaming encoder/decoder pair over the Brotli format with explicit
//! flush framing.
//!
//! ## Features
//!
//! - **Segments**: every [`BrotliEncoder::flush`] emits a decodable prefix,
//!   so a consumer on the other end of a pipe sees each chunk as soon as it
//!   is flushed
//! - **Strict decoding**: truncated input, corrupt input and bytes after the
//!   end-of-stream marker are errors, never silently accepted
//! - **Reusable sessions**: `reset` rebinds an encoder or decoder to a new
//!   sink/source and behaves exactly like a fresh instance
//! - **Generic transports**: anything implementing `std::io::Write` or
//!   `std::io::Read` works as a sink or source
//!
//! ## Example
//!
//! ```rust
//! use oxibrotli::{BrotliDecoder, BrotliEncoder, EncoderOptions};
//!
//! let mut encoder = BrotliEncoder::new(Vec::new(), EncoderOptions::new(5)).unwrap();
//! encoder.write(b"first").unwrap();
//! encoder.flush().unwrap();
//!
//! // The flushed prefix decodes on its own.
//! let prefix = encoder.get_ref().clone();
//! let mut decoder = BrotliDecoder::new(&prefix[..]);
//! let mut buf = [0u8; 5];
//! assert_eq!(decoder.read(&mut buf).unwrap(), 5);
//! assert_eq!(&buf, b"first");
//!
//! encoder.write(b" second").unwrap();
//! let stream = encoder.finish().unwrap();
//! assert_eq!(oxibrotli::decode_all(&stream).unwrap(), b"first second");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod decoder;
mod encoder;
pub mod engine;

pub use decoder::BrotliDecoder;
pub use encoder::BrotliEncoder;
pub use engine::{BrotliChunkCompressor, BrotliChunkDecompressor};
pub use oxibrotli_core::options::{
    BEST_COMPRESSION, BEST_SPEED, DEFAULT_QUALITY, DEFAULT_WINDOW_LOG, MAX_WINDOW_LOG,
    MIN_WINDOW_LOG,
};
pub use oxibrotli_core::{
    ByteSink, ByteSource, DecoderOptions, EncoderOptions, ErrorKind, FlushMode, OxiBrotliError,
    Result,
};

#[cfg(feature = "async-io")]
pub use oxibrotli_core::async_io::{AsyncCompressorWrapper, AsyncDecompressorWrapper};

/// Compress `data` into one complete stream.
///
/// # Example
///
/// ```rust
/// use oxibrotli::{EncoderOptions, encode_all};
///
/// let data = b"<html><body><H1>Hello world</H1></body></html>".repeat(10);
/// let compressed = encode_all(&data, &EncoderOptions::new(5)).unwrap();
/// assert!(compressed.len() < data.len() / 2);
/// ```
pub fn encode_all(data: &[u8], options: &EncoderOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encoder::encode_into(data, options, &mut out)?;
    Ok(out)
}

/// Decompress one complete stream.
///
/// Fails with [`OxiBrotliError::TrailingData`] if `data` continues past the
/// end-of-stream marker and with [`OxiBrotliError::CorruptedData`] if it
/// ends before it.
pub fn decode_all(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = BrotliDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Compress everything `reader` yields into `sink`, closing the stream.
///
/// Returns the sink and the number of uncompressed bytes read.
pub fn encode_reader<R, S>(reader: &mut R, sink: S, options: &EncoderOptions) -> Result<(S, u64)>
where
    R: ByteSource + ?Sized,
    S: ByteSink,
{
    let mut encoder = BrotliEncoder::new(sink, *options)?;
    let mut chunk = vec![0u8; options.buffer_size.clamp(1, 64 * 1024)];
    let mut total = 0u64;
    loop {
        let n = reader.read_some(&mut chunk)?;
        if n == 0 {
            break;
        }
        encoder.write(&chunk[..n])?;
        total += n as u64;
    }
    Ok((encoder.finish()?, total))
}

/// Decompress one stream from `source` into `writer`.
///
/// Returns the number of decompressed bytes written.
pub fn decode_reader<R, W>(source: R, writer: &mut W) -> Result<u64>
where
    R: ByteSource,
    W: ByteSink + ?Sized,
{
    let mut decoder = BrotliDecoder::new(source);
    let mut chunk = vec![0u8; 32 * 1024];
    let mut total = 0u64;
    loop {
        let n = decoder.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        writer.write_all_bytes(&chunk[..n])?;
        total += n as u64;
    }
    writer.flush_sink()?;
    Ok(total)
}
