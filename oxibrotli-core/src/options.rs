//! Encoder and decoder configuration.
//!
//! Options are plain values; [`EncoderOptions::validate`] and
//! [`DecoderOptions::validate`] check them once, at construction, and reject
//! anything outside the documented ranges instead of clamping it.

use crate::error::{OxiBrotliError, Result};

/// Fastest quality setting.
pub const BEST_SPEED: u32 = 0;
/// Densest quality setting.
pub const BEST_COMPRESSION: u32 = 11;
/// Quality used when none is given.
pub const DEFAULT_QUALITY: u32 = 11;

/// Smallest accepted window size (log2 bytes).
pub const MIN_WINDOW_LOG: u32 = 10;
/// Largest accepted window size (log2 bytes).
pub const MAX_WINDOW_LOG: u32 = 24;
/// Window size (log2 bytes) used when none is given, 4 MiB.
pub const DEFAULT_WINDOW_LOG: u32 = 22;

/// Input bytes buffered before the encoder hands them to the codec engine.
pub const DEFAULT_ENCODER_BUFFER_SIZE: usize = 64 * 1024;
/// Bytes pulled from the source per read.
pub const DEFAULT_DECODER_BUFFER_SIZE: usize = 32 * 1024;

/// Encoder configuration.
///
/// A `window_log` of `0` is a sentinel meaning [`DEFAULT_WINDOW_LOG`]; it is
/// resolved by [`validate`](Self::validate). No other value is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncoderOptions {
    /// Compression quality, `0..=11`. Higher is smaller but slower.
    pub quality: u32,
    /// Log2 of the sliding window size, `10..=24`, or `0` for the default.
    pub window_log: u32,
    /// Number of input bytes buffered before compression is driven.
    pub buffer_size: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            window_log: DEFAULT_WINDOW_LOG,
            buffer_size: DEFAULT_ENCODER_BUFFER_SIZE,
        }
    }
}

impl EncoderOptions {
    /// Options with the given quality and defaults for everything else.
    pub fn new(quality: u32) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }

    /// Set the quality.
    #[must_use]
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    /// Set the window size (log2 bytes).
    #[must_use]
    pub fn with_window_log(mut self, window_log: u32) -> Self {
        self.window_log = window_log;
        self
    }

    /// Set the input buffer threshold.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Window size in bytes.
    ///
    /// Fails like [`validate`](Self::validate) for out-of-range options.
    pub fn window_size(&self) -> Result<usize> {
        let resolved = self.validate()?;
        Ok(1usize << resolved.window_log)
    }

    /// Check every field and return the resolved options.
    pub fn validate(self) -> Result<Self> {
        if self.quality > BEST_COMPRESSION {
            return Err(OxiBrotliError::invalid_option(
                "quality",
                self.quality,
                "0..=11",
            ));
        }

        let window_log = match self.window_log {
            0 => DEFAULT_WINDOW_LOG,
            log if (MIN_WINDOW_LOG..=MAX_WINDOW_LOG).contains(&log) => log,
            log => {
                return Err(OxiBrotliError::invalid_option(
                    "window_log",
                    log,
                    "10..=24, or 0 for the default",
                ));
            }
        };

        if self.buffer_size == 0 {
            return Err(OxiBrotliError::invalid_option(
                "buffer_size",
                0u64,
                "at least 1",
            ));
        }

        Ok(Self {
            window_log,
            ..self
        })
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecoderOptions {
    /// Bytes requested from the source per pull.
    pub buffer_size: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_DECODER_BUFFER_SIZE,
        }
    }
}

impl DecoderOptions {
    /// Set the source pull size.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Check every field and return the options unchanged.
    pub fn validate(self) -> Result<Self> {
        if self.buffer_size == 0 {
            return Err(OxiBrotliError::invalid_option(
                "buffer_size",
                0u64,
                "at least 1",
            ));
        }
        Ok(self)
    }
}
