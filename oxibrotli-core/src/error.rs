//! Error types for OxiBrotli stream sessions.
//!
//! Every failure an encoder or decoder can report resolves to one of five
//! kinds, so callers can tell a rejected configuration from bad data, API
//! misuse, or a broken transport and pick a retry policy per kind.

use std::fmt;
use std::io;
use thiserror::Error;

/// The main error type for OxiBrotli operations.
#[derive(Debug, Error)]
pub enum OxiBrotliError {
    /// An option was outside its documented range at construction.
    #[error("Invalid option: {name} = {value} (expected {expected})")]
    InvalidOption {
        /// Name of the rejected option.
        name: &'static str,
        /// The rejected value.
        value: u64,
        /// Human readable description of the accepted range.
        expected: &'static str,
    },

    /// The stream was already closed.
    #[error("Stream is closed: cannot {operation}")]
    ClosedStream {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// I/O error from the underlying sink or source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input does not parse as a valid compressed stream.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset into the compressed input where the problem was found.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Bytes remain after the end-of-stream marker.
    #[error("Trailing data after end of stream at offset {offset}")]
    TrailingData {
        /// Byte offset of the first excess byte.
        offset: u64,
    },
}

/// Result type alias for OxiBrotli operations.
pub type Result<T> = std::result::Result<T, OxiBrotliError>;

/// Closed classification of [`OxiBrotliError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad configuration.
    Validation,
    /// Bad usage: operation on a closed stream.
    ClosedStream,
    /// Transport failure.
    Io,
    /// Malformed compressed input.
    CorruptData,
    /// Excess input after the logical end of stream.
    TrailingData,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::ClosedStream => "closed stream",
            Self::Io => "i/o",
            Self::CorruptData => "corrupt data",
            Self::TrailingData => "trailing data",
        };
        f.write_str(name)
    }
}

impl OxiBrotliError {
    /// Create an invalid option error.
    pub fn invalid_option(name: &'static str, value: impl Into<u64>, expected: &'static str) -> Self {
        Self::InvalidOption {
            name,
            value: value.into(),
            expected,
        }
    }

    /// Create a closed stream error.
    pub fn closed_stream(operation: &'static str) -> Self {
        Self::ClosedStream { operation }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create a trailing data error.
    pub fn trailing_data(offset: u64) -> Self {
        Self::TrailingData { offset }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOption { .. } => ErrorKind::Validation,
            Self::ClosedStream { .. } => ErrorKind::ClosedStream,
            Self::Io(_) => ErrorKind::Io,
            Self::CorruptedData { .. } => ErrorKind::CorruptData,
            Self::TrailingData { .. } => ErrorKind::TrailingData,
        }
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// Only transport failures qualify; bad data stays bad.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Io
    }
}

impl Clone for OxiBrotliError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidOption {
                name,
                value,
                expected,
            } => Self::InvalidOption {
                name: *name,
                value: *value,
                expected: *expected,
            },
            Self::ClosedStream { operation } => Self::ClosedStream {
                operation: *operation,
            },
            // io::Error is not Clone; keep kind and message.
            Self::Io(err) => Self::Io(io::Error::new(err.kind(), err.to_string())),
            Self::CorruptedData { offset, message } => Self::CorruptedData {
                offset: *offset,
                message: message.clone(),
            },
            Self::TrailingData { offset } => Self::TrailingData { offset: *offset },
        }
    }
}

impl From<OxiBrotliError> for io::Error {
    fn from(err: OxiBrotliError) -> Self {
        match err {
            OxiBrotliError::Io(inner) => inner,
            OxiBrotliError::InvalidOption { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            OxiBrotliError::ClosedStream { .. } => io::Error::other(err),
            OxiBrotliError::CorruptedData { .. } | OxiBrotliError::TrailingData { .. } => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
        }
    }
}
