//! # OxiBrotli Core
//!
//! Core components for the OxiBrotli streaming library.
//!
//! This crate provides the codec-independent pieces every stream session
//! needs:
//!
//! - [`error`]: The closed error taxonomy
//! - [`traits`]: Byte sink/source capabilities and the codec engine seam
//! - [`options`]: Validated encoder/decoder configuration
//! - [`session`]: Open/Closed lifecycle and endpoint rebinding
//! - `async_io`: Tokio adapters (feature `async-io`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Convenience                                         │
//! │     encode_all / decode_all, io::copy helpers           │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Stream sessions                                     │
//! │     BrotliEncoder (flush framing), BrotliDecoder        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     Errors, ByteSink/ByteSource, Session, Options       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L0: Codec engine                                        │
//! │     ChunkCompressor / ChunkDecompressor implementations │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxibrotli_core::options::EncoderOptions;
//! use oxibrotli_core::session::Session;
//!
//! let options = EncoderOptions::new(5).validate().unwrap();
//! assert_eq!(options.window_log, 22);
//!
//! let mut session = Session::open(Vec::<u8>::new());
//! session.close("close").unwrap();
//! assert!(session.ensure_open("write").is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod options;
pub mod session;
pub mod traits;

#[cfg(feature = "async-io")]
pub mod async_io;

// Re-exports for convenience
pub use error::{ErrorKind, OxiBrotliError, Result};
pub use options::{DecoderOptions, EncoderOptions};
pub use session::{Session, SessionState};
pub use traits::{
    ByteSink, ByteSource, ChunkCompressor, ChunkDecompressor, DecompressStatus, FlushMode,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorKind, OxiBrotliError, Result};
    pub use crate::options::{DecoderOptions, EncoderOptions};
    pub use crate::traits::{ByteSink, ByteSource, ChunkCompressor, ChunkDecompressor};
}
