//! Unified error type for codec operations.

use std::path::PathBuf;

use alloc::string::{String, ToString};

/// Unified error type for every facade operation.
///
/// Sniffing and decoding are kept apart: [`JxlError::NotJxl`] means the bytes
/// are some other format, [`JxlError::Decode`] means they looked like JXL but
/// the engine could not decode them.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JxlError {
    /// A path source could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Input was required to be JXL but does not carry a JXL signature.
    #[error("input is not a JPEG XL image")]
    NotJxl,
    /// Malformed, truncated or unsupported codestream.
    #[error("decode failed: {0}")]
    Decode(String),
    /// Invalid bitmap, invalid option combination, or engine rejection.
    #[error("encode failed: {0}")]
    Encode(String),
    /// Animated frame access beyond the frame count.
    #[error("frame index {index} out of range (frame count {count})")]
    FrameIndexOutOfRange { index: usize, count: usize },
    /// Invalid JPEG input, or JXL without JPEG reconstruction data.
    #[error("transcode failed: {0}")]
    Transcode(String),
    /// An animated encoder was used after `finish()`.
    #[error("animated encoder already finished")]
    EncoderAlreadyFinished,
    /// The operation needs an engine backend that is not compiled in.
    #[error("{0} (backend not compiled in)")]
    Unsupported(&'static str),
}

// Conversion helpers for engine-specific errors
impl JxlError {
    /// Wrap an engine decode error.
    pub fn decode(error: impl core::fmt::Display) -> Self {
        JxlError::Decode(error.to_string())
    }

    /// Wrap an engine encode error.
    pub fn encode(error: impl core::fmt::Display) -> Self {
        JxlError::Encode(error.to_string())
    }

    /// Wrap an engine transcode error.
    pub fn transcode(error: impl core::fmt::Display) -> Self {
        JxlError::Transcode(error.to_string())
    }
}
