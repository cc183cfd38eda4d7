//! # jxlcoder
//!
//! JPEG XL codec facade: sniff, decode, encode, animate, and losslessly
//! transcode JPEG. The codec work itself happens in an engine
//! ([`CodecEngine`]); [`NativeEngine`] wires up the feature-gated backends.
//!
//! ```toml
//! [dependencies]
//! jxlcoder = { version = "0.1", features = ["jxl-decode", "jxl-encode"] }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jxlcoder::{ColorSpace, DecodeRequest, EncodeRequest, PixelFormat, ResampleFilter};
//!
//! let data: &[u8] = &[]; // your JXL bytes
//! if jxlcoder::is_jxl(data) {
//!     let thumb = DecodeRequest::new(data)
//!         .with_rescale(320, 240)
//!         .with_filter(ResampleFilter::Mitchell)
//!         .with_pixel_format(PixelFormat::Rgba8)
//!         .decode()?;
//!
//!     let jxl = EncodeRequest::new()
//!         .with_color_space(ColorSpace::Rgba)
//!         .with_quality(85)
//!         .encode(&thumb)?;
//! }
//! # Ok::<(), jxlcoder::JxlError>(())
//! ```
//!
//! Requests use [`NativeEngine`] unless given another engine with
//! `with_engine`. Engines are stateless and can be shared across threads.

#![deny(unsafe_code)]

extern crate alloc;

mod animation;
mod bitmap;
pub mod codecs;
mod config;
mod decode;
mod encode;
mod engine;
mod error;
mod format;
mod info;
mod jpeg;
mod limits;
pub mod pixel;
mod resample;
mod transcode;

#[cfg(test)]
mod test_engine;

pub use animation::{AnimatedDecoder, AnimatedEncoder, Frames};
pub use bitmap::{Bitmap, ChannelLayout, PixelData};
pub use codecs::NativeEngine;
pub use config::{
    quality_to_distance, AnimationOptions, ColorSpace, Compression, DecodeOptions, DecodePlan,
    DecodingSpeed, EncodeOptions, EncodeSettings, JpegSettings, PixelFormat, ResampleFilter,
    Resize, Size, DEFAULT_DISTANCE, DEFAULT_JPEG_QUALITY,
};
pub use decode::{decode, probe, size, DecodeRequest, Source};
pub use encode::{encode, EncodeRequest};
pub use engine::{
    AnimatedSequence, AnimationFrame, AnimationInfo, AnimationSource, CodecEngine,
    ANIMATION_TICKS_PER_SECOND,
};
pub use error::JxlError;
pub use format::{
    is_jpeg, is_jxl, is_jxl_extension, require_jxl, JxlSignature, CODESTREAM_MAGIC,
    CONTAINER_MAGIC,
};
pub use info::ImageInfo;
pub use jpeg::{encode as encode_jpeg, encode_default as encode_jpeg_default, JpegRequest};
pub use limits::Limits;
pub use resample::resample;
pub use transcode::{inverse, inverse_with, transcode, transcode_with};
