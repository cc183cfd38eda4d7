//! Engine backends for format-specific implementations.
//!
//! Each module is a thin adapter between the facade's resolved settings and
//! one codec crate. [`NativeEngine`] dispatches to whichever are compiled in.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::bitmap::Bitmap;
use crate::config::{DecodePlan, EncodeSettings, JpegSettings};
use crate::engine::{AnimatedSequence, AnimationSource, CodecEngine};
use crate::{ImageInfo, JxlError};

#[cfg(feature = "jpeg")]
pub(crate) mod jpeg;

#[cfg(feature = "jxl-decode")]
pub(crate) mod jxl_dec;

#[cfg(feature = "jxl-encode")]
pub(crate) mod jxl_enc;

#[cfg(feature = "jxl-encode")]
pub(crate) mod jxl_anim;

/// The default engine: jxl-oxide for decoding, libjxl (via jpegxl-rs, and
/// jpegxl-sys for animations) for encoding, jpeg-encoder for JPEG output.
///
/// Operations whose backend feature is disabled return
/// [`JxlError::Unsupported`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeEngine;

impl CodecEngine for NativeEngine {
    fn probe(&self, data: &[u8]) -> Result<ImageInfo, JxlError> {
        #[cfg(feature = "jxl-decode")]
        return jxl_dec::probe(data);
        #[cfg(not(feature = "jxl-decode"))]
        {
            let _ = data;
            Err(JxlError::Unsupported("jxl-decode"))
        }
    }

    fn decode(&self, data: &[u8], plan: &DecodePlan) -> Result<Bitmap, JxlError> {
        #[cfg(feature = "jxl-decode")]
        return jxl_dec::decode(data, plan);
        #[cfg(not(feature = "jxl-decode"))]
        {
            let _ = (data, plan);
            Err(JxlError::Unsupported("jxl-decode"))
        }
    }

    fn encode(&self, bitmap: &Bitmap, settings: &EncodeSettings) -> Result<Vec<u8>, JxlError> {
        #[cfg(feature = "jxl-encode")]
        return jxl_enc::encode(bitmap, settings);
        #[cfg(not(feature = "jxl-encode"))]
        {
            let _ = (bitmap, settings);
            Err(JxlError::Unsupported("jxl-encode"))
        }
    }

    fn open_animation(&self, data: &[u8]) -> Result<Box<dyn AnimationSource>, JxlError> {
        #[cfg(feature = "jxl-decode")]
        return jxl_dec::open_animation(data);
        #[cfg(not(feature = "jxl-decode"))]
        {
            let _ = data;
            Err(JxlError::Unsupported("jxl-decode"))
        }
    }

    fn encode_animation(
        &self,
        sequence: &AnimatedSequence,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, JxlError> {
        #[cfg(feature = "jxl-encode")]
        return jxl_anim::encode(sequence, settings);
        #[cfg(not(feature = "jxl-encode"))]
        {
            let _ = (sequence, settings);
            Err(JxlError::Unsupported("jxl-encode"))
        }
    }

    fn jpeg_to_jxl(&self, jpeg: &[u8]) -> Result<Vec<u8>, JxlError> {
        #[cfg(feature = "jxl-encode")]
        return jxl_enc::recompress_jpeg(jpeg);
        #[cfg(not(feature = "jxl-encode"))]
        {
            let _ = jpeg;
            Err(JxlError::Unsupported("jxl-encode"))
        }
    }

    fn jxl_to_jpeg(&self, jxl: &[u8]) -> Result<Vec<u8>, JxlError> {
        #[cfg(feature = "jxl-decode")]
        return jxl_dec::reconstruct_jpeg(jxl);
        #[cfg(not(feature = "jxl-decode"))]
        {
            let _ = jxl;
            Err(JxlError::Unsupported("jxl-decode"))
        }
    }

    fn encode_jpeg(&self, bitmap: &Bitmap, settings: &JpegSettings) -> Result<Vec<u8>, JxlError> {
        #[cfg(feature = "jpeg")]
        return jpeg::encode(bitmap, settings);
        #[cfg(not(feature = "jpeg"))]
        {
            let _ = (bitmap, settings);
            Err(JxlError::Unsupported("jpeg"))
        }
    }
}
