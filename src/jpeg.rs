//! Direct bitmap to JPEG encoding.

use alloc::vec::Vec;

use crate::codecs::NativeEngine;
use crate::config::{JpegSettings, DEFAULT_JPEG_QUALITY};
use crate::engine::CodecEngine;
use crate::{Bitmap, JxlError};

/// JPEG encode request builder.
///
/// JPEG has no alpha channel; RGBA bitmaps are flattened by dropping alpha.
///
/// ```no_run
/// use jxlcoder::{Bitmap, JpegRequest};
/// use jxlcoder::pixel::{ImgVec, Rgb};
///
/// let bitmap = Bitmap::from_rgb8(ImgVec::new(vec![Rgb::new(10u8, 20, 30); 64], 8, 8));
/// let jpeg = JpegRequest::new().with_quality(90).encode(&bitmap)?;
/// # Ok::<(), jxlcoder::JxlError>(())
/// ```
#[derive(Clone, Copy, Default)]
pub struct JpegRequest<'a> {
    settings: JpegSettings,
    engine: Option<&'a dyn CodecEngine>,
}

impl<'a> JpegRequest<'a> {
    /// Quality 81, extended colour transform, progressive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Passed to the backend, which clamps it to its own range.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.settings.quality = quality;
        self
    }

    pub fn with_extended_color_transform(mut self, enabled: bool) -> Self {
        self.settings.extended_color_transform = enabled;
        self
    }

    pub fn with_progressive(mut self, progressive: bool) -> Self {
        self.settings.progressive = progressive;
        self
    }

    /// Use a specific engine instead of [`NativeEngine`].
    pub fn with_engine(mut self, engine: &'a dyn CodecEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn encode(self, bitmap: &Bitmap) -> Result<Vec<u8>, JxlError> {
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(JxlError::Encode(alloc::format!(
                "cannot encode a {}x{} bitmap",
                bitmap.width(),
                bitmap.height()
            )));
        }
        if bitmap.has_alpha() {
            tracing::debug!("jpeg output drops the alpha channel");
        }
        tracing::debug!(settings = ?self.settings, "encoding jpeg");
        self.engine
            .unwrap_or(&NativeEngine)
            .encode_jpeg(bitmap, &self.settings)
    }
}

/// Encode `bitmap` as JPEG with the native engine.
pub fn encode(
    bitmap: &Bitmap,
    quality: u8,
    use_extended_color_transform: bool,
) -> Result<Vec<u8>, JxlError> {
    JpegRequest::new()
        .with_quality(quality)
        .with_extended_color_transform(use_extended_color_transform)
        .encode(bitmap)
}

/// [`encode`] at the default quality.
pub fn encode_default(bitmap: &Bitmap) -> Result<Vec<u8>, JxlError> {
    encode(bitmap, DEFAULT_JPEG_QUALITY, true)
}
