//! Image encoding.

use alloc::borrow::Cow;
use alloc::format;
use alloc::vec::Vec;

use crate::codecs::NativeEngine;
use crate::config::{ColorSpace, DecodingSpeed, EncodeOptions, EncodeSettings};
use crate::engine::CodecEngine;
use crate::{Bitmap, JxlError};

/// Image encode request builder.
///
/// # Example
///
/// ```no_run
/// use jxlcoder::{Bitmap, ColorSpace, EncodeRequest};
/// use jxlcoder::pixel::{ImgVec, Rgba};
///
/// let pixels = ImgVec::new(vec![Rgba { r: 0u8, g: 0, b: 0, a: 255 }; 100 * 100], 100, 100);
/// let jxl = EncodeRequest::new()
///     .with_color_space(ColorSpace::Rgba)
///     .with_quality(85)
///     .encode(&Bitmap::from_rgba8(pixels))?;
/// # Ok::<(), jxlcoder::JxlError>(())
/// ```
#[derive(Clone, Copy, Default)]
pub struct EncodeRequest<'a> {
    options: EncodeOptions,
    engine: Option<&'a dyn CodecEngine>,
}

impl<'a> EncodeRequest<'a> {
    /// Encode with default options: RGB, lossy at distance 1.0, effort 7.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all encode options at once.
    pub fn with_options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.options = self.options.with_color_space(color_space);
        self
    }

    /// Request lossless encoding. Quality and distance are then ignored.
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.options = self.options.with_lossless(lossless);
        self
    }

    /// Set quality (0-100). Mutually exclusive with distance.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.options = self.options.with_quality(quality);
        self
    }

    /// Set butteraugli distance (0-15). Mutually exclusive with quality.
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.options = self.options.with_distance(distance);
        self
    }

    /// Set encoding effort (1-9).
    pub fn with_effort(mut self, effort: u8) -> Self {
        self.options = self.options.with_effort(effort);
        self
    }

    pub fn with_decoding_speed(mut self, speed: DecodingSpeed) -> Self {
        self.options = self.options.with_decoding_speed(speed);
        self
    }

    /// Use a specific engine instead of [`NativeEngine`].
    pub fn with_engine(mut self, engine: &'a dyn CodecEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Encode `bitmap` to JXL bytes.
    pub fn encode(self, bitmap: &Bitmap) -> Result<Vec<u8>, JxlError> {
        let settings = self.options.resolve()?;
        let shaped = prepare(bitmap, &settings)?;
        tracing::debug!(
            width = shaped.width(),
            height = shaped.height(),
            bit_depth = shaped.bit_depth(),
            ?settings,
            "encoding jxl"
        );
        self.engine
            .unwrap_or(&NativeEngine)
            .encode(&shaped, &settings)
    }
}

/// Encode `bitmap` with `options` using the native engine.
pub fn encode(bitmap: &Bitmap, options: &EncodeOptions) -> Result<Vec<u8>, JxlError> {
    EncodeRequest::new().with_options(*options).encode(bitmap)
}

/// Check dimensions and match the bitmap's channels to the requested colour
/// space. Bit depth is kept.
pub(crate) fn prepare<'b>(
    bitmap: &'b Bitmap,
    settings: &EncodeSettings,
) -> Result<Cow<'b, Bitmap>, JxlError> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(JxlError::Encode(format!(
            "cannot encode a {}x{} bitmap",
            bitmap.width(),
            bitmap.height()
        )));
    }
    let layout = settings.color_space.layout();
    if bitmap.layout() == layout {
        return Ok(Cow::Borrowed(bitmap));
    }
    if bitmap.has_alpha() {
        tracing::warn!("encoding RGBA bitmap as RGB, alpha channel dropped");
    }
    Ok(Cow::Owned(bitmap.clone().into_format(layout, bitmap.bit_depth())))
}
