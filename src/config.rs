//! Decode and encode options.
//!
//! Each operation takes one options struct with documented defaults. Options
//! are validated as a whole before anything reaches the engine, and the
//! engine only ever sees the resolved forms ([`DecodePlan`],
//! [`EncodeSettings`], [`JpegSettings`]).

use alloc::format;

use crate::bitmap::ChannelLayout;
use crate::JxlError;

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// --- Decode ---

/// Output pixel format for decoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA if the image has alpha, otherwise RGB; 16-bit if the image
    /// stores more than 8 bits per sample, otherwise 8-bit.
    #[default]
    Optimal,
    Rgb8,
    Rgba8,
    Rgb16,
    Rgba16,
}

impl PixelFormat {
    /// Concrete layout and bit depth for a source with the given properties.
    pub fn resolve(self, has_alpha: bool, source_bit_depth: u8) -> (ChannelLayout, u8) {
        match self {
            PixelFormat::Optimal => {
                let layout = if has_alpha {
                    ChannelLayout::Rgba
                } else {
                    ChannelLayout::Rgb
                };
                (layout, if source_bit_depth > 8 { 16 } else { 8 })
            }
            PixelFormat::Rgb8 => (ChannelLayout::Rgb, 8),
            PixelFormat::Rgba8 => (ChannelLayout::Rgba, 8),
            PixelFormat::Rgb16 => (ChannelLayout::Rgb, 16),
            PixelFormat::Rgba16 => (ChannelLayout::Rgba, 16),
        }
    }
}

/// Interpolation kernel used when decode-time rescaling changes the size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResampleFilter {
    Nearest,
    Bilinear,
    /// Keys cubic (B=0, C=0.5).
    Cubic,
    /// Mitchell-Netravali (B=1/3, C=1/3).
    Mitchell,
    /// Lanczos, 3 lobes.
    #[default]
    Lanczos,
    CatmullRom,
    /// Cubic Hermite (B=0, C=0).
    Hermite,
    /// Cubic B-spline (B=1, C=0).
    BSpline,
    /// Hann-windowed sinc, 3 lobes.
    Hann,
}

/// Options for [`DecodeRequest`](crate::DecodeRequest).
///
/// | Field          | Default      |
/// |----------------|--------------|
/// | `rescale`      | `None`       |
/// | `scale`        | `1`          |
/// | `pixel_format` | `Optimal`    |
/// | `filter`       | `Lanczos`    |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Logical output size. The decoded bitmap is `rescale * scale` pixels.
    pub rescale: Option<Size>,
    /// Display density factor, at least 1.
    pub scale: u32,
    pub pixel_format: PixelFormat,
    pub filter: ResampleFilter,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            rescale: None,
            scale: 1,
            pixel_format: PixelFormat::Optimal,
            filter: ResampleFilter::Lanczos,
        }
    }
}

impl DecodeOptions {
    pub fn validate(&self) -> Result<(), JxlError> {
        if self.scale == 0 {
            return Err(JxlError::Decode("scale factor must be at least 1".into()));
        }
        if let Some(size) = self.rescale.filter(|s| s.is_empty()) {
            return Err(JxlError::Decode(format!(
                "rescale target {}x{} has a zero side",
                size.width, size.height
            )));
        }
        Ok(())
    }

    /// Resolve into an engine plan for an image of the given intrinsic size.
    ///
    /// `resize` is set only when the backing size differs from `intrinsic`.
    pub fn plan(&self, intrinsic: Size) -> Result<DecodePlan, JxlError> {
        self.validate()?;
        let resize = match self.rescale {
            Some(target) => {
                let backing = Size::new(
                    target.width.checked_mul(self.scale).ok_or_else(overflow)?,
                    target.height.checked_mul(self.scale).ok_or_else(overflow)?,
                );
                (backing != intrinsic).then_some(Resize {
                    size: backing,
                    filter: self.filter,
                })
            }
            None => None,
        };
        Ok(DecodePlan {
            pixel_format: self.pixel_format,
            resize,
            scale: self.scale,
        })
    }
}

fn overflow() -> JxlError {
    JxlError::Decode("rescale target overflows u32".into())
}

/// Resample step carried in a [`DecodePlan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resize {
    pub size: Size,
    pub filter: ResampleFilter,
}

/// Validated decode instructions handed to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodePlan {
    pub pixel_format: PixelFormat,
    pub resize: Option<Resize>,
    pub scale: u32,
}

// --- Encode ---

/// Channel layout written to the JXL file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    #[default]
    Rgb,
    Rgba,
}

impl ColorSpace {
    pub fn layout(self) -> ChannelLayout {
        match self {
            ColorSpace::Rgb => ChannelLayout::Rgb,
            ColorSpace::Rgba => ChannelLayout::Rgba,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    #[default]
    Lossy,
    Lossless,
}

/// Encoder hint trading compression for cheaper decoding, tiers 0..=4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecodingSpeed {
    #[default]
    Default,
    Fast,
    Faster,
    VeryFast,
    Fastest,
}

impl DecodingSpeed {
    pub fn tier(self) -> u8 {
        match self {
            DecodingSpeed::Default => 0,
            DecodingSpeed::Fast => 1,
            DecodingSpeed::Faster => 2,
            DecodingSpeed::VeryFast => 3,
            DecodingSpeed::Fastest => 4,
        }
    }

    /// Inverse of [`tier`](Self::tier); None above 4.
    pub fn from_tier(tier: u8) -> Option<Self> {
        Some(match tier {
            0 => DecodingSpeed::Default,
            1 => DecodingSpeed::Fast,
            2 => DecodingSpeed::Faster,
            3 => DecodingSpeed::VeryFast,
            4 => DecodingSpeed::Fastest,
            _ => return None,
        })
    }
}

/// Distance used for lossy encodes when neither quality nor distance is given.
pub const DEFAULT_DISTANCE: f32 = 1.0;

/// Options for [`EncodeRequest`](crate::EncodeRequest).
///
/// | Field            | Default   |
/// |------------------|-----------|
/// | `color_space`    | `Rgb`     |
/// | `compression`    | `Lossy`   |
/// | `effort`         | `7`       |
/// | `quality`        | `None`    |
/// | `distance`       | `None`    |
/// | `decoding_speed` | `Default` |
///
/// `quality` (0-100) and `distance` (0-15) are two scales for the same
/// lossy setting; set at most one. With neither, lossy encodes use
/// [`DEFAULT_DISTANCE`]. Both are ignored for lossless encodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeOptions {
    pub color_space: ColorSpace,
    pub compression: Compression,
    /// 1 (fastest) to 9 (smallest output).
    pub effort: u8,
    pub quality: Option<u8>,
    /// Butteraugli distance: 0 is mathematically lossless, 1 visually lossless.
    pub distance: Option<f32>,
    pub decoding_speed: DecodingSpeed,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Rgb,
            compression: Compression::Lossy,
            effort: 7,
            quality: None,
            distance: None,
            decoding_speed: DecodingSpeed::Default,
        }
    }
}

impl EncodeOptions {
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.compression = if lossless {
            Compression::Lossless
        } else {
            Compression::Lossy
        };
        self
    }

    pub fn with_effort(mut self, effort: u8) -> Self {
        self.effort = effort;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_decoding_speed(mut self, speed: DecodingSpeed) -> Self {
        self.decoding_speed = speed;
        self
    }

    pub fn validate(&self) -> Result<(), JxlError> {
        if !(1..=9).contains(&self.effort) {
            return Err(JxlError::Encode(format!(
                "effort {} outside 1..=9",
                self.effort
            )));
        }
        if let Some(q) = self.quality.filter(|q| *q > 100) {
            return Err(JxlError::Encode(format!("quality {q} outside 0..=100")));
        }
        if let Some(d) = self.distance.filter(|d| !(0.0..=15.0).contains(d)) {
            return Err(JxlError::Encode(format!("distance {d} outside 0..=15")));
        }
        if self.quality.is_some() && self.distance.is_some() {
            return Err(JxlError::Encode(
                "quality and distance are mutually exclusive".into(),
            ));
        }
        Ok(())
    }

    /// Validate and resolve into engine settings.
    pub fn resolve(&self) -> Result<EncodeSettings, JxlError> {
        self.validate()?;
        let lossless = self.compression == Compression::Lossless;
        let distance = if lossless {
            0.0
        } else {
            match (self.quality, self.distance) {
                (Some(q), _) => quality_to_distance(q),
                (None, Some(d)) => d,
                (None, None) => DEFAULT_DISTANCE,
            }
        };
        Ok(EncodeSettings {
            color_space: self.color_space,
            lossless,
            effort: self.effort,
            distance,
            decoding_speed: self.decoding_speed,
        })
    }
}

/// Map 0-100 quality percentage to butteraugli distance.
pub fn quality_to_distance(quality: u8) -> f32 {
    let q = quality.min(99) as u32;
    if q >= 90 {
        (100 - q) as f32 / 10.0
    } else if q >= 70 {
        1.0 + (90 - q) as f32 / 20.0
    } else {
        2.0 + (70 - q) as f32 / 10.0
    }
}

/// Validated encode instructions handed to the engine.
///
/// For lossless encodes `distance` is always 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeSettings {
    pub color_space: ColorSpace,
    pub lossless: bool,
    pub effort: u8,
    pub distance: f32,
    pub decoding_speed: DecodingSpeed,
}

// --- Animation ---

/// Options for [`AnimatedEncoder`](crate::AnimatedEncoder).
///
/// Defaults: infinite looping, RGBA, lossy, effort 4, distance 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationOptions {
    /// Number of loops; 0 means loop forever.
    pub loop_count: u32,
    pub encode: EncodeOptions,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            loop_count: 0,
            encode: EncodeOptions::default()
                .with_color_space(ColorSpace::Rgba)
                .with_effort(4),
        }
    }
}

impl AnimationOptions {
    pub fn with_loop_count(mut self, loop_count: u32) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn with_encode(mut self, encode: EncodeOptions) -> Self {
        self.encode = encode;
        self
    }
}

// --- JPEG ---

/// Default quality for the auxiliary JPEG encoder.
pub const DEFAULT_JPEG_QUALITY: u8 = 81;

/// Settings handed to the engine's JPEG encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JpegSettings {
    /// Passed through; engines clamp to their own range.
    pub quality: u8,
    /// Use the engine's alternate colour decorrelation transform.
    pub extended_color_transform: bool,
    pub progressive: bool,
}

impl Default for JpegSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            extended_color_transform: true,
            progressive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_defaults() {
        let opts = DecodeOptions::default();
        assert_eq!(opts.scale, 1);
        assert_eq!(opts.pixel_format, PixelFormat::Optimal);
        assert_eq!(opts.filter, ResampleFilter::Lanczos);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn decoding_speed_tiers_invert() {
        for tier in 0..=4 {
            assert_eq!(DecodingSpeed::from_tier(tier).map(DecodingSpeed::tier), Some(tier));
        }
        assert_eq!(DecodingSpeed::from_tier(5), None);
    }

    #[test]
    fn zero_scale_rejected() {
        let opts = DecodeOptions {
            scale: 0,
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(JxlError::Decode(_))));
    }

    #[test]
    fn zero_sided_rescale_rejected() {
        let opts = DecodeOptions {
            rescale: Some(Size::new(0, 10)),
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(JxlError::Decode(_))));
    }

    #[test]
    fn plan_skips_resize_for_same_size() {
        let opts = DecodeOptions {
            rescale: Some(Size::new(64, 32)),
            ..Default::default()
        };
        let plan = opts.plan(Size::new(64, 32)).unwrap();
        assert_eq!(plan.resize, None);

        let plan = opts.plan(Size::new(128, 64)).unwrap();
        assert_eq!(plan.resize.map(|r| r.size), Some(Size::new(64, 32)));
    }

    #[test]
    fn plan_scales_backing_size() {
        let opts = DecodeOptions {
            rescale: Some(Size::new(50, 25)),
            scale: 2,
            filter: ResampleFilter::Hann,
            ..Default::default()
        };
        // 50x25 at 2x is exactly the intrinsic size: no resample
        assert_eq!(opts.plan(Size::new(100, 50)).unwrap().resize, None);

        let resize = opts.plan(Size::new(400, 200)).unwrap().resize.unwrap();
        assert_eq!(resize.size, Size::new(100, 50));
        assert_eq!(resize.filter, ResampleFilter::Hann);
    }

    #[test]
    fn plan_without_rescale_keeps_intrinsic() {
        let opts = DecodeOptions {
            scale: 3,
            ..Default::default()
        };
        let plan = opts.plan(Size::new(10, 10)).unwrap();
        assert_eq!(plan.resize, None);
        assert_eq!(plan.scale, 3);
    }

    #[test]
    fn optimal_pixel_format() {
        assert_eq!(
            PixelFormat::Optimal.resolve(true, 8),
            (ChannelLayout::Rgba, 8)
        );
        assert_eq!(
            PixelFormat::Optimal.resolve(false, 12),
            (ChannelLayout::Rgb, 16)
        );
        assert_eq!(PixelFormat::Rgb8.resolve(true, 16), (ChannelLayout::Rgb, 8));
    }

    #[test]
    fn encode_defaults_resolve_to_visually_lossless() {
        let settings = EncodeOptions::default().resolve().unwrap();
        assert!(!settings.lossless);
        assert_eq!(settings.distance, DEFAULT_DISTANCE);
        assert_eq!(settings.effort, 7);
        assert_eq!(settings.color_space, ColorSpace::Rgb);
    }

    #[test]
    fn quality_and_distance_are_exclusive() {
        let opts = EncodeOptions::default()
            .with_quality(90)
            .with_distance(1.0);
        assert!(matches!(opts.validate(), Err(JxlError::Encode(_))));
    }

    #[test]
    fn out_of_range_values_rejected() {
        assert!(EncodeOptions::default().with_effort(0).validate().is_err());
        assert!(EncodeOptions::default().with_effort(10).validate().is_err());
        assert!(EncodeOptions::default().with_quality(101).validate().is_err());
        assert!(EncodeOptions::default().with_distance(15.5).validate().is_err());
        assert!(EncodeOptions::default().with_distance(f32::NAN).validate().is_err());
        assert!(EncodeOptions::default().with_distance(0.0).validate().is_ok());
    }

    #[test]
    fn lossless_ignores_quality_axis() {
        let a = EncodeOptions::default()
            .with_lossless(true)
            .with_quality(10)
            .resolve()
            .unwrap();
        let b = EncodeOptions::default()
            .with_lossless(true)
            .with_distance(7.5)
            .resolve()
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.distance, 0.0);
    }

    #[test]
    fn quality_mapping() {
        assert_eq!(quality_to_distance(100), 0.1);
        assert_eq!(quality_to_distance(90), 1.0);
        assert_eq!(quality_to_distance(70), 2.0);
        assert_eq!(quality_to_distance(50), 4.0);
        assert_eq!(quality_to_distance(0), 9.0);
    }

    #[test]
    fn animation_defaults() {
        let opts = AnimationOptions::default();
        assert_eq!(opts.loop_count, 0);
        assert_eq!(opts.encode.effort, 4);
        assert_eq!(opts.encode.color_space, ColorSpace::Rgba);
    }

    #[test]
    fn decoding_speed_tiers() {
        assert_eq!(DecodingSpeed::Default.tier(), 0);
        assert_eq!(DecodingSpeed::Fastest.tier(), 4);
    }
}
