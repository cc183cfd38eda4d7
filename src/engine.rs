//! The codec engine seam.
//!
//! Facade operations validate their options, then call exactly one engine
//! method with the resolved settings. Engines own the bitstream work:
//! parsing, entropy coding, colour management and JPEG reconstruction.
//!
//! An engine is stateless between calls and must be shareable across
//! threads; [`crate::codecs::NativeEngine`] is the default.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::bitmap::Bitmap;
use crate::config::{DecodePlan, EncodeSettings, JpegSettings, PixelFormat};
use crate::{ImageInfo, JxlError};

/// Backend that performs the actual JXL and JPEG coding.
pub trait CodecEngine: Send + Sync {
    /// Parse the header only.
    fn probe(&self, data: &[u8]) -> Result<ImageInfo, JxlError>;

    /// Decode the first frame. Resampling in `plan` is applied here.
    fn decode(&self, data: &[u8], plan: &DecodePlan) -> Result<Bitmap, JxlError>;

    fn encode(&self, bitmap: &Bitmap, settings: &EncodeSettings) -> Result<Vec<u8>, JxlError>;

    /// Open a (possibly single-frame) image for frame-by-frame access.
    fn open_animation(&self, data: &[u8]) -> Result<Box<dyn AnimationSource>, JxlError>;

    fn encode_animation(
        &self,
        sequence: &AnimatedSequence,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, JxlError>;

    /// Losslessly recompress a JPEG file.
    fn jpeg_to_jxl(&self, jpeg: &[u8]) -> Result<Vec<u8>, JxlError>;

    /// Rebuild the original JPEG from a recompressed JXL file.
    fn jxl_to_jpeg(&self, jxl: &[u8]) -> Result<Vec<u8>, JxlError>;

    fn encode_jpeg(&self, bitmap: &Bitmap, settings: &JpegSettings) -> Result<Vec<u8>, JxlError>;
}

/// Frame access into an opened image.
///
/// Indices passed to [`frame_ticks`](Self::frame_ticks) and
/// [`render`](Self::render) are below `info().frame_count`; the caller
/// checks bounds.
pub trait AnimationSource: Send {
    fn info(&self) -> AnimationInfo;

    /// Display duration of frame `index` in ticks.
    fn frame_ticks(&self, index: usize) -> u32;

    fn render(&self, index: usize, format: PixelFormat) -> Result<Bitmap, JxlError>;
}

/// Timing and geometry of an opened image.
///
/// A still image has one frame and a zero tick rate numerator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationInfo {
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    /// 0 means loop forever.
    pub loop_count: u32,
    pub tps_numerator: u32,
    pub tps_denominator: u32,
}

impl AnimationInfo {
    /// Convert a tick count to milliseconds, rounded to nearest.
    pub fn ticks_to_ms(&self, ticks: u32) -> u32 {
        if self.tps_numerator == 0 {
            return 0;
        }
        let num = self.tps_numerator as u64;
        let scaled = ticks as u64 * self.tps_denominator as u64 * 1000;
        ((scaled + num / 2) / num).min(u32::MAX as u64) as u32
    }
}

/// Tick rate used for encoded animations: durations are whole milliseconds.
pub const ANIMATION_TICKS_PER_SECOND: u32 = 1000;

/// One frame of an animation to encode.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationFrame {
    pub bitmap: Bitmap,
    pub duration_ms: u32,
}

/// Frames collected by [`crate::AnimatedEncoder`], all `width` x `height`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatedSequence {
    pub width: u32,
    pub height: u32,
    /// 0 means loop forever.
    pub loop_count: u32,
    pub frames: Vec<AnimationFrame>,
}
