//! Image metadata from a header-only parse.

use crate::config::Size;
use crate::format::JxlSignature;

/// Header information reported by the engine without decoding pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    /// Width with orientation applied.
    pub width: u32,
    /// Height with orientation applied.
    pub height: u32,
    pub has_alpha: bool,
    /// Bits per sample of the colour channels as stored.
    pub bit_depth: u8,
    pub has_animation: bool,
    /// Frame count, when the engine can tell without decoding.
    pub frame_count: Option<u32>,
    /// Animation loop count; 0 means infinite.
    pub loop_count: u32,
    /// EXIF-style orientation, 1-8.
    pub orientation: u8,
    /// Whether the file carries JPEG reconstruction data.
    pub jpeg_reconstruction: bool,
    pub signature: JxlSignature,
}

impl ImageInfo {
    /// Create info for a still 8-bit image with default orientation.
    pub fn new(width: u32, height: u32, signature: JxlSignature) -> Self {
        Self {
            width,
            height,
            has_alpha: false,
            bit_depth: 8,
            has_animation: false,
            frame_count: Some(1),
            loop_count: 0,
            orientation: 1,
            jpeg_reconstruction: false,
            signature,
        }
    }

    pub fn with_alpha(mut self, has_alpha: bool) -> Self {
        self.has_alpha = has_alpha;
        self
    }

    pub fn with_bit_depth(mut self, bit_depth: u8) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn with_animation(mut self, frame_count: Option<u32>, loop_count: u32) -> Self {
        self.has_animation = true;
        self.frame_count = frame_count;
        self.loop_count = loop_count;
        self
    }

    pub fn with_orientation(mut self, orientation: u8) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_jpeg_reconstruction(mut self, available: bool) -> Self {
        self.jpeg_reconstruction = available;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether the stored orientation swaps width and height.
    pub fn is_transposed(&self) -> bool {
        self.orientation >= 5
    }
}
