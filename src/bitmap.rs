//! In-memory bitmaps exchanged with the engine.

use alloc::vec::Vec;

use rgb::ComponentMap;

use crate::pixel::{ImgRef, ImgVec, Rgb, Rgba};
use crate::JxlError;

/// Interleaved channel layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, ChannelLayout::Rgba)
    }
}

/// Typed pixel storage.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum PixelData {
    Rgb8(ImgVec<Rgb<u8>>),
    Rgba8(ImgVec<Rgba<u8>>),
    Rgb16(ImgVec<Rgb<u16>>),
    Rgba16(ImgVec<Rgba<u16>>),
}

impl PixelData {
    pub fn width(&self) -> u32 {
        match self {
            PixelData::Rgb8(img) => img.width() as u32,
            PixelData::Rgba8(img) => img.width() as u32,
            PixelData::Rgb16(img) => img.width() as u32,
            PixelData::Rgba16(img) => img.width() as u32,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            PixelData::Rgb8(img) => img.height() as u32,
            PixelData::Rgba8(img) => img.height() as u32,
            PixelData::Rgb16(img) => img.height() as u32,
            PixelData::Rgba16(img) => img.height() as u32,
        }
    }

    pub fn layout(&self) -> ChannelLayout {
        match self {
            PixelData::Rgb8(_) | PixelData::Rgb16(_) => ChannelLayout::Rgb,
            PixelData::Rgba8(_) | PixelData::Rgba16(_) => ChannelLayout::Rgba,
        }
    }

    /// Bits per channel: 8 or 16.
    pub fn bit_depth(&self) -> u8 {
        match self {
            PixelData::Rgb8(_) | PixelData::Rgba8(_) => 8,
            PixelData::Rgb16(_) | PixelData::Rgba16(_) => 16,
        }
    }
}

impl PartialEq for PixelData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PixelData::Rgb8(a), PixelData::Rgb8(b)) => same_pixels(a.as_ref(), b.as_ref()),
            (PixelData::Rgba8(a), PixelData::Rgba8(b)) => same_pixels(a.as_ref(), b.as_ref()),
            (PixelData::Rgb16(a), PixelData::Rgb16(b)) => same_pixels(a.as_ref(), b.as_ref()),
            (PixelData::Rgba16(a), PixelData::Rgba16(b)) => same_pixels(a.as_ref(), b.as_ref()),
            _ => false,
        }
    }
}

fn same_pixels<T: Copy + PartialEq>(a: ImgRef<'_, T>, b: ImgRef<'_, T>) -> bool {
    a.width() == b.width() && a.height() == b.height() && a.pixels().eq(b.pixels())
}

/// A decoded image, or an image to encode.
///
/// `scale` is the display density factor: the logical size is the pixel
/// size divided by it.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pixels: PixelData,
    scale: u32,
}

impl Bitmap {
    pub fn new(pixels: PixelData) -> Self {
        Self { pixels, scale: 1 }
    }

    pub fn from_rgb8(img: ImgVec<Rgb<u8>>) -> Self {
        Self::new(PixelData::Rgb8(img))
    }

    pub fn from_rgba8(img: ImgVec<Rgba<u8>>) -> Self {
        Self::new(PixelData::Rgba8(img))
    }

    pub fn from_rgb16(img: ImgVec<Rgb<u16>>) -> Self {
        Self::new(PixelData::Rgb16(img))
    }

    pub fn from_rgba16(img: ImgVec<Rgba<u16>>) -> Self {
        Self::new(PixelData::Rgba16(img))
    }

    /// Build an 8-bit bitmap from tightly packed interleaved bytes.
    pub fn from_bytes(
        layout: ChannelLayout,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<Self, JxlError> {
        if width == 0 || height == 0 {
            return Err(JxlError::Encode(alloc::format!(
                "bitmap dimensions {width}x{height} have a zero side"
            )));
        }
        let (w, h) = (width as usize, height as usize);
        let expected = w * h * layout.channels();
        if bytes.len() != expected {
            return Err(JxlError::Encode(alloc::format!(
                "pixel buffer is {} bytes, expected {expected} for {width}x{height} {layout:?}",
                bytes.len()
            )));
        }
        let pixels = match layout {
            ChannelLayout::Rgb => {
                let px: &[Rgb<u8>] = bytemuck::cast_slice(bytes);
                PixelData::Rgb8(ImgVec::new(px.to_vec(), w, h))
            }
            ChannelLayout::Rgba => {
                let px: &[Rgba<u8>] = bytemuck::cast_slice(bytes);
                PixelData::Rgba8(ImgVec::new(px.to_vec(), w, h))
            }
        };
        Ok(Self::new(pixels))
    }

    /// Build a 16-bit bitmap from tightly packed interleaved samples.
    pub fn from_samples16(
        layout: ChannelLayout,
        width: u32,
        height: u32,
        samples: &[u16],
    ) -> Result<Self, JxlError> {
        if width == 0 || height == 0 {
            return Err(JxlError::Encode(alloc::format!(
                "bitmap dimensions {width}x{height} have a zero side"
            )));
        }
        let (w, h) = (width as usize, height as usize);
        let expected = w * h * layout.channels();
        if samples.len() != expected {
            return Err(JxlError::Encode(alloc::format!(
                "sample buffer has {} values, expected {expected} for {width}x{height} {layout:?}",
                samples.len()
            )));
        }
        let pixels = match layout {
            ChannelLayout::Rgb => {
                let px = samples
                    .chunks_exact(3)
                    .map(|c| Rgb::new(c[0], c[1], c[2]))
                    .collect();
                PixelData::Rgb16(ImgVec::new(px, w, h))
            }
            ChannelLayout::Rgba => {
                let px = samples
                    .chunks_exact(4)
                    .map(|c| Rgba::new(c[0], c[1], c[2], c[3]))
                    .collect();
                PixelData::Rgba16(ImgVec::new(px, w, h))
            }
        };
        Ok(Self::new(pixels))
    }

    /// Quantize interleaved samples in `0.0..=1.0` to 8 or 16 bits.
    ///
    /// Out-of-range values clamp; `depth` above 8 selects 16-bit storage.
    pub(crate) fn from_unit_samples(
        layout: ChannelLayout,
        width: u32,
        height: u32,
        samples: &[f32],
        depth: u8,
    ) -> Result<Self, JxlError> {
        if depth > 8 {
            let data: Vec<u16> = samples
                .iter()
                .map(|s| (s * 65535.0 + 0.5).clamp(0.0, 65535.0) as u16)
                .collect();
            Self::from_samples16(layout, width, height, &data)
        } else {
            let data: Vec<u8> = samples
                .iter()
                .map(|s| (s * 255.0 + 0.5).clamp(0.0, 255.0) as u8)
                .collect();
            Self::from_bytes(layout, width, height, &data)
        }
    }

    /// Interleaved samples in the bitmap's own layout, scaled to `0.0..=1.0`.
    pub(crate) fn to_unit_samples(&self) -> Vec<f32> {
        let layout = self.layout();
        if self.bit_depth() > 8 {
            self.to_samples16(layout)
                .into_iter()
                .map(|s| f32::from(s) / 65535.0)
                .collect()
        } else {
            self.to_bytes(layout)
                .into_iter()
                .map(|s| f32::from(s) / 255.0)
                .collect()
        }
    }

    /// Tag this bitmap with a display scale factor (clamped to at least 1).
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn layout(&self) -> ChannelLayout {
        self.pixels.layout()
    }

    pub fn bit_depth(&self) -> u8 {
        self.pixels.bit_depth()
    }

    pub fn has_alpha(&self) -> bool {
        self.layout().has_alpha()
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Pixel size divided by the scale factor.
    pub fn logical_size(&self) -> (u32, u32) {
        (self.width() / self.scale, self.height() / self.scale)
    }

    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    pub fn into_pixels(self) -> PixelData {
        self.pixels
    }

    /// Convert to 8-bit RGB. Alpha is dropped.
    pub fn to_rgb8(&self) -> ImgVec<Rgb<u8>> {
        match &self.pixels {
            PixelData::Rgb8(img) => img.clone(),
            PixelData::Rgba8(img) => map_pixels(img.as_ref(), |p| p.rgb()),
            PixelData::Rgb16(img) => map_pixels(img.as_ref(), |p| p.map(narrow)),
            PixelData::Rgba16(img) => map_pixels(img.as_ref(), |p| p.rgb().map(narrow)),
        }
    }

    /// Convert to 8-bit RGBA. Missing alpha becomes opaque.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        match &self.pixels {
            PixelData::Rgb8(img) => map_pixels(img.as_ref(), |p| p.with_alpha(u8::MAX)),
            PixelData::Rgba8(img) => img.clone(),
            PixelData::Rgb16(img) => {
                map_pixels(img.as_ref(), |p| p.map(narrow).with_alpha(u8::MAX))
            }
            PixelData::Rgba16(img) => map_pixels(img.as_ref(), |p| p.map(narrow)),
        }
    }

    /// Convert to 16-bit RGB. Alpha is dropped.
    pub fn to_rgb16(&self) -> ImgVec<Rgb<u16>> {
        match &self.pixels {
            PixelData::Rgb8(img) => map_pixels(img.as_ref(), |p| p.map(widen)),
            PixelData::Rgba8(img) => map_pixels(img.as_ref(), |p| p.rgb().map(widen)),
            PixelData::Rgb16(img) => img.clone(),
            PixelData::Rgba16(img) => map_pixels(img.as_ref(), |p| p.rgb()),
        }
    }

    /// Convert to 16-bit RGBA. Missing alpha becomes opaque.
    pub fn to_rgba16(&self) -> ImgVec<Rgba<u16>> {
        match &self.pixels {
            PixelData::Rgb8(img) => {
                map_pixels(img.as_ref(), |p| p.map(widen).with_alpha(u16::MAX))
            }
            PixelData::Rgba8(img) => map_pixels(img.as_ref(), |p| p.map(widen)),
            PixelData::Rgb16(img) => map_pixels(img.as_ref(), |p| p.with_alpha(u16::MAX)),
            PixelData::Rgba16(img) => img.clone(),
        }
    }

    /// Convert to the given layout and bit depth (8 or 16), keeping the scale tag.
    ///
    /// Returns `self` unchanged when it already matches.
    pub fn into_format(self, layout: ChannelLayout, bit_depth: u8) -> Self {
        if self.layout() == layout && self.bit_depth() == bit_depth {
            return self;
        }
        let pixels = match (layout, bit_depth > 8) {
            (ChannelLayout::Rgb, false) => PixelData::Rgb8(self.to_rgb8()),
            (ChannelLayout::Rgba, false) => PixelData::Rgba8(self.to_rgba8()),
            (ChannelLayout::Rgb, true) => PixelData::Rgb16(self.to_rgb16()),
            (ChannelLayout::Rgba, true) => PixelData::Rgba16(self.to_rgba16()),
        };
        Self {
            pixels,
            scale: self.scale,
        }
    }

    /// Interleaved 8-bit samples, converting if needed.
    pub fn to_bytes(&self, layout: ChannelLayout) -> Vec<u8> {
        match layout {
            ChannelLayout::Rgb => bytemuck::cast_slice(self.to_rgb8().buf().as_slice()).to_vec(),
            ChannelLayout::Rgba => bytemuck::cast_slice(self.to_rgba8().buf().as_slice()).to_vec(),
        }
    }

    /// Interleaved 16-bit samples, converting if needed.
    pub fn to_samples16(&self, layout: ChannelLayout) -> Vec<u16> {
        match layout {
            ChannelLayout::Rgb => self
                .to_rgb16()
                .as_ref()
                .pixels()
                .flat_map(|p| [p.r, p.g, p.b])
                .collect(),
            ChannelLayout::Rgba => self
                .to_rgba16()
                .as_ref()
                .pixels()
                .flat_map(|p| [p.r, p.g, p.b, p.a])
                .collect(),
        }
    }
}

fn map_pixels<A: Copy, B>(img: ImgRef<'_, A>, f: impl FnMut(A) -> B) -> ImgVec<B> {
    let buf: Vec<B> = img.pixels().map(f).collect();
    ImgVec::new(buf, img.width(), img.height())
}

#[inline]
pub(crate) fn narrow(v: u16) -> u8 {
    ((v as u32 * 255 + 32767) / 65535) as u8
}

#[inline]
pub(crate) fn widen(v: u8) -> u16 {
    v as u16 * 257
}
