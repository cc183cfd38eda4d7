//! Decode-time rescaling on top of the `resize` crate.
//!
//! Works on interleaved samples normalized to `0.0..=1.0`. RGBA is
//! premultiplied while resizing so transparent pixels contribute no colour.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::f32::consts::PI;

use resize::{Filter, Pixel, Type};

use crate::bitmap::{Bitmap, ChannelLayout};
use crate::config::{ResampleFilter, Size};
use crate::pixel::{Rgb, Rgba};
use crate::JxlError;

const HANN_LOBES: f32 = 3.0;

/// Resample `bitmap` to `target` pixels with `filter`.
///
/// Layout and bit depth are preserved. The scale tag is reset to 1.
pub fn resample(bitmap: &Bitmap, target: Size, filter: ResampleFilter) -> Result<Bitmap, JxlError> {
    let layout = bitmap.layout();
    let source = Size::new(bitmap.width(), bitmap.height());
    let samples = resample_samples(&bitmap.to_unit_samples(), layout, source, target, filter)?;
    Bitmap::from_unit_samples(
        layout,
        target.width,
        target.height,
        &samples,
        bitmap.bit_depth(),
    )
}

/// Resample interleaved unit samples of a `source`-sized image.
///
/// The output buffer is reserved up front; a target too large to allocate
/// is a [`JxlError::Decode`].
pub(crate) fn resample_samples(
    samples: &[f32],
    layout: ChannelLayout,
    source: Size,
    target: Size,
    filter: ResampleFilter,
) -> Result<Vec<f32>, JxlError> {
    if source.is_empty() || target.is_empty() {
        return Err(JxlError::Decode(format!(
            "cannot resample {}x{} to {}x{}",
            source.width, source.height, target.width, target.height
        )));
    }
    let (src_w, src_h) = (source.width as usize, source.height as usize);
    let (dst_w, dst_h) = (target.width as usize, target.height as usize);

    match layout {
        ChannelLayout::Rgb => {
            let src: &[Rgb<f32>] = bytemuck::try_cast_slice(samples).map_err(JxlError::decode)?;
            let mut dst = allocate::<Rgb<f32>>(target)?;
            resize::new(src_w, src_h, dst_w, dst_h, Pixel::RGBF32, kernel(filter))
                .and_then(|mut resizer| resizer.resize(src, &mut dst))
                .map_err(JxlError::decode)?;
            flatten(dst)
        }
        ChannelLayout::Rgba => {
            let mut premultiplied = samples.to_vec();
            for px in premultiplied.chunks_exact_mut(4) {
                let alpha = px[3];
                px[..3].iter_mut().for_each(|c| *c *= alpha);
            }
            let src: &[Rgba<f32>] =
                bytemuck::try_cast_slice(&premultiplied).map_err(JxlError::decode)?;
            let mut dst = allocate::<Rgba<f32>>(target)?;
            resize::new(src_w, src_h, dst_w, dst_h, Pixel::RGBAF32, kernel(filter))
                .and_then(|mut resizer| resizer.resize(src, &mut dst))
                .map_err(JxlError::decode)?;
            for px in &mut dst {
                if px.a > 0.0 {
                    px.r /= px.a;
                    px.g /= px.a;
                    px.b /= px.a;
                } else {
                    *px = Rgba::new(0.0, 0.0, 0.0, 0.0);
                }
            }
            flatten(dst)
        }
    }
}

fn allocate<P: Clone + Default>(target: Size) -> Result<Vec<P>, JxlError> {
    let mut pixels = Vec::new();
    let len = (target.width as usize).checked_mul(target.height as usize);
    match len {
        Some(len) if pixels.try_reserve_exact(len).is_ok() => {
            pixels.resize(len, P::default());
            Ok(pixels)
        }
        _ => Err(JxlError::Decode(format!(
            "not enough memory to resample to {}x{}",
            target.width, target.height
        ))),
    }
}

fn flatten<P: bytemuck::Pod>(pixels: Vec<P>) -> Result<Vec<f32>, JxlError> {
    bytemuck::try_cast_vec(pixels).map_err(|(err, _)| JxlError::decode(err))
}

fn kernel(filter: ResampleFilter) -> Type {
    match filter {
        ResampleFilter::Nearest => Type::Point,
        ResampleFilter::Bilinear => Type::Triangle,
        // B=0, C=0.5 is the Catmull-Rom spline
        ResampleFilter::Cubic | ResampleFilter::CatmullRom => Type::Catrom,
        ResampleFilter::Mitchell => Type::Mitchell,
        ResampleFilter::Lanczos => Type::Lanczos3,
        ResampleFilter::Hermite => Type::Custom(Filter::new_cubic(0.0, 0.0)),
        ResampleFilter::BSpline => Type::Custom(Filter::new_cubic(1.0, 0.0)),
        ResampleFilter::Hann => Type::Custom(Filter::new(Box::new(hann), HANN_LOBES)),
    }
}

/// Hann-windowed sinc.
fn hann(x: f32) -> f32 {
    if x == 0.0 {
        return 1.0;
    }
    if x.abs() >= HANN_LOBES {
        return 0.0;
    }
    let a = PI * x;
    a.sin() / a * 0.5 * (1.0 + (a / HANN_LOBES).cos())
}
