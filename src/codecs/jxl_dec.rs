//! JXL decode backend using jxl-oxide.

use alloc::boxed::Box;
use alloc::vec::Vec;

use jxl_oxide::color::{EnumColourEncoding, RenderingIntent};
use jxl_oxide::{
    FrameBuffer, JpegReconstructionStatus, JxlImage, Moxcms, PixelFormat as OxidePixelFormat,
};

use crate::bitmap::{Bitmap, ChannelLayout};
use crate::config::{DecodePlan, PixelFormat, Resize, Size};
use crate::engine::{AnimationInfo, AnimationSource};
use crate::format::JxlSignature;
use crate::{resample, ImageInfo, JxlError};

/// Parse `data` and ask for sRGB output.
///
/// Gray sources render as gray sRGB, everything else (CMYK included) as
/// RGB sRGB. ICC-described colour goes through moxcms.
fn open(data: &[u8]) -> Result<JxlImage, JxlError> {
    let mut image = JxlImage::builder().read(data).map_err(JxlError::decode)?;
    image.set_cms(Moxcms);
    let gray = matches!(
        image.pixel_format(),
        OxidePixelFormat::Gray | OxidePixelFormat::Graya
    );
    tracing::debug!(gray, cmyk = image.pixel_format().has_black(), "rendering as sRGB");
    let intent = RenderingIntent::Relative;
    image.request_color_encoding(if gray {
        EnumColourEncoding::gray_srgb(intent)
    } else {
        EnumColourEncoding::srgb(intent)
    });
    Ok(image)
}

/// Probe header and frame structure without rendering.
pub(crate) fn probe(data: &[u8]) -> Result<ImageInfo, JxlError> {
    let signature = JxlSignature::detect(data).ok_or(JxlError::NotJxl)?;
    let image = JxlImage::builder().read(data).map_err(JxlError::decode)?;
    let meta = &image.image_header().metadata;

    let mut info = ImageInfo::new(image.width(), image.height(), signature)
        .with_alpha(image.pixel_format().has_alpha())
        .with_bit_depth(meta.bit_depth.bits_per_sample().min(u8::MAX as u32) as u8)
        .with_orientation(meta.orientation as u8)
        .with_jpeg_reconstruction(matches!(
            image.jpeg_reconstruction_status(),
            JpegReconstructionStatus::Available
        ));
    if let Some(animation) = &meta.animation {
        info = info.with_animation(
            Some(image.num_loaded_keyframes() as u32),
            animation.num_loops,
        );
    }
    Ok(info)
}

/// Render the first keyframe. A resize in the plan runs on the float
/// samples before they are quantized.
pub(crate) fn decode(data: &[u8], plan: &DecodePlan) -> Result<Bitmap, JxlError> {
    let image = open(data)?;
    let mut frame = render(&image, 0, plan.pixel_format)?;
    if let Some(resize) = plan.resize {
        frame = frame.resampled(resize)?;
    }
    Ok(frame.into_bitmap()?.with_scale(plan.scale))
}

/// A rendered keyframe as unit floats in the requested channel layout.
struct Rendered {
    samples: Vec<f32>,
    size: Size,
    layout: ChannelLayout,
    depth: u8,
}

impl Rendered {
    fn resampled(self, resize: Resize) -> Result<Self, JxlError> {
        let samples = resample::resample_samples(
            &self.samples,
            self.layout,
            self.size,
            resize.size,
            resize.filter,
        )?;
        Ok(Self {
            samples,
            size: resize.size,
            ..self
        })
    }

    fn into_bitmap(self) -> Result<Bitmap, JxlError> {
        Bitmap::from_unit_samples(
            self.layout,
            self.size.width,
            self.size.height,
            &self.samples,
            self.depth,
        )
    }
}

fn render(image: &JxlImage, keyframe: usize, format: PixelFormat) -> Result<Rendered, JxlError> {
    let render = image.render_frame(keyframe).map_err(JxlError::decode)?;
    let fb = render.image();
    let bits = image
        .image_header()
        .metadata
        .bit_depth
        .bits_per_sample()
        .min(16) as u8;
    let rendered = image.pixel_format();
    let gray = matches!(rendered, OxidePixelFormat::Gray | OxidePixelFormat::Graya);
    let (layout, depth) = format.resolve(rendered.has_alpha(), bits);
    Ok(Rendered {
        samples: unit_samples(&fb, gray, rendered.has_alpha(), layout)?,
        size: Size::new(fb.width() as u32, fb.height() as u32),
        layout,
        depth,
    })
}

/// Rearrange interleaved frame buffer samples into `layout`.
///
/// Colour comes first (one gray or three RGB channels); alpha, when present,
/// is the last channel. A black channel in between is skipped.
fn unit_samples(
    fb: &FrameBuffer,
    gray: bool,
    has_alpha: bool,
    layout: ChannelLayout,
) -> Result<Vec<f32>, JxlError> {
    let channels = fb.channels();
    let needed = if gray { 1 } else { 3 } + usize::from(has_alpha);
    if channels < needed {
        return Err(JxlError::Decode(alloc::format!(
            "rendered {channels} channels, expected at least {needed}"
        )));
    }

    let mut samples = Vec::with_capacity(fb.width() * fb.height() * layout.channels());
    for px in fb.buf().chunks_exact(channels) {
        let rgb = if gray { [px[0]; 3] } else { [px[0], px[1], px[2]] };
        samples.extend_from_slice(&rgb);
        if layout.has_alpha() {
            samples.push(if has_alpha { px[channels - 1] } else { 1.0 });
        }
    }
    Ok(samples)
}

struct OxideAnimation {
    image: JxlImage,
    info: AnimationInfo,
    ticks: Vec<u32>,
}

impl AnimationSource for OxideAnimation {
    fn info(&self) -> AnimationInfo {
        self.info
    }

    fn frame_ticks(&self, index: usize) -> u32 {
        self.ticks.get(index).copied().unwrap_or(0)
    }

    fn render(&self, index: usize, format: PixelFormat) -> Result<Bitmap, JxlError> {
        render(&self.image, index, format)?.into_bitmap()
    }
}

pub(crate) fn open_animation(data: &[u8]) -> Result<Box<dyn AnimationSource>, JxlError> {
    let image = open(data)?;
    let frame_count = image.num_loaded_keyframes();
    if frame_count == 0 {
        return Err(JxlError::Decode("image has no complete frames".into()));
    }

    let animation = image.image_header().metadata.animation.as_ref();
    let (tps_numerator, tps_denominator, loop_count) = animation
        .map(|a| (a.tps_numerator, a.tps_denominator, a.num_loops))
        .unwrap_or((0, 1, 0));
    let ticks = (0..frame_count)
        .map(|i| {
            if animation.is_some() {
                image.frame_header(i).map_or(0, |h| h.duration)
            } else {
                0
            }
        })
        .collect();

    let info = AnimationInfo {
        width: image.width(),
        height: image.height(),
        frame_count,
        loop_count,
        tps_numerator,
        tps_denominator,
    };
    Ok(Box::new(OxideAnimation { image, info, ticks }))
}

pub(crate) fn reconstruct_jpeg(data: &[u8]) -> Result<Vec<u8>, JxlError> {
    let image = JxlImage::builder().read(data).map_err(JxlError::transcode)?;
    match image.jpeg_reconstruction_status() {
        JpegReconstructionStatus::Available => {}
        JpegReconstructionStatus::Unavailable => {
            return Err(JxlError::transcode("no JPEG reconstruction data"));
        }
        JpegReconstructionStatus::Invalid => {
            return Err(JxlError::transcode("invalid JPEG reconstruction data"));
        }
        JpegReconstructionStatus::NeedMoreData => {
            return Err(JxlError::transcode("truncated JPEG reconstruction data"));
        }
    }
    let mut jpeg = Vec::new();
    image
        .reconstruct_jpeg(&mut jpeg)
        .map_err(JxlError::transcode)?;
    Ok(jpeg)
}
