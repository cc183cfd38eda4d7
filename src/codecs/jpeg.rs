//! JPEG encode backend using jpeg-encoder.

use alloc::format;
use alloc::vec::Vec;

use jpeg_encoder::{ColorType, Encoder, SamplingFactor};

use crate::bitmap::{Bitmap, ChannelLayout};
use crate::config::JpegSettings;
use crate::JxlError;

/// Encode `bitmap` as baseline or progressive JPEG. Alpha is dropped.
///
/// The extended colour transform keeps full-resolution chroma (4:4:4) with
/// optimized Huffman tables; the plain path uses 4:2:0 subsampling.
pub(crate) fn encode(bitmap: &Bitmap, settings: &JpegSettings) -> Result<Vec<u8>, JxlError> {
    let width = u16::try_from(bitmap.width())
        .map_err(|_| JxlError::Encode(format!("width {} exceeds JPEG limit", bitmap.width())))?;
    let height = u16::try_from(bitmap.height())
        .map_err(|_| JxlError::Encode(format!("height {} exceeds JPEG limit", bitmap.height())))?;
    let rgb = bitmap.to_bytes(ChannelLayout::Rgb);

    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, settings.quality.clamp(1, 100));
    encoder.set_progressive(settings.progressive);
    if settings.extended_color_transform {
        encoder.set_sampling_factor(SamplingFactor::F_1_1);
        encoder.set_optimized_huffman_tables(true);
    } else {
        encoder.set_sampling_factor(SamplingFactor::F_2_2);
    }
    encoder
        .encode(&rgb, width, height, ColorType::Rgb)
        .map_err(JxlError::encode)?;
    Ok(out)
}
