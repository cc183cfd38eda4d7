//! JXL encode backend using libjxl through jpegxl-rs.

use alloc::vec::Vec;

use jpegxl_rs::encode::{EncoderFrame, EncoderSpeed};

use crate::bitmap::Bitmap;
use crate::config::EncodeSettings;
use crate::JxlError;

/// Map effort 1-9 onto libjxl's named speed tiers.
fn speed(effort: u8) -> EncoderSpeed {
    match effort {
        0 | 1 => EncoderSpeed::Lightning,
        2 => EncoderSpeed::Thunder,
        3 => EncoderSpeed::Falcon,
        4 => EncoderSpeed::Cheetah,
        5 => EncoderSpeed::Hare,
        6 => EncoderSpeed::Wombat,
        7 => EncoderSpeed::Squirrel,
        8 => EncoderSpeed::Kitten,
        _ => EncoderSpeed::Tortoise,
    }
}

/// Encode one still frame. The bitmap already matches the requested channels.
pub(crate) fn encode(bitmap: &Bitmap, settings: &EncodeSettings) -> Result<Vec<u8>, JxlError> {
    let layout = settings.color_space.layout();
    let mut encoder = jpegxl_rs::encoder_builder()
        .build()
        .map_err(JxlError::encode)?;
    encoder.has_alpha = layout.has_alpha();
    encoder.lossless = settings.lossless;
    encoder.uses_original_profile = settings.lossless;
    encoder.speed = speed(settings.effort);
    // libjxl rejects distance 0 for lossy frames; lossless ignores it
    encoder.quality = if settings.lossless {
        0.0
    } else {
        settings.distance.max(0.01)
    };
    encoder.decoding_speed = settings.decoding_speed.tier() as i64;
    let channels = layout.channels() as u32;
    let (width, height) = (bitmap.width(), bitmap.height());

    let data = if bitmap.bit_depth() > 8 {
        let samples = bitmap.to_samples16(layout);
        let frame = EncoderFrame::new(&samples).num_channels(channels);
        encoder
            .encode_frame::<u16, u16>(&frame, width, height)
            .map_err(JxlError::encode)?
            .data
    } else {
        let bytes = bitmap.to_bytes(layout);
        let frame = EncoderFrame::new(&bytes).num_channels(channels);
        encoder
            .encode_frame::<u8, u8>(&frame, width, height)
            .map_err(JxlError::encode)?
            .data
    };
    tracing::debug!(bytes = data.len(), "libjxl encode done");
    Ok(data)
}

/// Losslessly recompress JPEG bytes.
pub(crate) fn recompress_jpeg(jpeg: &[u8]) -> Result<Vec<u8>, JxlError> {
    let mut encoder = jpegxl_rs::encoder_builder()
        .build()
        .map_err(JxlError::transcode)?;
    encoder.use_container = true;
    let result = encoder.encode_jpeg(jpeg).map_err(JxlError::transcode)?;
    Ok(result.data)
}
