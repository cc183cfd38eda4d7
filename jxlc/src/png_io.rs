//! PNG read/write for bitmaps, using the png crate.

use std::io::Cursor;

use anyhow::{Context, bail};
use jxlcoder::{Bitmap, ChannelLayout};

/// Decode PNG bytes into an RGB or RGBA bitmap, keeping 16-bit samples.
pub fn read(data: &[u8]) -> anyhow::Result<Bitmap> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder.read_info().context("reading PNG header")?;

    let buffer_size = reader
        .output_buffer_size()
        .context("cannot determine PNG output buffer size")?;
    let mut raw = vec![0u8; buffer_size];
    let frame = reader.next_frame(&mut raw).context("decoding PNG")?;
    raw.truncate(frame.buffer_size());

    let (color, depth) = reader.output_color_type();
    let (width, height) = (frame.width, frame.height);

    let (channels, layout) = match color {
        png::ColorType::Grayscale => (1, ChannelLayout::Rgb),
        png::ColorType::GrayscaleAlpha => (2, ChannelLayout::Rgba),
        png::ColorType::Rgb => (3, ChannelLayout::Rgb),
        png::ColorType::Rgba => (4, ChannelLayout::Rgba),
        png::ColorType::Indexed => bail!("indexed PNG was not expanded"),
    };

    if depth == png::BitDepth::Sixteen {
        let samples: Vec<u16> = raw
            .chunks_exact(2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .collect();
        let expanded = to_rgb_layout(&samples, channels);
        Ok(Bitmap::from_samples16(layout, width, height, &expanded)?)
    } else {
        let expanded = to_rgb_layout(&raw, channels);
        Ok(Bitmap::from_bytes(layout, width, height, &expanded)?)
    }
}

/// Widen gray and gray+alpha samples to RGB and RGBA.
fn to_rgb_layout<T: Copy>(samples: &[T], channels: usize) -> Vec<T> {
    match channels {
        1 => samples.iter().flat_map(|&g| [g, g, g]).collect(),
        2 => samples
            .chunks_exact(2)
            .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
            .collect(),
        _ => samples.to_vec(),
    }
}

/// Encode a bitmap as PNG at its own bit depth and channel layout.
pub fn write(bitmap: &Bitmap) -> anyhow::Result<Vec<u8>> {
    let layout = bitmap.layout();
    let mut output = Vec::new();
    let mut encoder = png::Encoder::new(&mut output, bitmap.width(), bitmap.height());
    encoder.set_color(match layout {
        ChannelLayout::Rgb => png::ColorType::Rgb,
        ChannelLayout::Rgba => png::ColorType::Rgba,
    });

    let bytes = if bitmap.bit_depth() > 8 {
        encoder.set_depth(png::BitDepth::Sixteen);
        bitmap
            .to_samples16(layout)
            .iter()
            .flat_map(|s| s.to_be_bytes())
            .collect()
    } else {
        encoder.set_depth(png::BitDepth::Eight);
        bitmap.to_bytes(layout)
    };

    let mut writer = encoder.write_header().context("writing PNG header")?;
    writer.write_image_data(&bytes).context("writing PNG data")?;
    writer.finish().context("finishing PNG")?;
    Ok(output)
}
