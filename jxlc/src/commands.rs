//! Single-file conversions: decode, encode, transcode, reconstruct, jpeg, frames.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, bail};
use jxlcoder::{
    AnimatedDecoder, ColorSpace, DecodeRequest, DecodingSpeed, EncodeRequest, JpegRequest,
    PixelFormat,
};

use crate::batch::{format_change, format_size};
use crate::output::OutputTarget;
use crate::{DecodeArgs, EncodeArgs, FramesArgs, IoArgs, JpegArgs, png_io};

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// One-line summary on stderr, e.g. `2.1 MB -> 1.6 MB (-21.4%) out.jxl in 312ms`.
fn report(input_size: usize, output_size: usize, output: &Path, started: Instant) {
    eprintln!(
        "{} -> {} ({}) {} in {}ms",
        format_size(input_size as u64),
        format_size(output_size as u64),
        format_change(input_size as u64, output_size as u64),
        output.display(),
        started.elapsed().as_millis(),
    );
}

/// Run the `decode` subcommand.
pub fn decode(args: DecodeArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let data = read_input(&args.io.input)?;
    let target = OutputTarget::resolve(&args.io.input, args.io.output.as_deref(), "png", args.io.force);
    target.check_writable(&args.io.input)?;

    let mut request = DecodeRequest::new(&data)
        .with_scale(args.scale)
        .with_filter(args.filter.to_filter());
    if let Some((w, h)) = args.resolve_size()? {
        request = request.with_rescale(w, h);
    }
    if args.sixteen_bit {
        let has_alpha = DecodeRequest::new(&data).probe()?.has_alpha;
        request = request.with_pixel_format(if has_alpha {
            PixelFormat::Rgba16
        } else {
            PixelFormat::Rgb16
        });
    }
    let bitmap = request
        .decode()
        .with_context(|| format!("decoding {}", args.io.input.display()))?;

    let png = png_io::write(&bitmap)?;
    target.write(&args.io.input, &png)?;
    report(data.len(), png.len(), &target.path, started);
    Ok(())
}

/// Run the `encode` subcommand.
pub fn encode(args: EncodeArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let data = read_input(&args.io.input)?;
    let target = OutputTarget::resolve(&args.io.input, args.io.output.as_deref(), "jxl", args.io.force);
    target.check_writable(&args.io.input)?;

    let Some(decoding_speed) = DecodingSpeed::from_tier(args.decoding_speed) else {
        bail!("--decoding-speed must be 0-4, got {}", args.decoding_speed);
    };
    let bitmap = png_io::read(&data).with_context(|| format!("reading {}", args.io.input.display()))?;

    let mut request = EncodeRequest::new()
        .with_color_space(if args.alpha { ColorSpace::Rgba } else { ColorSpace::Rgb })
        .with_lossless(args.lossless)
        .with_effort(args.effort)
        .with_decoding_speed(decoding_speed);
    if let Some(quality) = args.quality {
        request = request.with_quality(quality);
    }
    if let Some(distance) = args.distance {
        request = request.with_distance(distance);
    }
    let jxl = request.encode(&bitmap)?;

    target.write(&args.io.input, &jxl)?;
    report(data.len(), jxl.len(), &target.path, started);
    Ok(())
}

/// Run the `transcode` subcommand.
pub fn transcode(args: IoArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let jpeg = read_input(&args.input)?;
    let target = OutputTarget::resolve(&args.input, args.output.as_deref(), "jxl", args.force);
    target.check_writable(&args.input)?;

    let jxl = jxlcoder::transcode(&jpeg)
        .with_context(|| format!("recompressing {}", args.input.display()))?;
    target.write(&args.input, &jxl)?;
    report(jpeg.len(), jxl.len(), &target.path, started);
    Ok(())
}

/// Run the `reconstruct` subcommand.
pub fn reconstruct(args: IoArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let jxl = read_input(&args.input)?;
    let target = OutputTarget::resolve(&args.input, args.output.as_deref(), "jpg", args.force);
    target.check_writable(&args.input)?;

    let jpeg = jxlcoder::inverse(&jxl)
        .with_context(|| format!("reconstructing JPEG from {}", args.input.display()))?;
    target.write(&args.input, &jpeg)?;
    report(jxl.len(), jpeg.len(), &target.path, started);
    Ok(())
}

/// Run the `jpeg` subcommand.
pub fn jpeg(args: JpegArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let data = read_input(&args.io.input)?;
    let target = OutputTarget::resolve(&args.io.input, args.io.output.as_deref(), "jpg", args.io.force);
    target.check_writable(&args.io.input)?;

    let bitmap = png_io::read(&data).with_context(|| format!("reading {}", args.io.input.display()))?;
    let jpeg = JpegRequest::new()
        .with_quality(args.quality)
        .with_extended_color_transform(!args.basic)
        .with_progressive(!args.baseline)
        .encode(&bitmap)?;

    target.write(&args.io.input, &jpeg)?;
    report(data.len(), jpeg.len(), &target.path, started);
    Ok(())
}

/// Run the `frames` subcommand.
pub fn frames(args: FramesArgs) -> anyhow::Result<()> {
    let data = read_input(&args.input)?;
    let decoder = AnimatedDecoder::new(&data)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");

    eprintln!(
        "{}x{}, {} frames, loop count {}",
        decoder.width(),
        decoder.height(),
        decoder.frame_count(),
        decoder.loop_count()
    );
    for (index, frame) in decoder.frames().enumerate() {
        let (bitmap, duration_ms) = frame?;
        let target = OutputTarget::numbered(&args.output, stem, index, "png", args.force);
        target.write(&args.input, &png_io::write(&bitmap)?)?;
        println!("{} {duration_ms}ms", target.path.display());
    }
    Ok(())
}
