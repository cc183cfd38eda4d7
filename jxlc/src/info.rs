//! Header inspection without decoding pixels.

use std::path::Path;

use jxlcoder::DecodeRequest;
use serde::Serialize;

use crate::InfoArgs;
use crate::batch;

/// Run the `info` subcommand.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let files = batch::expand_inputs(&args.files)?;

    if files.is_empty() {
        anyhow::bail!("no JXL files found");
    }

    let multi = files.len() > 1;
    let mut failures = 0;

    for (i, path) in files.iter().enumerate() {
        if multi && !args.json {
            if i > 0 {
                println!();
            }
            println!("{}:", path.display());
        }

        match inspect_file(path) {
            Ok(info) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    print_info(&info);
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("  error: {e:#}");
            }
        }
    }

    if failures == files.len() {
        anyhow::bail!("no file could be inspected");
    }
    Ok(())
}

/// Probe a single file and return structured info.
fn inspect_file(path: &Path) -> anyhow::Result<InfoDisplay> {
    let data = std::fs::read(path)?;
    let info = DecodeRequest::new(&data).probe()?;

    Ok(InfoDisplay {
        path: path.display().to_string(),
        container: format!("{:?}", info.signature),
        mime_type: info.signature.mime_type().to_string(),
        width: info.width,
        height: info.height,
        has_alpha: info.has_alpha,
        bit_depth: info.bit_depth,
        has_animation: info.has_animation,
        frame_count: info.frame_count,
        loop_count: info.has_animation.then_some(info.loop_count),
        orientation: info.orientation,
        jpeg_reconstruction: info.jpeg_reconstruction,
        file_size: data.len() as u64,
    })
}

#[derive(Debug, Serialize)]
struct InfoDisplay {
    path: String,
    container: String,
    mime_type: String,
    width: u32,
    height: u32,
    has_alpha: bool,
    bit_depth: u8,
    has_animation: bool,
    frame_count: Option<u32>,
    loop_count: Option<u32>,
    orientation: u8,
    jpeg_reconstruction: bool,
    file_size: u64,
}

fn print_info(info: &InfoDisplay) {
    println!("  Format:       JPEG XL {} ({})", info.container, info.mime_type);
    println!("  Dimensions:   {}x{}", info.width, info.height);
    if info.orientation != 1 {
        println!("  Orientation:  {}", info.orientation);
    }
    println!("  Bit depth:    {}", info.bit_depth);
    println!("  Alpha:        {}", if info.has_alpha { "yes" } else { "no" });
    if info.has_animation {
        print!("  Animation:    yes");
        if let Some(count) = info.frame_count {
            print!(" ({count} frames)");
        }
        match info.loop_count {
            Some(0) => print!(", loops forever"),
            Some(n) => print!(", {n} loops"),
            None => {}
        }
        println!();
    }
    if info.jpeg_reconstruction {
        println!("  JPEG data:    reconstructible");
    }
    println!("  File size:    {}", batch::format_size(info.file_size));
}
