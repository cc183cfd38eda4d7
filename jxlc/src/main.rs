//! jxlc: inspect, decode, encode and transcode JPEG XL files.

mod batch;
mod commands;
mod info;
mod output;
mod png_io;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jxlc", version, about = "JPEG XL command-line tool")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe and display JXL header information without decoding.
    Info(InfoArgs),

    /// Decode a JXL file to PNG.
    Decode(DecodeArgs),

    /// Encode a PNG file to JXL.
    Encode(EncodeArgs),

    /// Losslessly recompress a JPEG file as JXL.
    Transcode(IoArgs),

    /// Rebuild the original JPEG from a recompressed JXL file.
    Reconstruct(IoArgs),

    /// Encode a PNG file to JPEG.
    Jpeg(JpegArgs),

    /// Write each frame of an animated JXL as a numbered PNG.
    Frames(FramesArgs),
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Input files, directories or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Single input, single output.
#[derive(Args, Debug)]
pub struct IoArgs {
    pub input: PathBuf,

    /// Output file (default: input with the new extension).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Allow overwriting existing files.
    #[arg(long, env = "JXLC_FORCE")]
    pub force: bool,
}

/// Arguments for the `decode` subcommand.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Target size as WxH (e.g., 800x600).
    #[arg(long)]
    pub size: Option<String>,

    /// Backing-resolution multiplier for --size.
    #[arg(long, default_value_t = 1)]
    pub scale: u32,

    /// Resampling filter used with --size.
    #[arg(long, value_enum, default_value = "lanczos", env = "JXLC_FILTER")]
    pub filter: FilterArg,

    /// Write 16-bit PNG.
    #[arg(long)]
    pub sixteen_bit: bool,
}

/// Arguments for the `encode` subcommand.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Quality 0-100, mapped to a butteraugli distance.
    #[arg(short, long, conflicts_with = "distance")]
    pub quality: Option<u8>,

    /// Butteraugli distance 0-15.
    #[arg(short, long)]
    pub distance: Option<f32>,

    /// Encode losslessly; quality and distance are ignored.
    #[arg(long)]
    pub lossless: bool,

    /// Encoder effort 1-9.
    #[arg(short, long, default_value_t = 7, env = "JXLC_EFFORT")]
    pub effort: u8,

    /// Decoding speed tier 0-4.
    #[arg(long, default_value_t = 0)]
    pub decoding_speed: u8,

    /// Keep the alpha channel.
    #[arg(long)]
    pub alpha: bool,
}

/// Arguments for the `jpeg` subcommand.
#[derive(Args, Debug)]
pub struct JpegArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// JPEG quality 1-100.
    #[arg(short, long, default_value_t = jxlcoder::DEFAULT_JPEG_QUALITY)]
    pub quality: u8,

    /// Use plain 4:2:0 output instead of the extended colour transform.
    #[arg(long)]
    pub basic: bool,

    /// Write a baseline (sequential) JPEG.
    #[arg(long)]
    pub baseline: bool,
}

/// Arguments for the `frames` subcommand.
#[derive(Args, Debug)]
pub struct FramesArgs {
    pub input: PathBuf,

    /// Output directory.
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Allow overwriting existing files.
    #[arg(long, env = "JXLC_FORCE")]
    pub force: bool,
}

/// Resampling filter.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FilterArg {
    Nearest,
    Bilinear,
    Cubic,
    Mitchell,
    Lanczos,
    CatmullRom,
    Hermite,
    Bspline,
    Hann,
}

impl FilterArg {
    pub fn to_filter(self) -> jxlcoder::ResampleFilter {
        use jxlcoder::ResampleFilter;
        match self {
            FilterArg::Nearest => ResampleFilter::Nearest,
            FilterArg::Bilinear => ResampleFilter::Bilinear,
            FilterArg::Cubic => ResampleFilter::Cubic,
            FilterArg::Mitchell => ResampleFilter::Mitchell,
            FilterArg::Lanczos => ResampleFilter::Lanczos,
            FilterArg::CatmullRom => ResampleFilter::CatmullRom,
            FilterArg::Hermite => ResampleFilter::Hermite,
            FilterArg::Bspline => ResampleFilter::BSpline,
            FilterArg::Hann => ResampleFilter::Hann,
        }
    }
}

impl DecodeArgs {
    /// Parse --size WxH into (width, height).
    pub fn resolve_size(&self) -> anyhow::Result<Option<(u32, u32)>> {
        let Some(size) = &self.size else {
            return Ok(None);
        };
        let Some((w, h)) = size.split_once('x') else {
            anyhow::bail!("--size must be WxH (e.g., 800x600), got: {size}");
        };
        let w: u32 = w
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid width in --size: {w}"))?;
        let h: u32 = h
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid height in --size: {h}"))?;
        Ok(Some((w, h)))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Info(args) => info::run(args),
        Command::Decode(args) => commands::decode(args),
        Command::Encode(args) => commands::encode(args),
        Command::Transcode(args) => commands::transcode(args),
        Command::Reconstruct(args) => commands::reconstruct(args),
        Command::Jpeg(args) => commands::jpeg(args),
        Command::Frames(args) => commands::frames(args),
    }
}
