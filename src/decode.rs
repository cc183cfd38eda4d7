//! Image decoding.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::codecs::NativeEngine;
use crate::config::{DecodeOptions, PixelFormat, ResampleFilter, Size};
use crate::engine::CodecEngine;
use crate::format::require_jxl;
use crate::{Bitmap, ImageInfo, JxlError, Limits};

/// Where encoded bytes come from. Used for one call and then dropped.
pub enum Source<'a> {
    Bytes(&'a [u8]),
    /// Drained to the end before decoding.
    Reader(Box<dyn Read + 'a>),
    Path(PathBuf),
}

impl<'a> Source<'a> {
    /// Read the whole source into memory.
    fn load(self) -> Result<Cow<'a, [u8]>, JxlError> {
        match self {
            Source::Bytes(data) => Ok(Cow::Borrowed(data)),
            Source::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).map_err(JxlError::decode)?;
                Ok(Cow::Owned(buf))
            }
            Source::Path(path) => {
                let mut file = std::fs::File::open(&path)
                    .map_err(|source| JxlError::UnreadableSource { path: path.clone(), source })?;
                let mut buf = Vec::new();
                file.read_to_end(&mut buf).map_err(JxlError::decode)?;
                Ok(Cow::Owned(buf))
            }
        }
    }
}

impl core::fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Source::Bytes(data) => write!(f, "Bytes({} bytes)", data.len()),
            Source::Reader(_) => f.write_str("Reader"),
            Source::Path(path) => write!(f, "Path({})", path.display()),
        }
    }
}

impl<'a> From<&'a [u8]> for Source<'a> {
    fn from(data: &'a [u8]) -> Self {
        Source::Bytes(data)
    }
}

impl<'a> From<&'a Vec<u8>> for Source<'a> {
    fn from(data: &'a Vec<u8>) -> Self {
        Source::Bytes(data)
    }
}

impl From<&Path> for Source<'_> {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Source<'_> {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

/// Image decode request builder.
///
/// # Example
///
/// ```no_run
/// use jxlcoder::{DecodeRequest, PixelFormat, ResampleFilter};
///
/// let data: &[u8] = &[]; // your JXL bytes
/// let bitmap = DecodeRequest::new(data)
///     .with_rescale(320, 240)
///     .with_scale(2)
///     .with_filter(ResampleFilter::Mitchell)
///     .with_pixel_format(PixelFormat::Rgba8)
///     .decode()?;
/// assert_eq!(bitmap.logical_size(), (320, 240));
/// # Ok::<(), jxlcoder::JxlError>(())
/// ```
pub struct DecodeRequest<'a> {
    source: Source<'a>,
    options: DecodeOptions,
    limits: Option<&'a Limits>,
    engine: Option<&'a dyn CodecEngine>,
}

impl<'a> DecodeRequest<'a> {
    /// Decode from bytes in memory.
    pub fn new(data: &'a [u8]) -> Self {
        Self::from_source(Source::Bytes(data))
    }

    /// Decode from a reader, drained to the end.
    pub fn from_reader(reader: impl Read + 'a) -> Self {
        Self::from_source(Source::Reader(Box::new(reader)))
    }

    /// Decode from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::from_source(Source::Path(path.as_ref().to_path_buf()))
    }

    pub fn from_source(source: Source<'a>) -> Self {
        Self {
            source,
            options: DecodeOptions::default(),
            limits: None,
            engine: None,
        }
    }

    /// Replace all decode options at once.
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the logical output size.
    pub fn with_rescale(mut self, width: u32, height: u32) -> Self {
        self.options.rescale = Some(Size::new(width, height));
        self
    }

    /// Set the display scale factor; the backing size of a rescale target is
    /// multiplied by it.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.options.scale = scale;
        self
    }

    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.options.pixel_format = format;
        self
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.options.filter = filter;
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Use a specific engine instead of [`NativeEngine`].
    pub fn with_engine(mut self, engine: &'a dyn CodecEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Decode the first frame to a bitmap.
    pub fn decode(self) -> Result<Bitmap, JxlError> {
        self.options.validate()?;
        let engine = self.engine.unwrap_or(&NativeEngine);
        let limits = self.limits;
        let options = self.options;
        let data = self.source.load()?;
        require_jxl(&data)?;

        let info = engine.probe(&data)?;
        if let Some(limits) = limits {
            limits.check(info.size())?;
        }
        let plan = options.plan(info.size())?;
        if let (Some(limits), Some(resize)) = (limits, plan.resize) {
            limits.check(resize.size)?;
        }
        tracing::debug!(
            width = info.width,
            height = info.height,
            ?plan,
            "decoding jxl"
        );

        let bitmap = engine.decode(&data, &plan)?;
        Ok(bitmap.with_scale(plan.scale))
    }

    /// Intrinsic size from a header-only parse.
    pub fn size(self) -> Result<Size, JxlError> {
        Ok(self.probe()?.size())
    }

    /// Header information without decoding pixels.
    pub fn probe(self) -> Result<ImageInfo, JxlError> {
        let engine = self.engine.unwrap_or(&NativeEngine);
        let data = self.source.load()?;
        require_jxl(&data)?;
        engine.probe(&data)
    }
}

/// Decode `source` with `options` using the native engine.
pub fn decode<'a>(source: impl Into<Source<'a>>, options: &DecodeOptions) -> Result<Bitmap, JxlError> {
    DecodeRequest::from_source(source.into())
        .with_options(*options)
        .decode()
}

/// Intrinsic size of `source` using the native engine.
pub fn size<'a>(source: impl Into<Source<'a>>) -> Result<Size, JxlError> {
    DecodeRequest::from_source(source.into()).size()
}

/// Header information of `source` using the native engine.
pub fn probe<'a>(source: impl Into<Source<'a>>) -> Result<ImageInfo, JxlError> {
    DecodeRequest::from_source(source.into()).probe()
}
