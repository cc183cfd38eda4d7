//! Deterministic in-memory engine for exercising the facade.
//!
//! Files start with a real JXL signature so sniffing works, followed by a
//! little-endian header and raw samples:
//!
//! ```text
//! width u32 | height u32 | channels u8 | depth u8 | frames u32 | loops u32
//! tps_num u32 | tps_den u32 | jpeg_len u32
//! frames * (ticks u32 | samples)
//! jpeg bytes
//! ```
//!
//! Lossy encodes quantize samples by a step derived from the distance, so
//! lossless and lossy outputs differ observably.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::bitmap::{Bitmap, ChannelLayout};
use crate::config::{DecodePlan, EncodeSettings, JpegSettings, PixelFormat, Size};
use crate::engine::{
    AnimatedSequence, AnimationInfo, AnimationSource, CodecEngine, ANIMATION_TICKS_PER_SECOND,
};
use crate::format::{is_jpeg, JxlSignature, CONTAINER_MAGIC, CODESTREAM_MAGIC};
use crate::{resample, ImageInfo, JxlError};

#[derive(Default)]
pub struct TestEngine {
    pub calls: AtomicUsize,
    pub last_plan: Mutex<Option<DecodePlan>>,
    pub last_settings: Mutex<Option<EncodeSettings>>,
    pub last_jpeg: Mutex<Option<JpegSettings>>,
    /// Makes `encode_animation` fail while set.
    pub fail_animation: AtomicBool,
}

impl TestEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn plan(&self) -> Option<DecodePlan> {
        *self.last_plan.lock().unwrap()
    }

    pub fn settings(&self) -> Option<EncodeSettings> {
        *self.last_settings.lock().unwrap()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// A parsed test file.
#[derive(Clone, Debug)]
struct TestFile {
    signature: JxlSignature,
    width: u32,
    height: u32,
    layout: ChannelLayout,
    depth: u8,
    loops: u32,
    tps_num: u32,
    tps_den: u32,
    frames: Vec<(u32, Bitmap)>,
    jpeg: Vec<u8>,
}

/// Encode a still bitmap in the test format, stored exactly.
pub fn still(bitmap: &Bitmap) -> Vec<u8> {
    write(&TestFile {
        signature: JxlSignature::Codestream,
        width: bitmap.width(),
        height: bitmap.height(),
        layout: bitmap.layout(),
        depth: bitmap.bit_depth(),
        loops: 0,
        tps_num: 0,
        tps_den: 1,
        frames: vec![(0, bitmap.clone())],
        jpeg: Vec::new(),
    })
}

/// Encode an animation in the test format with the given tick rate.
pub fn animated(frames: &[(Bitmap, u32)], loops: u32, tps_num: u32, tps_den: u32) -> Vec<u8> {
    let first = &frames[0].0;
    write(&TestFile {
        signature: JxlSignature::Container,
        width: first.width(),
        height: first.height(),
        layout: first.layout(),
        depth: first.bit_depth(),
        loops,
        tps_num,
        tps_den,
        frames: frames.iter().map(|(b, t)| (*t, b.clone())).collect(),
        jpeg: Vec::new(),
    })
}

/// A gradient bitmap that makes layout and position mistakes visible.
pub fn gradient(layout: ChannelLayout, width: u32, height: u32) -> Bitmap {
    let channels = layout.channels();
    let bytes: Vec<u8> = (0..width as usize * height as usize * channels)
        .map(|i| {
            let px = i / channels;
            match i % channels {
                3 => 128 + (px % 100) as u8,
                c => ((px * (c + 1) * 13) % 256) as u8,
            }
        })
        .collect();
    Bitmap::from_bytes(layout, width, height, &bytes).unwrap()
}

fn write(file: &TestFile) -> Vec<u8> {
    let mut out = match file.signature {
        JxlSignature::Codestream => CODESTREAM_MAGIC.to_vec(),
        JxlSignature::Container => CONTAINER_MAGIC.to_vec(),
    };
    for v in [file.width, file.height] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.push(file.layout.channels() as u8);
    out.push(file.depth);
    for v in [
        file.frames.len() as u32,
        file.loops,
        file.tps_num,
        file.tps_den,
        file.jpeg.len() as u32,
    ] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for (ticks, bitmap) in &file.frames {
        out.extend_from_slice(&ticks.to_le_bytes());
        if file.depth > 8 {
            for s in bitmap.to_samples16(file.layout) {
                out.extend_from_slice(&s.to_le_bytes());
            }
        } else {
            out.extend_from_slice(&bitmap.to_bytes(file.layout));
        }
    }
    out.extend_from_slice(&file.jpeg);
    out
}

struct Cursor<'a>(&'a [u8]);

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], JxlError> {
        if self.0.len() < n {
            return Err(JxlError::Decode("truncated test file".into()));
        }
        let (head, rest) = self.0.split_at(n);
        self.0 = rest;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, JxlError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, JxlError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn parse_header(data: &[u8]) -> Result<(TestFile, Cursor<'_>, usize), JxlError> {
    let signature = JxlSignature::detect(data).ok_or(JxlError::NotJxl)?;
    let mut cur = Cursor(&data[signature.prefix_len()..]);
    let width = cur.u32()?;
    let height = cur.u32()?;
    let layout = match cur.u8()? {
        3 => ChannelLayout::Rgb,
        4 => ChannelLayout::Rgba,
        n => return Err(JxlError::Decode(format!("bad channel count {n}"))),
    };
    let depth = cur.u8()?;
    let frame_count = cur.u32()? as usize;
    let file = TestFile {
        signature,
        width,
        height,
        layout,
        depth,
        loops: cur.u32()?,
        tps_num: cur.u32()?,
        tps_den: cur.u32()?,
        frames: Vec::new(),
        jpeg: vec![0; cur.u32()? as usize],
    };
    Ok((file, cur, frame_count))
}

fn parse(data: &[u8]) -> Result<TestFile, JxlError> {
    let (mut file, mut cur, frame_count) = parse_header(data)?;
    let (w, h) = (file.width, file.height);
    let samples = w as usize * h as usize * file.layout.channels();
    for _ in 0..frame_count {
        let ticks = cur.u32()?;
        let bitmap = if file.depth > 8 {
            let raw = cur.take(samples * 2)?;
            let values: Vec<u16> = raw
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            Bitmap::from_samples16(file.layout, w, h, &values)?
        } else {
            Bitmap::from_bytes(file.layout, w, h, cur.take(samples)?)?
        };
        file.frames.push((ticks, bitmap));
    }
    let jpeg_len = file.jpeg.len();
    file.jpeg = cur.take(jpeg_len)?.to_vec();
    Ok(file)
}

fn render(bitmap: &Bitmap, file: &TestFile, format: PixelFormat) -> Bitmap {
    let (layout, depth) = format.resolve(file.layout.has_alpha(), file.depth);
    bitmap.clone().into_format(layout, depth)
}

fn quantize(bitmap: &Bitmap, distance: f32) -> Result<Bitmap, JxlError> {
    let step = 1 + (distance * 4.0) as u16;
    let layout = bitmap.layout();
    if bitmap.bit_depth() > 8 {
        let samples: Vec<u16> = bitmap
            .to_samples16(layout)
            .into_iter()
            .map(|s| s - s % (step * 257))
            .collect();
        Bitmap::from_samples16(layout, bitmap.width(), bitmap.height(), &samples)
    } else {
        let bytes: Vec<u8> = bitmap
            .to_bytes(layout)
            .into_iter()
            .map(|b| b - (b as u16 % step) as u8)
            .collect();
        Bitmap::from_bytes(layout, bitmap.width(), bitmap.height(), &bytes)
    }
}

fn prepare(bitmap: &Bitmap, settings: &EncodeSettings) -> Result<Bitmap, JxlError> {
    let shaped = bitmap
        .clone()
        .into_format(settings.color_space.layout(), bitmap.bit_depth());
    if settings.lossless {
        Ok(shaped)
    } else {
        quantize(&shaped, settings.distance)
    }
}

struct TestAnimation(TestFile);

impl AnimationSource for TestAnimation {
    fn info(&self) -> AnimationInfo {
        AnimationInfo {
            width: self.0.width,
            height: self.0.height,
            frame_count: self.0.frames.len(),
            loop_count: self.0.loops,
            tps_numerator: self.0.tps_num,
            tps_denominator: self.0.tps_den,
        }
    }

    fn frame_ticks(&self, index: usize) -> u32 {
        self.0.frames[index].0
    }

    fn render(&self, index: usize, format: PixelFormat) -> Result<Bitmap, JxlError> {
        Ok(render(&self.0.frames[index].1, &self.0, format))
    }
}

impl CodecEngine for TestEngine {
    fn probe(&self, data: &[u8]) -> Result<ImageInfo, JxlError> {
        self.touch();
        let (file, _, frames) = parse_header(data)?;
        let mut info = ImageInfo::new(file.width, file.height, file.signature)
            .with_alpha(file.layout.has_alpha())
            .with_bit_depth(file.depth)
            .with_jpeg_reconstruction(!file.jpeg.is_empty());
        if file.tps_num > 0 {
            info = info.with_animation(Some(frames as u32), file.loops);
        }
        Ok(info)
    }

    fn decode(&self, data: &[u8], plan: &DecodePlan) -> Result<Bitmap, JxlError> {
        self.touch();
        *self.last_plan.lock().unwrap() = Some(*plan);
        let file = parse(data)?;
        let (_, first) = file
            .frames
            .first()
            .ok_or_else(|| JxlError::Decode("no frames".into()))?;
        let mut bitmap = render(first, &file, plan.pixel_format);
        if let Some(resize) = plan.resize {
            bitmap = resample::resample(&bitmap, resize.size, resize.filter)?;
        }
        Ok(bitmap.with_scale(plan.scale))
    }

    fn encode(&self, bitmap: &Bitmap, settings: &EncodeSettings) -> Result<Vec<u8>, JxlError> {
        self.touch();
        *self.last_settings.lock().unwrap() = Some(*settings);
        Ok(still(&prepare(bitmap, settings)?))
    }

    fn open_animation(&self, data: &[u8]) -> Result<Box<dyn AnimationSource>, JxlError> {
        self.touch();
        let file = parse(data)?;
        if file.frames.is_empty() {
            return Err(JxlError::Decode("no frames".into()));
        }
        Ok(Box::new(TestAnimation(file)))
    }

    fn encode_animation(
        &self,
        sequence: &AnimatedSequence,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, JxlError> {
        self.touch();
        *self.last_settings.lock().unwrap() = Some(*settings);
        if self.fail_animation.load(Ordering::SeqCst) {
            return Err(JxlError::Encode("animation writer failed".into()));
        }
        let frames = sequence
            .frames
            .iter()
            .map(|f| Ok((prepare(&f.bitmap, settings)?, f.duration_ms)))
            .collect::<Result<Vec<_>, JxlError>>()?;
        Ok(animated(
            &frames,
            sequence.loop_count,
            ANIMATION_TICKS_PER_SECOND,
            1,
        ))
    }

    fn jpeg_to_jxl(&self, jpeg: &[u8]) -> Result<Vec<u8>, JxlError> {
        self.touch();
        if !is_jpeg(jpeg) {
            return Err(JxlError::transcode("not a JPEG"));
        }
        let preview = gradient(ChannelLayout::Rgb, 1, 1);
        Ok(write(&TestFile {
            signature: JxlSignature::Container,
            width: 1,
            height: 1,
            layout: ChannelLayout::Rgb,
            depth: 8,
            loops: 0,
            tps_num: 0,
            tps_den: 1,
            frames: vec![(0, preview)],
            jpeg: jpeg.to_vec(),
        }))
    }

    fn jxl_to_jpeg(&self, jxl: &[u8]) -> Result<Vec<u8>, JxlError> {
        self.touch();
        let file = parse(jxl).map_err(JxlError::transcode)?;
        if file.jpeg.is_empty() {
            return Err(JxlError::transcode("no JPEG reconstruction data"));
        }
        Ok(file.jpeg)
    }

    fn encode_jpeg(&self, bitmap: &Bitmap, settings: &JpegSettings) -> Result<Vec<u8>, JxlError> {
        self.touch();
        *self.last_jpeg.lock().unwrap() = Some(*settings);
        let size = Size::new(bitmap.width(), bitmap.height());
        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE0];
        out.extend_from_slice(&size.width.to_le_bytes());
        out.extend_from_slice(&size.height.to_le_bytes());
        out.extend_from_slice(&bitmap.to_bytes(ChannelLayout::Rgb));
        out.extend_from_slice(&[0xFF, 0xD9]);
        Ok(out)
    }
}

/// Width and height stored in a test-engine JPEG.
pub fn jpeg_size(jpeg: &[u8]) -> Size {
    let w = u32::from_le_bytes([jpeg[4], jpeg[5], jpeg[6], jpeg[7]]);
    let h = u32::from_le_bytes([jpeg[8], jpeg[9], jpeg[10], jpeg[11]]);
    Size::new(w, h)
}
