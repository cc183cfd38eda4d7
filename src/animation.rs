//! Multi-frame JXL decoding and encoding.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;

use crate::codecs::NativeEngine;
use crate::config::{AnimationOptions, EncodeSettings, PixelFormat};
use crate::encode::prepare;
use crate::engine::{AnimatedSequence, AnimationFrame, AnimationInfo, AnimationSource, CodecEngine};
use crate::format::require_jxl;
use crate::{Bitmap, JxlError};

/// Random-access frame decoder.
///
/// Still images open as a single frame with duration 0. Frames are rendered
/// on demand; asking for the same index twice yields the same bitmap.
///
/// ```no_run
/// use jxlcoder::AnimatedDecoder;
///
/// let data: &[u8] = &[]; // animated JXL bytes
/// let decoder = AnimatedDecoder::new(data)?;
/// for frame in decoder.frames() {
///     let (bitmap, ms) = frame?;
///     println!("{}x{} for {ms} ms", bitmap.width(), bitmap.height());
/// }
/// # Ok::<(), jxlcoder::JxlError>(())
/// ```
pub struct AnimatedDecoder {
    source: Box<dyn AnimationSource>,
    info: AnimationInfo,
    pixel_format: PixelFormat,
}

impl AnimatedDecoder {
    /// Open `data` with the native engine.
    pub fn new(data: &[u8]) -> Result<Self, JxlError> {
        Self::with_engine(data, &NativeEngine)
    }

    pub fn with_engine(data: &[u8], engine: &dyn CodecEngine) -> Result<Self, JxlError> {
        require_jxl(data)?;
        let source = engine.open_animation(data)?;
        let info = source.info();
        tracing::debug!(
            frames = info.frame_count,
            loops = info.loop_count,
            width = info.width,
            height = info.height,
            "opened jxl animation"
        );
        Ok(Self {
            source,
            info,
            pixel_format: PixelFormat::Optimal,
        })
    }

    /// Pixel format of rendered frames. Defaults to [`PixelFormat::Optimal`].
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn frame_count(&self) -> usize {
        self.info.frame_count
    }

    /// Number of loops; 0 means loop forever.
    pub fn loop_count(&self) -> u32 {
        self.info.loop_count
    }

    pub fn frame(&self, index: usize) -> Result<Bitmap, JxlError> {
        self.check(index)?;
        self.source.render(index, self.pixel_format)
    }

    /// Display duration of frame `index` in milliseconds.
    pub fn duration(&self, index: usize) -> Result<u32, JxlError> {
        self.check(index)?;
        Ok(self.info.ticks_to_ms(self.source.frame_ticks(index)))
    }

    /// Iterate over `(frame, duration_ms)` in order.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            decoder: self,
            next: 0,
        }
    }

    fn check(&self, index: usize) -> Result<(), JxlError> {
        if index >= self.info.frame_count {
            return Err(JxlError::FrameIndexOutOfRange {
                index,
                count: self.info.frame_count,
            });
        }
        Ok(())
    }
}

/// Iterator returned by [`AnimatedDecoder::frames`].
pub struct Frames<'d> {
    decoder: &'d AnimatedDecoder,
    next: usize,
}

impl Iterator for Frames<'_> {
    type Item = Result<(Bitmap, u32), JxlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.decoder.frame_count() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(
            self.decoder
                .frame(index)
                .and_then(|bitmap| Ok((bitmap, self.decoder.duration(index)?))),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.decoder.frame_count().saturating_sub(self.next);
        (left, Some(left))
    }
}

/// Accumulates fixed-size frames and writes one animated JXL.
///
/// The encoder is open until [`finish`](Self::finish) succeeds; after that
/// every call returns [`JxlError::EncoderAlreadyFinished`]. A failed
/// `finish` keeps every frame, so it can be retried.
///
/// ```no_run
/// use jxlcoder::{AnimatedEncoder, AnimationOptions, Bitmap};
/// use jxlcoder::pixel::{ImgVec, Rgba};
///
/// let frame = Bitmap::from_rgba8(ImgVec::new(vec![Rgba::new(0u8, 0, 0, 255); 64], 8, 8));
/// let mut encoder = AnimatedEncoder::new(8, 8, AnimationOptions::default())?;
/// encoder.add_frame(&frame, 100)?;
/// encoder.add_frame(&frame, 250)?;
/// let jxl = encoder.finish()?;
/// # Ok::<(), jxlcoder::JxlError>(())
/// ```
pub struct AnimatedEncoder<'e> {
    width: u32,
    height: u32,
    loop_count: u32,
    settings: EncodeSettings,
    frames: Vec<AnimationFrame>,
    finished: bool,
    engine: Option<&'e dyn CodecEngine>,
}

impl AnimatedEncoder<'static> {
    pub fn new(width: u32, height: u32, options: AnimationOptions) -> Result<Self, JxlError> {
        if width == 0 || height == 0 {
            return Err(JxlError::Encode(format!(
                "animation canvas {width}x{height} has a zero side"
            )));
        }
        Ok(Self {
            width,
            height,
            loop_count: options.loop_count,
            settings: options.encode.resolve()?,
            frames: Vec::new(),
            finished: false,
            engine: None,
        })
    }
}

impl<'e> AnimatedEncoder<'e> {
    /// Use a specific engine instead of [`NativeEngine`].
    pub fn with_engine<'b>(self, engine: &'b dyn CodecEngine) -> AnimatedEncoder<'b> {
        AnimatedEncoder {
            width: self.width,
            height: self.height,
            loop_count: self.loop_count,
            settings: self.settings,
            frames: self.frames,
            finished: self.finished,
            engine: Some(engine),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Append a frame shown for `duration_ms` milliseconds.
    ///
    /// A frame whose size differs from the canvas is rejected and the
    /// encoder is left unchanged.
    pub fn add_frame(&mut self, bitmap: &Bitmap, duration_ms: u32) -> Result<(), JxlError> {
        if self.finished {
            return Err(JxlError::EncoderAlreadyFinished);
        }
        if (bitmap.width(), bitmap.height()) != (self.width, self.height) {
            return Err(JxlError::Encode(format!(
                "frame is {}x{}, animation is {}x{}",
                bitmap.width(),
                bitmap.height(),
                self.width,
                self.height
            )));
        }
        let bitmap = prepare(bitmap, &self.settings)?.into_owned();
        self.frames.push(AnimationFrame {
            bitmap,
            duration_ms,
        });
        Ok(())
    }

    /// Encode all frames. Fails without finishing if no frame was added or
    /// the engine rejects the sequence.
    pub fn finish(&mut self) -> Result<Vec<u8>, JxlError> {
        if self.finished {
            return Err(JxlError::EncoderAlreadyFinished);
        }
        if self.frames.is_empty() {
            return Err(JxlError::Encode("animation has no frames".into()));
        }
        let sequence = AnimatedSequence {
            width: self.width,
            height: self.height,
            loop_count: self.loop_count,
            frames: core::mem::take(&mut self.frames),
        };
        tracing::debug!(
            frames = sequence.frames.len(),
            loops = sequence.loop_count,
            settings = ?self.settings,
            "encoding jxl animation"
        );
        let result = self
            .engine
            .unwrap_or(&NativeEngine)
            .encode_animation(&sequence, &self.settings);
        match result {
            Ok(bytes) => {
                self.finished = true;
                Ok(bytes)
            }
            Err(err) => {
                self.frames = sequence.frames;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::ChannelLayout;
    use crate::config::{ColorSpace, EncodeOptions};
    use crate::test_engine::{animated, gradient, still, TestEngine};

    fn fixed_frames(count: u32) -> Vec<Bitmap> {
        (0..count)
            .map(|i| {
                let base = gradient(ChannelLayout::Rgba, 8, 6);
                let mut bytes = base.to_bytes(ChannelLayout::Rgba);
                bytes[0] = i as u8;
                Bitmap::from_bytes(ChannelLayout::Rgba, 8, 6, &bytes).unwrap()
            })
            .collect()
    }

    #[test]
    fn durations_follow_tick_rate() {
        let engine = TestEngine::default();
        let frames: Vec<(Bitmap, u32)> = fixed_frames(3).into_iter().zip([1, 2, 3]).collect();
        let file = animated(&frames, 2, 30, 1);
        let decoder = AnimatedDecoder::with_engine(&file, &engine).unwrap();
        assert_eq!(decoder.frame_count(), 3);
        assert_eq!(decoder.loop_count(), 2);
        assert_eq!(decoder.duration(0).unwrap(), 33);
        assert_eq!(decoder.duration(1).unwrap(), 67);
        assert_eq!(decoder.duration(2).unwrap(), 100);
    }

    #[test]
    fn frame_access_is_random_and_idempotent() {
        let engine = TestEngine::default();
        let originals = fixed_frames(4);
        let frames: Vec<(Bitmap, u32)> = originals.iter().cloned().map(|b| (b, 10)).collect();
        let file = animated(&frames, 0, 1000, 1);
        let decoder = AnimatedDecoder::with_engine(&file, &engine).unwrap();

        assert_eq!(decoder.frame(2).unwrap(), originals[2]);
        assert_eq!(decoder.frame(0).unwrap(), originals[0]);
        assert_eq!(decoder.frame(2).unwrap(), decoder.frame(2).unwrap());
    }

    #[test]
    fn out_of_range_index() {
        let engine = TestEngine::default();
        let file = animated(&[(gradient(ChannelLayout::Rgb, 2, 2), 5)], 0, 1000, 1);
        let decoder = AnimatedDecoder::with_engine(&file, &engine).unwrap();
        assert!(matches!(
            decoder.frame(1),
            Err(JxlError::FrameIndexOutOfRange { index: 1, count: 1 })
        ));
        assert!(matches!(
            decoder.duration(7),
            Err(JxlError::FrameIndexOutOfRange { index: 7, count: 1 })
        ));
    }

    #[test]
    fn still_image_is_one_zero_length_frame() {
        let engine = TestEngine::default();
        let bitmap = gradient(ChannelLayout::Rgb, 5, 3);
        let decoder = AnimatedDecoder::with_engine(&still(&bitmap), &engine).unwrap();
        assert_eq!(decoder.frame_count(), 1);
        assert_eq!(decoder.duration(0).unwrap(), 0);
        assert_eq!(decoder.frame(0).unwrap(), bitmap);
    }

    #[test]
    fn non_jxl_rejected() {
        let engine = TestEngine::default();
        let err = AnimatedDecoder::with_engine(b"GIF89a", &engine).err().unwrap();
        assert!(matches!(err, JxlError::NotJxl));
        let err = AnimatedDecoder::with_engine(&[0xFF, 0x0A, 0], &engine).err().unwrap();
        assert!(matches!(err, JxlError::Decode(_)));
    }

    #[test]
    fn frames_iterator_and_pixel_format() {
        let engine = TestEngine::default();
        let frames: Vec<(Bitmap, u32)> = fixed_frames(3).into_iter().zip([5, 5, 5]).collect();
        let file = animated(&frames, 0, 1000, 1);
        let decoder = AnimatedDecoder::with_engine(&file, &engine)
            .unwrap()
            .with_pixel_format(PixelFormat::Rgb16);
        assert_eq!(decoder.frames().size_hint(), (3, Some(3)));
        let decoded: Vec<_> = decoder.frames().collect::<Result<_, _>>().unwrap();
        assert_eq!(decoded.len(), 3);
        for (bitmap, ms) in decoded {
            assert_eq!(bitmap.bit_depth(), 16);
            assert!(!bitmap.has_alpha());
            assert_eq!(ms, 5);
        }
    }

    #[test]
    fn encode_then_decode_preserves_frames_and_timing() {
        let engine = TestEngine::default();
        let options = AnimationOptions::default()
            .with_loop_count(3)
            .with_encode(EncodeOptions::default().with_color_space(ColorSpace::Rgba).with_lossless(true));
        let mut encoder = AnimatedEncoder::new(8, 6, options).unwrap().with_engine(&engine);
        let originals = fixed_frames(3);
        for (bitmap, ms) in originals.iter().zip([40, 80, 120]) {
            encoder.add_frame(bitmap, ms).unwrap();
        }
        assert_eq!(encoder.frame_count(), 3);
        let jxl = encoder.finish().unwrap();
        assert!(encoder.is_finished());

        let decoder = AnimatedDecoder::with_engine(&jxl, &engine).unwrap();
        assert_eq!(decoder.frame_count(), 3);
        assert_eq!(decoder.loop_count(), 3);
        for (i, ms) in [40, 80, 120].into_iter().enumerate() {
            assert_eq!(decoder.duration(i).unwrap(), ms);
            assert_eq!(decoder.frame(i).unwrap(), originals[i]);
        }
    }

    #[test]
    fn wrong_frame_size_leaves_encoder_unchanged() {
        let engine = TestEngine::default();
        let mut encoder = AnimatedEncoder::new(8, 6, AnimationOptions::default())
            .unwrap()
            .with_engine(&engine);
        encoder.add_frame(&fixed_frames(1)[0], 10).unwrap();
        let err = encoder
            .add_frame(&gradient(ChannelLayout::Rgba, 6, 8), 10)
            .unwrap_err();
        assert!(matches!(err, JxlError::Encode(_)));
        assert_eq!(encoder.frame_count(), 1);
        assert!(!encoder.is_finished());
    }

    #[test]
    fn calls_after_finish_fail() {
        let engine = TestEngine::default();
        let mut encoder = AnimatedEncoder::new(8, 6, AnimationOptions::default())
            .unwrap()
            .with_engine(&engine);
        let frame = &fixed_frames(1)[0];
        encoder.add_frame(frame, 10).unwrap();
        encoder.finish().unwrap();
        assert!(matches!(
            encoder.add_frame(frame, 10),
            Err(JxlError::EncoderAlreadyFinished)
        ));
        assert!(matches!(encoder.finish(), Err(JxlError::EncoderAlreadyFinished)));
    }

    #[test]
    fn failed_finish_keeps_frames_for_retry() {
        let engine = TestEngine::default();
        engine.fail_animation.store(true, std::sync::atomic::Ordering::SeqCst);
        let mut encoder = AnimatedEncoder::new(8, 6, AnimationOptions::default())
            .unwrap()
            .with_engine(&engine);
        let frames = fixed_frames(2);
        encoder.add_frame(&frames[0], 10).unwrap();
        encoder.add_frame(&frames[1], 20).unwrap();

        assert!(matches!(encoder.finish(), Err(JxlError::Encode(_))));
        assert!(!encoder.is_finished());
        assert_eq!(encoder.frame_count(), 2);
        encoder.add_frame(&frames[0], 30).unwrap();

        engine.fail_animation.store(false, std::sync::atomic::Ordering::SeqCst);
        let jxl = encoder.finish().unwrap();
        assert!(encoder.is_finished());
        let decoder = AnimatedDecoder::with_engine(&jxl, &engine).unwrap();
        assert_eq!(decoder.frame_count(), 3);
        assert_eq!(decoder.duration(2).unwrap(), 30);
    }

    #[test]
    fn finish_without_frames_fails() {
        let engine = TestEngine::default();
        let mut encoder = AnimatedEncoder::new(4, 4, AnimationOptions::default())
            .unwrap()
            .with_engine(&engine);
        assert!(matches!(encoder.finish(), Err(JxlError::Encode(_))));
        assert!(!encoder.is_finished());
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn invalid_options_rejected_up_front() {
        assert!(matches!(
            AnimatedEncoder::new(0, 4, AnimationOptions::default()),
            Err(JxlError::Encode(_))
        ));
        let bad = AnimationOptions::default().with_encode(EncodeOptions::default().with_effort(12));
        assert!(matches!(
            AnimatedEncoder::new(4, 4, bad),
            Err(JxlError::Encode(_))
        ));
    }

    #[test]
    fn rgb_frames_get_opaque_alpha() {
        let engine = TestEngine::default();
        let mut encoder = AnimatedEncoder::new(3, 3, AnimationOptions::default())
            .unwrap()
            .with_engine(&engine);
        encoder
            .add_frame(&gradient(ChannelLayout::Rgb, 3, 3), 10)
            .unwrap();
        let jxl = encoder.finish().unwrap();
        let frame = AnimatedDecoder::with_engine(&jxl, &engine)
            .unwrap()
            .frame(0)
            .unwrap();
        assert!(frame.has_alpha());
    }

    #[test]
    fn decoder_sizes_report_canvas() {
        let engine = TestEngine::default();
        let file = animated(&[(gradient(ChannelLayout::Rgba, 6, 4), 1)], 0, 1000, 1);
        let decoder = AnimatedDecoder::with_engine(&file, &engine).unwrap();
        assert_eq!((decoder.width(), decoder.height()), (6, 4));
    }
}
