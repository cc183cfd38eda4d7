//! Animated JXL output through libjxl's C API.
//!
//! jpegxl-rs only writes single frames, so animation goes to jpegxl-sys
//! directly: basic info with an animation header, then one frame header
//! (carrying the duration) per added frame.

#![allow(unsafe_code)]

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::mem::MaybeUninit;
use core::ptr;

use jpegxl_sys::color::color_encoding::JxlColorEncoding;
use jpegxl_sys::common::types::{JxlDataType, JxlEndianness, JxlPixelFormat};
use jpegxl_sys::encoder::encode::{
    JxlColorEncodingSetToSRGB, JxlEncoder, JxlEncoderAddImageFrame, JxlEncoderCloseInput,
    JxlEncoderCreate, JxlEncoderDestroy, JxlEncoderFrameSettingId, JxlEncoderFrameSettings,
    JxlEncoderFrameSettingsCreate, JxlEncoderFrameSettingsSetOption, JxlEncoderGetError,
    JxlEncoderInitBasicInfo, JxlEncoderInitFrameHeader, JxlEncoderProcessOutput,
    JxlEncoderSetBasicInfo, JxlEncoderSetColorEncoding, JxlEncoderSetFrameDistance,
    JxlEncoderSetFrameHeader, JxlEncoderSetFrameLossless, JxlEncoderStatus,
};
use jpegxl_sys::metadata::codestream_header::{JxlBasicInfo, JxlFrameHeader};

use crate::config::EncodeSettings;
use crate::engine::{AnimatedSequence, ANIMATION_TICKS_PER_SECOND};
use crate::JxlError;

/// Owned libjxl encoder handle.
struct Encoder {
    raw: *mut JxlEncoder,
}

impl Encoder {
    fn new() -> Result<Self, JxlError> {
        // SAFETY: a null memory manager selects libjxl's default allocator.
        let raw = unsafe { JxlEncoderCreate(ptr::null()) };
        if raw.is_null() {
            return Err(JxlError::Encode("libjxl could not create an encoder".into()));
        }
        Ok(Self { raw })
    }

    fn check(&self, status: JxlEncoderStatus, step: &str) -> Result<(), JxlError> {
        match status {
            JxlEncoderStatus::Success => Ok(()),
            _ => {
                // SAFETY: `raw` is a live encoder.
                let error = unsafe { JxlEncoderGetError(self.raw) };
                Err(JxlError::Encode(format!("libjxl {step}: {error:?}")))
            }
        }
    }

    /// Frame settings owned by the encoder, freed with it.
    fn frame_settings(&self) -> Result<*mut JxlEncoderFrameSettings, JxlError> {
        // SAFETY: `raw` is a live encoder; a null source gives defaults.
        let settings = unsafe { JxlEncoderFrameSettingsCreate(self.raw, ptr::null()) };
        if settings.is_null() {
            return Err(JxlError::Encode("libjxl could not create frame settings".into()));
        }
        Ok(settings)
    }

    /// Drain the encoded bytes after input is closed.
    fn output(&self) -> Result<Vec<u8>, JxlError> {
        let mut out = vec![0u8; 64 * 1024];
        let mut written = 0;
        loop {
            let mut avail = out.len() - written;
            // SAFETY: `written <= out.len()`, so the pointer stays in bounds.
            let mut next = unsafe { out.as_mut_ptr().add(written) };
            // SAFETY: `next` points at `avail` writable bytes of `out`.
            let status = unsafe { JxlEncoderProcessOutput(self.raw, &mut next, &mut avail) };
            written = out.len() - avail;
            if status == JxlEncoderStatus::NeedMoreOutput {
                out.resize(out.len() * 2, 0);
                continue;
            }
            self.check(status, "writing output")?;
            out.truncate(written);
            return Ok(out);
        }
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        // SAFETY: `raw` came from JxlEncoderCreate and is destroyed once.
        unsafe { JxlEncoderDestroy(self.raw) };
    }
}

/// Frame pixels flattened at the sequence's common bit depth.
enum Samples {
    Eight(Vec<u8>),
    Sixteen(Vec<u16>),
}

impl Samples {
    fn as_raw(&self) -> (*const c_void, usize) {
        match self {
            Samples::Eight(v) => (v.as_ptr().cast(), v.len()),
            Samples::Sixteen(v) => (v.as_ptr().cast(), v.len() * 2),
        }
    }
}

/// Encode `sequence` as one animated JXL.
///
/// Durations are whole milliseconds on a [`ANIMATION_TICKS_PER_SECOND`]
/// timebase. Frames are 16-bit if any frame is.
pub(crate) fn encode(
    sequence: &AnimatedSequence,
    settings: &EncodeSettings,
) -> Result<Vec<u8>, JxlError> {
    let layout = settings.color_space.layout();
    let sixteen = sequence.frames.iter().any(|f| f.bitmap.bit_depth() > 8);
    let bits: u32 = if sixteen { 16 } else { 8 };

    let encoder = Encoder::new()?;
    let frame_settings = encoder.frame_settings()?;

    // SAFETY: `frame_settings` belongs to `encoder`, which outlives every call.
    unsafe {
        encoder.check(
            JxlEncoderSetFrameLossless(frame_settings, settings.lossless),
            "lossless mode",
        )?;
        encoder.check(
            JxlEncoderFrameSettingsSetOption(
                frame_settings,
                JxlEncoderFrameSettingId::Effort,
                i64::from(settings.effort),
            ),
            "effort",
        )?;
        encoder.check(
            JxlEncoderFrameSettingsSetOption(
                frame_settings,
                JxlEncoderFrameSettingId::DecodingSpeed,
                i64::from(settings.decoding_speed.tier()),
            ),
            "decoding speed",
        )?;
        // libjxl rejects distance 0 for lossy frames
        let distance = if settings.lossless {
            0.0
        } else {
            settings.distance.max(0.01)
        };
        encoder.check(
            JxlEncoderSetFrameDistance(frame_settings, distance),
            "distance",
        )?;
    }

    let mut info = MaybeUninit::<JxlBasicInfo>::uninit();
    // SAFETY: InitBasicInfo writes every field.
    let mut info = unsafe {
        JxlEncoderInitBasicInfo(info.as_mut_ptr());
        info.assume_init()
    };
    info.xsize = sequence.width;
    info.ysize = sequence.height;
    info.bits_per_sample = bits;
    info.uses_original_profile = settings.lossless.into();
    if layout.has_alpha() {
        info.num_extra_channels = 1;
        info.alpha_bits = bits;
    }
    info.have_animation = true.into();
    info.animation.tps_numerator = ANIMATION_TICKS_PER_SECOND;
    info.animation.tps_denominator = 1;
    info.animation.num_loops = sequence.loop_count;

    let mut color = MaybeUninit::<JxlColorEncoding>::uninit();
    // SAFETY: SetToSRGB writes every field.
    let color = unsafe {
        JxlColorEncodingSetToSRGB(color.as_mut_ptr(), false);
        color.assume_init()
    };
    // SAFETY: both structs are initialized and copied by libjxl.
    unsafe {
        encoder.check(JxlEncoderSetBasicInfo(encoder.raw, &info), "basic info")?;
        encoder.check(
            JxlEncoderSetColorEncoding(encoder.raw, &color),
            "colour encoding",
        )?;
    }

    let pixel_format = JxlPixelFormat {
        num_channels: layout.channels() as u32,
        data_type: if sixteen {
            JxlDataType::Uint16
        } else {
            JxlDataType::Uint8
        },
        endianness: JxlEndianness::Native,
        align: 0,
    };

    for frame in &sequence.frames {
        let mut header = MaybeUninit::<JxlFrameHeader>::uninit();
        // SAFETY: InitFrameHeader writes every field.
        let mut header = unsafe {
            JxlEncoderInitFrameHeader(header.as_mut_ptr());
            header.assume_init()
        };
        header.duration = frame.duration_ms;

        let samples = if sixteen {
            Samples::Sixteen(frame.bitmap.to_samples16(layout))
        } else {
            Samples::Eight(frame.bitmap.to_bytes(layout))
        };
        let (buffer, size) = samples.as_raw();
        // SAFETY: `buffer` holds `size` bytes of `pixel_format` samples for a
        // width x height frame; libjxl copies them before returning.
        unsafe {
            encoder.check(
                JxlEncoderSetFrameHeader(frame_settings, &header),
                "frame header",
            )?;
            encoder.check(
                JxlEncoderAddImageFrame(frame_settings, &pixel_format, buffer, size),
                "adding frame",
            )?;
        }
    }

    // SAFETY: `raw` is a live encoder.
    unsafe { JxlEncoderCloseInput(encoder.raw) };
    let data = encoder.output()?;
    tracing::debug!(
        frames = sequence.frames.len(),
        bytes = data.len(),
        "libjxl animation done"
    );
    Ok(data)
}
