//! Lossless JPEG recompression into JXL, and reconstruction back.
//!
//! Every failure surfaces as [`JxlError::Transcode`], except a missing
//! backend which stays [`JxlError::Unsupported`].

use alloc::vec::Vec;

use crate::codecs::NativeEngine;
use crate::engine::CodecEngine;
use crate::format::{is_jpeg, is_jxl};
use crate::JxlError;

/// Recompress a JPEG file into JXL, keeping its DCT coefficients.
pub fn transcode(jpeg: &[u8]) -> Result<Vec<u8>, JxlError> {
    transcode_with(&NativeEngine, jpeg)
}

/// Rebuild the original JPEG file from a recompressed JXL.
pub fn inverse(jxl: &[u8]) -> Result<Vec<u8>, JxlError> {
    inverse_with(&NativeEngine, jxl)
}

pub fn transcode_with(engine: &dyn CodecEngine, jpeg: &[u8]) -> Result<Vec<u8>, JxlError> {
    if !is_jpeg(jpeg) {
        return Err(JxlError::transcode("input is not a JPEG file"));
    }
    tracing::debug!(bytes = jpeg.len(), "recompressing jpeg");
    let jxl = engine.jpeg_to_jxl(jpeg).map_err(as_transcode)?;
    tracing::debug!(from = jpeg.len(), to = jxl.len(), "jpeg recompressed");
    Ok(jxl)
}

pub fn inverse_with(engine: &dyn CodecEngine, jxl: &[u8]) -> Result<Vec<u8>, JxlError> {
    if !is_jxl(jxl) {
        return Err(JxlError::transcode("input is not a JPEG XL file"));
    }
    tracing::debug!(bytes = jxl.len(), "reconstructing jpeg");
    engine.jxl_to_jpeg(jxl).map_err(as_transcode)
}

fn as_transcode(err: JxlError) -> JxlError {
    match err {
        JxlError::Transcode(_) | JxlError::Unsupported(_) => err,
        other => JxlError::transcode(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::ChannelLayout;
    use crate::test_engine::{gradient, still, TestEngine};

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0, 0xFF, 0xD9];

    #[test]
    fn roundtrip_restores_original_bytes() {
        let engine = TestEngine::default();
        let jxl = transcode_with(&engine, JPEG).unwrap();
        assert!(is_jxl(&jxl));
        assert_eq!(inverse_with(&engine, &jxl).unwrap(), JPEG);
    }

    #[test]
    fn non_jpeg_input_fails_as_transcode() {
        let engine = TestEngine::default();
        let err = transcode_with(&engine, b"\x89PNG\r\n\x1a\n").unwrap_err();
        assert!(matches!(err, JxlError::Transcode(_)));
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn inverse_without_reconstruction_data_fails() {
        let engine = TestEngine::default();
        let plain = still(&gradient(ChannelLayout::Rgb, 4, 4));
        let err = inverse_with(&engine, &plain).unwrap_err();
        assert!(matches!(err, JxlError::Transcode(_)));
    }

    #[test]
    fn inverse_of_garbage_fails_as_transcode() {
        let engine = TestEngine::default();
        assert!(matches!(inverse_with(&engine, JPEG), Err(JxlError::Transcode(_))));
        // Truncated JXL is an engine decode error, reported as transcode
        let err = inverse_with(&engine, &[0xFF, 0x0A, 1, 2]).unwrap_err();
        assert!(matches!(err, JxlError::Transcode(_)));
    }

    #[test]
    fn transcoded_file_reports_reconstruction_data() {
        let engine = TestEngine::default();
        let jxl = transcode_with(&engine, JPEG).unwrap();
        let info = crate::DecodeRequest::new(&jxl)
            .with_engine(&engine)
            .probe()
            .unwrap();
        assert!(info.jpeg_reconstruction);
    }
}
