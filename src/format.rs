//! JPEG XL signature detection.

use crate::JxlError;

/// Bare codestream signature.
pub const CODESTREAM_MAGIC: [u8; 2] = [0xFF, 0x0A];

/// ISOBMFF `JXL ` signature box.
pub const CONTAINER_MAGIC: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, 0x4A, 0x58, 0x4C, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
];

/// Which of the two JXL signatures a buffer starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JxlSignature {
    /// `FF 0A`: a raw codestream.
    Codestream,
    /// 12-byte signature box: the ISOBMFF container.
    Container,
}

impl JxlSignature {
    /// Detect the signature from leading bytes. Returns None if unrecognized.
    ///
    /// Only the prefix is inspected; the rest of the stream is not validated.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&CODESTREAM_MAGIC) {
            return Some(JxlSignature::Codestream);
        }
        if data.starts_with(&CONTAINER_MAGIC) {
            return Some(JxlSignature::Container);
        }
        None
    }

    /// Number of leading bytes the signature occupies.
    pub fn prefix_len(self) -> usize {
        match self {
            JxlSignature::Codestream => CODESTREAM_MAGIC.len(),
            JxlSignature::Container => CONTAINER_MAGIC.len(),
        }
    }

    pub fn mime_type(self) -> &'static str {
        "image/jxl"
    }
}

/// Whether `data` starts with either JXL signature.
///
/// Input shorter than a signature simply does not match it.
pub fn is_jxl(data: &[u8]) -> bool {
    JxlSignature::detect(data).is_some()
}

/// Like [`is_jxl`], but as an error for callers that require JXL input.
pub fn require_jxl(data: &[u8]) -> Result<JxlSignature, JxlError> {
    JxlSignature::detect(data).ok_or(JxlError::NotJxl)
}

/// Whether `data` starts with a JPEG SOI marker followed by another marker.
pub fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF
}

/// Detect from file extension (case-insensitive).
pub fn is_jxl_extension(ext: &str) -> bool {
    ext.eq_ignore_ascii_case("jxl")
}
