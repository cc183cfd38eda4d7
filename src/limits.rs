//! Decode size limits.

use alloc::format;

use crate::config::Size;
use crate::JxlError;

/// Caps on the image size a decode may produce.
///
/// Checked against the header, and again against a rescale target, before
/// any pixels are decoded. Unset fields do not limit anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Cap on width × height.
    pub max_pixels: Option<u64>,
}

impl Limits {
    /// No caps at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_size(mut self, width: u32, height: u32) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = Some(max_pixels);
        self
    }

    /// `Err` names the first cap that `size` exceeds.
    pub fn check(&self, size: Size) -> Result<(), JxlError> {
        let exceeded = |what: &str, value: u64, cap: u64| {
            Err(JxlError::Decode(format!(
                "{}x{} exceeds the {what} limit ({value} > {cap})",
                size.width, size.height
            )))
        };
        if let Some(cap) = self.max_width.filter(|&cap| size.width > cap) {
            return exceeded("width", size.width.into(), cap.into());
        }
        if let Some(cap) = self.max_height.filter(|&cap| size.height > cap) {
            return exceeded("height", size.height.into(), cap.into());
        }
        let pixels = u64::from(size.width) * u64::from(size.height);
        if let Some(cap) = self.max_pixels.filter(|&cap| pixels > cap) {
            return exceeded("pixel", pixels, cap);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_accepts_anything() {
        assert!(Limits::none().check(Size::new(u32::MAX, u32::MAX)).is_ok());
    }

    #[test]
    fn each_cap_applies() {
        let limits = Limits::none().with_max_size(1000, 800).with_max_pixels(500_000);
        assert!(limits.check(Size::new(700, 700)).is_ok());
        assert!(limits.check(Size::new(1001, 10)).is_err());
        assert!(limits.check(Size::new(10, 801)).is_err());
        assert!(limits.check(Size::new(1000, 800)).is_err());
    }

    #[test]
    fn failure_is_a_decode_error_naming_the_cap() {
        let err = Limits::none().with_max_pixels(100).check(Size::new(20, 20)).unwrap_err();
        assert!(matches!(err, JxlError::Decode(ref m) if m.contains("20x20") && m.contains("pixel")));
    }
}
