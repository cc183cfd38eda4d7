//! Typed pixel buffers, re-exported from `imgref` and `rgb`.
//!
//! Bitmaps store 2D pixel data as `imgref::ImgVec` of `rgb` pixels.

pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{Rgb, Rgba};
