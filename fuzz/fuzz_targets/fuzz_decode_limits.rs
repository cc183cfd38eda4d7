#![no_main]

use arbitrary::Arbitrary;
use jxlcoder::{DecodeRequest, Limits, PixelFormat, ResampleFilter};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    rescale: Option<(u8, u8)>,
    sixteen_bit: bool,
    data: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let limits = Limits::none().with_max_pixels(1 << 20);
    let mut request = DecodeRequest::new(input.data)
        .with_limits(&limits)
        .with_filter(ResampleFilter::Mitchell)
        .with_pixel_format(if input.sixteen_bit {
            PixelFormat::Rgba16
        } else {
            PixelFormat::Rgb8
        });
    if let Some((w, h)) = input.rescale {
        request = request.with_rescale(u32::from(w), u32::from(h));
    }
    if let Ok(bitmap) = request.decode() {
        if let Some((w, h)) = input.rescale {
            assert_eq!((bitmap.width(), bitmap.height()), (u32::from(w), u32::from(h)));
        }
    }
});
