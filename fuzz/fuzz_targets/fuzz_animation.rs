#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(decoder) = jxlcoder::AnimatedDecoder::new(data) else {
        return;
    };
    if decoder.width() as u64 * decoder.height() as u64 > 1 << 20 {
        return;
    }
    for frame in decoder.frames().take(8) {
        let Ok((bitmap, _)) = frame else {
            break;
        };
        assert_eq!(bitmap.width(), decoder.width());
    }
    assert!(decoder.frame(decoder.frame_count()).is_err());
});
