#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let sniffed = jxlcoder::is_jxl(data);
    if let Ok(info) = jxlcoder::DecodeRequest::new(data).probe() {
        assert!(sniffed);
        assert!(info.width > 0 && info.height > 0);
    }
});
