#![no_main]
use libfuzzer_sys::fuzz_target;
use zentex::{DecodeRequest, Limits, TextureInfo};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        ..Default::default()
    };

    // Probing and decoding must never panic
    let _ = TextureInfo::from_bytes(data);
    if let Ok(texture) = DecodeRequest::new(data).with_limits(&limits).decode() {
        let _ = texture.pixels();
    }

    // Same input as a GVPL palette for a tiny indexed GVR
    let _ = zentex::gvr::ExternalPalette::from_bytes(data).and_then(|p| p.palette(256));
});
