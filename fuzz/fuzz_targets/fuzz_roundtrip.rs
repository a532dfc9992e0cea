#![no_main]
use libfuzzer_sys::fuzz_target;
use zentex::gim::GimPixelFormat;
use zentex::gvr::{GvrDataFormat, GvrPixelFormat};
use zentex::*;

fuzz_target!(|data: &[u8]| {
    // If we can decode it, re-encoding into a lossless format and decoding again
    // must produce identical pixels
    let limits = Limits {
        max_pixels: Some(1 << 20),
        ..Default::default()
    };
    let Ok(texture) = DecodeRequest::new(data).with_limits(&limits).decode() else {
        return;
    };
    let format = texture.format();
    let Ok(decoded) = texture.into_image() else {
        return;
    };

    let request = match format {
        TextureFormat::Gim => EncodeRequest::gim(GimPixelFormat::Rgba8888),
        TextureFormat::Gvr => EncodeRequest::gvr(GvrPixelFormat::Rgb565, GvrDataFormat::Argb8888),
        _ => return,
    };
    let reencoded = request.encode(&decoded).expect("lossless re-encode failed");
    let Ok(decoded2) = DecodeRequest::new(&reencoded.bytes)
        .decode()
        .and_then(|t| t.into_image())
    else {
        panic!("re-encoded data failed to decode");
    };

    assert_eq!(decoded.width(), decoded2.width());
    assert_eq!(decoded.height(), decoded2.height());
    assert_eq!(decoded.pixels(), decoded2.pixels(), "roundtrip pixel mismatch");
});
