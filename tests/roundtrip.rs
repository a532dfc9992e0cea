use rgb::RGBA8;
use zentex::gim::{GimMetadata, GimPixelFormat};
use zentex::gvr::{GlobalIndex, GlobalIndexKind, GvrDataFormat, GvrPixelFormat};
use zentex::*;

fn noise(w: u32, h: u32, seed: u32) -> Vec<RGBA8> {
    let mut state = seed;
    (0..w * h)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, a] = state.to_le_bytes();
            RGBA8::new(r, g, b, a)
        })
        .collect()
}

fn image(w: u32, h: u32, pixels: Vec<RGBA8>) -> RgbaImage {
    RgbaImage::new(w, h, pixels).unwrap()
}

fn decode(bytes: &[u8]) -> RgbaImage {
    DecodeRequest::new(bytes).decode().unwrap().into_image().unwrap()
}

#[test]
fn gim_rgba8888_swizzled_roundtrip() {
    let pixels = noise(13, 7, 0xDEAD_BEEF);
    let out = EncodeRequest::gim(GimPixelFormat::Rgba8888)
        .encode(&image(13, 7, pixels.clone()))
        .unwrap();
    assert!(out.external_palette.is_none());

    let texture = DecodeRequest::new(&out.bytes).decode().unwrap();
    assert_eq!(texture.format(), TextureFormat::Gim);
    assert_eq!((texture.width(), texture.height()), (13, 7));
    assert!(texture.as_gim().unwrap().is_swizzled());
    assert_eq!(texture.pixels().unwrap().pixels(), &pixels[..]);
}

#[test]
fn gim_rgba8888_linear_roundtrip() {
    let pixels = noise(20, 9, 7);
    let out = EncodeRequest::gim(GimPixelFormat::Rgba8888)
        .with_swizzle(false)
        .encode(&image(20, 9, pixels.clone()))
        .unwrap();
    let texture = DecodeRequest::new(&out.bytes).decode().unwrap();
    assert!(!texture.as_gim().unwrap().is_swizzled());
    assert_eq!(texture.pixels().unwrap().pixels(), &pixels[..]);
}

#[test]
fn gim_sixteen_bit_formats_stay_within_a_step() {
    let cases = [
        (GimPixelFormat::Rgb565, [8u8, 4, 8, 0]),
        (GimPixelFormat::Rgba5551, [8, 8, 8, 128]),
        (GimPixelFormat::Rgba4444, [16, 16, 16, 16]),
    ];
    for (format, step) in cases {
        let mut pixels = noise(17, 11, 99);
        if format == GimPixelFormat::Rgb565 {
            pixels.iter_mut().for_each(|p| p.a = 255);
        }
        let bytes = EncodeRequest::gim(format)
            .encode(&image(17, 11, pixels.clone()))
            .unwrap()
            .bytes;
        let first = decode(&bytes);
        for (a, b) in pixels.iter().zip(first.pixels()) {
            assert!(a.r.abs_diff(b.r) < step[0], "{format:?} {a:?} {b:?}");
            assert!(a.g.abs_diff(b.g) < step[1], "{format:?} {a:?} {b:?}");
            assert!(a.b.abs_diff(b.b) < step[2], "{format:?} {a:?} {b:?}");
            if step[3] > 0 {
                assert!(a.a.abs_diff(b.a) < step[3], "{format:?} {a:?} {b:?}");
            }
        }

        // Decoded colors are representable, so a second pass is lossless.
        let again = EncodeRequest::gim(format).encode(&first).unwrap().bytes;
        assert_eq!(again, bytes, "{format:?}");
    }
}

#[test]
fn gim_index4_exact_palette() {
    let colors = [
        RGBA8::new(255, 0, 0, 255),
        RGBA8::new(0, 255, 0, 255),
        RGBA8::new(0, 0, 255, 255),
        RGBA8::new(0, 0, 0, 0),
        RGBA8::new(255, 255, 255, 128),
    ];
    let pixels: Vec<RGBA8> = (0..30 * 10).map(|i| colors[(i * 7 / 3) % colors.len()]).collect();
    let out = EncodeRequest::gim(GimPixelFormat::Index4)
        .with_palette_mode(PaletteMode::Exact)
        .encode(&image(30, 10, pixels.clone()))
        .unwrap();
    let texture = DecodeRequest::new(&out.bytes).decode().unwrap();
    let gim = texture.as_gim().unwrap();
    assert_eq!(gim.pixel_format(), Some(GimPixelFormat::Index4));
    assert_eq!(gim.palette_format(), Some(GimPixelFormat::Rgba8888));
    assert_eq!(gim.palette().unwrap().unwrap().len(), colors.len());
    assert_eq!(texture.pixels().unwrap().pixels(), &pixels[..]);
}

#[test]
fn gim_index8_with_rgba5551_palette() {
    // 128 distinct colors; red, blue and alpha survive RGBA5551 exactly.
    let pixels: Vec<RGBA8> = (0..32 * 8u32)
        .map(|i| {
            let v = ((i % 128) as u8 & 0x1f) * 8;
            let v = v | v >> 5;
            let a = if i % 128 >= 32 { 255 } else { 0 };
            RGBA8::new(v, 255 - v, if i % 256 >= 64 { 255 } else { 0 }, a)
        })
        .collect();
    let out = EncodeRequest::gim(GimPixelFormat::Index8)
        .with_palette_format(GimPixelFormat::Rgba5551)
        .encode(&image(32, 8, pixels.clone()))
        .unwrap();
    let texture = DecodeRequest::new(&out.bytes).decode().unwrap();
    assert_eq!(
        texture.as_gim().unwrap().palette_format(),
        Some(GimPixelFormat::Rgba5551)
    );
    let decoded = texture.pixels().unwrap();
    for (a, b) in pixels.iter().zip(decoded.pixels()) {
        assert_eq!((a.r, a.b, a.a), (b.r, b.b, b.a));
        assert!(a.g.abs_diff(b.g) < 8);
    }
}

#[test]
fn gim_index8_quantizes_noise() {
    let pixels = noise(40, 24, 3);
    let out = EncodeRequest::gim(GimPixelFormat::Index8)
        .encode(&image(40, 24, pixels.clone()))
        .unwrap();
    let texture = DecodeRequest::new(&out.bytes).decode().unwrap();
    assert_eq!(texture.as_gim().unwrap().palette_len(), Some(256));
    let decoded = texture.pixels().unwrap();
    assert_eq!(decoded.pixels().len(), pixels.len());

    let err = EncodeRequest::gim(GimPixelFormat::Index8)
        .with_palette_mode(PaletteMode::Exact)
        .encode(&image(40, 24, pixels))
        .unwrap_err();
    assert!(matches!(err, TextureError::CapacityExceeded { capacity: 256, .. }));
}

#[test]
fn gim_metadata_roundtrip() {
    let meta = GimMetadata {
        original_filename: "title.png".into(),
        user: "artist".into(),
        timestamp: "Sat Oct 17 12:00:00 2026".into(),
        program: "zentex".into(),
    };
    let out = EncodeRequest::gim(GimPixelFormat::Rgb565)
        .with_metadata(meta.clone())
        .encode(&image(4, 4, vec![RGBA8::new(0, 0, 0, 255); 16]))
        .unwrap();
    let texture = DecodeRequest::new(&out.bytes).decode().unwrap();
    assert_eq!(texture.as_gim().unwrap().metadata(), Some(&meta));
    assert_eq!(
        texture.pixels().unwrap().pixels(),
        &[RGBA8::new(0, 0, 0, 255); 16][..]
    );
}

#[test]
fn gvr_direct_formats_roundtrip() {
    let argb = noise(12, 8, 11);
    let bytes = EncodeRequest::gvr(GvrPixelFormat::Rgb565, GvrDataFormat::Argb8888)
        .encode(&image(12, 8, argb.clone()))
        .unwrap()
        .bytes;
    assert_eq!(decode(&bytes).pixels(), &argb[..]);

    for data_format in [
        GvrDataFormat::Intensity4,
        GvrDataFormat::Intensity8,
        GvrDataFormat::IntensityA4,
        GvrDataFormat::IntensityA8,
        GvrDataFormat::Rgb565,
        GvrDataFormat::Rgb5a3,
    ] {
        let pixels = noise(10, 6, u32::from(data_format.id()) + 1);
        let bytes = EncodeRequest::gvr(GvrPixelFormat::Rgb565, data_format)
            .encode(&image(10, 6, pixels))
            .unwrap()
            .bytes;
        let texture = DecodeRequest::new(&bytes).decode().unwrap();
        assert_eq!(texture.format_id(), u16::from(data_format.id()));
        let first = texture.into_image().unwrap();
        assert_eq!((first.width(), first.height()), (10, 6));

        let again = EncodeRequest::gvr(GvrPixelFormat::Rgb565, data_format)
            .encode(&first)
            .unwrap()
            .bytes;
        assert_eq!(decode(&again), first, "{data_format:?}");
    }
}

#[test]
fn gvr_intensity8_keeps_gray_levels() {
    let pixels: Vec<RGBA8> = (0..16 * 4u32)
        .map(|i| {
            let v = (i * 4) as u8;
            RGBA8::new(v, v, v, v)
        })
        .collect();
    let bytes = EncodeRequest::gvr(GvrPixelFormat::IntensityA8, GvrDataFormat::Intensity8)
        .encode(&image(16, 4, pixels.clone()))
        .unwrap()
        .bytes;
    assert_eq!(decode(&bytes).pixels(), &pixels[..]);
}

#[test]
fn gvr_internal_palette_roundtrip() {
    let colors = [
        RGBA8::new(255, 0, 0, 255),
        RGBA8::new(0, 255, 0, 255),
        RGBA8::new(0, 0, 255, 255),
    ];
    let pixels: Vec<RGBA8> = (0..9 * 9).map(|i| colors[i % 3]).collect();
    for data_format in [GvrDataFormat::Index4, GvrDataFormat::Index8] {
        let out = EncodeRequest::gvr(GvrPixelFormat::Rgb5a3, data_format)
            .encode(&image(9, 9, pixels.clone()))
            .unwrap();
        assert!(out.external_palette.is_none());
        let texture = DecodeRequest::new(&out.bytes).decode().unwrap();
        let gvr = texture.as_gvr().unwrap();
        assert!(gvr.has_internal_palette());
        assert!(!gvr.needs_external_palette());
        assert_eq!(gvr.pixel_format(), Some(GvrPixelFormat::Rgb5a3));
        assert_eq!(texture.pixels().unwrap().pixels(), &pixels[..]);
    }
}

#[test]
fn gvr_external_palette_roundtrip() {
    let pixels: Vec<RGBA8> = (0..16 * 8u32)
        .map(|i| RGBA8::new((i % 16) as u8 * 17, 0, 0, 255))
        .collect();
    let out = EncodeRequest::gvr(GvrPixelFormat::IntensityA8, GvrDataFormat::Index4)
        .with_external_palette(true)
        .encode(&image(16, 8, pixels.clone()))
        .unwrap();
    let gvpl = out.external_palette.as_deref().unwrap();

    let info = TextureInfo::from_bytes(&out.bytes).unwrap();
    assert!(info.needs_external_palette);
    assert_eq!(info.palette_format, Some(0));

    // Without the palette the texture still parses; pixels need it.
    let texture = DecodeRequest::new(&out.bytes).decode().unwrap();
    assert!(matches!(
        texture.pixels(),
        Err(TextureError::InvariantViolation(_))
    ));

    let texture = DecodeRequest::new(&out.bytes)
        .with_external_palette(gvpl)
        .decode()
        .unwrap();
    let decoded = texture.pixels().unwrap();
    // IA8 entries keep luma and alpha only.
    for (a, b) in pixels.iter().zip(decoded.pixels()) {
        let luma = ((u32::from(a.r) * 299 + 500) / 1000) as u8;
        assert_eq!(*b, RGBA8::new(luma, luma, luma, 255));
    }
}

#[test]
fn gvr_global_index_variants() {
    let px = image(4, 4, vec![RGBA8::new(9, 9, 9, 255); 16]);
    for index in [Some(GlobalIndex::gbix(7)), Some(GlobalIndex::gcix(0xABCD)), None] {
        let bytes = EncodeRequest::gvr(GvrPixelFormat::Rgb565, GvrDataFormat::Rgb565)
            .with_global_index(index)
            .encode(&px)
            .unwrap()
            .bytes;
        assert!(is_gvr(&bytes));
        let texture = DecodeRequest::new(&bytes).decode().unwrap();
        assert_eq!(texture.as_gvr().unwrap().global_index(), index);
    }
    assert_eq!(GlobalIndexKind::default(), GlobalIndexKind::Gbix);
}

#[test]
fn pixels_are_decoded_once() {
    let bytes = EncodeRequest::gim(GimPixelFormat::Rgba4444)
        .encode(&image(8, 8, noise(8, 8, 5)))
        .unwrap()
        .bytes;
    let texture = DecodeRequest::new(&bytes).decode().unwrap();
    let a = texture.pixels().unwrap();
    let b = texture.pixels().unwrap();
    assert!(core::ptr::eq(a, b));
}

#[test]
fn info_matches_decode() {
    let bytes = EncodeRequest::gim(GimPixelFormat::Index8)
        .encode(&image(33, 3, noise(33, 3, 1)))
        .unwrap()
        .bytes;
    let info = TextureInfo::from_bytes(&bytes).unwrap();
    assert_eq!(info.format, TextureFormat::Gim);
    assert_eq!((info.width, info.height), (33, 3));
    assert_eq!(info.data_format, GimPixelFormat::Index8.id());
    assert_eq!(info.palette_format, Some(GimPixelFormat::Rgba8888.id()));
    assert_eq!(probe(&bytes), Some(TextureFormat::Gim));
}

#[test]
fn limits_reject_large_textures() {
    let bytes = EncodeRequest::gim(GimPixelFormat::Rgba8888)
        .encode(&image(64, 64, noise(64, 64, 2)))
        .unwrap()
        .bytes;
    let limits = Limits {
        max_pixels: Some(1024),
        ..Default::default()
    };
    let err = DecodeRequest::new(&bytes).with_limits(&limits).decode().unwrap_err();
    assert!(matches!(err, TextureError::LimitExceeded(_)));

    let err = EncodeRequest::gim(GimPixelFormat::Rgba8888)
        .with_limits(limits)
        .encode(&image(64, 64, noise(64, 64, 2)))
        .unwrap_err();
    assert!(matches!(err, TextureError::LimitExceeded(_)));
}

#[test]
fn memory_limit_applies_to_encode() {
    let limits = Limits {
        max_memory_bytes: Some(16 * 16 * 4 - 1),
        ..Default::default()
    };
    let request = EncodeRequest::gvr(GvrPixelFormat::Rgb565, GvrDataFormat::Rgb565).with_limits(limits);
    let err = request.encode(&image(16, 16, noise(16, 16, 3))).unwrap_err();
    assert!(matches!(err, TextureError::LimitExceeded(_)));
    let err = request
        .encode_pixels(&noise(16, 16, 3), 16, 16)
        .unwrap_err();
    assert!(matches!(err, TextureError::LimitExceeded(_)));
    assert!(request.encode(&image(8, 8, noise(8, 8, 3))).is_ok());
}

#[cfg(feature = "imgref")]
#[test]
fn imgref_input() {
    let pixels = noise(6, 5, 42);
    let img = imgref::ImgVec::new(pixels.clone(), 6, 5);
    let out = EncodeRequest::gim(GimPixelFormat::Rgba8888).encode(&img).unwrap();
    assert_eq!(decode(&out.bytes).pixels(), &pixels[..]);
}
