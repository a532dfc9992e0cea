#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn gim_chunk(out: &mut Vec<u8>, kind: u16, length: usize) {
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(length as u32).to_le_bytes());
    out.extend_from_slice(&(length as u32).to_le_bytes());
    out.extend_from_slice(&0x10u32.to_le_bytes());
}

/// Single image chunk at 0x30, payload at image + 0x50.
fn gim(format: u16, swizzled: bool, width: u16, height: u16, bpp: u16, payload: &[u8]) -> Vec<u8> {
    let image_len = 0x50 + payload.len();
    let mut out = b"MIG.00.1PSP\0\0\0\0\0".to_vec();
    gim_chunk(&mut out, 0x02, 0x20 + image_len);
    gim_chunk(&mut out, 0x03, 0x10 + image_len);
    let image = out.len();
    gim_chunk(&mut out, 0x04, image_len);
    out.resize(image + 0x50, 0);
    out[image + 0x14..image + 0x16].copy_from_slice(&format.to_le_bytes());
    out[image + 0x16..image + 0x18].copy_from_slice(&u16::from(swizzled).to_le_bytes());
    out[image + 0x18..image + 0x1A].copy_from_slice(&width.to_le_bytes());
    out[image + 0x1A..image + 0x1C].copy_from_slice(&height.to_le_bytes());
    out[image + 0x1C..image + 0x1E].copy_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn gvr(gbix: bool, packed: u8, data_format: u8, width: u16, height: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    if gbix {
        out.extend_from_slice(b"GBIX");
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
    }
    out.extend_from_slice(b"GVRT");
    out.extend_from_slice(&(8 + body.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.push(packed);
    out.push(data_format);
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // GIM RGBA8888 16x8, linear and swizzled
    let rgba: Vec<u8> = (0..16 * 8 * 4).map(|i| (i * 7) as u8).collect();
    fs::write(format!("{dir}/gim_rgba8888_16x8.gim"), gim(3, false, 16, 8, 32, &rgba)).unwrap();
    fs::write(format!("{dir}/gim_rgba8888_swz.gim"), gim(3, true, 16, 8, 32, &rgba)).unwrap();

    // GIM RGB565 16x8
    let rgb565: Vec<u8> = (0..16 * 8 * 2).map(|i| (i * 13) as u8).collect();
    fs::write(format!("{dir}/gim_rgb565_16x8.gim"), gim(0, false, 16, 8, 16, &rgb565)).unwrap();

    // GVR RGB565 8x4 (one tile) with GBIX, and without
    let tile: Vec<u8> = (0..8 * 4 * 2).map(|i| (i * 5) as u8).collect();
    fs::write(format!("{dir}/gvr_rgb565_gbix.gvr"), gvr(true, 0x10, 0x04, 8, 4, &tile)).unwrap();
    fs::write(format!("{dir}/gvr_rgb565.gvr"), gvr(false, 0x10, 0x04, 8, 4, &tile)).unwrap();

    // GVR Index4 8x8 with an internal RGB5A3 palette
    let mut body = vec![0xFFu8; 16 * 2];
    body.extend((0..8 * 8 / 2).map(|i| i as u8));
    fs::write(format!("{dir}/gvr_index4_pal.gvr"), gvr(true, 0x28, 0x08, 8, 8, &body)).unwrap();

    // GVPL with two RGB565 entries
    let mut gvpl = b"GVPL".to_vec();
    gvpl.extend_from_slice(&(8u32 + 4).to_le_bytes());
    gvpl.push(0);
    gvpl.push(1);
    gvpl.extend_from_slice(&0u32.to_le_bytes());
    gvpl.extend_from_slice(&2u16.to_be_bytes());
    gvpl.extend_from_slice(&[0xF8, 0x00, 0x07, 0xE0]);
    fs::write(format!("{dir}/gvpl_2.gvp"), gvpl).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/just_mig.bin"), b"MIG.00.1PSP\0").unwrap();
    fs::write(format!("{dir}/just_gvrt.bin"), b"GVRT").unwrap();
    fs::write(format!("{dir}/gbix_short.bin"), b"GBIX\x08\x00\x00\x00").unwrap();

    println!("Generated seed corpus in {dir}/");
}
