//! Direct-color pixel codecs: one packed sample (or palette entry) ↔ RGBA8.
//!
//! Narrowing to N-bit channels truncates; widening replicates the high bits
//! into the low bits, so every value produced by decode encodes back to the
//! same bits.

use alloc::vec::Vec;

use rgb::RGBA8;

use crate::error::TextureError;

/// Multiplier/shift tables turning an N-bit channel into 8 bits by bit replication.
const MUL_TABLE: [u32; 9] = [
    0,    // 0 bits
    0xff, // 1 bit:  0b11111111
    0x55, // 2 bits: 0b01010101
    0x49, // 3 bits: 0b01001001
    0x11, // 4 bits: 0b00010001
    0x21, // 5 bits: 0b00100001
    0x41, // 6 bits: 0b01000001
    0x81, // 7 bits: 0b10000001
    0x01, // 8 bits: 0b00000001
];

const SHIFT_TABLE: [u32; 9] = [0, 0, 0, 1, 0, 2, 4, 6, 0];

/// Widen the `bits`-wide field of `raw` starting at `shift` to 8 bits.
#[inline]
fn widen(raw: u32, shift: u32, bits: u32) -> u8 {
    let v = (raw >> shift) & ((1 << bits) - 1);
    ((v * MUL_TABLE[bits as usize]) >> SHIFT_TABLE[bits as usize]) as u8
}

/// Narrow an 8-bit channel to `bits` and place it at `shift`.
#[inline]
fn narrow(c: u8, shift: u32, bits: u32) -> u32 {
    (u32::from(c) >> (8 - bits)) << shift
}

/// Rec. 601 luma, rounded.
#[inline]
fn luma(px: RGBA8) -> u8 {
    let r = u32::from(px.r);
    let g = u32::from(px.g);
    let b = u32::from(px.b);
    ((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8
}

/// A packed direct-color encoding.
///
/// `Le`/`Be` suffixes name the byte order of the 16-bit container; byte-wise
/// layouts list their channels in memory order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorCodec {
    /// PSP 16-bit: R bits 0-4, G 5-10, B 11-15, opaque.
    Rgb565Le,
    /// PSP 16-bit: R 0-4, G 5-9, B 10-14, A bit 15.
    Rgba5551Le,
    /// PSP 16-bit: R 0-3, G 4-7, B 8-11, A 12-15.
    Rgba4444Le,
    /// Bytes R, G, B, A.
    Rgba8888,
    /// GameCube 4-bit intensity, replicated into all four channels.
    Intensity4,
    /// GameCube 8-bit intensity, replicated into all four channels.
    Intensity8,
    /// GameCube 8-bit: alpha high nibble, intensity low nibble.
    IntensityA4,
    /// GameCube 16-bit: alpha byte then intensity byte.
    IntensityA8Be,
    /// GameCube 16-bit big-endian: R 11-15, G 5-10, B 0-4.
    Rgb565Be,
    /// GameCube 16-bit big-endian: bit 15 set selects opaque RGB555,
    /// clear selects A3 R4 G4 B4.
    Rgb5a3Be,
    /// Bytes A, R, G, B (logical order; the GameCube tile splits AR and GB).
    Argb8888,
}

impl ColorCodec {
    /// Bits occupied by one packed sample.
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Intensity4 => 4,
            Self::Intensity8 | Self::IntensityA4 => 8,
            Self::Rgb565Le
            | Self::Rgba5551Le
            | Self::Rgba4444Le
            | Self::IntensityA8Be
            | Self::Rgb565Be
            | Self::Rgb5a3Be => 16,
            Self::Rgba8888 | Self::Argb8888 => 32,
        }
    }

    /// Whether decode→encode is bit-exact for every input sample.
    ///
    /// `Rgb5a3Be` is the exception: an A3 sample with alpha 7 decodes opaque and
    /// re-encodes in the RGB555 form.
    pub const fn is_bit_exact(self) -> bool {
        !matches!(self, Self::Rgb5a3Be)
    }

    /// Expand a raw sample (right-aligned in a `u32`) to RGBA8.
    pub fn unpack(self, raw: u32) -> RGBA8 {
        match self {
            Self::Rgb565Le => RGBA8::new(widen(raw, 0, 5), widen(raw, 5, 6), widen(raw, 11, 5), 255),
            Self::Rgba5551Le => RGBA8::new(
                widen(raw, 0, 5),
                widen(raw, 5, 5),
                widen(raw, 10, 5),
                widen(raw, 15, 1),
            ),
            Self::Rgba4444Le => RGBA8::new(
                widen(raw, 0, 4),
                widen(raw, 4, 4),
                widen(raw, 8, 4),
                widen(raw, 12, 4),
            ),
            Self::Rgba8888 => {
                let [r, g, b, a] = raw.to_be_bytes();
                RGBA8::new(r, g, b, a)
            }
            Self::Intensity4 => {
                let i = widen(raw, 0, 4);
                RGBA8::new(i, i, i, i)
            }
            Self::Intensity8 => {
                let i = raw as u8;
                RGBA8::new(i, i, i, i)
            }
            Self::IntensityA4 => {
                let i = widen(raw, 0, 4);
                RGBA8::new(i, i, i, widen(raw, 4, 4))
            }
            Self::IntensityA8Be => {
                let i = raw as u8;
                RGBA8::new(i, i, i, (raw >> 8) as u8)
            }
            Self::Rgb565Be => RGBA8::new(widen(raw, 11, 5), widen(raw, 5, 6), widen(raw, 0, 5), 255),
            Self::Rgb5a3Be => {
                if raw & 0x8000 != 0 {
                    RGBA8::new(widen(raw, 10, 5), widen(raw, 5, 5), widen(raw, 0, 5), 255)
                } else {
                    RGBA8::new(
                        widen(raw, 8, 4),
                        widen(raw, 4, 4),
                        widen(raw, 0, 4),
                        widen(raw, 12, 3),
                    )
                }
            }
            Self::Argb8888 => {
                let [a, r, g, b] = raw.to_be_bytes();
                RGBA8::new(r, g, b, a)
            }
        }
    }

    /// Pack RGBA8 into a raw sample (right-aligned in a `u32`).
    pub fn pack(self, px: RGBA8) -> u32 {
        match self {
            Self::Rgb565Le => narrow(px.r, 0, 5) | narrow(px.g, 5, 6) | narrow(px.b, 11, 5),
            Self::Rgba5551Le => {
                narrow(px.r, 0, 5) | narrow(px.g, 5, 5) | narrow(px.b, 10, 5) | narrow(px.a, 15, 1)
            }
            Self::Rgba4444Le => {
                narrow(px.r, 0, 4) | narrow(px.g, 4, 4) | narrow(px.b, 8, 4) | narrow(px.a, 12, 4)
            }
            Self::Rgba8888 => u32::from_be_bytes([px.r, px.g, px.b, px.a]),
            Self::Intensity4 => u32::from(luma(px)) >> 4,
            Self::Intensity8 => u32::from(luma(px)),
            Self::IntensityA4 => narrow(px.a, 4, 4) | (u32::from(luma(px)) >> 4),
            Self::IntensityA8Be => (u32::from(px.a) << 8) | u32::from(luma(px)),
            Self::Rgb565Be => narrow(px.r, 11, 5) | narrow(px.g, 5, 6) | narrow(px.b, 0, 5),
            Self::Rgb5a3Be => {
                // Alpha that would survive as 7 in three bits is stored opaque.
                if px.a >= 0xE0 {
                    0x8000 | narrow(px.r, 10, 5) | narrow(px.g, 5, 5) | narrow(px.b, 0, 5)
                } else {
                    narrow(px.a, 12, 3) | narrow(px.r, 8, 4) | narrow(px.g, 4, 4) | narrow(px.b, 0, 4)
                }
            }
            Self::Argb8888 => u32::from_be_bytes([px.a, px.r, px.g, px.b]),
        }
    }

    fn bytes_per_sample(self) -> Result<usize, TextureError> {
        match self.bits_per_pixel() {
            8 => Ok(1),
            16 => Ok(2),
            32 => Ok(4),
            bpp => Err(TextureError::InvariantViolation(alloc::format!(
                "{self:?} is {bpp} bpp and cannot be addressed per byte"
            ))),
        }
    }

    /// Read one raw sample at `offset`. Only for codecs of 8 bpp or more.
    pub(crate) fn read_raw(self, bytes: &[u8], offset: usize) -> Result<u32, TextureError> {
        let n = self.bytes_per_sample()?;
        let s = offset
            .checked_add(n)
            .and_then(|end| bytes.get(offset..end))
            .ok_or_else(|| TextureError::truncated(offset, n))?;
        Ok(match (n, self) {
            (1, _) => u32::from(s[0]),
            (2, Self::Rgb565Le | Self::Rgba5551Le | Self::Rgba4444Le) => {
                u32::from(u16::from_le_bytes([s[0], s[1]]))
            }
            (2, _) => u32::from(u16::from_be_bytes([s[0], s[1]])),
            _ => u32::from_be_bytes([s[0], s[1], s[2], s[3]]),
        })
    }

    /// Write one raw sample at `offset`. Only for codecs of 8 bpp or more.
    pub(crate) fn write_raw(self, raw: u32, dst: &mut [u8], offset: usize) -> Result<(), TextureError> {
        let n = self.bytes_per_sample()?;
        let len = dst.len();
        let d = offset
            .checked_add(n)
            .and_then(|end| dst.get_mut(offset..end))
            .ok_or(TextureError::BufferTooSmall {
                needed: offset + n,
                actual: len,
            })?;
        match (n, self) {
            (1, _) => d[0] = raw as u8,
            (2, Self::Rgb565Le | Self::Rgba5551Le | Self::Rgba4444Le) => {
                d.copy_from_slice(&(raw as u16).to_le_bytes())
            }
            (2, _) => d.copy_from_slice(&(raw as u16).to_be_bytes()),
            _ => d.copy_from_slice(&raw.to_be_bytes()),
        }
        Ok(())
    }

    /// Decode the sample starting at byte `offset`.
    pub fn decode_pixel(self, bytes: &[u8], offset: usize) -> Result<RGBA8, TextureError> {
        Ok(self.unpack(self.read_raw(bytes, offset)?))
    }

    /// Pack `src[src_offset]` into `dst` at byte `dst_offset`.
    ///
    /// Used both for pixel payloads and for palette entries.
    pub fn encode_pixel(
        self,
        src: &[RGBA8],
        src_offset: usize,
        dst: &mut [u8],
        dst_offset: usize,
    ) -> Result<(), TextureError> {
        let px = *src.get(src_offset).ok_or(TextureError::BufferTooSmall {
            needed: (src_offset + 1) * 4,
            actual: src.len() * 4,
        })?;
        self.write_raw(self.pack(px), dst, dst_offset)
    }

    /// Decode `width * height` consecutive samples in linear order.
    ///
    /// 4-bit samples are read high nibble first.
    pub fn decode(
        self,
        bytes: &[u8],
        offset: usize,
        width: u32,
        height: u32,
    ) -> Result<Vec<RGBA8>, TextureError> {
        let count = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(self.bits_per_pixel() as usize).map(|bits| (n, bits)));
        let Some((count, bits)) = count else {
            return Err(TextureError::DimensionsTooLarge { width, height });
        };
        let needed = bits.div_ceil(8);
        let data = offset
            .checked_add(needed)
            .and_then(|end| bytes.get(offset..end))
            .ok_or_else(|| TextureError::truncated(offset, needed))?;

        if self.bits_per_pixel() == 4 {
            return Ok((0..count)
                .map(|i| {
                    let byte = data[i / 2];
                    let raw = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
                    self.unpack(u32::from(raw))
                })
                .collect());
        }

        let step = self.bytes_per_sample()?;
        (0..count)
            .map(|i| self.decode_pixel(data, i * step))
            .collect()
    }

    /// Encode every pixel of `src` into a new linear buffer.
    pub fn encode(self, src: &[RGBA8]) -> Result<Vec<u8>, TextureError> {
        let mut out = alloc::vec![0u8; (src.len() * self.bits_per_pixel() as usize).div_ceil(8)];
        if self.bits_per_pixel() == 4 {
            for (i, px) in src.iter().enumerate() {
                let raw = self.pack(*px) as u8;
                out[i / 2] |= if i % 2 == 0 { raw << 4 } else { raw };
            }
            return Ok(out);
        }
        let step = self.bytes_per_sample()?;
        for i in 0..src.len() {
            self.encode_pixel(src, i, &mut out, i * step)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ColorCodec; 11] = [
        ColorCodec::Rgb565Le,
        ColorCodec::Rgba5551Le,
        ColorCodec::Rgba4444Le,
        ColorCodec::Rgba8888,
        ColorCodec::Intensity4,
        ColorCodec::Intensity8,
        ColorCodec::IntensityA4,
        ColorCodec::IntensityA8Be,
        ColorCodec::Rgb565Be,
        ColorCodec::Rgb5a3Be,
        ColorCodec::Argb8888,
    ];

    #[test]
    fn sixteen_bit_samples_roundtrip_bit_exact() {
        for codec in ALL.iter().copied().filter(|c| c.bits_per_pixel() == 16) {
            for raw in 0..=u16::MAX as u32 {
                let back = codec.pack(codec.unpack(raw));
                // A3 samples with alpha 7 are the only lossy case.
                let exact = codec.is_bit_exact() || raw & 0x8000 != 0 || (raw >> 12) & 7 != 7;
                if exact {
                    assert_eq!(back, raw, "{codec:?} raw {raw:#06x}");
                } else {
                    assert_eq!(back & 0x8000, 0x8000, "{codec:?} raw {raw:#06x}");
                }
            }
        }
    }

    #[test]
    fn byte_samples_roundtrip() {
        for codec in [ColorCodec::Intensity8, ColorCodec::IntensityA4] {
            for raw in 0..=255u32 {
                assert_eq!(codec.pack(codec.unpack(raw)), raw, "{codec:?}");
            }
        }
        for raw in 0..16u32 {
            assert_eq!(ColorCodec::Intensity4.pack(ColorCodec::Intensity4.unpack(raw)), raw);
        }
    }

    #[test]
    fn widening_replicates_high_bits() {
        assert_eq!(widen(0x1f, 0, 5), 255);
        assert_eq!(widen(0x01, 0, 5), 8);
        assert_eq!(widen(0x3f, 0, 6), 255);
        assert_eq!(widen(0x07, 0, 3), 255);
        assert_eq!(widen(0x01, 0, 1), 255);
        assert_eq!(widen(0x0a, 0, 4), 0xaa);
    }

    #[test]
    fn psp_565_has_red_in_low_bits() {
        let px = ColorCodec::Rgb565Le.unpack(0x001f);
        assert_eq!(px, RGBA8::new(255, 0, 0, 255));
        let px = ColorCodec::Rgb565Be.unpack(0x001f);
        assert_eq!(px, RGBA8::new(0, 0, 255, 255));
    }

    #[test]
    fn rgb5a3_picks_form_by_alpha() {
        let opaque = ColorCodec::Rgb5a3Be.pack(RGBA8::new(255, 0, 0, 255));
        assert_eq!(opaque, 0xfc00);
        let translucent = ColorCodec::Rgb5a3Be.pack(RGBA8::new(255, 0, 0, 0x80));
        assert_eq!(translucent & 0x8000, 0);
        assert_eq!(translucent >> 12, 4);
        let px = ColorCodec::Rgb5a3Be.unpack(translucent);
        assert_eq!(px.r, 255);
        assert_eq!(px.a, 0x92);
    }

    #[test]
    fn byte_order_of_sixteen_bit_containers() {
        let mut buf = [0u8; 2];
        ColorCodec::Rgb565Le.write_raw(0x1234, &mut buf, 0).unwrap();
        assert_eq!(buf, [0x34, 0x12]);
        ColorCodec::Rgb565Be.write_raw(0x1234, &mut buf, 0).unwrap();
        assert_eq!(buf, [0x12, 0x34]);
    }

    #[test]
    fn linear_decode_reads_nibbles_high_first() {
        let px = ColorCodec::Intensity4.decode(&[0xf0], 0, 2, 1).unwrap();
        assert_eq!(px[0], RGBA8::new(255, 255, 255, 255));
        assert_eq!(px[1], RGBA8::new(0, 0, 0, 0));
    }

    #[test]
    fn truncated_input_is_malformed() {
        let err = ColorCodec::Rgba8888.decode(&[0u8; 7], 0, 2, 1).unwrap_err();
        assert!(matches!(err, TextureError::MalformedContainer { .. }));
    }

    #[test]
    fn oversized_sample_count_is_an_error() {
        assert!(matches!(
            ColorCodec::Rgba8888.decode(&[], 0, u32::MAX, u32::MAX),
            Err(TextureError::DimensionsTooLarge { .. })
        ));
    }

    #[test]
    fn encode_pixel_checks_destination() {
        let src = [RGBA8::new(1, 2, 3, 4)];
        let mut dst = [0u8; 3];
        let err = ColorCodec::Rgba8888.encode_pixel(&src, 0, &mut dst, 0).unwrap_err();
        assert!(matches!(err, TextureError::BufferTooSmall { .. }));
        let mut dst = [0u8; 4];
        ColorCodec::Argb8888.encode_pixel(&src, 0, &mut dst, 0).unwrap();
        assert_eq!(dst, [4, 1, 2, 3]);
    }
}
