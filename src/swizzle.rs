//! Reversible linear ↔ tiled byte permutations.
//!
//! Both directions are pure functions of `(width, height, bpp)` over a buffer of
//! exactly `width * height * bpp / 8` bytes. Dimensions must already be padded
//! to the tile granularity; the data codecs take care of that.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::TextureError;

/// Tile geometry of a hardware texture layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Swizzle {
    /// Blocks of `block_bytes` × `block_rows` stored contiguously, row-major
    /// inside the block, blocks left to right then top to bottom.
    Blocks { block_bytes: u32, block_rows: u32 },
    /// GameCube ARGB8888: 4×4 pixel tiles of 64 bytes, the first 32 holding
    /// A,R pairs and the last 32 holding G,B pairs.
    SplitArgb,
}

impl Swizzle {
    /// PSP "fast" layout: 16-byte × 8-row blocks.
    pub const PSP: Swizzle = Swizzle::Blocks {
        block_bytes: 16,
        block_rows: 8,
    };

    /// Width (pixels) and height granularity for samples of `bpp` bits.
    pub fn granularity(self, bpp: u32) -> (u32, u32) {
        match self {
            Swizzle::Blocks {
                block_bytes,
                block_rows,
            } => (
                block_bytes
                    .saturating_mul(8)
                    .checked_div(bpp)
                    .unwrap_or(1)
                    .max(1),
                block_rows,
            ),
            Swizzle::SplitArgb => (4, 4),
        }
    }

    fn check(self, len: usize, width: u32, height: u32, bpp: u32) -> Result<usize, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvariantViolation(alloc::format!(
                "swizzle of empty {width}x{height} surface"
            )));
        }
        if bpp == 0 {
            return Err(TextureError::InvariantViolation(
                "swizzle of zero-bit samples".into(),
            ));
        }
        if let Swizzle::SplitArgb = self {
            if bpp != 32 {
                return Err(TextureError::InvariantViolation(alloc::format!(
                    "split ARGB tiles need 32 bpp, got {bpp}"
                )));
            }
        }
        if let Swizzle::Blocks {
            block_bytes,
            block_rows,
        } = self
        {
            if block_bytes == 0 || block_rows == 0 || block_bytes.saturating_mul(8) % bpp != 0 {
                return Err(TextureError::InvariantViolation(alloc::format!(
                    "{block_bytes}x{block_rows} blocks cannot hold whole {bpp}-bit samples"
                )));
            }
        }
        let (gw, gh) = self.granularity(bpp);
        if width % gw != 0 || height % gh != 0 {
            return Err(TextureError::InvariantViolation(alloc::format!(
                "{width}x{height} is not a multiple of the {gw}x{gh} tile at {bpp} bpp"
            )));
        }
        let Some(row_bytes) = (width as usize).checked_mul(bpp as usize).map(|bits| bits / 8) else {
            return Err(TextureError::DimensionsTooLarge { width, height });
        };
        let Some(expected) = row_bytes.checked_mul(height as usize) else {
            return Err(TextureError::DimensionsTooLarge { width, height });
        };
        if len != expected {
            return Err(TextureError::InvariantViolation(alloc::format!(
                "swizzle buffer is {len} bytes, {width}x{height}@{bpp}bpp needs {expected}"
            )));
        }
        Ok(row_bytes)
    }

    /// Linear raster → tiled layout.
    pub fn swizzle(
        self,
        linear: &[u8],
        width: u32,
        height: u32,
        bpp: u32,
    ) -> Result<Vec<u8>, TextureError> {
        self.permute(linear, width, height, bpp, true)
    }

    /// Tiled layout → linear raster.
    pub fn unswizzle(
        self,
        tiled: &[u8],
        width: u32,
        height: u32,
        bpp: u32,
    ) -> Result<Vec<u8>, TextureError> {
        self.permute(tiled, width, height, bpp, false)
    }

    fn permute(
        self,
        src: &[u8],
        width: u32,
        height: u32,
        bpp: u32,
        to_tiled: bool,
    ) -> Result<Vec<u8>, TextureError> {
        let row_bytes = self.check(src.len(), width, height, bpp)?;
        let mut out = vec![0u8; src.len()];

        match self {
            Swizzle::Blocks {
                block_bytes,
                block_rows,
            } => {
                let bb = block_bytes as usize;
                let br = block_rows as usize;
                let blocks_per_row = row_bytes / bb;
                for y in 0..height as usize {
                    let block_row_base = (y / br) * blocks_per_row * bb * br + (y % br) * bb;
                    for bx in 0..blocks_per_row {
                        let lin = y * row_bytes + bx * bb;
                        let til = block_row_base + bx * bb * br;
                        if to_tiled {
                            out[til..til + bb].copy_from_slice(&src[lin..lin + bb]);
                        } else {
                            out[lin..lin + bb].copy_from_slice(&src[til..til + bb]);
                        }
                    }
                }
            }
            Swizzle::SplitArgb => {
                let tiles_per_row = width as usize / 4;
                for y in 0..height as usize {
                    for x in 0..width as usize {
                        let tile = (y / 4) * tiles_per_row + x / 4;
                        let p = (y % 4) * 4 + x % 4;
                        let lin = y * row_bytes + x * 4;
                        let til = tile * 64 + p * 2;
                        // A,R into the first half; G,B into the second.
                        let pairs = [(lin, til), (lin + 1, til + 1), (lin + 2, til + 32), (lin + 3, til + 33)];
                        for (l, t) in pairs {
                            if to_tiled {
                                out[t] = src[l];
                            } else {
                                out[l] = src[t];
                            }
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(len: usize, seed: u32) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect()
    }

    #[test]
    fn blocks_are_bijective() {
        let layouts = [
            Swizzle::PSP,
            Swizzle::Blocks {
                block_bytes: 4,
                block_rows: 8,
            },
            Swizzle::Blocks {
                block_bytes: 8,
                block_rows: 4,
            },
        ];
        for swz in layouts {
            for bpp in [4u32, 8, 16, 32] {
                let (gw, gh) = swz.granularity(bpp);
                for (mw, mh) in [(1u32, 1u32), (2, 3), (5, 2)] {
                    let (w, h) = (gw * mw, gh * mh);
                    let linear = noise((w * h * bpp / 8) as usize, w * 31 + h + bpp);
                    let tiled = swz.swizzle(&linear, w, h, bpp).unwrap();
                    assert_eq!(tiled.len(), linear.len());
                    let back = swz.unswizzle(&tiled, w, h, bpp).unwrap();
                    assert_eq!(back, linear, "{swz:?} {w}x{h}@{bpp}");
                }
            }
        }
    }

    #[test]
    fn split_argb_is_bijective() {
        for (w, h) in [(4u32, 4u32), (8, 4), (12, 8)] {
            let linear = noise((w * h * 4) as usize, w + h);
            let tiled = Swizzle::SplitArgb.swizzle(&linear, w, h, 32).unwrap();
            let back = Swizzle::SplitArgb.unswizzle(&tiled, w, h, 32).unwrap();
            assert_eq!(back, linear);
        }
    }

    #[test]
    fn psp_block_placement() {
        // 32 bytes wide (8 px at 32 bpp), 8 rows → two blocks side by side.
        let linear: Vec<u8> = (0..=255).collect();
        let tiled = Swizzle::PSP.swizzle(&linear, 8, 8, 32).unwrap();
        // Row 0 of block 0 is linear bytes 0..16.
        assert_eq!(&tiled[0..16], &linear[0..16]);
        // Row 1 of block 0 is linear row 1 (offset 32).
        assert_eq!(&tiled[16..32], &linear[32..48]);
        // Block 1 starts after 128 bytes with linear bytes 16..32.
        assert_eq!(&tiled[128..144], &linear[16..32]);
    }

    #[test]
    fn split_argb_places_alpha_red_first() {
        let mut linear = vec![0u8; 4 * 4 * 4];
        linear[0..4].copy_from_slice(&[0xa0, 0xb0, 0xc0, 0xd0]);
        let tiled = Swizzle::SplitArgb.swizzle(&linear, 4, 4, 32).unwrap();
        assert_eq!(&tiled[0..2], &[0xa0, 0xb0]);
        assert_eq!(&tiled[32..34], &[0xc0, 0xd0]);
    }

    #[test]
    fn misaligned_dimensions_fail() {
        let err = Swizzle::PSP.swizzle(&[0u8; 2 * 8 * 4], 2, 8, 32).unwrap_err();
        assert!(matches!(err, TextureError::InvariantViolation(_)));
        let err = Swizzle::PSP.swizzle(&[0u8; 10], 4, 8, 32).unwrap_err();
        assert!(matches!(err, TextureError::InvariantViolation(_)));
    }

    #[test]
    fn wrong_buffer_size_fails() {
        let err = Swizzle::PSP.unswizzle(&[0u8; 127], 16, 8, 8).unwrap_err();
        assert!(matches!(err, TextureError::InvariantViolation(_)));
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let err = Swizzle::PSP.swizzle(&[], 1, 1, 0).unwrap_err();
        assert!(matches!(err, TextureError::InvariantViolation(_)));
        assert_eq!(Swizzle::PSP.granularity(0), (1, 8));

        let flat = Swizzle::Blocks {
            block_bytes: 16,
            block_rows: 0,
        };
        let err = flat.unswizzle(&[0u8; 16], 4, 1, 32).unwrap_err();
        assert!(matches!(err, TextureError::InvariantViolation(_)));

        let err = Swizzle::PSP.swizzle(&[0u8; 12], 4, 1, 24).unwrap_err();
        assert!(matches!(err, TextureError::InvariantViolation(_)));
    }
}
