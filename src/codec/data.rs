//! Whole-surface data codecs: alignment padding, swizzle, per-sample codec.

use alloc::borrow::Cow;
use alloc::vec;
use alloc::vec::Vec;

use rgb::RGBA8;

use super::color::ColorCodec;
use super::palette::{IndexCodec, Palette};
use crate::error::TextureError;
use crate::swizzle::Swizzle;

/// What one stored sample holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleLayout {
    /// Full color per sample.
    Direct(ColorCodec),
    /// A palette index of `bits` bits (4 or 8).
    Indexed { bits: u32 },
}

/// Which half of a byte holds the first of two 4-bit samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NibbleOrder {
    /// GameCube.
    HighFirst,
    /// PSP.
    LowFirst,
}

/// Samples handed to [`DataCodec::encode`], row-major, exactly width × height.
#[derive(Clone, Copy, Debug)]
pub enum Samples<'a> {
    Colors(&'a [RGBA8]),
    Indices(&'a [u8]),
}

/// Encoder/decoder for a full surface of one data format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataCodec {
    layout: SampleLayout,
    swizzle: Option<Swizzle>,
    align: (u32, u32),
    nibbles: NibbleOrder,
    external_palette: bool,
}

impl DataCodec {
    pub const fn new(layout: SampleLayout, nibbles: NibbleOrder) -> Self {
        Self {
            layout,
            swizzle: None,
            align: (1, 1),
            nibbles,
            external_palette: false,
        }
    }

    /// Store the surface in `swizzle` tile order.
    pub const fn with_swizzle(mut self, swizzle: Option<Swizzle>) -> Self {
        self.swizzle = swizzle;
        self
    }

    /// Pad the stored surface to multiples of `width` × `height` pixels.
    pub const fn with_alignment(mut self, width: u32, height: u32) -> Self {
        self.align = (width, height);
        self
    }

    /// Mark the palette as living in a separate file.
    pub const fn with_external_palette(mut self, external: bool) -> Self {
        self.external_palette = external;
        self
    }

    pub const fn layout(&self) -> SampleLayout {
        self.layout
    }

    pub const fn swizzle(&self) -> Option<Swizzle> {
        self.swizzle
    }

    pub const fn bits_per_pixel(&self) -> u32 {
        match self.layout {
            SampleLayout::Direct(codec) => codec.bits_per_pixel(),
            SampleLayout::Indexed { bits } => bits,
        }
    }

    pub const fn is_indexed(&self) -> bool {
        matches!(self.layout, SampleLayout::Indexed { .. })
    }

    /// Palette slots addressable by this format; 0 for direct color.
    pub const fn palette_entries(&self) -> usize {
        match self.layout {
            SampleLayout::Direct(_) => 0,
            SampleLayout::Indexed { bits } => 1 << bits,
        }
    }

    pub const fn needs_external_palette(&self) -> bool {
        self.external_palette
    }

    /// Stored surface size: the reported size rounded up to the alignment and
    /// to the swizzle granularity.
    pub fn padded_dimensions(&self, width: u32, height: u32) -> Result<(u32, u32), TextureError> {
        let (mut gw, mut gh) = self.align;
        if let Some(swz) = self.swizzle {
            let (sw, sh) = swz.granularity(self.bits_per_pixel());
            gw = lcm(gw, sw);
            gh = lcm(gh, sh);
        }
        // Sub-byte rows must end on a byte boundary.
        if self.bits_per_pixel() < 8 {
            gw = lcm(gw, 8 / self.bits_per_pixel());
        }
        let pad = |n: u32, g: u32| n.div_ceil(g.max(1)).checked_mul(g.max(1));
        match (pad(width, gw), pad(height, gh)) {
            (Some(pw), Some(ph)) => Ok((pw, ph)),
            _ => Err(TextureError::DimensionsTooLarge { width, height }),
        }
    }

    /// Exact payload byte length for a `width` × `height` image.
    pub fn payload_len(&self, width: u32, height: u32) -> Result<usize, TextureError> {
        let (pw, ph) = self.padded_dimensions(width, height)?;
        (pw as usize)
            .checked_mul(ph as usize)
            .and_then(|n| n.checked_mul(self.bits_per_pixel() as usize))
            .map(|bits| bits / 8)
            .ok_or(TextureError::DimensionsTooLarge { width, height })
    }

    /// Decode the payload at `offset` into `width * height` RGBA8 pixels.
    ///
    /// Indexed layouts need `palette`; indices past its end are a format error.
    pub fn decode(
        &self,
        bytes: &[u8],
        offset: usize,
        width: u32,
        height: u32,
        palette: Option<&Palette>,
    ) -> Result<Vec<RGBA8>, TextureError> {
        crate::pixel::check_dimensions(width, height)?;
        let (pw, ph) = self.padded_dimensions(width, height)?;
        let len = self.payload_len(width, height)?;
        let stored = offset
            .checked_add(len)
            .and_then(|end| bytes.get(offset..end))
            .ok_or_else(|| TextureError::truncated(offset, len))?;

        let linear: Cow<'_, [u8]> = match self.swizzle {
            Some(swz) => Cow::Owned(swz.unswizzle(stored, pw, ph, self.bits_per_pixel())?),
            None => Cow::Borrowed(stored),
        };

        let resolve = match (self.layout, palette) {
            (SampleLayout::Direct(codec), _) => Resolve::Direct(codec),
            (SampleLayout::Indexed { bits }, Some(palette)) => {
                Resolve::Indexed(IndexCodec::new(bits, palette))
            }
            (SampleLayout::Indexed { .. }, None) => {
                return Err(TextureError::InvariantViolation(
                    "indexed surface decoded without a palette".into(),
                ));
            }
        };

        let mut out = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as usize {
            let row_start = y * pw as usize;
            for x in 0..width as usize {
                let raw = self.read_sample(&linear, row_start + x)?;
                out.push(match &resolve {
                    Resolve::Direct(codec) => codec.unpack(raw),
                    Resolve::Indexed(idx) => idx.lookup(raw, offset)?,
                });
            }
        }
        Ok(out)
    }

    /// Pack `samples` for a `width` × `height` image into a stored payload.
    ///
    /// Padding pixels repeat the last column and row.
    pub fn encode(
        &self,
        samples: Samples<'_>,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, TextureError> {
        crate::pixel::check_dimensions(width, height)?;
        let count = width as usize * height as usize;
        let provided = match samples {
            Samples::Colors(c) => c.len(),
            Samples::Indices(i) => i.len(),
        };
        if provided != count {
            return Err(TextureError::InvariantViolation(alloc::format!(
                "{provided} samples supplied for a {width}x{height} surface"
            )));
        }

        let (pw, ph) = self.padded_dimensions(width, height)?;
        let mut linear = vec![0u8; self.payload_len(width, height)?];
        let capacity = self.palette_entries();

        for py in 0..ph as usize {
            let sy = py.min(height as usize - 1);
            for px in 0..pw as usize {
                let src = sy * width as usize + px.min(width as usize - 1);
                let raw = match (self.layout, samples) {
                    (SampleLayout::Direct(codec), Samples::Colors(colors)) => codec.pack(colors[src]),
                    (SampleLayout::Indexed { .. }, Samples::Indices(indices)) => {
                        let index = indices[src] as usize;
                        if index >= capacity {
                            return Err(TextureError::CapacityExceeded {
                                needed: index + 1,
                                capacity,
                            });
                        }
                        index as u32
                    }
                    (layout, _) => {
                        return Err(TextureError::InvariantViolation(alloc::format!(
                            "sample kind does not match {layout:?}"
                        )));
                    }
                };
                self.write_sample(&mut linear, py * pw as usize + px, raw)?;
            }
        }

        match self.swizzle {
            Some(swz) => swz.swizzle(&linear, pw, ph, self.bits_per_pixel()),
            None => Ok(linear),
        }
    }

    fn read_sample(&self, linear: &[u8], index: usize) -> Result<u32, TextureError> {
        match (self.bits_per_pixel(), self.layout) {
            (4, _) => {
                let byte = *linear
                    .get(index / 2)
                    .ok_or_else(|| TextureError::truncated(index / 2, 1))?;
                let high = (index % 2 == 0) == (self.nibbles == NibbleOrder::HighFirst);
                Ok(u32::from(if high { byte >> 4 } else { byte & 0x0f }))
            }
            (_, SampleLayout::Direct(codec)) => {
                codec.read_raw(linear, index * codec.bits_per_pixel() as usize / 8)
            }
            (_, SampleLayout::Indexed { .. }) => linear
                .get(index)
                .map(|&b| u32::from(b))
                .ok_or_else(|| TextureError::truncated(index, 1)),
        }
    }

    fn write_sample(&self, linear: &mut [u8], index: usize, raw: u32) -> Result<(), TextureError> {
        let len = linear.len();
        let too_small = |needed: usize| TextureError::BufferTooSmall {
            needed,
            actual: len,
        };
        match (self.bits_per_pixel(), self.layout) {
            (4, _) => {
                let byte = linear.get_mut(index / 2).ok_or(too_small(index / 2 + 1))?;
                let high = (index % 2 == 0) == (self.nibbles == NibbleOrder::HighFirst);
                let nibble = (raw & 0x0f) as u8;
                if high {
                    *byte = (*byte & 0x0f) | (nibble << 4);
                } else {
                    *byte = (*byte & 0xf0) | nibble;
                }
                Ok(())
            }
            (_, SampleLayout::Direct(codec)) => {
                codec.write_raw(raw, linear, index * codec.bits_per_pixel() as usize / 8)
            }
            (_, SampleLayout::Indexed { .. }) => {
                *linear.get_mut(index).ok_or(too_small(index + 1))? = raw as u8;
                Ok(())
            }
        }
    }
}

enum Resolve<'p> {
    Direct(ColorCodec),
    Indexed(IndexCodec<'p>),
}

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

const fn lcm(a: u32, b: u32) -> u32 {
    if a == 0 || b == 0 {
        return if a > b { a } else { b };
    }
    a / gcd(a, b) * b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> Vec<RGBA8> {
        (0..w * h)
            .map(|i| {
                let x = (i % w) as u8;
                let y = (i / w) as u8;
                RGBA8::new(x.wrapping_mul(16), y.wrapping_mul(16), x ^ y, 255)
            })
            .collect()
    }

    #[test]
    fn padding_rounds_to_swizzle_granularity() {
        let codec = DataCodec::new(SampleLayout::Indexed { bits: 4 }, NibbleOrder::LowFirst)
            .with_swizzle(Some(Swizzle::PSP))
            .with_alignment(16, 8);
        assert_eq!(codec.padded_dimensions(20, 5).unwrap(), (32, 8));
        assert_eq!(codec.payload_len(20, 5).unwrap(), 32 * 8 / 2);

        let codec = DataCodec::new(SampleLayout::Direct(ColorCodec::Rgba8888), NibbleOrder::LowFirst)
            .with_swizzle(Some(Swizzle::PSP))
            .with_alignment(16, 8);
        assert_eq!(codec.padded_dimensions(16, 16).unwrap(), (16, 16));
    }

    #[test]
    fn unaligned_surface_crops_back() {
        let codec = DataCodec::new(SampleLayout::Direct(ColorCodec::Rgba8888), NibbleOrder::LowFirst)
            .with_swizzle(Some(Swizzle::PSP))
            .with_alignment(16, 8);
        let pixels = gradient(13, 5);
        let payload = codec.encode(Samples::Colors(&pixels), 13, 5).unwrap();
        assert_eq!(payload.len(), 16 * 8 * 4);
        let back = codec.decode(&payload, 0, 13, 5, None).unwrap();
        assert_eq!(back, pixels);
    }

    #[test]
    fn nibble_order_is_respected() {
        let palette = Palette::new(
            (0..16u8).map(|i| RGBA8::new(i, i, i, 255)).collect(),
            16,
        )
        .unwrap();
        let low = DataCodec::new(SampleLayout::Indexed { bits: 4 }, NibbleOrder::LowFirst);
        let high = DataCodec::new(SampleLayout::Indexed { bits: 4 }, NibbleOrder::HighFirst);
        let a = low.decode(&[0x21], 0, 2, 1, Some(&palette)).unwrap();
        let b = high.decode(&[0x21], 0, 2, 1, Some(&palette)).unwrap();
        assert_eq!((a[0].r, a[1].r), (1, 2));
        assert_eq!((b[0].r, b[1].r), (2, 1));

        let packed = low.encode(Samples::Indices(&[1, 2]), 2, 1).unwrap();
        assert_eq!(packed, [0x21]);
    }

    #[test]
    fn index_past_palette_is_malformed() {
        let palette = Palette::new(alloc::vec![RGBA8::default(); 2], 256).unwrap();
        let codec = DataCodec::new(SampleLayout::Indexed { bits: 8 }, NibbleOrder::LowFirst);
        let err = codec.decode(&[0, 1, 2, 0], 0, 2, 2, Some(&palette)).unwrap_err();
        assert!(matches!(err, TextureError::MalformedContainer { .. }));
    }

    #[test]
    fn indexed_without_palette_is_an_invariant_violation() {
        let codec = DataCodec::new(SampleLayout::Indexed { bits: 8 }, NibbleOrder::LowFirst);
        let err = codec.decode(&[0], 0, 1, 1, None).unwrap_err();
        assert!(matches!(err, TextureError::InvariantViolation(_)));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let codec = DataCodec::new(SampleLayout::Direct(ColorCodec::Rgb565Le), NibbleOrder::LowFirst);
        let err = codec.decode(&[0u8; 7], 0, 2, 2, None).unwrap_err();
        assert!(matches!(err, TextureError::MalformedContainer { .. }));
    }

    #[test]
    fn mismatched_sample_kind_rejected() {
        let codec = DataCodec::new(SampleLayout::Direct(ColorCodec::Rgb565Le), NibbleOrder::LowFirst);
        let err = codec.encode(Samples::Indices(&[0]), 1, 1).unwrap_err();
        assert!(matches!(err, TextureError::InvariantViolation(_)));
    }

    #[test]
    fn oversized_surface_is_an_error() {
        let codec = DataCodec::new(SampleLayout::Direct(ColorCodec::Rgba8888), NibbleOrder::LowFirst)
            .with_swizzle(Some(Swizzle::PSP))
            .with_alignment(16, 8);
        assert!(matches!(
            codec.padded_dimensions(u32::MAX, 1),
            Err(TextureError::DimensionsTooLarge { .. })
        ));
        assert!(matches!(
            codec.decode(&[], 0, u32::MAX, 1, None),
            Err(TextureError::DimensionsTooLarge { .. })
        ));
    }

    #[test]
    fn zero_dimension_rejected() {
        let codec = DataCodec::new(SampleLayout::Direct(ColorCodec::Rgb565Le), NibbleOrder::LowFirst);
        assert!(matches!(
            codec.encode(Samples::Colors(&[]), 0, 4),
            Err(TextureError::InvariantViolation(_))
        ));
    }
}
