//! Palette store and the indexed lookup bound to it.

use alloc::vec::Vec;

use rgb::RGBA8;

use super::color::ColorCodec;
use crate::error::TextureError;

/// Ordered palette colors with the capacity of the format they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<RGBA8>,
    capacity: usize,
}

impl Palette {
    /// Fails with [`TextureError::CapacityExceeded`] if `entries` is longer than `capacity`.
    pub fn new(entries: Vec<RGBA8>, capacity: usize) -> Result<Self, TextureError> {
        if entries.len() > capacity {
            return Err(TextureError::CapacityExceeded {
                needed: entries.len(),
                capacity,
            });
        }
        Ok(Self { entries, capacity })
    }

    /// Decode `count` packed entries starting at `offset`.
    pub fn decode(
        codec: ColorCodec,
        bytes: &[u8],
        offset: usize,
        count: usize,
        capacity: usize,
    ) -> Result<Self, TextureError> {
        if count > capacity {
            return Err(TextureError::malformed(
                offset,
                alloc::format!("palette declares {count} entries, format allows {capacity}"),
            ));
        }
        let entries = codec.decode(bytes, offset, count as u32, 1)?;
        Self::new(entries, capacity)
    }

    /// Pack every entry with `codec`, padding unused slots up to `padded_len` entries with zeros.
    pub fn encode(&self, codec: ColorCodec, padded_len: usize) -> Result<Vec<u8>, TextureError> {
        let mut out = codec.encode(&self.entries)?;
        let entry_bytes = codec.bits_per_pixel() as usize / 8;
        out.resize(padded_len.max(self.entries.len()) * entry_bytes, 0);
        Ok(out)
    }

    pub fn entries(&self) -> &[RGBA8] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Indexed pixel codec: `bits` per index, colors resolved through a bound palette.
#[derive(Clone, Copy, Debug)]
pub struct IndexCodec<'p> {
    bits: u32,
    palette: &'p Palette,
}

impl<'p> IndexCodec<'p> {
    pub fn new(bits: u32, palette: &'p Palette) -> Self {
        Self { bits, palette }
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.bits
    }

    /// Number of addressable palette entries (`1 << bits`).
    pub fn palette_entries(&self) -> usize {
        1 << self.bits
    }

    /// Resolve an index. Indices past the end of the palette are a format error.
    #[inline]
    pub fn lookup(&self, index: u32, offset: usize) -> Result<RGBA8, TextureError> {
        self.palette
            .entries
            .get(index as usize)
            .copied()
            .ok_or_else(|| {
                TextureError::malformed(
                    offset,
                    alloc::format!(
                        "palette index {index} out of range (palette has {} entries)",
                        self.palette.len()
                    ),
                )
            })
    }
}
