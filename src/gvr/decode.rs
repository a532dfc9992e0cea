//! GVR header parsing and the decoded texture.

use alloc::vec::Vec;
use core::cell::OnceCell;

use super::format::{self, GvrDataFormat, GvrPixelFormat};
use super::palette::ExternalPalette;
use super::{FLAG_EXTERNAL_PALETTE, FLAG_INTERNAL_PALETTE, FLAG_MIPMAPS, GBIX, GCIX, GVRT};
use crate::chunk::Cursor;
use crate::codec::{DataCodec, Palette};
use crate::error::TextureError;
use crate::limits::{self, Limits};
use crate::pixel::RgbaImage;

/// Which tag introduced the global index block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GlobalIndexKind {
    #[default]
    Gbix,
    Gcix,
}

/// The optional global index preceding the texture header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlobalIndex {
    pub kind: GlobalIndexKind,
    pub value: u32,
}

impl GlobalIndex {
    pub const fn gbix(value: u32) -> Self {
        Self {
            kind: GlobalIndexKind::Gbix,
            value,
        }
    }

    pub const fn gcix(value: u32) -> Self {
        Self {
            kind: GlobalIndexKind::Gcix,
            value,
        }
    }
}

/// A parsed GVR file. Pixels are decoded on first request and kept.
#[derive(Debug)]
pub struct GvrTexture<'a> {
    data: &'a [u8],
    global_index: Option<GlobalIndex>,
    pixel_format: u8,
    data_format: u8,
    flags: u8,
    width: u16,
    height: u16,
    /// Absolute offset of the first byte after the GVRT header.
    data_start: usize,
    /// End of the GVRT block.
    data_end: usize,
    external_palette: Option<&'a [u8]>,
    pixels: OnceCell<RgbaImage>,
}

/// Read the global index and GVRT headers. No pixels are decoded.
pub(crate) fn parse<'a>(
    data: &'a [u8],
    limits: Option<&Limits>,
    external_palette: Option<&'a [u8]>,
) -> Result<GvrTexture<'a>, TextureError> {
    let mut cursor = Cursor::new(data);
    let mut magic = cursor.read_fixed_bytes::<4>()?;

    let mut global_index = None;
    if magic == GBIX || magic == GCIX {
        let kind = if magic == GBIX {
            GlobalIndexKind::Gbix
        } else {
            GlobalIndexKind::Gcix
        };
        let length = cursor.read_u32_le()? as usize;
        let block_start = cursor.position();
        let value = cursor.read_u32_be()?;
        if length < 4 {
            return Err(TextureError::malformed(
                4,
                alloc::format!("global index block length {length} is too short"),
            ));
        }
        global_index = Some(GlobalIndex { kind, value });
        cursor.set_position(block_start + length)?;
        magic = cursor.read_fixed_bytes::<4>()?;
        if magic != GVRT {
            return Err(TextureError::malformed(
                cursor.position() - 4,
                "global index block is not followed by GVRT",
            ));
        }
    } else if magic != GVRT {
        return Err(TextureError::UnrecognizedFormat);
    }

    let header_start = cursor.position() - 4;
    let chunk_len = cursor.read_u32_le()? as usize;
    cursor.skip(2)?;
    let packed = cursor.read_u8()?;
    let data_format = cursor.read_u8()?;
    let width = cursor.read_u16_be()?;
    let height = cursor.read_u16_be()?;
    let data_start = cursor.position();

    if chunk_len < 8 {
        return Err(TextureError::malformed(
            header_start + 4,
            alloc::format!("GVRT length {chunk_len} is shorter than its header"),
        ));
    }
    let data_end = header_start + 8 + chunk_len;
    if data_end > data.len() {
        return Err(TextureError::malformed(
            header_start + 4,
            alloc::format!(
                "GVRT length {chunk_len} runs past end of data ({} bytes)",
                data.len()
            ),
        ));
    }
    if width == 0 || height == 0 {
        return Err(TextureError::malformed(
            header_start + 12,
            alloc::format!("GVRT declares {width}x{height}"),
        ));
    }
    limits::check_output(limits, width.into(), height.into())?;

    let texture = GvrTexture {
        data,
        global_index,
        pixel_format: packed >> 4,
        data_format,
        flags: packed & 0x0F,
        width,
        height,
        data_start,
        data_end,
        external_palette,
        pixels: OnceCell::new(),
    };
    log::debug!(
        "gvr: {width}x{height} {}, flags {:#x}, global index {global_index:?}",
        format::describe(data_format),
        texture.flags
    );
    Ok(texture)
}

impl<'a> GvrTexture<'a> {
    pub fn width(&self) -> u32 {
        self.width.into()
    }

    pub fn height(&self) -> u32 {
        self.height.into()
    }

    pub fn global_index(&self) -> Option<GlobalIndex> {
        self.global_index
    }

    /// Raw palette pixel format id (high nibble of the format byte).
    pub fn pixel_format_id(&self) -> u8 {
        self.pixel_format
    }

    pub fn pixel_format(&self) -> Option<GvrPixelFormat> {
        GvrPixelFormat::from_id(self.pixel_format)
    }

    pub fn data_format_id(&self) -> u8 {
        self.data_format
    }

    pub fn data_format(&self) -> Option<GvrDataFormat> {
        GvrDataFormat::from_id(self.data_format)
    }

    /// Low nibble of the format byte.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Smaller levels follow level 0; only level 0 is decoded.
    pub fn has_mipmaps(&self) -> bool {
        self.flags & FLAG_MIPMAPS != 0
    }

    pub fn has_internal_palette(&self) -> bool {
        self.flags & FLAG_INTERNAL_PALETTE != 0
    }

    pub fn needs_external_palette(&self) -> bool {
        self.flags & FLAG_EXTERNAL_PALETTE != 0 && !self.has_internal_palette()
    }

    /// Decoded RGBA pixels, computed on the first call.
    pub fn pixels(&self) -> Result<&RgbaImage, TextureError> {
        if let Some(pixels) = self.pixels.get() {
            return Ok(pixels);
        }
        let decoded = self.decode_pixels()?;
        Ok(self.pixels.get_or_init(|| decoded))
    }

    /// Take the decoded image, decoding now if it was never requested.
    pub fn into_image(mut self) -> Result<RgbaImage, TextureError> {
        match self.pixels.take() {
            Some(pixels) => Ok(pixels),
            None => self.decode_pixels(),
        }
    }

    /// The palette and the offset where pixel data starts after it.
    fn load_palette(&self, codec: &DataCodec) -> Result<(Palette, usize), TextureError> {
        let capacity = codec.palette_entries();
        if codec.needs_external_palette() {
            let bytes = self.external_palette.ok_or_else(|| {
                TextureError::InvariantViolation(
                    "GVR texture uses an external palette but none was supplied".into(),
                )
            })?;
            let palette = ExternalPalette::from_bytes(bytes)?.palette(capacity)?;
            return Ok((palette, self.data_start));
        }
        if self.has_internal_palette() {
            let entry = format::resolve_palette(self.pixel_format).ok_or_else(|| {
                TextureError::UnsupportedFormat(format::describe_palette(self.pixel_format))
            })?;
            let bytes = &self.data[..self.data_end];
            let palette = Palette::decode(entry, bytes, self.data_start, capacity, capacity)?;
            let pixel_start = self.data_start + capacity * entry.bits_per_pixel() as usize / 8;
            return Ok((palette, pixel_start));
        }
        Err(TextureError::malformed(
            self.data_start - 6,
            "indexed GVR without a palette flag",
        ))
    }

    fn decode_pixels(&self) -> Result<RgbaImage, TextureError> {
        let codec = format::resolve(self.data_format)
            .ok_or_else(|| TextureError::UnsupportedFormat(format::describe(self.data_format)))?;
        let codec = codec.with_external_palette(codec.is_indexed() && self.needs_external_palette());
        let (palette, pixel_start) = if codec.is_indexed() {
            let (palette, start) = self.load_palette(&codec)?;
            (Some(palette), start)
        } else {
            (None, self.data_start)
        };
        let (width, height) = (self.width(), self.height());
        let pixels: Vec<_> = codec.decode(
            &self.data[..self.data_end],
            pixel_start,
            width,
            height,
            palette.as_ref(),
        )?;
        RgbaImage::new(width, height, pixels)
    }
}
