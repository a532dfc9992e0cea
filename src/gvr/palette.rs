//! GVPL external palette files.
//!
//! ```text
//! 0x00  "GVPL"
//! 0x04  u32 LE  length of everything after this field (8 + entries × 2)
//! 0x08  u8      reserved
//! 0x09  u8      palette pixel format
//! 0x0A  u32     reserved
//! 0x0E  u16 BE  entry count
//! 0x10  entries, big-endian 16-bit
//! ```

use alloc::vec::Vec;

use super::format::{self, GvrPixelFormat};
use crate::chunk::Cursor;
use crate::codec::Palette;
use crate::error::TextureError;

pub(crate) const GVPL_MAGIC: [u8; 4] = *b"GVPL";
const ENTRIES_OFFSET: usize = 0x10;

/// A parsed GVPL header over borrowed bytes.
#[derive(Clone, Copy, Debug)]
pub struct ExternalPalette<'a> {
    data: &'a [u8],
    pixel_format: u8,
    entries: u16,
}

impl<'a> ExternalPalette<'a> {
    pub fn from_bytes(data: &'a [u8]) -> Result<Self, TextureError> {
        let mut cursor = Cursor::new(data);
        if cursor.read_fixed_bytes::<4>()? != GVPL_MAGIC {
            return Err(TextureError::UnrecognizedFormat);
        }
        let length = cursor.read_u32_le()? as usize;
        cursor.skip(1)?;
        let pixel_format = cursor.read_u8()?;
        cursor.skip(4)?;
        let entries = cursor.read_u16_be()?;

        let needed = ENTRIES_OFFSET + usize::from(entries) * 2;
        if length.checked_add(8).is_none_or(|end| end < needed) {
            return Err(TextureError::malformed(
                4,
                alloc::format!("GVPL length {length} cannot hold {entries} entries"),
            ));
        }
        if data.len() < needed {
            return Err(TextureError::truncated(data.len(), needed - data.len()));
        }
        Ok(Self {
            data,
            pixel_format,
            entries,
        })
    }

    pub fn pixel_format_id(&self) -> u8 {
        self.pixel_format
    }

    pub fn pixel_format(&self) -> Option<GvrPixelFormat> {
        GvrPixelFormat::from_id(self.pixel_format)
    }

    pub fn len(&self) -> usize {
        usize::from(self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Decode the entries for a surface addressing `capacity` slots.
    pub fn palette(&self, capacity: usize) -> Result<Palette, TextureError> {
        let codec = format::resolve_palette(self.pixel_format)
            .ok_or_else(|| TextureError::UnsupportedFormat(format::describe_palette(self.pixel_format)))?;
        Palette::decode(codec, self.data, ENTRIES_OFFSET, self.len(), capacity)
    }
}

/// Write `palette` as a GVPL file.
pub(crate) fn encode(
    palette: &Palette,
    pixel_format: GvrPixelFormat,
) -> Result<Vec<u8>, TextureError> {
    let codec = format::resolve_palette(pixel_format.id())
        .ok_or_else(|| TextureError::UnsupportedFormat(format::describe_palette(pixel_format.id())))?;
    let entries = palette.encode(codec, palette.len())?;
    let count = u16::try_from(palette.len()).map_err(|_| TextureError::CapacityExceeded {
        needed: palette.len(),
        capacity: usize::from(u16::MAX),
    })?;

    let mut out = Vec::with_capacity(ENTRIES_OFFSET + entries.len());
    out.extend_from_slice(&GVPL_MAGIC);
    out.extend_from_slice(&(8 + entries.len() as u32).to_le_bytes());
    out.push(0);
    out.push(pixel_format.id());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&entries);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    #[test]
    fn writes_and_reads_back() {
        let colors = alloc::vec![
            RGBA8::new(255, 0, 0, 255),
            RGBA8::new(0, 255, 0, 255),
            RGBA8::new(0, 0, 255, 255),
        ];
        let palette = Palette::new(colors.clone(), 16).unwrap();
        let bytes = encode(&palette, GvrPixelFormat::Rgb565).unwrap();
        assert_eq!(&bytes[..4], b"GVPL");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 8 + 6);
        assert_eq!(bytes[9], 1);
        assert_eq!(u16::from_be_bytes([bytes[14], bytes[15]]), 3);
        // Pure red in big-endian RGB565.
        assert_eq!(&bytes[16..18], &[0xf8, 0x00]);

        let parsed = ExternalPalette::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.pixel_format(), Some(GvrPixelFormat::Rgb565));
        assert_eq!(parsed.palette(16).unwrap().entries(), &colors[..]);
    }

    #[test]
    fn too_many_entries_for_surface() {
        let palette = Palette::new(alloc::vec![RGBA8::default(); 20], 256).unwrap();
        let bytes = encode(&palette, GvrPixelFormat::Rgb5a3).unwrap();
        let parsed = ExternalPalette::from_bytes(&bytes).unwrap();
        assert!(matches!(
            parsed.palette(16),
            Err(TextureError::MalformedContainer { .. })
        ));
    }

    #[test]
    fn truncated_entries_rejected() {
        let palette = Palette::new(alloc::vec![RGBA8::default(); 4], 16).unwrap();
        let bytes = encode(&palette, GvrPixelFormat::IntensityA8).unwrap();
        assert!(ExternalPalette::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(matches!(
            ExternalPalette::from_bytes(b"GVRT\0\0\0\0"),
            Err(TextureError::UnrecognizedFormat)
        ));
    }
}
