//! GIM pixel format identifiers and the codec registry.

use crate::codec::{ColorCodec, DataCodec, NibbleOrder, SampleLayout};

/// Pixel format identifier stored in GIM image and palette chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum GimPixelFormat {
    Rgb565 = 0,
    Rgba5551 = 1,
    Rgba4444 = 2,
    Rgba8888 = 3,
    Index4 = 4,
    Index8 = 5,
    Index16 = 6,
    Index32 = 7,
    Dxt1 = 8,
    Dxt3 = 9,
    Dxt5 = 10,
}

impl GimPixelFormat {
    pub const fn id(self) -> u16 {
        self as u16
    }

    pub const fn from_id(id: u16) -> Option<Self> {
        Some(match id {
            0 => Self::Rgb565,
            1 => Self::Rgba5551,
            2 => Self::Rgba4444,
            3 => Self::Rgba8888,
            4 => Self::Index4,
            5 => Self::Index8,
            6 => Self::Index16,
            7 => Self::Index32,
            8 => Self::Dxt1,
            9 => Self::Dxt3,
            10 => Self::Dxt5,
            _ => return None,
        })
    }

    pub const fn is_indexed(self) -> bool {
        matches!(
            self,
            Self::Index4 | Self::Index8 | Self::Index16 | Self::Index32
        )
    }

    /// Formats a palette chunk may use for its entries.
    pub const fn is_palette_format(self) -> bool {
        matches!(
            self,
            Self::Rgb565 | Self::Rgba5551 | Self::Rgba4444 | Self::Rgba8888
        )
    }

    /// Bits per stored sample, DXT formats averaged over their blocks.
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Rgb565 | Self::Rgba5551 | Self::Rgba4444 | Self::Index16 => 16,
            Self::Rgba8888 | Self::Index32 => 32,
            Self::Index4 | Self::Dxt1 => 4,
            Self::Index8 | Self::Dxt3 | Self::Dxt5 => 8,
        }
    }
}

/// Stored row width in pixels: 16 bytes, and never fewer than 16 pixels.
const fn pitch_pixels(bpp: u32) -> u32 {
    let p = 128 / bpp;
    if p > 16 { p } else { 16 }
}

const fn direct(codec: ColorCodec) -> DataCodec {
    DataCodec::new(SampleLayout::Direct(codec), NibbleOrder::LowFirst)
        .with_alignment(pitch_pixels(codec.bits_per_pixel()), 8)
}

const fn indexed(bits: u32) -> DataCodec {
    DataCodec::new(SampleLayout::Indexed { bits }, NibbleOrder::LowFirst)
        .with_alignment(pitch_pixels(bits), 8)
}

/// Indexed by format id. `None` marks a recognized format without a codec.
static DATA_CODECS: [Option<DataCodec>; 11] = [
    Some(direct(ColorCodec::Rgb565Le)),
    Some(direct(ColorCodec::Rgba5551Le)),
    Some(direct(ColorCodec::Rgba4444Le)),
    Some(direct(ColorCodec::Rgba8888)),
    Some(indexed(4)),
    Some(indexed(8)),
    None,
    None,
    None,
    None,
    None,
];

static PALETTE_CODECS: [ColorCodec; 4] = [
    ColorCodec::Rgb565Le,
    ColorCodec::Rgba5551Le,
    ColorCodec::Rgba4444Le,
    ColorCodec::Rgba8888,
];

/// Unswizzled data codec for an image chunk's format id.
///
/// Callers add [`Swizzle::PSP`](crate::Swizzle::PSP) when the chunk's order field says so.
pub fn resolve(id: u16) -> Option<DataCodec> {
    DATA_CODECS.get(usize::from(id)).copied().flatten()
}

/// Entry codec for a palette chunk's format id.
pub fn resolve_palette(id: u16) -> Option<ColorCodec> {
    PALETTE_CODECS.get(usize::from(id)).copied()
}

pub(crate) fn describe(id: u16) -> alloc::string::String {
    match GimPixelFormat::from_id(id) {
        Some(f) => alloc::format!("GIM {f:?} ({id})"),
        None => alloc::format!("GIM pixel format {id:#06x}"),
    }
}
