//! GVR pixel and data format identifiers and the codec registry.

use crate::codec::{ColorCodec, DataCodec, NibbleOrder, SampleLayout};
use crate::swizzle::Swizzle;

/// Palette entry format, the high nibble of GVRT byte 0x0A.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GvrPixelFormat {
    IntensityA8 = 0,
    Rgb565 = 1,
    Rgb5a3 = 2,
}

impl GvrPixelFormat {
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::IntensityA8),
            1 => Some(Self::Rgb565),
            2 => Some(Self::Rgb5a3),
            _ => None,
        }
    }
}

/// Surface data format, GVRT byte 0x0B.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GvrDataFormat {
    Intensity4 = 0x00,
    Intensity8 = 0x01,
    IntensityA4 = 0x02,
    IntensityA8 = 0x03,
    Rgb565 = 0x04,
    Rgb5a3 = 0x05,
    Argb8888 = 0x06,
    Index4 = 0x08,
    Index8 = 0x09,
    Dxt1 = 0x0E,
}

impl GvrDataFormat {
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0x00 => Self::Intensity4,
            0x01 => Self::Intensity8,
            0x02 => Self::IntensityA4,
            0x03 => Self::IntensityA8,
            0x04 => Self::Rgb565,
            0x05 => Self::Rgb5a3,
            0x06 => Self::Argb8888,
            0x08 => Self::Index4,
            0x09 => Self::Index8,
            0x0E => Self::Dxt1,
            _ => return None,
        })
    }

    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Index4 | Self::Index8)
    }
}

const fn tiled(layout: SampleLayout, block_bytes: u32, block_rows: u32) -> DataCodec {
    DataCodec::new(layout, NibbleOrder::HighFirst).with_swizzle(Some(Swizzle::Blocks {
        block_bytes,
        block_rows,
    }))
}

const fn direct(codec: ColorCodec) -> DataCodec {
    match codec.bits_per_pixel() {
        4 => tiled(SampleLayout::Direct(codec), 4, 8),
        _ => tiled(SampleLayout::Direct(codec), 8, 4),
    }
}

/// Indexed by data format id. `None` covers both gaps in the id space and
/// recognized formats without a codec.
static DATA_CODECS: [Option<DataCodec>; 15] = [
    Some(direct(ColorCodec::Intensity4)),
    Some(direct(ColorCodec::Intensity8)),
    Some(direct(ColorCodec::IntensityA4)),
    Some(direct(ColorCodec::IntensityA8Be)),
    Some(direct(ColorCodec::Rgb565Be)),
    Some(direct(ColorCodec::Rgb5a3Be)),
    Some(
        DataCodec::new(SampleLayout::Direct(ColorCodec::Argb8888), NibbleOrder::HighFirst)
            .with_swizzle(Some(Swizzle::SplitArgb)),
    ),
    None,
    Some(tiled(SampleLayout::Indexed { bits: 4 }, 4, 8)),
    Some(tiled(SampleLayout::Indexed { bits: 8 }, 8, 4)),
    None,
    None,
    None,
    None,
    None,
];

static PALETTE_CODECS: [ColorCodec; 3] = [
    ColorCodec::IntensityA8Be,
    ColorCodec::Rgb565Be,
    ColorCodec::Rgb5a3Be,
];

/// Tiled data codec for a GVRT data format id.
pub fn resolve(data_format: u8) -> Option<DataCodec> {
    DATA_CODECS.get(usize::from(data_format)).copied().flatten()
}

/// Entry codec for a palette pixel format id.
pub fn resolve_palette(pixel_format: u8) -> Option<ColorCodec> {
    PALETTE_CODECS.get(usize::from(pixel_format)).copied()
}

pub(crate) fn describe(data_format: u8) -> alloc::string::String {
    match GvrDataFormat::from_id(data_format) {
        Some(f) => alloc::format!("GVR {f:?} ({data_format:#04x})"),
        None => alloc::format!("GVR data format {data_format:#04x}"),
    }
}

pub(crate) fn describe_palette(pixel_format: u8) -> alloc::string::String {
    match GvrPixelFormat::from_id(pixel_format) {
        Some(f) => alloc::format!("GVR palette {f:?} ({pixel_format})"),
        None => alloc::format!("GVR palette format {pixel_format:#04x}"),
    }
}
