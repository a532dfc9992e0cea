//! GVR writer.

use alloc::vec::Vec;

use rgb::RGBA8;

use super::decode::{GlobalIndex, GlobalIndexKind};
use super::format::{self, GvrDataFormat, GvrPixelFormat};
use super::palette;
use super::{FLAG_EXTERNAL_PALETTE, FLAG_INTERNAL_PALETTE, GBIX, GCIX, GVRT};
use crate::codec::{Palette, Samples};
use crate::error::TextureError;
use crate::quantize::{self, PaletteMode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GvrOptions {
    pub pixel_format: GvrPixelFormat,
    pub data_format: GvrDataFormat,
    pub global_index: Option<GlobalIndex>,
    pub palette_mode: PaletteMode,
    pub external_palette: bool,
}

impl GvrOptions {
    pub(crate) fn new(pixel_format: GvrPixelFormat, data_format: GvrDataFormat) -> Self {
        Self {
            pixel_format,
            data_format,
            global_index: Some(GlobalIndex::gbix(0)),
            palette_mode: PaletteMode::default(),
            external_palette: false,
        }
    }
}

/// A GVR file and, for external-palette textures, its GVPL companion.
pub(crate) struct GvrOutput {
    pub texture: Vec<u8>,
    pub palette: Option<Vec<u8>>,
}

pub(crate) fn encode(
    pixels: &[RGBA8],
    width: u32,
    height: u32,
    options: &GvrOptions,
) -> Result<GvrOutput, TextureError> {
    let too_large = TextureError::DimensionsTooLarge { width, height };
    let w = u16::try_from(width).map_err(|_| too_large.clone())?;
    let h = u16::try_from(height).map_err(|_| too_large.clone())?;

    let codec = format::resolve(options.data_format.id())
        .ok_or_else(|| TextureError::UnsupportedFormat(format::describe(options.data_format.id())))?;
    let codec = codec.with_external_palette(codec.is_indexed() && options.external_palette);

    let mut flags = 0u8;
    let mut internal = Vec::new();
    let mut external = None;
    let payload = if codec.is_indexed() {
        let entry_codec = format::resolve_palette(options.pixel_format.id()).ok_or_else(|| {
            TextureError::UnsupportedFormat(format::describe_palette(options.pixel_format.id()))
        })?;
        let capacity = codec.palette_entries();
        let (entries, indices) =
            quantize::build_palette(pixels, capacity, options.palette_mode)?.into_parts();
        let palette = Palette::new(entries, capacity)?;
        if codec.needs_external_palette() {
            flags |= FLAG_EXTERNAL_PALETTE;
            external = Some(palette::encode(&palette, options.pixel_format)?);
        } else {
            flags |= FLAG_INTERNAL_PALETTE;
            internal = palette.encode(entry_codec, capacity)?;
        }
        codec.encode(Samples::Indices(&indices), width, height)?
    } else {
        codec.encode(Samples::Colors(pixels), width, height)?
    };

    let chunk_len = 8 + internal.len() + payload.len();
    let chunk_len = u32::try_from(chunk_len).map_err(|_| too_large)?;

    let mut out = Vec::with_capacity(16 + 16 + internal.len() + payload.len());
    if let Some(index) = options.global_index {
        out.extend_from_slice(match index.kind {
            GlobalIndexKind::Gbix => &GBIX,
            GlobalIndexKind::Gcix => &GCIX,
        });
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&index.value.to_be_bytes());
        out.extend_from_slice(&[0u8; 4]);
    }
    out.extend_from_slice(&GVRT);
    out.extend_from_slice(&chunk_len.to_le_bytes());
    out.extend_from_slice(&[0u8; 2]);
    out.push(options.pixel_format.id() << 4 | flags);
    out.push(options.data_format.id());
    out.extend_from_slice(&w.to_be_bytes());
    out.extend_from_slice(&h.to_be_bytes());
    out.extend_from_slice(&internal);
    out.extend_from_slice(&payload);

    log::debug!(
        "gvr: wrote {width}x{height} {:?}, {} bytes{}",
        options.data_format,
        out.len(),
        if external.is_some() { " + GVPL" } else { "" }
    );
    Ok(GvrOutput {
        texture: out,
        palette: external,
    })
}
