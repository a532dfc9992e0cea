//! GIM writer: root → picture → image → palette → file info.

use alloc::vec::Vec;

use rgb::RGBA8;

use super::decode::{
    GimMetadata, KIND_FILE_INFO, KIND_IMAGE, KIND_PALETTE, KIND_PICTURE, KIND_ROOT,
};
use super::format::{self, GimPixelFormat};
use super::{MAGIC, PAYLOAD_OFFSET, PREAMBLE_LEN};
use crate::codec::{Palette, Samples};
use crate::error::TextureError;
use crate::quantize::{self, PaletteMode};
use crate::swizzle::Swizzle;

const CHUNK_HEADER_LEN: usize = 0x10;
/// Size of the image/palette header that follows the chunk header.
const IMAGE_HEADER_LEN: u16 = 0x30;

/// Options for writing a GIM file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GimOptions {
    pub format: GimPixelFormat,
    pub swizzle: bool,
    pub palette_format: GimPixelFormat,
    pub palette_mode: PaletteMode,
    pub metadata: Option<GimMetadata>,
}

impl GimOptions {
    pub(crate) fn new(format: GimPixelFormat) -> Self {
        Self {
            format,
            swizzle: true,
            palette_format: GimPixelFormat::Rgba8888,
            palette_mode: PaletteMode::default(),
            metadata: None,
        }
    }
}

/// Fields of one image or palette chunk.
struct Surface<'a> {
    kind: u16,
    format: GimPixelFormat,
    swizzled: bool,
    width: u16,
    height: u16,
    height_align: u16,
    payload: &'a [u8],
}

impl Surface<'_> {
    fn chunk_len(&self) -> usize {
        PAYLOAD_OFFSET + self.payload.len()
    }
}

/// Encode `pixels` (`width` × `height`, row-major) as a complete GIM file.
pub(crate) fn encode(
    pixels: &[RGBA8],
    width: u32,
    height: u32,
    options: &GimOptions,
) -> Result<Vec<u8>, TextureError> {
    let too_large = TextureError::DimensionsTooLarge { width, height };
    let w = u16::try_from(width).map_err(|_| too_large.clone())?;
    let h = u16::try_from(height).map_err(|_| too_large.clone())?;

    let unsupported = || TextureError::UnsupportedFormat(format::describe(options.format.id()));
    let codec = format::resolve(options.format.id())
        .ok_or_else(unsupported)?
        .with_swizzle(options.swizzle.then_some(Swizzle::PSP));

    let (payload, palette) = if codec.is_indexed() {
        let entry_codec = format::resolve_palette(options.palette_format.id()).ok_or_else(|| {
            TextureError::UnsupportedFormat(alloc::format!(
                "{} as palette entries",
                format::describe(options.palette_format.id())
            ))
        })?;
        let capacity = codec.palette_entries();
        let indexed = quantize::build_palette(pixels, capacity, options.palette_mode)?;
        let (entries, indices) = indexed.into_parts();
        let count = entries.len();
        let palette = Palette::new(entries, capacity)?;
        let payload = codec.encode(Samples::Indices(&indices), width, height)?;
        let palette_bytes = palette.encode(entry_codec, capacity)?;
        (payload, Some((palette_bytes, count)))
    } else {
        (codec.encode(Samples::Colors(pixels), width, height)?, None)
    };

    let image = Surface {
        kind: KIND_IMAGE,
        format: options.format,
        swizzled: options.swizzle,
        width: w,
        height: h,
        height_align: 8,
        payload: &payload,
    };
    let palette = palette
        .as_ref()
        .map(|(bytes, count)| {
            Ok::<_, TextureError>(Surface {
                kind: KIND_PALETTE,
                format: options.palette_format,
                swizzled: false,
                width: u16::try_from(*count).map_err(|_| too_large.clone())?,
                height: 1,
                height_align: 1,
                payload: bytes,
            })
        })
        .transpose()?;
    let info = options.metadata.as_ref().map(file_info_body);

    let picture_len =
        CHUNK_HEADER_LEN + image.chunk_len() + palette.as_ref().map_or(0, Surface::chunk_len);
    let info_len = info.as_ref().map_or(0, |b| CHUNK_HEADER_LEN + b.len());
    let root_len = CHUNK_HEADER_LEN + picture_len + info_len;
    let file_size = PREAMBLE_LEN + root_len;
    if i32::try_from(root_len).is_err() {
        return Err(too_large);
    }

    let mut out = Vec::with_capacity(file_size);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&[0u8; 4]);
    write_chunk_header(&mut out, KIND_ROOT, root_len);
    write_chunk_header(&mut out, KIND_PICTURE, picture_len);
    write_surface(&mut out, &image);
    if let Some(palette) = &palette {
        write_surface(&mut out, palette);
    }
    if let Some(body) = &info {
        write_chunk_header(&mut out, KIND_FILE_INFO, CHUNK_HEADER_LEN + body.len());
        out.extend_from_slice(body);
    }
    debug_assert_eq!(out.len(), file_size);

    log::debug!(
        "gim: wrote {width}x{height} {:?}, {} bytes",
        options.format,
        out.len()
    );
    Ok(out)
}

fn write_chunk_header(out: &mut Vec<u8>, kind: u16, length: usize) {
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // reserved
    out.extend_from_slice(&(length as u32).to_le_bytes());
    out.extend_from_slice(&(length as u32).to_le_bytes()); // next offset
    out.extend_from_slice(&(CHUNK_HEADER_LEN as u32).to_le_bytes()); // data offset
}

fn write_surface(out: &mut Vec<u8>, s: &Surface<'_>) {
    let start = out.len();
    write_chunk_header(out, s.kind, s.chunk_len());

    let pixels_end = u32::from(IMAGE_HEADER_LEN) + s.payload.len() as u32;
    out.extend_from_slice(&IMAGE_HEADER_LEN.to_le_bytes()); // 0x10 header size
    out.extend_from_slice(&0u16.to_le_bytes()); // 0x12 reference
    out.extend_from_slice(&s.format.id().to_le_bytes()); // 0x14
    out.extend_from_slice(&u16::from(s.swizzled).to_le_bytes()); // 0x16 order
    out.extend_from_slice(&s.width.to_le_bytes()); // 0x18
    out.extend_from_slice(&s.height.to_le_bytes()); // 0x1A
    out.extend_from_slice(&(s.format.bits_per_pixel() as u16).to_le_bytes()); // 0x1C
    out.extend_from_slice(&16u16.to_le_bytes()); // 0x1E pitch align
    out.extend_from_slice(&s.height_align.to_le_bytes()); // 0x20
    out.extend_from_slice(&2u16.to_le_bytes()); // 0x22 dim count
    out.extend_from_slice(&[0u8; 4]); // 0x24
    out.extend_from_slice(&u32::from(IMAGE_HEADER_LEN).to_le_bytes()); // 0x28 index start
    out.extend_from_slice(&u32::from(IMAGE_HEADER_LEN).to_le_bytes()); // 0x2C pixels start
    out.extend_from_slice(&pixels_end.to_le_bytes()); // 0x30
    out.extend_from_slice(&0u32.to_le_bytes()); // 0x34 plane mask
    out.extend_from_slice(&1u16.to_le_bytes()); // 0x38 level type
    out.extend_from_slice(&1u16.to_le_bytes()); // 0x3A level count
    out.extend_from_slice(&3u16.to_le_bytes()); // 0x3C frame type
    out.extend_from_slice(&1u16.to_le_bytes()); // 0x3E frame count
    out.extend_from_slice(&0x40u32.to_le_bytes()); // 0x40 frame offset
    out.resize(start + PAYLOAD_OFFSET, 0);
    out.extend_from_slice(s.payload);
}

/// Four NUL-terminated strings, padded to a 16-byte multiple.
fn file_info_body(meta: &GimMetadata) -> Vec<u8> {
    let mut body = Vec::new();
    for s in [
        &meta.original_filename,
        &meta.user,
        &meta.timestamp,
        &meta.program,
    ] {
        body.extend(s.bytes().filter(|&b| b != 0));
        body.push(0);
    }
    body.resize(body.len().next_multiple_of(16), 0);
    body
}
