//! GIM chunk handlers and the decoded texture.

use alloc::string::String;
use alloc::vec::Vec;
use core::cell::OnceCell;

use super::format::{self, GimPixelFormat};
use super::{PAYLOAD_OFFSET, PREAMBLE_LEN};
use crate::chunk::{self, ChunkHandler, ChunkStep, ChunkView};
use crate::codec::Palette;
use crate::error::TextureError;
use crate::limits::{self, Limits};
use crate::pixel::RgbaImage;
use crate::swizzle::Swizzle;

pub(crate) const KIND_ROOT: u16 = 0x02;
pub(crate) const KIND_PICTURE: u16 = 0x03;
pub(crate) const KIND_IMAGE: u16 = 0x04;
pub(crate) const KIND_PALETTE: u16 = 0x05;
pub(crate) const KIND_FILE_INFO: u16 = 0xFF;

/// Header bytes of a container chunk before its first child.
const CONTAINER_HEADER_LEN: usize = 16;

/// Strings carried by the optional file-info chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GimMetadata {
    pub original_filename: String,
    pub user: String,
    pub timestamp: String,
    pub program: String,
}

/// A payload region: absolute start, and the end of its chunk.
#[derive(Clone, Copy, Debug)]
struct Region {
    start: usize,
    end: usize,
}

#[derive(Clone, Copy, Debug)]
struct ImageChunk {
    format: u16,
    swizzled: bool,
    width: u16,
    height: u16,
    bpp: u16,
    offset: usize,
    payload: Region,
}

#[derive(Clone, Copy, Debug)]
struct PaletteChunk {
    format: u16,
    entries: u16,
    payload: Region,
}

/// Chunk state accumulated during the walk.
#[derive(Default)]
struct Builder {
    eof: Option<usize>,
    image: Option<ImageChunk>,
    palette: Option<PaletteChunk>,
    metadata: Option<GimMetadata>,
}

fn payload(chunk: &ChunkView<'_>) -> Result<Region, TextureError> {
    chunk.tail(PAYLOAD_OFFSET)?;
    Ok(Region {
        start: chunk.absolute(PAYLOAD_OFFSET),
        end: chunk.header.end(),
    })
}

impl<'a> ChunkHandler<'a> for Builder {
    fn end_of_file(&self) -> Option<usize> {
        self.eof
    }

    fn handle(&mut self, chunk: &ChunkView<'a>) -> Result<ChunkStep, TextureError> {
        let at = chunk.header.offset;
        log::debug!("gim: chunk {:#04x} @ {at:#x}, {} bytes", chunk.header.kind, chunk.header.length);
        match chunk.header.kind {
            KIND_ROOT => {
                self.eof = Some(chunk.header.length + PREAMBLE_LEN);
                Ok(ChunkStep::Descend {
                    header_len: CONTAINER_HEADER_LEN,
                })
            }
            KIND_PICTURE => Ok(ChunkStep::Descend {
                header_len: CONTAINER_HEADER_LEN,
            }),
            KIND_IMAGE => {
                let image = ImageChunk {
                    format: chunk.u16_le(0x14)?,
                    swizzled: chunk.u16_le(0x16)? == 1,
                    width: chunk.u16_le(0x18)?,
                    height: chunk.u16_le(0x1A)?,
                    bpp: chunk.u16_le(0x1C)?,
                    offset: at,
                    payload: payload(chunk)?,
                };
                if self.image.is_some() {
                    log::debug!("gim: ignoring additional image chunk @ {at:#x}");
                } else {
                    self.image = Some(image);
                }
                Ok(ChunkStep::Skip)
            }
            KIND_PALETTE => {
                let palette = PaletteChunk {
                    format: chunk.u16_le(0x14)?,
                    entries: chunk.u16_le(0x18)?,
                    payload: payload(chunk)?,
                };
                if self.palette.is_some() {
                    log::debug!("gim: ignoring additional palette chunk @ {at:#x}");
                } else {
                    self.palette = Some(palette);
                }
                Ok(ChunkStep::Skip)
            }
            KIND_FILE_INFO => {
                self.metadata = Some(parse_file_info(chunk)?);
                Ok(ChunkStep::Skip)
            }
            other => Err(TextureError::malformed(
                at,
                alloc::format!("unknown GIM chunk kind {other:#06x}"),
            )),
        }
    }
}

fn parse_file_info(chunk: &ChunkView<'_>) -> Result<GimMetadata, TextureError> {
    let mut fields = chunk.tail(0x10)?.split(|&b| b == 0);
    let mut next = || -> Result<String, TextureError> {
        match fields.next() {
            Some(s) => Ok(String::from_utf8_lossy(s).into_owned()),
            None => Err(TextureError::malformed(
                chunk.header.offset,
                "file info chunk ends before its fourth string",
            )),
        }
    };
    let original_filename = next()?;
    let user = next()?;
    let timestamp = next()?;
    let program = next()?;
    // `split` yields a final piece after the last NUL; four terminators mean five pieces.
    if fields.next().is_none() {
        return Err(TextureError::malformed(
            chunk.header.offset,
            "file info string is not NUL-terminated",
        ));
    }
    Ok(GimMetadata {
        original_filename,
        user,
        timestamp,
        program,
    })
}

/// A parsed GIM file. Pixels are decoded on first request and kept.
#[derive(Debug)]
pub struct GimTexture<'a> {
    data: &'a [u8],
    image: ImageChunk,
    palette: Option<PaletteChunk>,
    metadata: Option<GimMetadata>,
    pixels: OnceCell<RgbaImage>,
}

/// Walk the chunks of `data` and build a texture. No pixels are decoded.
pub(crate) fn parse<'a>(
    data: &'a [u8],
    limits: Option<&Limits>,
) -> Result<GimTexture<'a>, TextureError> {
    if !crate::info::is_gim(data) {
        return Err(TextureError::UnrecognizedFormat);
    }

    let mut builder = Builder::default();
    let end = chunk::walk(data, PREAMBLE_LEN, &mut builder)?;

    let image = builder
        .image
        .ok_or_else(|| TextureError::malformed(end, "GIM has no image chunk"))?;
    if image.width == 0 || image.height == 0 {
        return Err(TextureError::malformed(
            image.offset,
            alloc::format!("image chunk declares {}x{}", image.width, image.height),
        ));
    }
    limits::check_output(limits, image.width.into(), image.height.into())?;

    log::debug!(
        "gim: {}x{} {}{}, palette {:?}",
        image.width,
        image.height,
        format::describe(image.format),
        if image.swizzled { " swizzled" } else { "" },
        builder.palette.map(|p| p.format),
    );

    Ok(GimTexture {
        data,
        image,
        palette: builder.palette,
        metadata: builder.metadata,
        pixels: OnceCell::new(),
    })
}

impl<'a> GimTexture<'a> {
    pub fn width(&self) -> u32 {
        self.image.width.into()
    }

    pub fn height(&self) -> u32 {
        self.image.height.into()
    }

    /// Raw format id of the image chunk, known or not.
    pub fn pixel_format_id(&self) -> u16 {
        self.image.format
    }

    pub fn pixel_format(&self) -> Option<GimPixelFormat> {
        GimPixelFormat::from_id(self.image.format)
    }

    /// Bits per pixel as declared in the image chunk.
    pub fn declared_bpp(&self) -> u16 {
        self.image.bpp
    }

    pub fn is_swizzled(&self) -> bool {
        self.image.swizzled
    }

    pub fn palette_format_id(&self) -> Option<u16> {
        self.palette.map(|p| p.format)
    }

    pub fn palette_format(&self) -> Option<GimPixelFormat> {
        self.palette_format_id().and_then(GimPixelFormat::from_id)
    }

    /// Entry count declared by the palette chunk.
    pub fn palette_len(&self) -> Option<usize> {
        self.palette.map(|p| usize::from(p.entries))
    }

    pub fn metadata(&self) -> Option<&GimMetadata> {
        self.metadata.as_ref()
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

    /// The palette, decoded. `None` for direct-color images.
    pub fn palette(&self) -> Result<Option<Palette>, TextureError> {
        let Some(codec) = format::resolve(self.image.format) else {
            return Err(TextureError::UnsupportedFormat(format::describe(self.image.format)));
        };
        if !codec.is_indexed() {
            return Ok(None);
        }
        let chunk = self.palette.ok_or_else(|| {
            TextureError::malformed(self.image.offset, "indexed image without a palette chunk")
        })?;
        let entry_codec = format::resolve_palette(chunk.format).ok_or_else(|| {
            TextureError::UnsupportedFormat(alloc::format!(
                "{} as palette entries",
                format::describe(chunk.format)
            ))
        })?;
        Palette::decode(
            entry_codec,
            &self.data[..chunk.payload.end],
            chunk.payload.start,
            usize::from(chunk.entries),
            codec.palette_entries(),
        )
        .map(Some)
    }

    fn decode_pixels(&self) -> Result<RgbaImage, TextureError> {
        let codec = format::resolve(self.image.format)
            .ok_or_else(|| TextureError::UnsupportedFormat(format::describe(self.image.format)))?
            .with_swizzle(self.image.swizzled.then_some(Swizzle::PSP));
        if u32::from(self.image.bpp) != codec.bits_per_pixel() {
            return Err(TextureError::malformed(
                self.image.offset + 0x1C,
                alloc::format!(
                    "{} image declares {} bits per pixel",
                    format::describe(self.image.format),
                    self.image.bpp
                ),
            ));
        }
        let palette = self.palette()?;
        let (width, height) = (self.width(), self.height());
        let pixels: Vec<_> = codec.decode(
            &self.data[..self.image.payload.end],
            self.image.payload.start,
            width,
            height,
            palette.as_ref(),
        )?;
        RgbaImage::new(width, height, pixels)
    }
}
