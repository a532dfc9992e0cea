use alloc::vec::Vec;

use rgb::RGBA8;

use crate::error::TextureError;
use crate::limits::Limits;
use crate::pixel::{self, ImageBuffer};
use crate::quantize::PaletteMode;

#[cfg(feature = "gim")]
use crate::gim::{GimMetadata, GimOptions, GimPixelFormat};
#[cfg(feature = "gvr")]
use crate::gvr::{GlobalIndex, GvrDataFormat, GvrOptions, GvrPixelFormat};

/// Encoded texture bytes, plus a GVPL file when the palette is external.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOutput {
    pub bytes: Vec<u8>,
    pub external_palette: Option<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Target {
    #[cfg(feature = "gim")]
    Gim(GimOptions),
    #[cfg(feature = "gvr")]
    Gvr(GvrOptions),
}

/// Encode request builder.
///
/// Options that do not apply to the chosen container are ignored.
///
/// ```no_run
/// use zentex::{EncodeRequest, RgbaImage, gim::GimPixelFormat};
///
/// let image = RgbaImage::new(16, 16, vec![rgb::RGBA8::new(255, 0, 0, 255); 256])?;
/// let out = EncodeRequest::gim(GimPixelFormat::Index4).encode(&image)?;
/// assert!(out.external_palette.is_none());
/// # Ok::<(), zentex::TextureError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    target: Target,
    limits: Option<Limits>,
}

impl EncodeRequest {
    /// GIM output, PSP-swizzled, with RGBA8888 palette entries for indexed formats.
    #[cfg(feature = "gim")]
    pub fn gim(format: GimPixelFormat) -> Self {
        Self {
            target: Target::Gim(GimOptions::new(format)),
            limits: None,
        }
    }

    /// GVR output with a `GBIX` index of 0 and an internal palette.
    ///
    /// `pixel_format` is the palette entry format; it is stored but unused
    /// for direct-color data formats.
    #[cfg(feature = "gvr")]
    pub fn gvr(pixel_format: GvrPixelFormat, data_format: GvrDataFormat) -> Self {
        Self {
            target: Target::Gvr(GvrOptions::new(pixel_format, data_format)),
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// How to handle images with more colors than an indexed format holds.
    pub fn with_palette_mode(mut self, mode: PaletteMode) -> Self {
        match &mut self.target {
            #[cfg(feature = "gim")]
            Target::Gim(o) => o.palette_mode = mode,
            #[cfg(feature = "gvr")]
            Target::Gvr(o) => o.palette_mode = mode,
        }
        self
    }

    /// GIM: store pixels in PSP block order (default `true`).
    #[cfg(feature = "gim")]
    pub fn with_swizzle(mut self, swizzle: bool) -> Self {
        if let Target::Gim(o) = &mut self.target {
            o.swizzle = swizzle;
        }
        self
    }

    /// GIM: palette entry format for indexed images.
    #[cfg(feature = "gim")]
    pub fn with_palette_format(mut self, format: GimPixelFormat) -> Self {
        if let Target::Gim(o) = &mut self.target {
            o.palette_format = format;
        }
        self
    }

    /// GIM: append a file-info chunk.
    #[cfg(feature = "gim")]
    pub fn with_metadata(mut self, metadata: GimMetadata) -> Self {
        if let Target::Gim(o) = &mut self.target {
            o.metadata = Some(metadata);
        }
        self
    }

    /// GVR: global index block, or `None` to start directly with `GVRT`.
    #[cfg(feature = "gvr")]
    pub fn with_global_index(mut self, index: Option<GlobalIndex>) -> Self {
        if let Target::Gvr(o) = &mut self.target {
            o.global_index = index;
        }
        self
    }

    /// GVR: write the palette of indexed formats to a separate GVPL file.
    #[cfg(feature = "gvr")]
    pub fn with_external_palette(mut self, external: bool) -> Self {
        if let Target::Gvr(o) = &mut self.target {
            o.external_palette = external;
        }
        self
    }

    /// Encode any [`ImageBuffer`].
    pub fn encode<I: ImageBuffer + ?Sized>(&self, image: &I) -> Result<EncodeOutput, TextureError> {
        if let Some(limits) = &self.limits {
            limits.check_raster(image.width(), image.height())?;
        }
        let pixels = pixel::collect_pixels(image)?;
        self.encode_pixels(&pixels, image.width(), image.height())
    }

    /// Encode a row-major pixel slice of exactly `width * height` entries.
    pub fn encode_pixels(
        &self,
        pixels: &[RGBA8],
        width: u32,
        height: u32,
    ) -> Result<EncodeOutput, TextureError> {
        pixel::check_dimensions(width, height)?;
        if let Some(limits) = &self.limits {
            limits.check_raster(width, height)?;
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or(TextureError::DimensionsTooLarge { width, height })?;
        if pixels.len() < expected {
            return Err(TextureError::BufferTooSmall {
                needed: expected * 4,
                actual: pixels.len() * 4,
            });
        }
        let pixels = &pixels[..expected];

        match &self.target {
            #[cfg(feature = "gim")]
            Target::Gim(options) => Ok(EncodeOutput {
                bytes: crate::gim::encode(pixels, width, height, options)?,
                external_palette: None,
            }),
            #[cfg(feature = "gvr")]
            Target::Gvr(options) => {
                let out = crate::gvr::encode(pixels, width, height, options)?;
                Ok(EncodeOutput {
                    bytes: out.texture,
                    external_palette: out.palette,
                })
            }
        }
    }
}
