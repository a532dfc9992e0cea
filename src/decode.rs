use crate::error::TextureError;
use crate::info::{self, TextureFormat};
use crate::limits::Limits;
use crate::pixel::RgbaImage;

#[cfg(feature = "gim")]
use crate::gim::GimTexture;
#[cfg(feature = "gvr")]
use crate::gvr::GvrTexture;

/// Decode request builder.
///
/// ```no_run
/// use zentex::DecodeRequest;
///
/// let data: &[u8] = &[]; // GIM or GVR bytes
/// let texture = DecodeRequest::new(data).decode()?;
/// let image = texture.pixels()?;
/// println!("{}x{}", image.width(), image.height());
/// # Ok::<(), zentex::TextureError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    external_palette: Option<&'a [u8]>,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            limits: None,
            external_palette: None,
        }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// GVPL bytes for GVR textures whose palette lives in a separate file.
    pub fn with_external_palette(mut self, gvpl: &'a [u8]) -> Self {
        self.external_palette = Some(gvpl);
        self
    }

    /// Parse and validate the container. Pixels are decoded lazily by
    /// [`Texture::pixels`].
    pub fn decode(self) -> Result<Texture<'a>, TextureError> {
        if let Some(limits) = self.limits {
            limits.check_input(self.data.len())?;
        }
        match info::probe(self.data) {
            #[cfg(feature = "gim")]
            Some(TextureFormat::Gim) => crate::gim::parse(self.data, self.limits).map(Texture::Gim),
            #[cfg(feature = "gvr")]
            Some(TextureFormat::Gvr) => {
                crate::gvr::parse(self.data, self.limits, self.external_palette).map(Texture::Gvr)
            }
            #[allow(unreachable_patterns)]
            Some(other) => Err(TextureError::UnsupportedFormat(alloc::format!(
                "{other:?} support is not compiled in"
            ))),
            None => Err(TextureError::UnrecognizedFormat),
        }
    }
}

/// A parsed texture of either family.
#[derive(Debug)]
#[non_exhaustive]
pub enum Texture<'a> {
    #[cfg(feature = "gim")]
    Gim(GimTexture<'a>),
    #[cfg(feature = "gvr")]
    Gvr(GvrTexture<'a>),
}

impl<'a> Texture<'a> {
    pub fn format(&self) -> TextureFormat {
        match self {
            #[cfg(feature = "gim")]
            Texture::Gim(_) => TextureFormat::Gim,
            #[cfg(feature = "gvr")]
            Texture::Gvr(_) => TextureFormat::Gvr,
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            #[cfg(feature = "gim")]
            Texture::Gim(t) => t.width(),
            #[cfg(feature = "gvr")]
            Texture::Gvr(t) => t.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            #[cfg(feature = "gim")]
            Texture::Gim(t) => t.height(),
            #[cfg(feature = "gvr")]
            Texture::Gvr(t) => t.height(),
        }
    }

    /// Raw pixel (GIM) or data (GVR) format id.
    pub fn format_id(&self) -> u16 {
        match self {
            #[cfg(feature = "gim")]
            Texture::Gim(t) => t.pixel_format_id(),
            #[cfg(feature = "gvr")]
            Texture::Gvr(t) => t.data_format_id().into(),
        }
    }

    /// Raw palette format id; GVR always reports its pixel format nibble.
    pub fn palette_format_id(&self) -> Option<u16> {
        match self {
            #[cfg(feature = "gim")]
            Texture::Gim(t) => t.palette_format_id(),
            #[cfg(feature = "gvr")]
            Texture::Gvr(t) => Some(t.pixel_format_id().into()),
        }
    }

    /// Decoded RGBA pixels, computed once and cached.
    pub fn pixels(&self) -> Result<&RgbaImage, TextureError> {
        match self {
            #[cfg(feature = "gim")]
            Texture::Gim(t) => t.pixels(),
            #[cfg(feature = "gvr")]
            Texture::Gvr(t) => t.pixels(),
        }
    }

    pub fn into_image(self) -> Result<RgbaImage, TextureError> {
        match self {
            #[cfg(feature = "gim")]
            Texture::Gim(t) => t.into_image(),
            #[cfg(feature = "gvr")]
            Texture::Gvr(t) => t.into_image(),
        }
    }

    #[cfg(feature = "gim")]
    pub fn as_gim(&self) -> Option<&GimTexture<'a>> {
        match self {
            Texture::Gim(t) => Some(t),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "gvr")]
    pub fn as_gvr(&self) -> Option<&GvrTexture<'a>> {
        match self {
            Texture::Gvr(t) => Some(t),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}
