use alloc::vec::Vec;

use rgb::RGBA8;

use crate::error::TextureError;

/// Read access to a width×height grid of RGBA8 samples in row-major order.
///
/// This is the only thing encoders need from an image. Implemented for
/// [`RgbaImage`] and, with the `imgref` feature, for `ImgRef<RGBA8>` and
/// `ImgVec<RGBA8>`.
pub trait ImageBuffer {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// One row of exactly `width()` pixels. `y` must be less than `height()`.
    fn row(&self, y: u32) -> &[RGBA8];
}

/// Owned canonical RGBA8 raster, as produced by decoders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<RGBA8>,
}

impl RgbaImage {
    /// Wrap a row-major pixel vector.
    ///
    /// Fails with [`TextureError::InvariantViolation`] on a zero dimension and
    /// [`TextureError::BufferTooSmall`] when `pixels` is not exactly `width * height` long.
    pub fn new(width: u32, height: u32, pixels: Vec<RGBA8>) -> Result<Self, TextureError> {
        check_dimensions(width, height)?;
        let needed = width as usize * height as usize;
        if pixels.len() != needed {
            return Err(TextureError::BufferTooSmall {
                needed: needed * 4,
                actual: pixels.len() * 4,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from tightly packed RGBA8 bytes.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, TextureError> {
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| RGBA8::new(c[0], c[1], c[2], c[3]))
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[RGBA8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<RGBA8> {
        self.pixels
    }

    /// Pixel data as RGBA8 bytes (zero-copy view).
    pub fn as_bytes(&self) -> &[u8] {
        use rgb::ComponentBytes as _;
        self.pixels.as_bytes()
    }

    /// Convert to an [`imgref::ImgVec`].
    #[cfg(feature = "imgref")]
    pub fn into_imgvec(self) -> imgref::ImgVec<RGBA8> {
        imgref::ImgVec::new(self.pixels, self.width as usize, self.height as usize)
    }
}

impl ImageBuffer for RgbaImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn row(&self, y: u32) -> &[RGBA8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }
}

impl<T: ImageBuffer + ?Sized> ImageBuffer for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn row(&self, y: u32) -> &[RGBA8] {
        (**self).row(y)
    }
}

#[cfg(feature = "imgref")]
impl ImageBuffer for imgref::ImgRef<'_, RGBA8> {
    fn width(&self) -> u32 {
        imgref::Img::width(self) as u32
    }

    fn height(&self) -> u32 {
        imgref::Img::height(self) as u32
    }

    fn row(&self, y: u32) -> &[RGBA8] {
        strided_row(self.buf(), self.stride(), imgref::Img::width(self), y)
    }
}

#[cfg(feature = "imgref")]
impl ImageBuffer for imgref::ImgVec<RGBA8> {
    fn width(&self) -> u32 {
        imgref::Img::width(self) as u32
    }

    fn height(&self) -> u32 {
        imgref::Img::height(self) as u32
    }

    fn row(&self, y: u32) -> &[RGBA8] {
        strided_row(self.buf(), self.stride(), imgref::Img::width(self), y)
    }
}

#[cfg(feature = "imgref")]
fn strided_row(buf: &[RGBA8], stride: usize, width: usize, y: u32) -> &[RGBA8] {
    let start = y as usize * stride;
    &buf[start..start + width]
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::InvariantViolation(alloc::format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Copy an [`ImageBuffer`] into a contiguous row-major pixel vector.
pub(crate) fn collect_pixels<I: ImageBuffer + ?Sized>(image: &I) -> Result<Vec<RGBA8>, TextureError> {
    let width = image.width();
    let height = image.height();
    check_dimensions(width, height)?;
    let mut out = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        let row = image.row(y);
        if row.len() < width as usize {
            return Err(TextureError::BufferTooSmall {
                needed: width as usize * 4,
                actual: row.len() * 4,
            });
        }
        out.extend_from_slice(&row[..width as usize]);
    }
    Ok(out)
}
