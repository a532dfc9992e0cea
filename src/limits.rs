use crate::error::TextureError;

/// Resource limits for decode/encode operations.
///
/// All fields default to `None` (no limit). Dimensions are the visible ones;
/// alignment padding is not counted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum size of the decoded RGBA8 raster in bytes.
    pub max_memory_bytes: Option<u64>,
    /// Maximum size of the container handed to the decoder.
    pub max_input_bytes: Option<u64>,
}

fn exceeds(what: &str, value: u64, limit: Option<u64>) -> Result<(), TextureError> {
    match limit {
        Some(max) if value > max => Err(TextureError::LimitExceeded(alloc::format!(
            "{what} {value} exceeds limit {max}"
        ))),
        _ => Ok(()),
    }
}

impl Limits {
    pub(crate) fn check_dimensions(&self, width: u32, height: u32) -> Result<(), TextureError> {
        exceeds("width", width.into(), self.max_width.map(u64::from))?;
        exceeds("height", height.into(), self.max_height.map(u64::from))?;
        exceeds("pixel count", u64::from(width) * u64::from(height), self.max_pixels)
    }

    pub(crate) fn check_input(&self, len: usize) -> Result<(), TextureError> {
        exceeds("input size", len as u64, self.max_input_bytes)
    }

    /// Dimensions plus the RGBA8 raster they decode into.
    pub(crate) fn check_raster(&self, width: u32, height: u32) -> Result<(), TextureError> {
        self.check_dimensions(width, height)?;
        let bytes = (u64::from(width) * u64::from(height)).saturating_mul(4);
        exceeds("raster size", bytes, self.max_memory_bytes)
    }
}

/// [`Limits::check_raster`] when limits are set.
pub(crate) fn check_output(
    limits: Option<&Limits>,
    width: u32,
    height: u32,
) -> Result<(), TextureError> {
    match limits {
        Some(limits) => limits.check_raster(width, height),
        None => Ok(()),
    }
}
