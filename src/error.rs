use alloc::string::String;

/// Errors from texture decoding and encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TextureError {
    #[error("unrecognized format magic bytes")]
    UnrecognizedFormat,

    /// Structural corruption: bad magic, bad chunk length, unknown chunk
    /// kind, end-of-file mismatch, truncated payload, palette index out of range.
    #[error("malformed container at offset {offset:#x}: {reason}")]
    MalformedContainer { offset: usize, reason: String },

    /// The format identifier is recognized (or at least readable) but no codec
    /// is registered for it.
    #[error("format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("palette needs {needed} entries, format allows {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },
}

impl TextureError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        TextureError::MalformedContainer {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(offset: usize, needed: usize) -> Self {
        TextureError::MalformedContainer {
            offset,
            reason: alloc::format!("unexpected end of input, {needed} more bytes required"),
        }
    }
}
