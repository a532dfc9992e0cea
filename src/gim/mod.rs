//! GIM texture container (PlayStation Portable).
//!
//! A 16-byte preamble (`MIG.00.1PSP\0` and four zero bytes) followed by a tree
//! of little-endian chunks: root → picture → image, palette, plus an optional
//! file-info chunk carrying four strings.
//!
//! Image payloads are stored with rows padded to 16 bytes (at least 16 pixels)
//! and height padded to 8, optionally in the PSP 16-byte × 8-row block order.

mod decode;
mod encode;
pub mod format;

pub use decode::{GimMetadata, GimTexture};
pub use format::GimPixelFormat;

pub(crate) use decode::parse;
pub(crate) use encode::{GimOptions, encode};

pub(crate) const MAGIC: [u8; 12] = *b"MIG.00.1PSP\0";
pub(crate) const PREAMBLE_LEN: usize = 16;
/// Offset of pixel or palette data inside an image/palette chunk.
pub(crate) const PAYLOAD_OFFSET: usize = 0x50;
