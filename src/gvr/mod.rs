//! GVR texture container (GameCube / Wii).
//!
//! An optional `GBIX`/`GCIX` global index block, then the `GVRT` header:
//!
//! ```text
//! 0x00  "GVRT"
//! 0x04  u32 LE  length of everything after this field
//! 0x08  u16     reserved
//! 0x0A  u8      palette pixel format << 4 | flags
//! 0x0B  u8      data format
//! 0x0C  u16 BE  width
//! 0x0E  u16 BE  height
//! 0x10  internal palette (flag 0x08), then tiled pixel data
//! ```
//!
//! Indexed textures without an internal palette reference a separate GVPL
//! file; see [`palette::ExternalPalette`].

mod decode;
mod encode;
pub mod format;
pub mod palette;

pub use decode::{GlobalIndex, GlobalIndexKind, GvrTexture};
pub use format::{GvrDataFormat, GvrPixelFormat};
pub use palette::ExternalPalette;

pub(crate) use decode::parse;
pub(crate) use encode::{GvrOptions, encode};

pub(crate) const GBIX: [u8; 4] = *b"GBIX";
pub(crate) const GCIX: [u8; 4] = *b"GCIX";
pub(crate) const GVRT: [u8; 4] = *b"GVRT";

pub(crate) const FLAG_MIPMAPS: u8 = 0x01;
pub(crate) const FLAG_EXTERNAL_PALETTE: u8 = 0x02;
pub(crate) const FLAG_INTERNAL_PALETTE: u8 = 0x08;
