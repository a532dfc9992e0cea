//! # zentex
//!
//! GIM (PlayStation Portable) and GVR (GameCube / Wii) texture decoder and encoder.
//!
//! Both containers are converted to and from a canonical RGBA8 raster
//! ([`RgbaImage`]). Decoding parses and validates the container up front;
//! pixels are decoded on first access and cached on the texture.
//!
//! ## Supported Formats
//!
//! ### GIM (`gim` feature)
//! - RGB565, RGBA5551, RGBA4444, RGBA8888
//! - 4-bit and 8-bit indexed with any of the four direct formats as palette
//! - Linear or PSP-swizzled (16-byte × 8-row blocks)
//! - Index16/Index32 and DXT1/3/5 are recognized but not decoded
//!
//! ### GVR (`gvr` feature)
//! - I4, I8, IA4, IA8, RGB565, RGB5A3, ARGB8888 in GameCube tile order
//! - 4-bit and 8-bit indexed with IA8, RGB565 or RGB5A3 palettes, stored
//!   inline or in a separate GVPL file
//! - `GBIX` / `GCIX` global index blocks
//! - DXT1 is recognized but not decoded
//!
//! Encoding into an indexed format builds the palette from the image: an exact
//! palette in first-seen order when the colors fit, otherwise a deterministic
//! median-cut quantization (see [`PaletteMode`]).
//!
//! ## Non-Goals
//!
//! - PNG or other interchange formats (bring your own)
//! - Archive formats that embed textures
//! - Mipmap levels beyond the first
//!
//! ## Usage
//!
//! ```no_run
//! use zentex::{DecodeRequest, EncodeRequest, TextureInfo};
//! use zentex::gvr::{GvrDataFormat, GvrPixelFormat};
//!
//! let data: &[u8] = &[]; // your GIM/GVR bytes
//!
//! // Probe without decoding
//! let info = TextureInfo::from_bytes(data)?;
//! println!("{}x{} {:?}", info.width, info.height, info.format);
//!
//! // Decode
//! let texture = DecodeRequest::new(data).decode()?;
//! let image = texture.pixels()?;
//!
//! // Re-encode as an 8-bit indexed GVR
//! let out = EncodeRequest::gvr(GvrPixelFormat::Rgb5a3, GvrDataFormat::Index8)
//!     .encode(image)?;
//! # let _ = out;
//! # Ok::<(), zentex::TextureError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(not(any(feature = "gim", feature = "gvr")))]
compile_error!("enable at least one of the `gim` or `gvr` features");

extern crate alloc;

mod chunk;
pub mod codec;
mod decode;
mod encode;
mod error;
mod info;
mod limits;
mod pixel;
pub mod quantize;
mod swizzle;

#[cfg(feature = "gim")]
pub mod gim;

#[cfg(feature = "gvr")]
pub mod gvr;

// Re-exports
pub use decode::{DecodeRequest, Texture};
pub use encode::{EncodeOutput, EncodeRequest};
pub use error::TextureError;
pub use info::{TextureFormat, TextureInfo, is_gim, is_gvr, probe};
pub use limits::Limits;
pub use pixel::{ImageBuffer, RgbaImage};
pub use quantize::{IndexedImage, PaletteMode, build_palette};
pub use swizzle::Swizzle;
