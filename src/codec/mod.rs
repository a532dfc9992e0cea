//! Pixel, palette and data codecs shared by the container formats.
//!
//! - [`ColorCodec`]: one packed direct-color sample ↔ RGBA8.
//! - [`Palette`] / [`IndexCodec`]: palette store and indexed lookup.
//! - [`DataCodec`]: a whole surface, composing the above with padding and
//!   an optional [`Swizzle`](crate::Swizzle).

mod color;
mod data;
mod palette;

pub use color::ColorCodec;
pub use data::{DataCodec, NibbleOrder, SampleLayout, Samples};
pub use palette::{IndexCodec, Palette};
