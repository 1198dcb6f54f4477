//! # Rendering
//!
//! Turns label elements into pixels and pixels into printer bitmaps.
//!
//! ## Submodules
//!
//! - [`raster`]: [`Rasterizer`] trait and the software implementation
//! - [`text`]: Glyph sources (TrueType or built-in Spleen bitmap font)
//! - [`barcode`]: EAN-13 / Code 128 module encoding for previews
//! - [`monochrome`]: Luminance thresholding and MSB-first bit packing

pub mod barcode;
pub mod monochrome;
pub mod raster;
pub mod text;

pub use monochrome::MonochromeBitmap;
pub use raster::{RasterResult, Rasterizer, SoftwareRasterizer};
pub use text::GlyphSource;
