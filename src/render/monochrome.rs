//! # Monochrome Packing
//!
//! Converts an RGBA raster into the 1-bit row format of the TSPL `BITMAP`
//! command.
//!
//! ## Bit Packing
//!
//! Each bit represents one dot:
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = ink, 0 = no ink
//!
//! Rows are padded to whole bytes (`ceil(width / 8)`); padding bits are 0.
//!
//! ```text
//! width = 10 dots, one row all ink:
//! 11111111 11000000  →  FF C0
//! ```
//!
//! ## Threshold
//!
//! ```text
//! luminance = 0.299 R + 0.587 G + 0.114 B
//! ink       = luminance < threshold
//! ```
//!
//! Alpha is composited over white first, so transparent pixels never ink.

use image::RgbaImage;

/// A packed 1-bit bitmap, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonochromeBitmap {
    /// Bytes per row
    pub width_bytes: u32,
    /// Rows
    pub height: u32,
    /// `width_bytes * height` bytes
    pub data: Vec<u8>,
}

/// Perceived luminance of an RGBA pixel over a white background.
#[inline]
pub fn luminance(rgba: [u8; 4]) -> f64 {
    let [r, g, b, a] = rgba;
    // Integer weights keep pure white at exactly 255.0
    let lum = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) as f64 / 1000.0;
    let alpha = a as f64 / 255.0;
    lum * alpha + 255.0 * (1.0 - alpha)
}

/// Pack a row of ink flags into bytes, MSB first.
///
/// ## Example
///
/// ```
/// use etiqueta::render::monochrome::pack_row;
///
/// let row = [true, true, false, false, true, false, true, false, true];
/// assert_eq!(pack_row(&row), vec![0b11001010, 0b10000000]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            let byte_idx = i / 8;
            let bit_idx = 7 - (i % 8); // MSB first
            bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    bytes
}

impl MonochromeBitmap {
    /// Binarize `image` with a luminance `threshold`.
    pub fn from_rgba(image: &RgbaImage, threshold: u8) -> Self {
        let (width, height) = image.dimensions();
        let width_bytes = width.div_ceil(8);
        let mut data = Vec::with_capacity((width_bytes * height) as usize);
        let cut = threshold as f64;

        let mut row = Vec::with_capacity(width as usize);
        for y in 0..height {
            row.clear();
            row.extend((0..width).map(|x| luminance(image.get_pixel(x, y).0) < cut));
            data.extend(pack_row(&row));
        }

        Self {
            width_bytes,
            height,
            data,
        }
    }

    /// Width in dots covered by the packed rows (including padding).
    pub fn width_dots(&self) -> u32 {
        self.width_bytes * 8
    }

    /// Whether the dot at (`x`, `y`) is ink.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        if x >= self.width_dots() || y >= self.height {
            return false;
        }
        let byte = self.data[(y * self.width_bytes + x / 8) as usize];
        (byte >> (7 - (x % 8))) & 1 == 1
    }

    /// Uppercase hex of the packed data, for embedding in a text command.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.data)
    }
}
