//! # Rasterizer
//!
//! Renders label text and barcode symbols into pixel buffers sized in device
//! dots. The [`Rasterizer`] trait keeps the composer and the preview
//! independent of how pixels are produced.
//!
//! ## Text Canvas
//!
//! ```text
//! font_h = round(font_px * dpi / 96)
//! height = max(round(1.6 * font_h), font_h + 4)
//!
//! ┌──────────── max_width_dots ────────────┐
//! │                                        │
//! │            Spiral Notebook             │  ← centered, squeezed if wider
//! │                                        │
//! └────────────────────────────────────────┘
//! ```

use image::imageops;
use image::{Rgba, RgbaImage};
use std::path::Path;

use super::barcode;
use super::text::GlyphSource;
use crate::error::EtiquetaError;
use crate::protocol::Symbology;
use crate::units::{dots_to_css_px, font_px_to_dots};

/// A rendered element: pixels in dots plus the CSS size to display them at.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterResult {
    pub image: RgbaImage,
    /// Resolution the image was rendered for
    pub dpi: u32,
}

impl RasterResult {
    pub fn new(image: RgbaImage, dpi: u32) -> Self {
        Self { image, dpi }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Display width in CSS pixels.
    pub fn css_width(&self) -> f64 {
        dots_to_css_px(self.width() as f64, self.dpi)
    }

    /// Display height in CSS pixels.
    pub fn css_height(&self) -> f64 {
        dots_to_css_px(self.height() as f64, self.dpi)
    }

    /// Crop blank columns on both sides, keeping the full height.
    ///
    /// A raster with no ink trims to zero width.
    pub fn trimmed(&self) -> Self {
        let (w, h) = self.image.dimensions();
        let has_ink = |x: u32| (0..h).any(|y| is_marked(self.image.get_pixel(x, y)));

        let Some(left) = (0..w).find(|&x| has_ink(x)) else {
            return Self::new(RgbaImage::new(0, h), self.dpi);
        };
        let right = (0..w).rev().find(|&x| has_ink(x)).unwrap_or(left);
        let cropped = imageops::crop_imm(&self.image, left, 0, right - left + 1, h).to_image();
        Self::new(cropped, self.dpi)
    }
}

/// Any pixel that is not opaque-white-equivalent.
fn is_marked(pixel: &Rgba<u8>) -> bool {
    let [r, g, b, a] = pixel.0;
    a > 0 && (r < 255 || g < 255 || b < 255)
}

/// Produces label element rasters.
pub trait Rasterizer: Send + Sync {
    /// Render one line of centered black text on white.
    ///
    /// The result is exactly `max_width_dots` wide; wider text is squeezed.
    fn render_text(&self, text: &str, font_px: f64, dpi: u32, max_width_dots: u32) -> RasterResult;

    /// Render a barcode symbol stretched to `total_width_dots` × `height_dots`.
    ///
    /// When `total_width_dots` is 0 the natural width (modules × module
    /// width) is used.
    fn render_barcode(
        &self,
        code: &str,
        symbology: Symbology,
        module_width_dots: f64,
        height_dots: u32,
        total_width_dots: u32,
        dpi: u32,
    ) -> Result<RasterResult, EtiquetaError>;
}

/// CPU rasterizer backed by a [`GlyphSource`] and barcoders.
#[derive(Debug, Clone, Default)]
pub struct SoftwareRasterizer {
    glyphs: GlyphSource,
}

impl SoftwareRasterizer {
    /// Rasterizer using the built-in bitmap font.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_glyphs(glyphs: GlyphSource) -> Self {
        Self { glyphs }
    }

    /// Rasterizer using a TrueType font file.
    pub fn with_font_file(path: &Path) -> Result<Self, EtiquetaError> {
        Ok(Self::with_glyphs(GlyphSource::from_ttf_file(path)?))
    }

    pub fn glyphs(&self) -> &GlyphSource {
        &self.glyphs
    }
}

/// Text line height in dots for a CSS font size.
pub fn text_height_dots(font_px: f64, dpi: u32) -> u32 {
    (font_px_to_dots(font_px, dpi).round() as u32).max(1)
}

/// Canvas height in dots for a text line `font_h` dots tall.
pub fn text_canvas_height(font_h: u32) -> u32 {
    ((font_h as f64 * 1.6).round() as u32).max(font_h + 4)
}

impl Rasterizer for SoftwareRasterizer {
    fn render_text(&self, text: &str, font_px: f64, dpi: u32, max_width_dots: u32) -> RasterResult {
        let font_h = text_height_dots(font_px, dpi);
        let width = max_width_dots;
        let height = text_canvas_height(font_h);
        if width == 0 {
            return RasterResult::new(RgbaImage::new(0, height), dpi);
        }
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        let measured = self.glyphs.measure(text, font_h as f32);
        if measured > 0.0 {
            let squeeze = if measured > width as f32 {
                width as f32 / measured
            } else {
                1.0
            };
            let drawn = measured * squeeze;
            let left = (width as f32 - drawn) / 2.0;
            let top = (height - font_h) as f32 / 2.0;
            self.glyphs.draw(&mut canvas, text, left, top, font_h as f32, squeeze);
        }

        RasterResult::new(canvas, dpi)
    }

    fn render_barcode(
        &self,
        code: &str,
        symbology: Symbology,
        module_width_dots: f64,
        height_dots: u32,
        total_width_dots: u32,
        dpi: u32,
    ) -> Result<RasterResult, EtiquetaError> {
        let modules = barcode::encode(code, symbology)?;
        let width = if total_width_dots > 0 {
            total_width_dots
        } else {
            (modules.len() as f64 * module_width_dots.max(1.0)).round() as u32
        };
        Ok(RasterResult::new(
            barcode::draw_modules(&modules, width, height_dots),
            dpi,
        ))
    }
}
