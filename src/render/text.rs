//! Text rasterization.
//!
//! Draws a single line of text into an RGBA canvas, either from a TrueType
//! font loaded at runtime (anti-aliased, via ab_glyph) or from the built-in
//! Spleen 12x24 bitmap font (nearest-neighbour scaled).
//!
//! Text never wraps. When a line is wider than the canvas the glyphs are
//! squeezed horizontally until it fits.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use spleen_font::{FONT_12X24, PSF2Font};
use std::path::Path;

use crate::error::EtiquetaError;

/// Spleen cell size (width, height) in font units.
const SPLEEN_CELL: (usize, usize) = (12, 24);

/// Where glyph shapes come from.
#[derive(Clone, Default)]
pub enum GlyphSource {
    /// Built-in Spleen 12x24 bitmap font.
    #[default]
    Builtin,
    /// A TrueType/OpenType font.
    Truetype(FontArc),
}

impl std::fmt::Debug for GlyphSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => write!(f, "GlyphSource::Builtin"),
            Self::Truetype(_) => write!(f, "GlyphSource::Truetype(..)"),
        }
    }
}

impl GlyphSource {
    /// Parse a TrueType font from memory.
    pub fn from_ttf_bytes(bytes: Vec<u8>) -> Result<Self, EtiquetaError> {
        FontArc::try_from_vec(bytes)
            .map(Self::Truetype)
            .map_err(|e| EtiquetaError::Render(format!("Invalid font: {}", e)))
    }

    /// Load a TrueType font file.
    pub fn from_ttf_file(path: &Path) -> Result<Self, EtiquetaError> {
        let bytes = std::fs::read(path)?;
        Self::from_ttf_bytes(bytes)
    }

    /// Unsqueezed advance width of `text` at `font_h` pixels.
    pub fn measure(&self, text: &str, font_h: f32) -> f32 {
        match self {
            Self::Builtin => {
                let scale = font_h / SPLEEN_CELL.1 as f32;
                text.chars().count() as f32 * SPLEEN_CELL.0 as f32 * scale
            }
            Self::Truetype(font) => {
                let scaled = font.as_scaled(PxScale::from(font_h));
                text.chars().map(|ch| scaled.h_advance(font.glyph_id(ch))).sum()
            }
        }
    }

    /// Draw `text` with its line box at (`left`, `top`), `font_h` pixels tall,
    /// horizontally scaled by `squeeze`.
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, left: f32, top: f32, font_h: f32, squeeze: f32) {
        match self {
            Self::Builtin => draw_spleen(canvas, text, left, top, font_h, squeeze),
            Self::Truetype(font) => draw_ttf(canvas, font, text, left, top, font_h, squeeze),
        }
    }
}

/// Darken a pixel by `coverage` (0.0 = untouched, 1.0 = black).
fn ink(canvas: &mut RgbaImage, x: i64, y: i64, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let level = (255.0 * (1.0 - coverage.clamp(0.0, 1.0))).round() as u8;
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    let value = pixel.0[0].min(level);
    *pixel = Rgba([value, value, value, 255]);
}

fn draw_ttf(canvas: &mut RgbaImage, font: &FontArc, text: &str, left: f32, top: f32, font_h: f32, squeeze: f32) {
    let scale = PxScale {
        x: font_h * squeeze,
        y: font_h,
    };
    let scaled = font.as_scaled(scale);
    let baseline_y = top + scaled.ascent();

    let mut caret_x = left;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(scale, point(caret_x, baseline_y));
        caret_x += scaled.h_advance(glyph_id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i64 + bounds.min.x as i64;
                let y = py as i64 + bounds.min.y as i64;
                ink(canvas, x, y, coverage);
            });
        }
    }
}

/// Rows of a Spleen glyph, or a hollow box for characters the font lacks.
fn spleen_glyph(font: &mut PSF2Font, ch: char) -> Vec<Vec<bool>> {
    let (w, h) = SPLEEN_CELL;
    let mut buf = [0u8; 4];
    if let Some(glyph) = font.glyph_for_utf8(ch.encode_utf8(&mut buf).as_bytes()) {
        let mut rows: Vec<Vec<bool>> = glyph.map(|row| row.collect()).collect();
        rows.resize(h, vec![false; w]);
        return rows;
    }

    // Fallback: draw a box for unknown chars
    (0..h)
        .map(|y| {
            (0..w)
                .map(|x| {
                    let edge_row = (y == 2 || y == h - 3) && (1..w - 1).contains(&x);
                    let edge_col = (x == 1 || x == w - 2) && (2..h - 2).contains(&y);
                    edge_row || edge_col
                })
                .collect()
        })
        .collect()
}

fn draw_spleen(canvas: &mut RgbaImage, text: &str, left: f32, top: f32, font_h: f32, squeeze: f32) {
    let mut font = PSF2Font::new(FONT_12X24).expect("embedded Spleen font is valid");
    let scale_y = font_h / SPLEEN_CELL.1 as f32;
    let scale_x = scale_y * squeeze;
    let advance = SPLEEN_CELL.0 as f32 * scale_x;
    if scale_x <= 0.0 || scale_y <= 0.0 {
        return;
    }

    for (i, ch) in text.chars().enumerate() {
        if ch == ' ' {
            continue;
        }
        let rows = spleen_glyph(&mut font, ch);
        let cell_x = left + i as f32 * advance;

        let x_start = cell_x.floor() as i64;
        let x_end = (cell_x + advance).ceil() as i64;
        let y_start = top.floor() as i64;
        let y_end = (top + font_h).ceil() as i64;

        for y in y_start..y_end {
            let sy = ((y as f32 + 0.5 - top) / scale_y).floor();
            if sy < 0.0 || sy >= SPLEEN_CELL.1 as f32 {
                continue;
            }
            let row = &rows[sy as usize];
            for x in x_start..x_end {
                let sx = ((x as f32 + 0.5 - cell_x) / scale_x).floor();
                if sx < 0.0 || sx >= SPLEEN_CELL.0 as f32 {
                    continue;
                }
                if row.get(sx as usize).copied().unwrap_or(false) {
                    ink(canvas, x, y, 1.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    fn ink_columns(canvas: &RgbaImage) -> Vec<u32> {
        (0..canvas.width())
            .filter(|&x| (0..canvas.height()).any(|y| canvas.get_pixel(x, y).0[0] < 128))
            .collect()
    }

    #[test]
    fn test_builtin_measure_scales_with_height() {
        let source = GlyphSource::Builtin;
        assert_eq!(source.measure("ABCD", 24.0), 48.0);
        assert_eq!(source.measure("ABCD", 48.0), 96.0);
        assert_eq!(source.measure("", 48.0), 0.0);
    }

    #[test]
    fn test_builtin_draws_ink() {
        let mut canvas = blank(100, 30);
        GlyphSource::Builtin.draw(&mut canvas, "HI", 10.0, 3.0, 24.0, 1.0);
        let cols = ink_columns(&canvas);
        assert!(!cols.is_empty());
        assert!(*cols.first().unwrap() >= 10);
        assert!(*cols.last().unwrap() < 10 + 24);
    }

    #[test]
    fn test_squeeze_narrows_output() {
        let mut wide = blank(200, 30);
        let mut narrow = blank(200, 30);
        GlyphSource::Builtin.draw(&mut wide, "WWWW", 0.0, 0.0, 24.0, 1.0);
        GlyphSource::Builtin.draw(&mut narrow, "WWWW", 0.0, 0.0, 24.0, 0.5);
        let wide_max = *ink_columns(&wide).last().unwrap();
        let narrow_max = *ink_columns(&narrow).last().unwrap();
        assert!(narrow_max < wide_max);
        assert!(narrow_max < 24);
    }

    #[test]
    fn test_drawing_is_clipped() {
        let mut canvas = blank(10, 10);
        GlyphSource::Builtin.draw(&mut canvas, "MMMM", -20.0, -5.0, 48.0, 1.0);
        assert_eq!(canvas.dimensions(), (10, 10));
    }

    #[test]
    fn test_invalid_ttf_rejected() {
        let err = GlyphSource::from_ttf_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, EtiquetaError::Render(_)));
    }
}
