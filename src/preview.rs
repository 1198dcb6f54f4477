//! # Label Preview
//!
//! On-screen preview of a label in CSS pixels, and a composited PNG of the
//! whole label in device dots.
//!
//! Positions come from the same [`LabelLayout`] calls the composer uses, then
//! cross into CSS units through [`dots_to_css_px`]:
//!
//! ```text
//! dots (layout) ──► composer ──► TSPL placement commands
//!        │
//!        └────────► css_px = dots * 96 / dpi ──► preview rectangles
//! ```
//!
//! ## Example
//!
//! ```
//! use etiqueta::layout::{LabelLayout, TextElement};
//! use etiqueta::preview::{self, ElementSize};
//! use etiqueta::printer::CalibrationProfile;
//!
//! let layout = LabelLayout::new(&CalibrationProfile::default());
//! let sizes = [ElementSize { element: TextElement::Name, width: 96, height: 30 }];
//! let positions = preview::positions(&layout, &sizes, Some("8901030875021"));
//!
//! let name = positions.name.unwrap();
//! assert!((name.x - 16.0 * 96.0 / 203.0).abs() < 1e-9);
//! assert!(positions.barcode.is_some());
//! ```

use image::{Rgba, RgbaImage};
use serde::Serialize;
use std::io::Cursor;

use crate::composer::{self, ArrangedLabel, TextRender};
use crate::error::EtiquetaError;
use crate::layout::{LabelLayout, Placement, TextElement};
use crate::printer::CalibrationProfile;
use crate::product::{LabelContent, ProductSelection};
use crate::render::{RasterResult, Rasterizer};
use crate::units::dots_to_css_px;

/// Font size of the human-readable digits under a previewed barcode.
const HRI_FONT_PX: f64 = 10.0;

/// A rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CssRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CssRect {
    pub fn from_placement(placement: &Placement, dpi: u32) -> Self {
        Self {
            x: dots_to_css_px(placement.x as f64, dpi),
            y: dots_to_css_px(placement.y as f64, dpi),
            width: dots_to_css_px(placement.width as f64, dpi),
            height: dots_to_css_px(placement.height as f64, dpi),
        }
    }
}

/// Measured size of one text element, in dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSize {
    pub element: TextElement,
    pub width: u32,
    pub height: u32,
}

/// Where each element sits on the previewed label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewPositions {
    pub label_width: f64,
    pub label_height: f64,
    pub name: Option<CssRect>,
    pub sku: Option<CssRect>,
    pub price: Option<CssRect>,
    pub barcode: Option<CssRect>,
}

/// Compute CSS positions for measured elements.
///
/// Pure: identical inputs always give identical outputs.
pub fn positions(layout: &LabelLayout, sizes: &[ElementSize], code: Option<&str>) -> PreviewPositions {
    let dpi = layout.dpi;
    let rect = |element: TextElement| {
        sizes.iter().find(|s| s.element == element).map(|s| {
            CssRect::from_placement(&layout.place_text(element, s.width, s.height), dpi)
        })
    };

    PreviewPositions {
        label_width: dots_to_css_px(layout.label_width as f64, dpi),
        label_height: dots_to_css_px(layout.label_height as f64, dpi),
        name: rect(TextElement::Name),
        sku: rect(TextElement::Sku),
        price: rect(TextElement::Price),
        barcode: code.map(|code| CssRect::from_placement(&layout.place_barcode(code).placement(), dpi)),
    }
}

/// Positions of an already arranged label.
pub fn label_positions(label: &ArrangedLabel) -> PreviewPositions {
    let sizes: Vec<ElementSize> = label
        .texts
        .iter()
        .map(|t| ElementSize {
            element: t.element,
            width: t.placement.width,
            height: t.placement.height,
        })
        .collect();
    positions(
        &label.layout,
        &sizes,
        label.barcode.as_ref().map(|b| b.code.as_str()),
    )
}

/// A rendered label preview.
#[derive(Debug, Clone)]
pub struct LabelPreview {
    /// Whole label in device dots
    pub image: RgbaImage,
    pub dpi: u32,
    pub content: LabelContent,
    pub positions: PreviewPositions,
    /// Whether the barcode could be drawn
    pub barcode_rendered: bool,
}

impl LabelPreview {
    /// Encode the label image as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, EtiquetaError> {
        let mut png_bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
            .map_err(|e| EtiquetaError::Image(format!("PNG encoding failed: {}", e)))?;
        Ok(png_bytes)
    }
}

/// Darken `canvas` with `top` at (`x`, `y`), so white never erases ink.
fn stamp(canvas: &mut RgbaImage, top: &RgbaImage, x: u32, y: u32) {
    let (cw, ch) = canvas.dimensions();
    for (tx, ty, pixel) in top.enumerate_pixels() {
        let (cx, cy) = (x + tx, y + ty);
        if cx >= cw || cy >= ch || pixel.0[3] == 0 {
            continue;
        }
        let under = canvas.get_pixel_mut(cx, cy);
        for c in 0..3 {
            under.0[c] = under.0[c].min(pixel.0[c]);
        }
    }
}

/// Rasterize and composite every element of the selected product's label.
///
/// Barcode encoding failures are logged and the barcode is left out; text
/// still renders.
pub fn render_preview<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    profile: &CalibrationProfile,
    selection: &ProductSelection,
) -> LabelPreview {
    let profile = profile.clone().sanitized();
    let content = LabelContent::new(selection, &profile);
    let label = composer::arrange(rasterizer, &profile, &content);
    let layout = &label.layout;
    let mut image = RgbaImage::from_pixel(
        layout.label_width,
        layout.label_height,
        Rgba([255, 255, 255, 255]),
    );

    for text in &label.texts {
        let raster = match &text.render {
            TextRender::Bitmap(raster) => raster.clone(),
            // The printer draws vector text; approximate it inside its estimated box
            TextRender::Vector { width, .. } => rasterizer
                .render_text(&text.text, text.font_px, profile.dpi, *width)
                .trimmed(),
        };
        stamp(&mut image, &raster.image, text.placement.x, text.placement.y);
    }

    let mut barcode_rendered = false;
    if let Some(barcode) = &label.barcode {
        match rasterizer.render_barcode(
            &barcode.code,
            barcode.symbology,
            layout.module_width,
            barcode.height,
            0,
            profile.dpi,
        ) {
            Ok(bars) => {
                stamp(&mut image, &bars.image, barcode.x, barcode.y);
                if profile.show_barcode_text {
                    let digits: RasterResult = rasterizer
                        .render_text(&barcode.code, HRI_FONT_PX, profile.dpi, bars.width())
                        .trimmed();
                    let hri_x = barcode.x + bars.width().saturating_sub(digits.width()) / 2;
                    stamp(&mut image, &digits.image, hri_x, barcode.y + barcode.height);
                }
                barcode_rendered = true;
            }
            Err(e) => {
                tracing::warn!(code = %barcode.code, symbology = %barcode.symbology, error = %e, "barcode omitted from preview");
            }
        }
    }

    LabelPreview {
        image,
        dpi: profile.dpi,
        positions: label_positions(&label),
        content,
        barcode_rendered,
    }
}
