//! # TSPL Composer
//!
//! Turns a product selection and a calibration profile into a complete TSPL
//! script. Composition is a pure in-memory transform: nothing is sent to a
//! printer until the whole script exists.
//!
//! ## Text Strategies
//!
//! | Mode | Command | Placement |
//! |------|---------|-----------|
//! | Bitmap (default) | `BITMAP` | exact: rasterized, trimmed, aligned |
//! | Vector | `TEXT` | approximate: width estimated from character count |
//!
//! Vector mode leaves glyph layout to the printer firmware, whose font
//! metrics are unknown here. Centered and right-aligned vector text can
//! therefore sit a few dots off; this is a known limitation of the mode.
//!
//! ## Example
//!
//! ```
//! use etiqueta::composer;
//! use etiqueta::printer::CalibrationProfile;
//! use etiqueta::product::{ProductSelection, SelectedProduct};
//! use etiqueta::render::SoftwareRasterizer;
//!
//! let product = SelectedProduct {
//!     name: "Gel Pen".into(),
//!     price: 20.0,
//!     discount_percent: 0.0,
//!     sku: "GP-01".into(),
//!     barcode: Some("8901030875021".into()),
//!     variants: vec![],
//! };
//! let script = composer::compose(
//!     &SoftwareRasterizer::new(),
//!     &CalibrationProfile::default(),
//!     &ProductSelection::new(product),
//!     None,
//! );
//! assert_eq!(script.keywords()[..6], ["SIZE", "GAP", "SPEED", "DENSITY", "DIRECTION", "CLS"]);
//! ```

use crate::layout::{BarcodePlacement, LabelLayout, Placement, TextElement};
use crate::printer::CalibrationProfile;
use crate::product::{LabelContent, ProductSelection};
use crate::protocol::commands::{self, BarcodeCommand};
use crate::protocol::TsplScript;
use crate::render::{MonochromeBitmap, RasterResult, Rasterizer};

/// Printer font used in vector mode (8 × 12 dot cell).
pub const VECTOR_FONT: &str = "1";
/// Cell width of [`VECTOR_FONT`] per multiplier step, in dots.
pub const VECTOR_CHAR_WIDTH: u32 = 8;
/// Cell height of [`VECTOR_FONT`] per multiplier step, in dots.
pub const VECTOR_CHAR_HEIGHT: u32 = 12;

/// Printer font multiplier approximating a CSS font size.
///
/// ```
/// use etiqueta::composer::vector_multiplier;
///
/// assert_eq!(vector_multiplier(18.0), 3);
/// assert_eq!(vector_multiplier(2.0), 1);
/// assert_eq!(vector_multiplier(1000.0), 40);
/// ```
pub fn vector_multiplier(font_px: f64) -> u32 {
    ((font_px / 6.0).round() as u32).clamp(1, 40)
}

/// How a text element will be drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum TextRender {
    /// Rasterized and trimmed to its ink.
    Bitmap(RasterResult),
    /// Printer font with an estimated footprint.
    Vector {
        multiplier: u32,
        width: u32,
        height: u32,
    },
}

impl TextRender {
    pub fn width(&self) -> u32 {
        match self {
            Self::Bitmap(raster) => raster.width(),
            Self::Vector { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Bitmap(raster) => raster.height(),
            Self::Vector { height, .. } => *height,
        }
    }
}

/// A text element with its content, rendering and position.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrangedText {
    pub element: TextElement,
    pub text: String,
    pub font_px: f64,
    pub render: TextRender,
    pub placement: Placement,
}

/// Every element of a label, positioned.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrangedLabel {
    pub layout: LabelLayout,
    /// Text elements in script order
    pub texts: Vec<ArrangedText>,
    pub barcode: Option<BarcodePlacement>,
}

impl ArrangedLabel {
    pub fn text(&self, element: TextElement) -> Option<&ArrangedText> {
        self.texts.iter().find(|t| t.element == element)
    }
}

fn font_px(profile: &CalibrationProfile, element: TextElement) -> f64 {
    match element {
        TextElement::Name => profile.name_font_px(),
        TextElement::Sku => profile.sku_font_px,
        TextElement::Price => profile.price_font_px(),
    }
}

/// Render and position every label element.
///
/// Empty strings and bitmaps without ink are left out. `profile` is
/// sanitized before use.
pub fn arrange<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    profile: &CalibrationProfile,
    content: &LabelContent,
) -> ArrangedLabel {
    let profile = profile.clone().sanitized();
    let layout = LabelLayout::new(&profile);
    let mut texts = Vec::with_capacity(3);

    for element in layout.text_order() {
        let text = match element {
            TextElement::Name => &content.name,
            TextElement::Sku => &content.sku,
            TextElement::Price => &content.price,
        };
        if text.trim().is_empty() {
            continue;
        }
        let px = font_px(&profile, element);

        let render = if profile.text_as_bitmap {
            let raster = rasterizer
                .render_text(text, px, profile.dpi, layout.text_max_width())
                .trimmed();
            if raster.width() == 0 {
                tracing::debug!(?element, "text has no ink, skipping");
                continue;
            }
            TextRender::Bitmap(raster)
        } else {
            let multiplier = vector_multiplier(px);
            TextRender::Vector {
                multiplier,
                width: text.chars().count() as u32 * VECTOR_CHAR_WIDTH * multiplier,
                height: VECTOR_CHAR_HEIGHT * multiplier,
            }
        };

        let placement = layout.place_text(element, render.width(), render.height());
        texts.push(ArrangedText {
            element,
            text: text.clone(),
            font_px: px,
            render,
            placement,
        });
    }

    let barcode = content.code.as_deref().map(|code| layout.place_barcode(code));

    ArrangedLabel {
        layout,
        texts,
        barcode,
    }
}

/// Emit the TSPL script for an arranged label.
pub fn emit(label: &ArrangedLabel, profile: &CalibrationProfile, copies: Option<u32>) -> TsplScript {
    let profile = profile.clone().sanitized();
    let mut script = TsplScript::new();

    script.push(commands::size(profile.label_width_mm, profile.label_height_mm));
    script.push(commands::gap(profile.gap_mm));
    script.push(commands::speed(profile.speed));
    script.push(commands::density(profile.density));
    script.push(commands::direction(1));
    script.push(commands::cls());

    for text in &label.texts {
        let Placement { x, y, .. } = text.placement;
        match &text.render {
            TextRender::Bitmap(raster) => {
                let bitmap = MonochromeBitmap::from_rgba(&raster.image, profile.threshold);
                script.push(commands::bitmap(x, y, &bitmap));
            }
            TextRender::Vector { multiplier, .. } => {
                script.push(commands::text(
                    x,
                    y,
                    VECTOR_FONT,
                    0,
                    *multiplier,
                    *multiplier,
                    &text.text,
                ));
            }
        }
    }

    if let Some(barcode) = &label.barcode {
        script.push(commands::barcode(&BarcodeCommand {
            x: barcode.x,
            y: barcode.y,
            symbology: barcode.symbology,
            height: barcode.height,
            show_text: profile.show_barcode_text,
            rotation: 0,
            narrow: barcode.narrow,
            wide: barcode.wide,
            code: &barcode.code,
        }));
    }

    script.push(commands::print(copies.unwrap_or(profile.copies)));
    if profile.feed_after_print {
        script.push(commands::feed(1));
    }

    script
}

/// Compose the full TSPL script for the selected product.
///
/// `copies` overrides the profile's default copy count.
pub fn compose<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    profile: &CalibrationProfile,
    selection: &ProductSelection,
    copies: Option<u32>,
) -> TsplScript {
    let profile = profile.clone().sanitized();
    let content = LabelContent::new(selection, &profile);
    let label = arrange(rasterizer, &profile, &content);
    let script = emit(&label, &profile, copies);
    tracing::debug!(
        lines = script.len(),
        bitmap = profile.text_as_bitmap,
        barcode = label.barcode.is_some(),
        "composed label script"
    );
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::HeaderLayout;
    use crate::product::SelectedProduct;
    use crate::protocol::Symbology;
    use crate::render::SoftwareRasterizer;

    fn selection(barcode: Option<&str>) -> ProductSelection {
        ProductSelection::new(SelectedProduct {
            name: "Spiral Notebook".to_string(),
            price: 120.0,
            discount_percent: 0.0,
            sku: "NB-A5".to_string(),
            barcode: barcode.map(str::to_string),
            variants: Vec::new(),
        })
    }

    fn keywords(script: &TsplScript) -> Vec<String> {
        script.keywords().into_iter().map(str::to_string).collect()
    }

    #[test]
    fn test_row_bitmap_order() {
        let script = compose(
            &SoftwareRasterizer::new(),
            &CalibrationProfile::default(),
            &selection(Some("8901030875021")),
            None,
        );
        assert_eq!(
            keywords(&script),
            vec![
                "SIZE", "GAP", "SPEED", "DENSITY", "DIRECTION", "CLS", "BITMAP", "BITMAP", "BITMAP",
                "BARCODE", "PRINT"
            ]
        );
        assert_eq!(script.lines()[0], "SIZE 50 mm,25 mm");
        assert_eq!(script.lines()[1], "GAP 2 mm,0");
        assert!(script.lines()[9].starts_with("BARCODE 57,104,\"EAN13\",64,1,0,2,4,"));
        assert_eq!(script.lines()[10], "PRINT 1");
    }

    #[test]
    fn test_vector_mode_uses_text() {
        let profile = CalibrationProfile {
            text_as_bitmap: false,
            header_layout: HeaderLayout::Column,
            feed_after_print: true,
            ..Default::default()
        };
        let script = compose(&SoftwareRasterizer::new(), &profile, &selection(Some("SKU-ABC123")), Some(3));
        let lines = script.lines();
        // Name: 18px → multiplier 3, left aligned at the margin
        assert_eq!(lines[6], r#"TEXT 16,40,"1",0,3,3,"Spiral Notebook""#);
        // SKU: 14px → multiplier 2, centered from the estimate 5 * 8 * 2 = 80
        assert_eq!(lines[7], format!(r#"TEXT {},64,"1",0,2,2,"NB-A5""#, 16 + (368 - 80) / 2));
        assert!(lines[8].starts_with("TEXT "));
        assert!(lines[8].ends_with(r#","Rs.120.00""#));
        assert!(lines[9].starts_with(r#"BARCODE "#));
        assert!(lines[9].contains(r#""128""#));
        assert_eq!(lines[10], "PRINT 3");
        assert_eq!(lines[11], "FEED 1");
    }

    #[test]
    fn test_no_code_no_barcode() {
        let sel = ProductSelection::new(SelectedProduct {
            sku: String::new(),
            ..selection(None).product().clone()
        });
        let script = compose(&SoftwareRasterizer::new(), &CalibrationProfile::default(), &sel, None);
        assert!(!keywords(&script).contains(&"BARCODE".to_string()));
        // Name and price still print
        assert_eq!(keywords(&script).iter().filter(|k| *k == "BITMAP").count(), 2);
    }

    #[test]
    fn test_bitmap_dimensions_match_placement() {
        let profile = CalibrationProfile::default();
        let content = LabelContent::new(&selection(Some("X1")), &profile);
        let label = arrange(&SoftwareRasterizer::new(), &profile, &content);
        let script = emit(&label, &profile, None);

        for (text, line) in label.texts.iter().zip(&script.lines()[6..9]) {
            let fields: Vec<&str> = line["BITMAP ".len()..].splitn(6, ',').collect();
            assert_eq!(fields[0].parse::<u32>().unwrap(), text.placement.x);
            assert_eq!(fields[1].parse::<u32>().unwrap(), text.placement.y);
            assert_eq!(fields[2].parse::<u32>().unwrap(), text.placement.width.div_ceil(8));
            assert_eq!(fields[3].parse::<u32>().unwrap(), text.placement.height);
            assert_eq!(fields[5].len() as u32, text.placement.width.div_ceil(8) * text.placement.height * 2);
        }
    }

    #[test]
    fn test_row_text_fits_its_share() {
        let profile = CalibrationProfile::default();
        let mut product = selection(None).product().clone();
        product.name = "Extra Long Premium Hardbound Notebook".to_string();
        product.sku = "SKU-WITH-A-VERY-LONG-CODE".to_string();
        let content = LabelContent::new(&ProductSelection::new(product), &profile);
        let label = arrange(&SoftwareRasterizer::new(), &profile, &content);
        for text in &label.texts {
            assert!(text.placement.width <= label.layout.text_max_width());
        }
    }

    #[test]
    fn test_quotes_in_vector_text() {
        let profile = CalibrationProfile {
            text_as_bitmap: false,
            ..Default::default()
        };
        let mut product = selection(Some("X1")).product().clone();
        product.name = r#"12" Ruler"#.to_string();
        let script = compose(&SoftwareRasterizer::new(), &profile, &ProductSelection::new(product), None);
        assert!(script.lines()[6].ends_with(r#""12' Ruler""#));
    }

    #[test]
    fn test_symbology_follows_code() {
        let profile = CalibrationProfile::default();
        let rasterizer = SoftwareRasterizer::new();
        for (code, symbology) in [("8901030875021", Symbology::Ean13), ("SKU-ABC123", Symbology::Code128)] {
            let content = LabelContent::new(&selection(Some(code)), &profile);
            let label = arrange(&rasterizer, &profile, &content);
            assert_eq!(label.barcode.unwrap().symbology, symbology);
        }
    }

    #[test]
    fn test_out_of_range_profile_is_sanitized() {
        let rasterizer = SoftwareRasterizer::new();
        let sel = selection(Some("8901030875021"));
        let broken = CalibrationProfile {
            dpi: 0,
            label_width_mm: -10.0,
            speed: 20,
            ..Default::default()
        };
        let script = compose(&rasterizer, &broken, &sel, None);
        assert_eq!(script.lines()[0], "SIZE 50 mm,25 mm");
        assert_eq!(script.lines()[2], "SPEED 4");
        assert_eq!(
            script,
            compose(&rasterizer, &CalibrationProfile::default(), &sel, None)
        );
    }
}
