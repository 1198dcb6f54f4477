//! # Label Layout
//!
//! Anchor math for the four label elements, in device dots. The composer and
//! the preview both place elements through [`LabelLayout`], so the on-screen
//! preview and the printed label cannot drift apart.
//!
//! ## Row Layout
//!
//! ```text
//! ├2mm┼──────────────── printable ────────────────┼2mm┤
//! ┌──────────────────────────────────────────────────┐
//! │                                                  │ ← 5mm: header
//! │   Notebook A5        NB-A5-RED        Rs.108.00  │
//! │                                                  │
//! │              ║█║║█║█║║║█║█║║█║█║║                │ ← 13mm: barcode
//! │              ║█║║█║█║║║█║█║║█║█║║                │
//! │               8901030875021                      │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │   Notebook A5                                    │ ← 5mm
//! │                    NB-A5-RED                     │ ← 8mm
//! │                    Rs.108.00                     │ ← 11mm
//! │              ║█║║█║█║║║█║█║║█║█║║                │ ← 15mm: barcode
//! └──────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::printer::{CalibrationProfile, HeaderLayout};
use crate::protocol::Symbology;
use crate::units::{mm_to_dots, mm_to_dots_u32};

/// Blank margin on each side of the printable area.
pub const SIDE_MARGIN_MM: f64 = 2.0;
/// Distance from the label top to the header line.
pub const HEADER_TOP_MM: f64 = 5.0;
/// Column layout: SKU below the name.
pub const COLUMN_SKU_STEP_MM: f64 = 3.0;
/// Column layout: price below the name.
pub const COLUMN_PRICE_STEP_MM: f64 = 6.0;
pub const BARCODE_TOP_ROW_MM: f64 = 13.0;
pub const BARCODE_TOP_COLUMN_MM: f64 = 15.0;
/// Barcodes never start closer than this to the left edge.
pub const MIN_BARCODE_X: i32 = 4;

/// The three text elements of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextElement {
    Name,
    Sku,
    Price,
}

/// Horizontal alignment inside the printable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Top-left corner and size of a placed element, in dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Where and how the printer draws the barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodePlacement {
    pub x: u32,
    pub y: u32,
    pub height: u32,
    /// Layout estimate of the symbol width; the real width depends on the
    /// symbology's encoding and is only known to the printer.
    pub estimated_width: u32,
    pub narrow: u32,
    pub wide: u32,
    pub symbology: Symbology,
    pub code: String,
}

impl BarcodePlacement {
    pub fn placement(&self) -> Placement {
        Placement {
            x: self.x,
            y: self.y,
            width: self.estimated_width,
            height: self.height,
        }
    }
}

/// Estimated barcode width in dots: `max(60, len * 11) * module`.
pub fn estimate_barcode_width(code: &str, module_width: f64) -> u32 {
    let modules = (code.chars().count() as f64 * 11.0).max(60.0);
    (modules * module_width).round() as u32
}

/// Dot geometry derived from a calibration profile.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub dpi: u32,
    pub header_layout: HeaderLayout,
    pub label_width: u32,
    pub label_height: u32,
    /// Left edge of the printable area
    pub margin: i32,
    pub printable_width: u32,
    /// Header anchor, global vertical offset included
    pub header_y: i32,
    /// Global horizontal offset for text
    pub offset_x: i32,
    pub barcode_top: i32,
    pub barcode_offset_x: i32,
    pub barcode_height: u32,
    pub module_width: f64,
}

impl LabelLayout {
    pub fn new(profile: &CalibrationProfile) -> Self {
        let dpi = profile.dpi;
        let label_width = profile.label_width_dots();
        let offset_y = mm_to_dots(profile.offset_y_mm, dpi);
        let barcode_top_mm = match profile.header_layout {
            HeaderLayout::Row => BARCODE_TOP_ROW_MM,
            HeaderLayout::Column => BARCODE_TOP_COLUMN_MM,
        };

        Self {
            dpi,
            header_layout: profile.header_layout,
            label_width,
            label_height: profile.label_height_dots(),
            margin: mm_to_dots(SIDE_MARGIN_MM, dpi),
            printable_width: label_width.saturating_sub(mm_to_dots_u32(2.0 * SIDE_MARGIN_MM, dpi)),
            header_y: mm_to_dots(HEADER_TOP_MM, dpi) + offset_y,
            offset_x: mm_to_dots(profile.offset_x_mm, dpi),
            barcode_top: mm_to_dots(barcode_top_mm, dpi)
                + offset_y
                + mm_to_dots(profile.barcode_offset_y_mm, dpi),
            barcode_offset_x: mm_to_dots(profile.barcode_offset_x_mm, dpi),
            barcode_height: mm_to_dots_u32(profile.barcode_height_mm, dpi).max(1),
            module_width: profile.barcode_module_width,
        }
    }

    /// Order in which text elements are emitted.
    pub fn text_order(&self) -> [TextElement; 3] {
        match self.header_layout {
            HeaderLayout::Row => [TextElement::Name, TextElement::Price, TextElement::Sku],
            HeaderLayout::Column => [TextElement::Name, TextElement::Sku, TextElement::Price],
        }
    }

    /// Widest a text element may render. Row layout shares the line three ways.
    pub fn text_max_width(&self) -> u32 {
        match self.header_layout {
            HeaderLayout::Row => (self.printable_width / 3).max(1),
            HeaderLayout::Column => self.printable_width.max(1),
        }
    }

    pub fn align(&self, element: TextElement) -> Align {
        match (self.header_layout, element) {
            (_, TextElement::Name) => Align::Left,
            (HeaderLayout::Row, TextElement::Price) => Align::Right,
            _ => Align::Center,
        }
    }

    /// Top edge of a text element.
    pub fn text_y(&self, element: TextElement) -> i32 {
        let step_mm = match (self.header_layout, element) {
            (HeaderLayout::Column, TextElement::Sku) => COLUMN_SKU_STEP_MM,
            (HeaderLayout::Column, TextElement::Price) => COLUMN_PRICE_STEP_MM,
            _ => 0.0,
        };
        self.header_y + mm_to_dots(step_mm, self.dpi)
    }

    /// Place a text element of the given size.
    pub fn place_text(&self, element: TextElement, width: u32, height: u32) -> Placement {
        let printable = self.printable_width as i32;
        let w = width as i32;
        let x = match self.align(element) {
            Align::Left => self.margin,
            Align::Center => self.margin + (printable - w) / 2,
            Align::Right => self.margin + printable - w,
        } + self.offset_x;

        Placement {
            x: x.max(0) as u32,
            y: self.text_y(element).max(0) as u32,
            width,
            height,
        }
    }

    /// Place the barcode for `code`.
    pub fn place_barcode(&self, code: &str) -> BarcodePlacement {
        let estimated_width = estimate_barcode_width(code, self.module_width);
        let x = self.margin
            + (self.printable_width as i32 - estimated_width as i32) / 2
            + self.barcode_offset_x;

        BarcodePlacement {
            x: x.max(MIN_BARCODE_X) as u32,
            y: self.barcode_top.max(0) as u32,
            height: self.barcode_height,
            estimated_width,
            narrow: (self.module_width.round() as u32).max(1),
            wide: ((self.module_width * 2.0).round() as u32).max(2),
            symbology: Symbology::for_code(code),
            code: code.to_string(),
        }
    }
}
