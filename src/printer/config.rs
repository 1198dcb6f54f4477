//! # Calibration Profile
//!
//! Physical printer and label parameters, edited by the operator and read on
//! every preview and print.
//!
//! ## Defaults
//!
//! | Property | Value |
//! |----------|-------|
//! | Resolution | 203 DPI |
//! | Label | 50mm × 25mm, 2mm gap |
//! | Barcode | 2 dot modules, 8mm high, HRI on |
//! | Text | bitmap mode, threshold 160 |
//!
//! ## Usage
//!
//! ```
//! use etiqueta::printer::CalibrationProfile;
//!
//! let profile = CalibrationProfile::default();
//! println!("Label: {}x{} dots",
//!          profile.label_width_dots(),
//!          profile.label_height_dots());
//! ```

use serde::{Deserialize, Serialize};

use crate::units::{mm_to_dots, mm_to_dots_u32};

/// Named font sizes offered in the designer, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontPreset {
    Small,
    Medium,
    Large,
    Xlarge,
    /// Use the matching `*_custom_px` field.
    Custom,
}

impl FontPreset {
    /// Resolve the preset to CSS pixels, falling back to `custom_px` for
    /// [`FontPreset::Custom`].
    pub fn to_px(self, custom_px: f64) -> f64 {
        match self {
            Self::Small => 14.0,
            Self::Medium => 18.0,
            Self::Large => 24.0,
            Self::Xlarge => 32.0,
            Self::Custom => custom_px,
        }
    }
}

/// How name, SKU and price share the label header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderLayout {
    /// Name, SKU and price on one line.
    #[default]
    Row,
    /// Name, SKU and price stacked.
    Column,
}

/// # Calibration Profile
///
/// Flat record of everything the layout and the printer need to know about
/// the physical label. Every field has a default so that profiles persisted
/// by older versions keep loading when new fields appear.
///
/// ## Coordinate Conventions
///
/// - Sizes and offsets are in millimetres; offsets may be negative.
/// - `barcode_module_width` is already in dots (narrow bar width).
/// - Font sizes are CSS pixels at the 96 dpi reference, scaled by DPI
///   when rasterized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationProfile {
    /// Printer resolution in dots per inch
    pub dpi: u32,
    pub label_width_mm: f64,
    pub label_height_mm: f64,
    /// Gap between consecutive labels on the roll
    pub gap_mm: f64,
    /// Global horizontal shift applied to text elements
    pub offset_x_mm: f64,
    /// Global vertical shift applied to every element
    pub offset_y_mm: f64,
    pub barcode_offset_x_mm: f64,
    pub barcode_offset_y_mm: f64,
    /// Narrow bar width in dots
    pub barcode_module_width: f64,
    pub barcode_height_mm: f64,
    pub name_font_size: FontPreset,
    pub name_font_custom_px: f64,
    pub price_font_size: FontPreset,
    pub price_font_custom_px: f64,
    pub sku_font_px: f64,
    pub truncate_name: bool,
    /// Maximum name length in characters, ellipsis included
    pub truncate_length: usize,
    /// Print speed (printer-specific scale)
    pub speed: u32,
    /// Print darkness (printer-specific scale)
    pub density: u32,
    /// Print human-readable digits under the barcode
    pub show_barcode_text: bool,
    /// Rasterize text (exact) instead of using printer fonts (approximate)
    pub text_as_bitmap: bool,
    /// Luminance below which a pixel becomes ink
    pub threshold: u8,
    pub header_layout: HeaderLayout,
    pub currency_symbol: String,
    /// Default `PRINT` count
    pub copies: u32,
    /// Append `FEED 1` after printing
    pub feed_after_print: bool,
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self {
            dpi: 203,
            label_width_mm: 50.0,
            label_height_mm: 25.0,
            gap_mm: 2.0,
            offset_x_mm: 0.0,
            offset_y_mm: 0.0,
            barcode_offset_x_mm: 0.0,
            barcode_offset_y_mm: 0.0,
            barcode_module_width: 2.0,
            barcode_height_mm: 8.0,
            name_font_size: FontPreset::Medium,
            name_font_custom_px: 18.0,
            price_font_size: FontPreset::Large,
            price_font_custom_px: 24.0,
            sku_font_px: 14.0,
            truncate_name: true,
            truncate_length: 24,
            speed: 4,
            density: 8,
            show_barcode_text: true,
            text_as_bitmap: true,
            threshold: 160,
            header_layout: HeaderLayout::Row,
            currency_symbol: "Rs.".to_string(),
            copies: 1,
            feed_after_print: false,
        }
    }
}

/// Accept `value` when finite and inside `range`, otherwise take `default`.
fn within(value: f64, range: std::ops::RangeInclusive<f64>, default: f64) -> f64 {
    if value.is_finite() && range.contains(&value) {
        value
    } else {
        default
    }
}

impl CalibrationProfile {
    /// Largest label edge accepted, in millimetres.
    pub const MAX_LABEL_MM: f64 = 500.0;

    /// Replace every non-finite or out-of-bounds value with its default.
    ///
    /// The store never rejects a profile; consumers call this before doing
    /// arithmetic with it.
    ///
    /// ## Example
    ///
    /// ```
    /// use etiqueta::printer::CalibrationProfile;
    ///
    /// let broken = CalibrationProfile {
    ///     dpi: 0,
    ///     label_width_mm: f64::NAN,
    ///     ..Default::default()
    /// };
    /// let fixed = broken.sanitized();
    /// assert_eq!(fixed.dpi, 203);
    /// assert_eq!(fixed.label_width_mm, 50.0);
    /// ```
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let offset = -Self::MAX_LABEL_MM..=Self::MAX_LABEL_MM;
        Self {
            dpi: if (100..=1200).contains(&self.dpi) { self.dpi } else { d.dpi },
            label_width_mm: within(self.label_width_mm, 1.0..=Self::MAX_LABEL_MM, d.label_width_mm),
            label_height_mm: within(
                self.label_height_mm,
                1.0..=Self::MAX_LABEL_MM,
                d.label_height_mm,
            ),
            gap_mm: within(self.gap_mm, 0.0..=50.0, d.gap_mm),
            offset_x_mm: within(self.offset_x_mm, offset.clone(), d.offset_x_mm),
            offset_y_mm: within(self.offset_y_mm, offset.clone(), d.offset_y_mm),
            barcode_offset_x_mm: within(self.barcode_offset_x_mm, offset.clone(), 0.0),
            barcode_offset_y_mm: within(self.barcode_offset_y_mm, offset, 0.0),
            barcode_module_width: within(
                self.barcode_module_width,
                0.5..=10.0,
                d.barcode_module_width,
            ),
            barcode_height_mm: within(
                self.barcode_height_mm,
                1.0..=Self::MAX_LABEL_MM,
                d.barcode_height_mm,
            ),
            name_font_custom_px: within(self.name_font_custom_px, 1.0..=400.0, d.name_font_custom_px),
            price_font_custom_px: within(
                self.price_font_custom_px,
                1.0..=400.0,
                d.price_font_custom_px,
            ),
            sku_font_px: within(self.sku_font_px, 1.0..=400.0, d.sku_font_px),
            truncate_length: if self.truncate_length > 0 {
                self.truncate_length
            } else {
                d.truncate_length
            },
            speed: if (1..=15).contains(&self.speed) { self.speed } else { d.speed },
            density: if self.density <= 15 { self.density } else { d.density },
            copies: self.copies.max(1),
            ..self
        }
    }

    /// Name font size in CSS pixels.
    pub fn name_font_px(&self) -> f64 {
        self.name_font_size.to_px(self.name_font_custom_px)
    }

    /// Price font size in CSS pixels.
    pub fn price_font_px(&self) -> f64 {
        self.price_font_size.to_px(self.price_font_custom_px)
    }

    /// Calculate dots per millimetre.
    #[inline]
    pub fn dots_per_mm(&self) -> f64 {
        self.dpi as f64 / crate::units::MM_PER_INCH
    }

    /// Convert millimetres to dots at this profile's resolution.
    #[inline]
    pub fn mm_to_dots(&self, mm: f64) -> i32 {
        mm_to_dots(mm, self.dpi)
    }

    /// Label width in dots.
    pub fn label_width_dots(&self) -> u32 {
        mm_to_dots_u32(self.label_width_mm, self.dpi)
    }

    /// Label height in dots.
    pub fn label_height_dots(&self) -> u32 {
        mm_to_dots_u32(self.label_height_mm, self.dpi)
    }
}

// ============================================================================
// TESTS
// ============================================================================
