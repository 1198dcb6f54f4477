//! # Unit Conversions
//!
//! Three coordinate systems meet in a label:
//!
//! | Unit | Used by |
//! |------|---------|
//! | millimetres | calibration, `SIZE`/`GAP` commands |
//! | device dots | every placement command, rasterized bitmaps |
//! | CSS pixels | on-screen preview (96 px per inch reference) |
//!
//! All crossings between them go through the functions in this module so the
//! preview and the printed label share one rounding rule.
//!
//! ```text
//! dots   = round(mm / 25.4 * dpi)
//! css_px = dots * 96 / dpi
//!
//! For 203 DPI:
//!   25.4mm = 203 dots
//!   50mm   = 400 dots ≈ 189 css px
//! ```

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// CSS reference resolution (pixels per inch).
pub const CSS_PX_PER_INCH: f64 = 96.0;

/// Convert millimetres to device dots, rounding to the nearest dot.
///
/// Printer firmware reads coordinates as integers, so every physical
/// measurement must pass through here exactly once.
///
/// ## Example
///
/// ```
/// use etiqueta::units::mm_to_dots;
///
/// assert_eq!(mm_to_dots(25.4, 203), 203);
/// assert_eq!(mm_to_dots(50.0, 203), 400);
/// assert_eq!(mm_to_dots(-2.0, 203), -16);
/// ```
#[inline]
pub fn mm_to_dots(mm: f64, dpi: u32) -> i32 {
    (mm / MM_PER_INCH * dpi as f64).round() as i32
}

/// Convert a non-negative length in millimetres to dots.
#[inline]
pub fn mm_to_dots_u32(mm: f64, dpi: u32) -> u32 {
    mm_to_dots(mm, dpi).max(0) as u32
}

/// Convert device dots to CSS pixels at the 96 dpi reference.
#[inline]
pub fn dots_to_css_px(dots: f64, dpi: u32) -> f64 {
    dots * CSS_PX_PER_INCH / dpi as f64
}

/// Scale a CSS font size (96 dpi reference) to device dots.
#[inline]
pub fn font_px_to_dots(font_px: f64, dpi: u32) -> f64 {
    font_px * dpi as f64 / CSS_PX_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_inch_is_dpi() {
        assert_eq!(mm_to_dots(25.4, 203), 203);
        assert_eq!(mm_to_dots(25.4, 300), 300);
    }

    #[test]
    fn test_mm_to_dots_monotonic() {
        for dpi in [203, 300, 600] {
            let mut last = i32::MIN;
            for step in 0..2000 {
                let mm = step as f64 * 0.05;
                let dots = mm_to_dots(mm, dpi);
                assert!(dots >= last, "{}mm at {}dpi went backwards", mm, dpi);
                last = dots;
            }
        }
    }

    #[test]
    fn test_printable_width_at_203() {
        assert_eq!(mm_to_dots(50.0, 203) - mm_to_dots(4.0, 203), 368);
    }

    #[test]
    fn test_negative_offsets_round_symmetrically() {
        assert_eq!(mm_to_dots(-1.0, 203), -mm_to_dots(1.0, 203));
        assert_eq!(mm_to_dots_u32(-1.0, 203), 0);
    }

    #[test]
    fn test_css_round_trip() {
        // 96 dpi device: dots and css px coincide
        assert_eq!(dots_to_css_px(100.0, 96), 100.0);
        assert!((dots_to_css_px(203.0, 203) - 96.0).abs() < 1e-9);
        assert!((font_px_to_dots(24.0, 203) - 50.75).abs() < 1e-9);
    }
}
