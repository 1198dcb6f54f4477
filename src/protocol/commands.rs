//! # TSPL Commands
//!
//! This module builds individual TSPL command lines for TSC-compatible
//! thermal label printers.
//!
//! ## Protocol Overview
//!
//! TSPL is a line-oriented text protocol. The printer executes lines strictly
//! in order, so a label job is always:
//!
//! ```text
//! SIZE 50 mm,25 mm        ← media geometry
//! GAP 2 mm,0              ← gap between labels
//! SPEED 4
//! DENSITY 8
//! DIRECTION 1
//! CLS                     ← clear the image buffer
//! BITMAP / TEXT / BARCODE ← placements, in dots
//! PRINT 1                 ← render the buffer
//! ```
//!
//! ## Coordinates
//!
//! Placement coordinates are integer dots from the top-left corner of the
//! label. `SIZE` and `GAP` take millimetres.
//!
//! ## Strings
//!
//! TSPL has no escape sequence inside quoted strings, so embedded double
//! quotes are replaced with single quotes.

use std::fmt;

use crate::render::MonochromeBitmap;

/// Barcode symbologies used on product labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    /// 13-digit retail code
    Ean13,
    /// Code 128, any printable ASCII
    Code128,
}

impl Symbology {
    /// Pick the symbology for a code: EAN-13 for exactly 13 digits, else Code 128.
    ///
    /// ## Example
    ///
    /// ```
    /// use etiqueta::protocol::commands::Symbology;
    ///
    /// assert_eq!(Symbology::for_code("8901030875021"), Symbology::Ean13);
    /// assert_eq!(Symbology::for_code("SKU-ABC123"), Symbology::Code128);
    /// assert_eq!(Symbology::for_code("890103087502"), Symbology::Code128);
    /// ```
    pub fn for_code(code: &str) -> Self {
        if code.len() == 13 && code.bytes().all(|b| b.is_ascii_digit()) {
            Self::Ean13
        } else {
            Self::Code128
        }
    }

    /// Code type name in the `BARCODE` command.
    pub fn tspl_name(self) -> &'static str {
        match self {
            Self::Ean13 => "EAN13",
            Self::Code128 => "128",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ean13 => write!(f, "EAN-13"),
            Self::Code128 => write!(f, "CODE128"),
        }
    }
}

/// Format a millimetre value without trailing zeros (`50`, `25.5`).
fn mm(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{:.2}", rounded);
        text.trim_end_matches('0').to_string()
    }
}

/// Make a string safe to embed between TSPL double quotes.
pub fn quote_safe(text: &str) -> String {
    text.replace('"', "'").replace(['\r', '\n'], " ")
}

// ============================================================================
// SETUP COMMANDS
// ============================================================================

/// # Label Size (SIZE)
///
/// ```
/// use etiqueta::protocol::commands;
///
/// assert_eq!(commands::size(50.0, 25.0), "SIZE 50 mm,25 mm");
/// assert_eq!(commands::size(40.5, 30.0), "SIZE 40.5 mm,30 mm");
/// ```
pub fn size(width_mm: f64, height_mm: f64) -> String {
    format!("SIZE {} mm,{} mm", mm(width_mm), mm(height_mm))
}

/// # Gap Between Labels (GAP)
///
/// The second parameter (gap offset) is always 0.
pub fn gap(gap_mm: f64) -> String {
    format!("GAP {} mm,0", mm(gap_mm))
}

/// # Print Speed (SPEED), inches per second on most models
pub fn speed(n: u32) -> String {
    format!("SPEED {}", n)
}

/// # Print Darkness (DENSITY), 0-15
pub fn density(n: u32) -> String {
    format!("DENSITY {}", n)
}

/// # Print Direction (DIRECTION)
///
/// `1` prints with the label's top edge leaving the printer first.
pub fn direction(n: u8) -> String {
    format!("DIRECTION {}", n)
}

/// # Clear Image Buffer (CLS)
///
/// Must follow the setup commands and precede every placement.
pub fn cls() -> String {
    "CLS".to_string()
}

// ============================================================================
// PLACEMENT COMMANDS
// ============================================================================

/// # Bitmap Placement (BITMAP)
///
/// ```text
/// BITMAP x,y,width_bytes,height,mode,data
/// ```
///
/// Mode `1` is OR: ink bits are added on top of whatever is already in the
/// buffer. Data is the packed bitmap, hex encoded.
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::commands;
/// use etiqueta::render::MonochromeBitmap;
///
/// let bitmap = MonochromeBitmap { width_bytes: 2, height: 1, data: vec![0xFF, 0x80] };
/// assert_eq!(commands::bitmap(10, 20, &bitmap), "BITMAP 10,20,2,1,1,FF80");
/// ```
pub fn bitmap(x: u32, y: u32, bitmap: &MonochromeBitmap) -> String {
    format!(
        "BITMAP {},{},{},{},1,{}",
        x,
        y,
        bitmap.width_bytes,
        bitmap.height,
        bitmap.to_hex()
    )
}

/// # Printer Font Text (TEXT)
///
/// ```text
/// TEXT x,y,"font",rotation,x_mul,y_mul,"content"
/// ```
///
/// Glyph layout is done by the printer firmware.
pub fn text(x: u32, y: u32, font: &str, rotation: u16, x_mul: u32, y_mul: u32, content: &str) -> String {
    format!(
        "TEXT {},{},\"{}\",{},{},{},\"{}\"",
        x,
        y,
        quote_safe(font),
        rotation,
        x_mul,
        y_mul,
        quote_safe(content)
    )
}

/// Parameters of a `BARCODE` command.
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeCommand<'a> {
    pub x: u32,
    pub y: u32,
    pub symbology: Symbology,
    pub height: u32,
    /// Print human-readable digits under the bars
    pub show_text: bool,
    pub rotation: u16,
    pub narrow: u32,
    pub wide: u32,
    pub code: &'a str,
}

/// # Barcode Placement (BARCODE)
///
/// ```text
/// BARCODE x,y,"type",height,human_readable,rotation,narrow,wide,"code"
/// ```
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::commands::{self, BarcodeCommand, Symbology};
///
/// let cmd = commands::barcode(&BarcodeCommand {
///     x: 40, y: 104, symbology: Symbology::Code128, height: 64,
///     show_text: true, rotation: 0, narrow: 2, wide: 4, code: "SKU-1",
/// });
/// assert_eq!(cmd, r#"BARCODE 40,104,"128",64,1,0,2,4,"SKU-1""#);
/// ```
pub fn barcode(cmd: &BarcodeCommand<'_>) -> String {
    format!(
        "BARCODE {},{},\"{}\",{},{},{},{},{},\"{}\"",
        cmd.x,
        cmd.y,
        cmd.symbology.tspl_name(),
        cmd.height,
        u8::from(cmd.show_text),
        cmd.rotation,
        cmd.narrow,
        cmd.wide,
        quote_safe(cmd.code)
    )
}

// ============================================================================
// OUTPUT COMMANDS
// ============================================================================

/// # Print Buffer (PRINT)
pub fn print(copies: u32) -> String {
    format!("PRINT {}", copies.max(1))
}

/// # Feed Paper (FEED), in dots
pub fn feed(n: u32) -> String {
    format!("FEED {}", n)
}
