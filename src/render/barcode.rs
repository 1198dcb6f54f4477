//! Barcode encoding for preview rendering.
//!
//! Uses the barcoders crate for EAN-13 and Code 128 encoding. The printed
//! barcode itself is drawn by the printer from a `BARCODE` command; these
//! modules only feed the on-screen preview.

use barcoders::sym::code128::Code128;
use barcoders::sym::ean13::EAN13;
use image::{Rgba, RgbaImage};

use crate::error::EtiquetaError;
use crate::protocol::Symbology;

/// EAN-13 check digit for the first 12 digits.
fn ean13_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .take(12)
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Encode an EAN-13 code (13 digits, check digit verified) into modules.
pub fn encode_ean13(code: &str) -> Result<Vec<u8>, EtiquetaError> {
    if code.len() != 13 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EtiquetaError::Render(format!(
            "EAN-13 needs exactly 13 digits, got '{}'",
            code
        )));
    }
    let digits: Vec<u8> = code.bytes().map(|b| b - b'0').collect();
    let expected = ean13_check_digit(&digits);
    if digits[12] != expected {
        return Err(EtiquetaError::Render(format!(
            "EAN-13 check digit mismatch for '{}' (expected {})",
            code, expected
        )));
    }

    let barcode = EAN13::new(&code[..12])
        .or_else(|_| EAN13::new(code))
        .map_err(|e| EtiquetaError::Render(format!("EAN-13 encoding failed: {}", e)))?;
    Ok(barcode.encode())
}

/// Encode a Code 128 code into modules.
pub fn encode_code128(code: &str) -> Result<Vec<u8>, EtiquetaError> {
    // Character set B covers printable ASCII
    let prefixed = format!("\u{0181}{}", code);
    let barcode = Code128::new(&prefixed)
        .map_err(|e| EtiquetaError::Render(format!("Code 128 encoding failed for '{}': {}", code, e)))?;
    Ok(barcode.encode())
}

/// Encode `code` as a module sequence (1 = bar, 0 = space).
pub fn encode(code: &str, symbology: Symbology) -> Result<Vec<u8>, EtiquetaError> {
    if code.is_empty() {
        return Err(EtiquetaError::Render("empty barcode".to_string()));
    }
    match symbology {
        Symbology::Ean13 => encode_ean13(code),
        Symbology::Code128 => encode_code128(code),
    }
}

/// Draw `modules` stretched across a `width` × `height` canvas.
///
/// The canvas is opaque white; the printer bitmap format has no alpha.
pub fn draw_modules(modules: &[u8], width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([255, 255, 255, 255]));
    if modules.is_empty() {
        return canvas;
    }
    let n = modules.len() as u64;
    for x in 0..canvas.width() {
        let module = (x as u64 * n / canvas.width() as u64) as usize;
        if modules[module.min(modules.len() - 1)] == 1 {
            for y in 0..canvas.height() {
                canvas.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
    }
    canvas
}
