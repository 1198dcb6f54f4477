//! # Label Tests
//!
//! End-to-end checks from a product selection to the TSPL script, the
//! preview and the print session.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Mutex;

use etiqueta::composer;
use etiqueta::preview::{self, render_preview};
use etiqueta::printer::{CalibrationProfile, CalibrationStore, HeaderLayout, MemoryStore};
use etiqueta::product::{ColorVariant, LabelContent, ProductSelection, SelectedProduct};
use etiqueta::protocol::Symbology;
use etiqueta::render::{MonochromeBitmap, Rasterizer, SoftwareRasterizer};
use etiqueta::transport::{PrintBridge, PrintSession};
use etiqueta::units::mm_to_dots;
use etiqueta::EtiquetaError;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn notebook() -> SelectedProduct {
    SelectedProduct {
        name: "Spiral Notebook A5".to_string(),
        price: 120.0,
        discount_percent: 10.0,
        sku: "NB-A5".to_string(),
        barcode: Some("8901030875021".to_string()),
        variants: Vec::new(),
    }
}

fn vector_profile() -> CalibrationProfile {
    CalibrationProfile {
        text_as_bitmap: false,
        ..Default::default()
    }
}

fn compose(profile: &CalibrationProfile, product: SelectedProduct) -> Vec<String> {
    composer::compose(
        &SoftwareRasterizer::new(),
        profile,
        &ProductSelection::new(product),
        None,
    )
    .lines()
    .to_vec()
}

// ============================================================================
// SCRIPT TESTS
// ============================================================================

#[test]
fn test_vector_row_script() {
    let lines = compose(&vector_profile(), notebook());
    assert_eq!(
        lines,
        vec![
            "SIZE 50 mm,25 mm",
            "GAP 2 mm,0",
            "SPEED 4",
            "DENSITY 8",
            "DIRECTION 1",
            "CLS",
            r#"TEXT 16,40,"1",0,3,3,"Spiral Notebook A5""#,
            r#"TEXT 96,40,"1",0,4,4,"Rs.108.00""#,
            r#"TEXT 160,40,"1",0,2,2,"NB-A5""#,
            r#"BARCODE 57,104,"EAN13",64,1,0,2,4,"8901030875021""#,
            "PRINT 1",
        ]
    );
}

#[test]
fn test_script_wire_format() {
    let script = composer::compose(
        &SoftwareRasterizer::new(),
        &vector_profile(),
        &ProductSelection::new(notebook()),
        None,
    );
    let text = script.to_string();
    assert_eq!(text.matches("\r\n").count(), script.len());
    assert!(text.ends_with("PRINT 1\r\n"));
    assert_eq!(script.to_bytes(), text.into_bytes());
}

#[test]
fn test_symbology_scenarios() {
    let mut product = notebook();
    let lines = compose(&vector_profile(), product.clone());
    assert!(lines[9].contains(r#""EAN13""#));

    product.barcode = Some("SKU-ABC123".to_string());
    let lines = compose(&vector_profile(), product.clone());
    assert!(lines[9].contains(r#","128","#));
    assert!(lines[9].ends_with(r#""SKU-ABC123""#));

    // 12 digits is not EAN-13
    product.barcode = Some("890103087502".to_string());
    let lines = compose(&vector_profile(), product);
    assert!(lines[9].contains(r#","128","#));
}

#[test]
fn test_truncated_name_on_label() {
    let profile = CalibrationProfile {
        truncate_length: 10,
        ..vector_profile()
    };
    let product = SelectedProduct {
        name: "A Very Long Product Name Exceeding Limit".to_string(),
        ..notebook()
    };
    let lines = compose(&profile, product);
    assert_eq!(lines[6], r#"TEXT 16,40,"1",0,3,3,"A Very Lo…""#);
}

#[test]
fn test_variant_sku_and_code() {
    let mut product = notebook();
    product.variants = vec![
        ColorVariant {
            color: "Red".to_string(),
            sku: "NB-A5-RED".to_string(),
            barcode: None,
            stock: 2,
        },
        ColorVariant {
            color: "Blue".to_string(),
            sku: "NB-A5-BLU".to_string(),
            barcode: Some("BLU-0001".to_string()),
            stock: 5,
        },
    ];
    let selection = ProductSelection::with_variant(product, Some(1)).unwrap();
    let script = composer::compose(&SoftwareRasterizer::new(), &vector_profile(), &selection, Some(4));
    let lines = script.lines();

    assert!(lines[8].ends_with(r#","NB-A5-BLU""#));
    // Variant barcode wins over the product's EAN
    assert_eq!(lines[9], r#"BARCODE 112,104,"128",64,1,0,2,4,"BLU-0001""#);
    assert_eq!(lines[10], "PRINT 4");
}

#[test]
fn test_bitmap_script_is_well_formed() {
    let profile = CalibrationProfile::default();
    let lines = compose(&profile, notebook());
    let bitmaps: Vec<&String> = lines.iter().filter(|l| l.starts_with("BITMAP ")).collect();
    assert_eq!(bitmaps.len(), 3);

    let max_width = (mm_to_dots(50.0, 203) - mm_to_dots(4.0, 203)) as u32 / 3;
    for line in bitmaps {
        let fields: Vec<&str> = line["BITMAP ".len()..].splitn(6, ',').collect();
        let width_bytes: u32 = fields[2].parse().unwrap();
        let height: u32 = fields[3].parse().unwrap();
        assert_eq!(fields[4], "1");
        assert!(width_bytes * 8 <= max_width + 7);
        assert_eq!(fields[5].len() as u32, width_bytes * height * 2);
        assert!(fields[5].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }
}

#[test]
fn test_column_layout_stacks_text() {
    let profile = CalibrationProfile {
        header_layout: HeaderLayout::Column,
        ..vector_profile()
    };
    let lines = compose(&profile, notebook());
    // Name, SKU, price on successive lines; barcode lower than in row mode
    assert!(lines[6].starts_with("TEXT 16,40,"));
    assert!(lines[7].contains(",64,") && lines[7].ends_with(r#""NB-A5""#));
    assert!(lines[8].contains(",88,") && lines[8].ends_with(r#""Rs.108.00""#));
    assert!(lines[9].starts_with("BARCODE 57,120,"));
}

#[test]
fn test_higher_dpi_scales_geometry() {
    let profile = CalibrationProfile {
        dpi: 300,
        ..vector_profile()
    };
    let lines = compose(&profile, notebook());
    assert_eq!(lines[0], "SIZE 50 mm,25 mm");
    // 5mm header at 300 dpi
    assert!(lines[6].starts_with(&format!("TEXT {},{},", mm_to_dots(2.0, 300), mm_to_dots(5.0, 300))));
}

// ============================================================================
// UNIT AND RASTER PROPERTIES
// ============================================================================

#[test]
fn test_mm_to_dots_reference_values() {
    assert_eq!(mm_to_dots(25.4, 203), 203);
    let mut last = i32::MIN;
    for tenth in 0..600 {
        let dots = mm_to_dots(tenth as f64 / 10.0, 203);
        assert!(dots >= last);
        last = dots;
    }
}

#[test]
fn test_rendered_text_never_exceeds_max_width() {
    let rasterizer = SoftwareRasterizer::new();
    for max_width in [8, 50, 122, 368] {
        let raster = rasterizer.render_text("Extra Long Premium Hardbound Notebook", 32.0, 203, max_width);
        assert!(raster.width() <= max_width);
    }
}

#[test]
fn test_monochrome_extremes() {
    use image::{Rgba, RgbaImage};

    let white = MonochromeBitmap::from_rgba(&RgbaImage::from_pixel(12, 2, Rgba([255, 255, 255, 255])), 160);
    assert!(white.data.iter().all(|&b| b == 0));

    let black = MonochromeBitmap::from_rgba(&RgbaImage::from_pixel(12, 2, Rgba([0, 0, 0, 255])), 1);
    assert_eq!(black.data, vec![0xFF, 0xF0, 0xFF, 0xF0]);
}

// ============================================================================
// CALIBRATION ROUND TRIP
// ============================================================================

#[test]
fn test_saved_profile_reloads() {
    let store = MemoryStore::default();
    let profile = CalibrationProfile {
        dpi: 300,
        label_width_mm: 40.0,
        header_layout: HeaderLayout::Column,
        currency_symbol: "₹".to_string(),
        ..Default::default()
    };
    store.save(&profile);
    assert_eq!(store.load(), profile);
}

#[test]
fn test_corrupt_calibration_still_prints() {
    let store = MemoryStore::with_raw("{ not json");
    let lines = compose(&store.load(), notebook());
    assert_eq!(lines[0], "SIZE 50 mm,25 mm");
}

// ============================================================================
// PREVIEW
// ============================================================================

#[test]
fn test_preview_positions_track_composer() {
    let rasterizer = SoftwareRasterizer::new();
    let profile = CalibrationProfile::default();
    let selection = ProductSelection::new(notebook());

    let content = LabelContent::new(&selection, &profile);
    let label = composer::arrange(&rasterizer, &profile, &content);
    let first = preview::label_positions(&label);
    let second = preview::label_positions(&label);
    assert_eq!(first, second);

    let barcode = label.barcode.as_ref().unwrap();
    assert_eq!(barcode.symbology, Symbology::Ean13);
    let css = first.barcode.unwrap();
    assert!((css.x - barcode.x as f64 * 96.0 / 203.0).abs() < 1e-9);

    let rendered = render_preview(&rasterizer, &profile, &selection);
    assert_eq!(rendered.positions, first);
}

#[test]
fn test_preview_barcode_matches_encoding() {
    let raster = SoftwareRasterizer::new()
        .render_barcode("8901030875021", Symbology::Ean13, 2.0, 64, 0, 203)
        .unwrap();
    // 95 modules at 2 dots each
    assert_eq!(raster.width(), 190);
}

// ============================================================================
// PRINTING
// ============================================================================

#[derive(Default)]
struct LoggingBridge {
    payloads: Mutex<Vec<String>>,
}

#[async_trait]
impl PrintBridge for LoggingBridge {
    async fn connect(&self) -> Result<(), EtiquetaError> {
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn find_printers(&self) -> Result<Vec<String>, EtiquetaError> {
        Ok(vec!["TSC TE244".to_string()])
    }

    async fn submit_raw(&self, _printer: &str, payload: &str) -> Result<(), EtiquetaError> {
        self.payloads.lock().unwrap().push(payload.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_print_without_printer_is_rejected() {
    let mut session = PrintSession::new(LoggingBridge::default());
    session.connect().await.unwrap();

    let err = session
        .print_label(
            &SoftwareRasterizer::new(),
            &CalibrationProfile::default(),
            &ProductSelection::new(notebook()),
            None,
        )
        .await
        .unwrap_err();
    assert!(err.is_connectivity());
    assert!(session.bridge().payloads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_print_sends_composed_script() {
    let mut session = PrintSession::new(LoggingBridge::default());
    session.connect().await.unwrap();
    session.select_printer("TSC TE244").unwrap();

    let rasterizer = SoftwareRasterizer::new();
    let profile = vector_profile();
    let selection = ProductSelection::new(notebook());
    session
        .print_label(&rasterizer, &profile, &selection, None)
        .await
        .unwrap();

    let expected = composer::compose(&rasterizer, &profile, &selection, None).to_string();
    assert_eq!(*session.bridge().payloads.lock().unwrap(), vec![expected]);
}
