//! # Etiqueta - Barcode Label Designer
//!
//! Etiqueta turns a catalog product into a printed price label on
//! TSPL-compatible thermal label printers (TSC and clones). It provides:
//!
//! - **Calibration**: a persisted, self-healing profile of label geometry and
//!   printer settings
//! - **Rasterization**: text and barcode rendering in device dots, and 1-bit
//!   packing for the printer
//! - **Composition**: TSPL script generation (bitmap or printer-font text,
//!   EAN-13 / Code 128 barcodes)
//! - **Preview**: the same layout in CSS pixels and as a PNG
//! - **Transport**: a local print-spooler bridge over websocket
//!
//! ## Quick Start
//!
//! ```
//! use etiqueta::{
//!     composer,
//!     printer::{CalibrationStore, MemoryStore},
//!     product::{ProductSelection, SelectedProduct},
//!     render::SoftwareRasterizer,
//! };
//!
//! // Calibration: defaults on first use
//! let store = MemoryStore::default();
//! let profile = store.load();
//!
//! // The product to label
//! let selection = ProductSelection::new(SelectedProduct {
//!     name: "Spiral Notebook A5".into(),
//!     price: 120.0,
//!     discount_percent: 10.0,
//!     sku: "NB-A5".into(),
//!     barcode: Some("8901030875021".into()),
//!     variants: vec![],
//! });
//!
//! // Build the TSPL script
//! let script = composer::compose(&SoftwareRasterizer::new(), &profile, &selection, None);
//! assert!(script.to_string().starts_with("SIZE 50 mm,25 mm\r\n"));
//! assert!(script.lines().iter().any(|l| l.contains("\"EAN13\"")));
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`printer`] | Calibration profile and its store |
//! | [`product`] | Product selection and label strings |
//! | [`render`] | Text/barcode rasterization, monochrome packing |
//! | [`layout`] | Element anchors in dots |
//! | [`composer`] | TSPL script composition |
//! | [`protocol`] | TSPL command builders |
//! | [`preview`] | CSS positions and PNG preview |
//! | [`transport`] | Print bridge and print session |
//! | [`search`] | Debounced product suggestions |
//! | [`server`] | HTTP API |
//! | [`units`] | mm / dots / CSS px conversions |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Any printer accepting TSPL (`SIZE`, `GAP`, `BITMAP`, `BARCODE`, ...),
//! tested at 203 and 300 DPI.

pub mod composer;
pub mod error;
pub mod layout;
pub mod preview;
pub mod printer;
pub mod product;
pub mod protocol;
pub mod render;
pub mod search;
pub mod server;
pub mod transport;
pub mod units;

// Re-exports for convenience
pub use error::EtiquetaError;
pub use printer::CalibrationProfile;
pub use protocol::TsplScript;
