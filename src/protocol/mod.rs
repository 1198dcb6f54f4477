//! # TSPL Protocol Implementation
//!
//! This module provides command builders for TSPL, the text command language
//! of TSC-compatible thermal label printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: One function per command line (`SIZE`, `BITMAP`, `BARCODE`, ...)
//! - [`script`]: Ordered command script and its wire form
//!
//! ## Usage Example
//!
//! ```
//! use etiqueta::protocol::{commands, TsplScript};
//!
//! let mut script = TsplScript::new();
//! script.push(commands::size(50.0, 25.0));
//! script.push(commands::gap(2.0));
//! script.push(commands::cls());
//! script.push(commands::text(16, 40, "1", 0, 2, 2, "HELLO"));
//! script.push(commands::print(1));
//!
//! assert!(script.to_string().starts_with("SIZE 50 mm,25 mm\r\n"));
//! ```

pub mod commands;
pub mod script;

pub use commands::Symbology;
pub use script::TsplScript;
