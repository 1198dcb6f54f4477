//! # Printer Module
//!
//! This module provides label calibration and its persistence.
//!
//! ## Modules
//!
//! - [`config`]: Calibration profile (label geometry, fonts, barcode tuning)
//! - [`store`]: Durable calibration storage

pub mod config;
pub mod store;

pub use config::{CalibrationProfile, FontPreset, HeaderLayout};
pub use store::{CalibrationPatch, CalibrationStore, JsonFileStore, MemoryStore};
