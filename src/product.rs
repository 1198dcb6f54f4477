//! # Product Selection
//!
//! The catalog product chosen for printing, its active colour variant, and
//! the three strings (name, SKU, price) plus barcode that end up on the
//! label.

use serde::{Deserialize, Serialize};

use crate::error::EtiquetaError;
use crate::printer::CalibrationProfile;

/// A colour variant with its own SKU and stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorVariant {
    #[serde(default)]
    pub color: String,
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub stock: u32,
}

/// Projection of a catalog product as returned by the product API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedProduct {
    pub name: String,
    pub price: f64,
    #[serde(default, alias = "discountPercent", alias = "discount")]
    pub discount_percent: f64,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default, alias = "colorVariants")]
    pub variants: Vec<ColorVariant>,
}

/// A product plus the variant currently chosen for printing.
///
/// When the product has variants exactly one of them is active; the first
/// one on selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSelection {
    product: SelectedProduct,
    active: Option<usize>,
}

impl ProductSelection {
    pub fn new(product: SelectedProduct) -> Self {
        let active = if product.variants.is_empty() {
            None
        } else {
            Some(0)
        };
        Self { product, active }
    }

    /// Select the product and, if given, one of its variants.
    pub fn with_variant(product: SelectedProduct, variant: Option<usize>) -> Result<Self, EtiquetaError> {
        let mut selection = Self::new(product);
        if let Some(index) = variant {
            selection.select_variant(index)?;
        }
        Ok(selection)
    }

    pub fn product(&self) -> &SelectedProduct {
        &self.product
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_variant(&self) -> Option<&ColorVariant> {
        self.active.and_then(|i| self.product.variants.get(i))
    }

    /// Make variant `index` the active one.
    pub fn select_variant(&mut self, index: usize) -> Result<(), EtiquetaError> {
        if index >= self.product.variants.len() {
            return Err(EtiquetaError::Config(format!(
                "variant {} out of range ({} variants)",
                index,
                self.product.variants.len()
            )));
        }
        self.active = Some(index);
        Ok(())
    }

    /// SKU of the active variant, or the product's own.
    pub fn active_sku(&self) -> &str {
        self.active_variant()
            .map(|v| v.sku.as_str())
            .unwrap_or(&self.product.sku)
    }

    /// Code to encode in the barcode: variant barcode, product barcode, or SKU.
    pub fn active_code(&self) -> Option<&str> {
        let variant_code = self.active_variant().and_then(|v| v.barcode.as_deref());
        [variant_code, self.product.barcode.as_deref(), Some(self.active_sku())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|code| !code.is_empty())
    }
}

/// Cut `text` to `max_len` characters, ellipsis included, when enabled.
///
/// ## Example
///
/// ```
/// use etiqueta::product::truncate;
///
/// assert_eq!(truncate("Gel Pen Blue", true, 8), "Gel Pen…");
/// assert_eq!(truncate("Gel Pen Blue", false, 8), "Gel Pen Blue");
/// assert_eq!(truncate("Pen", true, 8), "Pen");
/// ```
pub fn truncate(text: &str, enabled: bool, max_len: usize) -> String {
    if !enabled || text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_len.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Price after discount, with the discount clamped to 0..=100 percent.
pub fn final_price(price: f64, discount_percent: f64) -> f64 {
    let discount = if discount_percent.is_finite() {
        discount_percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    price * (1.0 - discount / 100.0)
}

/// The strings printed on a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelContent {
    pub name: String,
    pub sku: String,
    pub price: String,
    /// Barcode payload, `None` when the product has nothing to encode
    pub code: Option<String>,
}

impl LabelContent {
    pub fn new(selection: &ProductSelection, profile: &CalibrationProfile) -> Self {
        let product = selection.product();
        let price = final_price(product.price, product.discount_percent);
        Self {
            name: truncate(product.name.trim(), profile.truncate_name, profile.truncate_length),
            sku: selection.active_sku().trim().to_string(),
            price: format!("{}{:.2}", profile.currency_symbol, price),
            code: selection.active_code().map(str::to_string),
        }
    }
}
