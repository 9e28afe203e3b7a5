//! Cart line types.

use aurelia_core::{LineKey, Price, ProductId, VariantId};
use serde::{Deserialize, Serialize};

/// One cart entry: a product, optionally a variant, and a positive quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Derived from `product_id` and `variant_id`.
    pub key: LineKey,
    /// Referenced product. May no longer exist in the catalog.
    pub product_id: ProductId,
    /// Selected variant, if the product has options.
    pub variant_id: Option<VariantId>,
    /// Always at least 1 while the line exists.
    pub quantity: u32,
}

impl CartLine {
    /// Create a line with quantity 1.
    #[must_use]
    pub fn new(product_id: ProductId, variant_id: Option<VariantId>) -> Self {
        Self {
            key: LineKey::new(&product_id, variant_id.as_ref()),
            product_id,
            variant_id,
            quantity: 1,
        }
    }
}

/// A cart line resolved against the catalog, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineView {
    /// Line key, passed back for quantity updates and removal.
    pub key: LineKey,
    /// Referenced product.
    pub product_id: ProductId,
    /// Localized product name.
    pub name: String,
    /// Localized variant label, if a known variant is selected.
    pub variant_label: Option<String>,
    /// Localized wholesale pack label.
    pub pack_label: String,
    /// Units of the pack ordered.
    pub quantity: u32,
    /// Price per pack.
    pub unit_price: Price,
    /// `unit_price * quantity`.
    pub line_total: Price,
}

/// State published to subscribers after every change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CartSnapshot {
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,
    /// Sum of quantities.
    pub total_items: u32,
    /// Sum of resolvable line totals.
    pub subtotal: Price,
    /// Whether the cart drawer is shown.
    pub drawer_open: bool,
}
