//! Product catalog data source.
//!
//! The catalog is a fixed, read-only product list built once at startup.
//! Everything else in the storefront reads it by ID; nothing mutates it.
//!
//! # Modules
//!
//! - [`data`] - The built-in wholesale product list and its translations
//! - [`i18n`] - Per-language overrides for names, descriptions and labels
//! - [`query`] - Filtering, sorting and pagination over the product list

pub mod data;
pub mod i18n;
pub mod query;

use std::collections::{HashMap, HashSet};

use aurelia_core::{Availability, Language, Price, ProductId, VariantId};
use serde::{Deserialize, Serialize};

pub use i18n::Translations;
pub use query::{FilterState, Page, PriceBand, SearchScope, SortOrder, paginate};

// =============================================================================
// Product Types
// =============================================================================

/// A purchasable option of a product (finish, size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant ID, unique within its product.
    pub id: VariantId,
    /// Display label in the base language (e.g., "Dorado").
    pub label: String,
    /// Units on hand for this variant.
    pub stock: u32,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name in the base language.
    pub name: String,
    /// Description in the base language.
    pub description: String,
    /// Material line (e.g., "plata-925").
    pub category: String,
    /// Piece type (e.g., "aros").
    pub subcategory: String,
    /// Brand name.
    pub brand: String,
    /// Wholesale price per pack.
    pub price: Price,
    /// Price before discount. Only present when greater than `price`.
    pub original_price: Option<Price>,
    /// Parent-level stock.
    pub stock: u32,
    /// Wholesale pack description (e.g., "Pack 6 pares").
    pub pack_label: String,
    /// Ordered variants. Empty when the product has no options.
    pub variants: Vec<Variant>,
}

impl Product {
    /// Create a product without discount or variants.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        description: impl Into<String>,
        subcategory: impl Into<String>,
        category: impl Into<String>,
        brand: impl Into<String>,
        price: i64,
        stock: u32,
        pack_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category: category.into(),
            subcategory: subcategory.into(),
            brand: brand.into(),
            price: Price::new(price),
            original_price: None,
            stock,
            pack_label: pack_label.into(),
            variants: Vec::new(),
        }
    }

    /// Set the pre-discount price.
    #[must_use]
    pub const fn with_original_price(mut self, original_price: i64) -> Self {
        self.original_price = Some(Price::new(original_price));
        self
    }

    /// Append a variant.
    #[must_use]
    pub fn with_variant(mut self, id: &str, label: &str, stock: u32) -> Self {
        self.variants.push(Variant {
            id: VariantId::new(id),
            label: label.to_string(),
            stock,
        });
        self
    }

    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Whether the product is sold below its original price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.original_price.is_some_and(|original| original > self.price)
    }

    /// Whole-percent markdown from the original price, rounded down.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price.filter(|_| self.is_discounted())?;
        let off = (original.amount() - self.price.amount()) * 100 / original.amount();
        u32::try_from(off).ok()
    }

    /// Whether the product, or a specific variant of it, can be ordered.
    ///
    /// Precedence:
    /// 1. Parent `stock == 0` means out of stock, whatever the variants say.
    /// 2. Otherwise, with a variant named, that variant's stock decides
    ///    (an unknown variant is out of stock).
    /// 3. Otherwise, a product with variants is in stock if any variant is.
    /// 4. A product without variants is in stock (its parent stock is non-zero).
    #[must_use]
    pub fn availability(&self, variant: Option<&VariantId>) -> Availability {
        if self.stock == 0 {
            return Availability::OutOfStock;
        }
        match variant {
            Some(id) => self
                .variant(id)
                .map_or(Availability::OutOfStock, |v| Availability::from_stock(v.stock)),
            None if self.variants.is_empty() => Availability::InStock,
            None => {
                if self.variants.iter().any(|v| v.stock > 0) {
                    Availability::InStock
                } else {
                    Availability::OutOfStock
                }
            }
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// The read-only product catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
    translations: Translations,
}

impl Catalog {
    /// Build a catalog from a product list.
    ///
    /// Products keep their given order. A repeated ID keeps its first
    /// occurrence. An `original_price` that is not above `price` is dropped
    /// so the discount invariant always holds.
    #[must_use]
    pub fn new(products: Vec<Product>, translations: Translations) -> Self {
        let mut kept = Vec::with_capacity(products.len());
        let mut index = HashMap::with_capacity(products.len());

        for mut product in products {
            if index.contains_key(&product.id) {
                tracing::warn!(product_id = %product.id, "Duplicate product id ignored");
                continue;
            }
            if product.original_price.is_some() && !product.is_discounted() {
                tracing::warn!(
                    product_id = %product.id,
                    "Original price not above price, dropping discount"
                );
                product.original_price = None;
            }
            index.insert(product.id.clone(), kept.len());
            kept.push(product);
        }

        Self {
            products: kept,
            index,
            translations,
        }
    }

    /// All products in catalog order.
    #[must_use]
    pub fn all(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns `true` if the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn get_by_id(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|&i| self.products.get(i))
    }

    /// Product name in `lang`, falling back to the base name.
    ///
    /// Returns `None` only if the product does not exist.
    #[must_use]
    pub fn name_for(&self, id: &ProductId, lang: Language) -> Option<&str> {
        let product = self.get_by_id(id)?;
        Some(
            self.translations
                .name(id, lang)
                .unwrap_or(product.name.as_str()),
        )
    }

    /// Product description in `lang`, falling back to the base description.
    ///
    /// Returns `None` only if the product does not exist.
    #[must_use]
    pub fn description_for(&self, id: &ProductId, lang: Language) -> Option<&str> {
        let product = self.get_by_id(id)?;
        Some(
            self.translations
                .description(id, lang)
                .unwrap_or(product.description.as_str()),
        )
    }

    /// Translate a raw label (variant, pack, category), or return it unchanged.
    #[must_use]
    pub fn label_for<'a>(&'a self, raw: &'a str, lang: Language) -> &'a str {
        self.translations.label(raw, lang).unwrap_or(raw)
    }

    /// Distinct subcategories in first-appearance order.
    #[must_use]
    pub fn subcategories(&self) -> Vec<&str> {
        distinct(self.products.iter().map(|p| p.subcategory.as_str()))
    }

    /// Distinct categories in first-appearance order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        distinct(self.products.iter().map(|p| p.category.as_str()))
    }

    /// Distinct brands in first-appearance order.
    #[must_use]
    pub fn brands(&self) -> Vec<&str> {
        distinct(self.products.iter().map(|p| p.brand.as_str()))
    }

    /// Quick matches for the header search box.
    ///
    /// Matches the trimmed, case-insensitive term against name, description
    /// and category. An empty term yields nothing.
    #[must_use]
    pub fn search_suggestions(&self, term: &str, limit: usize) -> Vec<&Product> {
        let filter = FilterState {
            search: term.to_string(),
            ..FilterState::default()
        };
        if filter.search_term().is_none() {
            return Vec::new();
        }
        self.products
            .iter()
            .filter(|p| filter.matches_search(p, SearchScope::IncludeCategory))
            .take(limit)
            .collect()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}
