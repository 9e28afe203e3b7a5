//! Catalog query engine.
//!
//! Pure functions over the product list: a [`FilterState`] narrows the list
//! (every dimension must pass), then a [`SortOrder`] orders what is left,
//! and [`paginate`] slices the result for display. Nothing here fails; a
//! filter that matches nothing yields an empty list.

use std::collections::BTreeSet;
use std::str::FromStr;

use aurelia_core::Price;
use serde::{Deserialize, Serialize};

use super::Product;

/// Upper bound of the `low` band, inclusive.
const LOW_BAND_MAX: i64 = 20_000;
/// Upper bound of the `mid` band, inclusive.
const MID_BAND_MAX: i64 = 30_000;

/// Coarse price ranges. Boundaries belong to the lower band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBand {
    /// `price <= 20000`
    Low,
    /// `20000 < price <= 30000`
    Mid,
    /// `price > 30000`
    High,
}

impl PriceBand {
    /// Whether `price` falls in this band.
    #[must_use]
    pub const fn contains(self, price: Price) -> bool {
        let amount = price.amount();
        match self {
            Self::Low => amount <= LOW_BAND_MAX,
            Self::Mid => amount > LOW_BAND_MAX && amount <= MID_BAND_MAX,
            Self::High => amount > MID_BAND_MAX,
        }
    }
}

impl FromStr for PriceBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "mid" => Ok(Self::Mid),
            "high" => Ok(Self::High),
            _ => Err(format!("invalid price band: {s}")),
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    Recommended,
    /// Cheapest first; ties keep catalog order.
    PriceAsc,
    /// Most expensive first; ties keep catalog order.
    PriceDesc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recommended" => Ok(Self::Recommended),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

/// Which product fields free-text search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Name and description.
    #[default]
    NameAndDescription,
    /// Name, description and category.
    IncludeCategory,
}

/// User-selected catalog filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    /// Single subcategory, or `None` for all.
    pub active_subcategory: Option<String>,
    /// Categories to include. Empty means all.
    pub selected_categories: BTreeSet<String>,
    /// Brands to include. Empty means all.
    pub selected_brands: BTreeSet<String>,
    /// Price band, or `None` for all.
    pub price_filter: Option<PriceBand>,
    /// Free-text search, matched after trimming.
    pub search: String,
    /// Result ordering.
    pub sort_by: SortOrder,
    /// Fields searched by `search`.
    pub search_scope: SearchScope,
}

impl FilterState {
    /// Select a subcategory. `"all"` clears the selection.
    pub fn set_subcategory(&mut self, subcategory: &str) {
        self.active_subcategory = match subcategory {
            "all" => None,
            other => Some(other.to_string()),
        };
    }

    /// Add the category if absent, remove it if present.
    pub fn toggle_category(&mut self, category: &str) {
        toggle(&mut self.selected_categories, category);
    }

    /// Add the brand if absent, remove it if present.
    pub fn toggle_brand(&mut self, brand: &str) {
        toggle(&mut self.selected_brands, brand);
    }

    /// Reset every filter dimension to its default. The sort order and
    /// search scope are presentation choices and are kept.
    pub fn clear(&mut self) {
        *self = Self {
            sort_by: self.sort_by,
            search_scope: self.search_scope,
            ..Self::default()
        };
    }

    /// The trimmed, lowercased search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<String> {
        let term = self.search.trim();
        (!term.is_empty()).then(|| term.to_lowercase())
    }

    /// Number of active filters, for the "filters (n)" badge.
    ///
    /// Counts each selected category and brand, plus one for a price band
    /// and one for a non-blank search. The subcategory tab is not counted.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        self.selected_categories.len()
            + self.selected_brands.len()
            + usize::from(self.price_filter.is_some())
            + usize::from(self.search_term().is_some())
    }

    /// Whether `product` passes every filter dimension.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_subcategory(product)
            && self.matches_category(product)
            && self.matches_brand(product)
            && self.matches_price(product)
            && self.matches_search(product, self.search_scope)
    }

    fn matches_subcategory(&self, product: &Product) -> bool {
        self.active_subcategory
            .as_deref()
            .is_none_or(|sub| product.subcategory == sub)
    }

    fn matches_category(&self, product: &Product) -> bool {
        self.selected_categories.is_empty() || self.selected_categories.contains(&product.category)
    }

    fn matches_brand(&self, product: &Product) -> bool {
        self.selected_brands.is_empty() || self.selected_brands.contains(&product.brand)
    }

    fn matches_price(&self, product: &Product) -> bool {
        self.price_filter
            .is_none_or(|band| band.contains(product.price))
    }

    pub(crate) fn matches_search(&self, product: &Product, scope: SearchScope) -> bool {
        let Some(term) = self.search_term() else {
            return true;
        };
        product.name.to_lowercase().contains(&term)
            || product.description.to_lowercase().contains(&term)
            || (scope == SearchScope::IncludeCategory
                && product.category.to_lowercase().contains(&term))
    }

    /// Filter then sort `products`.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut matched: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        match self.sort_by {
            SortOrder::Recommended => {}
            SortOrder::PriceAsc => matched.sort_by_key(|p| p.price),
            SortOrder::PriceDesc => matched.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        matched
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// Items on this page.
    pub items: &'a [T],
    /// 1-based page number after clamping.
    pub number: usize,
    /// Total number of pages, at least 1.
    pub total_pages: usize,
    /// Total number of items across all pages.
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// Slice `items` into the requested 1-based page.
///
/// The request is clamped into `1..=total_pages`, where
/// `total_pages = max(1, ceil(len / page_size))`. A `page_size` of 0 is
/// treated as 1.
#[must_use]
pub fn paginate<T>(items: &[T], page_size: usize, requested: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let number = requested.clamp(1, total_pages);

    let start = (number - 1) * page_size;
    let end = (start + page_size).min(total_items);

    Page {
        items: items.get(start..end).unwrap_or(&[]),
        number,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::data;

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    fn product_at(price: i64) -> Product {
        Product::new("x", "x", "", "aros", "plata-925", "Luma", price, 1, "")
    }

    #[test]
    fn test_band_boundaries_belong_to_lower_band() {
        assert!(PriceBand::Low.contains(Price::new(20_000)));
        assert!(!PriceBand::Mid.contains(Price::new(20_000)));
        assert!(PriceBand::Mid.contains(Price::new(20_001)));
        assert!(PriceBand::Mid.contains(Price::new(30_000)));
        assert!(!PriceBand::High.contains(Price::new(30_000)));
        assert!(PriceBand::High.contains(Price::new(30_001)));
    }

    #[test]
    fn test_price_filter_on_boundary_products() {
        let products = vec![product_at(20_000), product_at(30_000)];
        let low = FilterState {
            price_filter: Some(PriceBand::Low),
            ..FilterState::default()
        };
        assert_eq!(low.apply(&products).len(), 1);
        let high = FilterState {
            price_filter: Some(PriceBand::High),
            ..FilterState::default()
        };
        assert!(high.apply(&products).is_empty());
    }

    #[test]
    fn test_default_filter_returns_catalog_order() {
        let catalog = data::builtin();
        let result = FilterState::default().apply(catalog.all());
        assert_eq!(result.len(), 10);
        assert_eq!(ids(&result).first().unwrap(), "p1");
        assert_eq!(ids(&result).last().unwrap(), "p10");
    }

    #[test]
    fn test_subcategory_filter() {
        let catalog = data::builtin();
        let mut filter = FilterState::default();
        filter.set_subcategory("aros");
        assert_eq!(ids(&filter.apply(catalog.all())), vec!["p1", "p5", "p9"]);
        filter.set_subcategory("all");
        assert_eq!(filter.apply(catalog.all()).len(), 10);
    }

    #[test]
    fn test_categories_union_brands_intersect() {
        let catalog = data::builtin();
        let mut filter = FilterState::default();
        filter.toggle_category("plata-925");
        filter.toggle_category("acero-quirurgico");
        assert_eq!(filter.apply(catalog.all()).len(), 7);

        filter.toggle_brand("Nácar");
        assert_eq!(ids(&filter.apply(catalog.all())), vec!["p3", "p5", "p9"]);
    }

    #[test]
    fn test_toggle_removes_existing_selection() {
        let mut filter = FilterState::default();
        filter.toggle_brand("Luma");
        filter.toggle_brand("Luma");
        assert!(filter.selected_brands.is_empty());
    }

    #[test]
    fn test_dimensions_commute() {
        let catalog = data::builtin();
        let mut filter = FilterState::default();
        filter.toggle_category("enchapado-oro");
        filter.toggle_brand("Aurelia");
        filter.price_filter = Some(PriceBand::Mid);

        let combined = filter.apply(catalog.all());

        let stepwise: Vec<&Product> = catalog
            .all()
            .iter()
            .filter(|p| filter.matches_price(p))
            .filter(|p| filter.matches_brand(p))
            .filter(|p| filter.matches_category(p))
            .collect();
        assert_eq!(combined, stepwise);
        assert_eq!(ids(&combined), vec!["p6"]);
    }

    #[test]
    fn test_search_is_trimmed_and_case_insensitive() {
        let catalog = data::builtin();
        let filter = FilterState {
            search: "  SIENA ".to_string(),
            ..FilterState::default()
        };
        assert_eq!(ids(&filter.apply(catalog.all())), vec!["p1", "p6"]);
    }

    #[test]
    fn test_search_category_scope_is_opt_in() {
        let catalog = data::builtin();
        let mut filter = FilterState {
            search: "quirurgico".to_string(),
            ..FilterState::default()
        };
        assert!(filter.apply(catalog.all()).is_empty());
        filter.search_scope = SearchScope::IncludeCategory;
        assert_eq!(ids(&filter.apply(catalog.all())), vec!["p2", "p4", "p9"]);
    }

    #[test]
    fn test_sort_price_asc_is_stable() {
        let products = vec![
            Product::new("a", "a", "", "s", "c", "b", 500, 1, ""),
            Product::new("b", "b", "", "s", "c", "b", 100, 1, ""),
            Product::new("c", "c", "", "s", "c", "b", 500, 1, ""),
            Product::new("d", "d", "", "s", "c", "b", 100, 1, ""),
        ];
        let asc = FilterState {
            sort_by: SortOrder::PriceAsc,
            ..FilterState::default()
        };
        assert_eq!(ids(&asc.apply(&products)), vec!["b", "d", "a", "c"]);

        let desc = FilterState {
            sort_by: SortOrder::PriceDesc,
            ..FilterState::default()
        };
        assert_eq!(ids(&desc.apply(&products)), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_active_filter_count() {
        let mut filter = FilterState::default();
        assert_eq!(filter.active_filter_count(), 0);

        filter.set_subcategory("aros");
        filter.search = "   ".to_string();
        assert_eq!(filter.active_filter_count(), 0);

        filter.toggle_category("plata-925");
        filter.toggle_category("enchapado-oro");
        filter.toggle_brand("Luma");
        filter.price_filter = Some(PriceBand::High);
        filter.search = "aro".to_string();
        assert_eq!(filter.active_filter_count(), 5);
    }

    #[test]
    fn test_clear_keeps_sort() {
        let mut filter = FilterState {
            sort_by: SortOrder::PriceDesc,
            search: "lira".to_string(),
            price_filter: Some(PriceBand::Low),
            ..FilterState::default()
        };
        filter.set_subcategory("aros");
        filter.toggle_brand("Luma");
        filter.clear();

        assert_eq!(filter.active_filter_count(), 0);
        assert_eq!(filter.active_subcategory, None);
        assert_eq!(filter.sort_by, SortOrder::PriceDesc);
    }

    #[test]
    fn test_paginate_clamps() {
        let items: Vec<u32> = (1..=10).collect();

        let first = paginate(&items, 8, 0);
        assert_eq!(first.number, 1);
        assert_eq!(first.items, &items[..8]);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = paginate(&items, 8, 2);
        let beyond = paginate(&items, 8, 99);
        assert_eq!(last, beyond);
        assert_eq!(beyond.items, &[9, 10]);
        assert!(!beyond.has_next());
    }

    #[test]
    fn test_paginate_empty() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 8, 3);
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_paginate_exact_multiple() {
        let items: Vec<u32> = (1..=16).collect();
        assert_eq!(paginate(&items, 8, 1).total_pages, 2);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("mid".parse::<PriceBand>().unwrap(), PriceBand::Mid);
        assert!("all".parse::<PriceBand>().is_err());
        assert_eq!("price_desc".parse::<SortOrder>().unwrap(), SortOrder::PriceDesc);
    }
}
