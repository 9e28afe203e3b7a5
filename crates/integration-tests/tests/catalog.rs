//! Catalog scenarios over the built-in product list.

use aurelia_core::Price;
use aurelia_integration_tests::memory_session;
use aurelia_storefront::catalog::{FilterState, PriceBand, SortOrder, paginate};

fn ids(products: &[&aurelia_storefront::catalog::Product]) -> Vec<String> {
    products.iter().map(|p| p.id.to_string()).collect()
}

#[test]
fn test_low_band_has_five_products() {
    let state = memory_session();
    let filter = FilterState {
        price_filter: Some(PriceBand::Low),
        ..FilterState::default()
    };
    let result = filter.apply(state.catalog().all());
    assert_eq!(result.len(), 5);
    assert!(result.iter().all(|p| p.price <= Price::new(20_000)));
}

#[test]
fn test_mid_band_has_four_products() {
    let state = memory_session();
    let filter = FilterState {
        price_filter: Some(PriceBand::Mid),
        ..FilterState::default()
    };
    assert_eq!(filter.apply(state.catalog().all()).len(), 4);
}

#[test]
fn test_high_band_has_the_set() {
    let state = memory_session();
    let filter = FilterState {
        price_filter: Some(PriceBand::High),
        ..FilterState::default()
    };
    let result = filter.apply(state.catalog().all());
    assert_eq!(result.len(), 1);
    assert_eq!(result.first().map(|p| p.price), Some(Price::new(98_500)));
}

#[test]
fn test_search_matches_name_and_description() {
    let state = memory_session();
    let filter = FilterState {
        search: "  SIENA ".to_string(),
        ..FilterState::default()
    };
    assert_eq!(ids(&filter.apply(state.catalog().all())), vec!["p1", "p6"]);

    let nothing = FilterState {
        search: "diamante".to_string(),
        ..FilterState::default()
    };
    assert!(nothing.apply(state.catalog().all()).is_empty());
}

#[test]
fn test_sorted_pages() {
    let state = memory_session();
    let filter = FilterState {
        sort_by: SortOrder::PriceDesc,
        ..FilterState::default()
    };
    let sorted = filter.apply(state.catalog().all());

    let first = paginate(&sorted, state.page_size(), 1);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items.len(), 8);
    assert_eq!(first.items.first().map(|p| p.id.as_str()), Some("p10"));

    let last = paginate(&sorted, state.page_size(), 99);
    assert_eq!(last.number, 2);
    assert_eq!(ids(last.items), vec!["p2", "p4"]);
}

#[test]
fn test_filters_combine_and_clear() {
    let state = memory_session();
    let mut filter = FilterState::default();
    filter.set_subcategory("aros");
    filter.toggle_brand("Nácar");
    filter.search = "perla".to_string();
    assert_eq!(filter.active_filter_count(), 2);
    assert_eq!(ids(&filter.apply(state.catalog().all())), vec!["p5"]);

    filter.clear();
    assert_eq!(filter.apply(state.catalog().all()).len(), 10);
}
