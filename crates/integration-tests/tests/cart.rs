//! Cart scenarios across sessions and storage backends.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use aurelia_core::{Language, LineKey, Price, ProductId, VariantId};
use aurelia_integration_tests::{memory_session, session_with};
use aurelia_storefront::cart::AddOptions;
use aurelia_storefront::filters::format_price;
use aurelia_storefront::storage::{JsonFileStore, KeyValueStore, MemoryStore};

#[test]
fn test_two_products_subtotal() {
    let state = memory_session();
    let mut cart = state.cart();
    let siena = ProductId::new("p1");
    let lira = ProductId::new("p2");

    cart.add_to_cart(&siena, None, AddOptions::default());
    cart.add_to_cart(&siena, None, AddOptions::default());
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.subtotal(), Price::new(37_800));

    cart.add_to_cart(&lira, None, AddOptions { open_drawer: true });
    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.subtotal(), Price::new(51_000));
    assert_eq!(cart.total_items(), 3);
    assert!(cart.is_drawer_open());
    assert_eq!(format_price(cart.subtotal(), Language::Es), "$51.000");
}

#[test]
fn test_cart_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storefront.json");

    {
        let state = session_with(Arc::new(JsonFileStore::new(&path)));
        let mut cart = state.cart();
        cart.add_to_cart(&ProductId::new("p7"), Some(&VariantId::new("silver")), AddOptions::default());
        cart.add_to_cart(&ProductId::new("p4"), None, AddOptions::default());
        cart.update_quantity(&LineKey::new(&ProductId::new("p4"), None), 3);
    }

    let state = session_with(Arc::new(JsonFileStore::new(&path)));
    let cart = state.cart();
    assert_eq!(cart.total_items(), 4);
    assert_eq!(cart.subtotal(), Price::new(27_500 + 3 * 9_900));

    let views = cart.line_views(Language::Ko);
    let names: Vec<_> = views.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["오로라 팔찌", "알바 목걸이"]);
}

#[test]
fn test_corrupt_storage_starts_empty() {
    let storage = Arc::new(MemoryStore::with_entries([("aurelia_cart", "not json")]));
    let state = session_with(storage.clone());
    assert!(state.cart().is_empty());

    state
        .cart()
        .add_to_cart(&ProductId::new("p9"), None, AddOptions::default());
    let stored = storage.get("aurelia_cart").unwrap().unwrap();
    let lines: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(lines.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_corrupt_cart_file_is_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storefront.json");
    std::fs::write(&path, "{not json").unwrap();

    {
        let state = session_with(Arc::new(JsonFileStore::new(&path)));
        assert!(state.cart().is_empty());
        state
            .cart()
            .add_to_cart(&ProductId::new("p4"), None, AddOptions::default());
    }

    let state = session_with(Arc::new(JsonFileStore::new(&path)));
    assert_eq!(state.cart().total_items(), 1);
}

#[test]
fn test_dangling_lines_are_tolerated() {
    let stored = r#"[{"key":"gone-default","product_id":"gone","variant_id":null,"quantity":4},
                    {"key":"p2-default","product_id":"p2","variant_id":null,"quantity":1}]"#;
    let state = session_with(Arc::new(MemoryStore::with_entries([("aurelia_cart", stored)])));
    let cart = state.cart();
    assert_eq!(cart.total_items(), 5);
    assert_eq!(cart.subtotal(), Price::new(13_200));
}

#[test]
fn test_other_session_writes_are_picked_up_on_reload() {
    let storage = Arc::new(MemoryStore::new());
    let tab_a = session_with(storage.clone());
    let tab_b = session_with(storage);
    let mut changes = tab_a.cart().subscribe();

    tab_b
        .cart()
        .add_to_cart(&ProductId::new("p10"), None, AddOptions::default());
    tab_a.cart().reload_from_storage();

    assert!(changes.has_changed().unwrap());
    let snapshot = changes.borrow_and_update().clone();
    assert_eq!(snapshot.total_items, 1);
    assert_eq!(snapshot.subtotal, Price::new(98_500));
}
