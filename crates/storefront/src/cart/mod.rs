//! Cart store.
//!
//! Holds the cart lines for one session, keyed by [`LineKey`] so each
//! product/variant pair appears once. Every line mutation is written to the
//! key-value store as a JSON snapshot and published to subscribers.
//! Totals are derived on read, never stored.
//!
//! Storage problems never reach the caller: a missing or unreadable snapshot
//! starts an empty cart, and a failed write is logged and the in-memory
//! state kept.

mod line;

use std::sync::Arc;

use aurelia_core::{Language, LineKey, Price, ProductId, VariantId};
use tokio::sync::watch;
use tracing::instrument;

pub use line::{CartLine, CartSnapshot, LineView};

use crate::catalog::Catalog;
use crate::storage::KeyValueStore;

/// Options for [`CartStore::add_to_cart`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions {
    /// Show the cart drawer after adding.
    pub open_drawer: bool,
}

/// Session cart.
pub struct CartStore {
    catalog: Arc<Catalog>,
    storage: Arc<dyn KeyValueStore>,
    storage_key: String,
    lines: Vec<CartLine>,
    drawer_open: bool,
    changes: watch::Sender<CartSnapshot>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage_key", &self.storage_key)
            .field("lines", &self.lines)
            .field("drawer_open", &self.drawer_open)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store and hydrate it from `storage_key`.
    #[must_use]
    pub fn open(
        catalog: Arc<Catalog>,
        storage: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
    ) -> Self {
        let (changes, _) = watch::channel(CartSnapshot::default());
        let mut store = Self {
            catalog,
            storage,
            storage_key: storage_key.into(),
            lines: Vec::new(),
            drawer_open: false,
            changes,
        };
        store.lines = store.hydrate();
        store.publish();
        store
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product (and variant) to the cart.
    ///
    /// Increments the existing line for the pair, or creates one with
    /// quantity 1. Unknown product IDs are accepted; they contribute nothing
    /// to the subtotal.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn add_to_cart(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        options: AddOptions,
    ) {
        let key = LineKey::new(product_id, variant_id);
        if let Some(line) = self.lines.iter_mut().find(|l| l.key == key) {
            line.quantity = line.quantity.saturating_add(1);
            tracing::debug!(%key, quantity = line.quantity, "Incremented cart line");
        } else {
            self.lines
                .push(CartLine::new(product_id.clone(), variant_id.cloned()));
            tracing::debug!(%key, "Created cart line");
        }

        if options.open_drawer {
            self.drawer_open = true;
        }
        self.persist();
        self.publish();
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// Unknown keys are ignored.
    #[instrument(skip(self), fields(key = %key))]
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) {
        let Ok(quantity) = u32::try_from(quantity.clamp(0, i64::from(u32::MAX))) else {
            return;
        };
        if quantity == 0 {
            self.remove_from_cart(key);
            return;
        }
        let Some(line) = self.lines.iter_mut().find(|l| &l.key == key) else {
            tracing::debug!("Quantity update for unknown line ignored");
            return;
        };
        line.quantity = quantity;
        tracing::debug!(quantity, "Set cart line quantity");
        self.persist();
        self.publish();
    }

    /// Remove a line if present.
    #[instrument(skip(self), fields(key = %key))]
    pub fn remove_from_cart(&mut self, key: &LineKey) {
        let before = self.lines.len();
        self.lines.retain(|l| &l.key != key);
        if self.lines.len() == before {
            return;
        }
        tracing::debug!("Removed cart line");
        self.persist();
        self.publish();
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        tracing::debug!("Cleared cart");
        self.persist();
        self.publish();
    }

    /// Show the cart drawer.
    pub fn open_drawer(&mut self) {
        self.set_drawer(true);
    }

    /// Hide the cart drawer.
    pub fn close_drawer(&mut self) {
        self.set_drawer(false);
    }

    fn set_drawer(&mut self, open: bool) {
        if self.drawer_open != open {
            self.drawer_open = open;
            self.publish();
        }
    }

    /// Replace the in-memory lines with whatever storage now holds.
    ///
    /// Used when another session wrote the same key. Last write wins.
    pub fn reload_from_storage(&mut self) {
        self.lines = self.hydrate();
        self.publish();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by key.
    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.key == key)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the cart drawer is shown.
    #[must_use]
    pub const fn is_drawer_open(&self) -> bool {
        self.drawer_open
    }

    /// Sum of quantities across all lines, including dangling ones.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Sum of `price * quantity` over lines whose product still exists.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines
            .iter()
            .filter_map(|l| {
                self.catalog
                    .get_by_id(&l.product_id)
                    .map(|p| p.price * l.quantity)
            })
            .sum()
    }

    /// Resolve lines for display in `lang`. Dangling lines are skipped.
    #[must_use]
    pub fn line_views(&self, lang: Language) -> Vec<LineView> {
        self.lines
            .iter()
            .filter_map(|line| {
                let Some(product) = self.catalog.get_by_id(&line.product_id) else {
                    tracing::warn!(
                        product_id = %line.product_id,
                        "Cart line references unknown product"
                    );
                    return None;
                };
                let variant_label = line
                    .variant_id
                    .as_ref()
                    .and_then(|id| product.variant(id))
                    .map(|v| self.catalog.label_for(&v.label, lang).to_string());
                Some(LineView {
                    key: line.key.clone(),
                    product_id: product.id.clone(),
                    name: self
                        .catalog
                        .name_for(&product.id, lang)
                        .unwrap_or(product.name.as_str())
                        .to_string(),
                    variant_label,
                    pack_label: self.catalog.label_for(&product.pack_label, lang).to_string(),
                    quantity: line.quantity,
                    unit_price: product.price,
                    line_total: product.price * line.quantity,
                })
            })
            .collect()
    }

    /// Current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            total_items: self.total_items(),
            subtotal: self.subtotal(),
            drawer_open: self.drawer_open,
        }
    }

    /// Receive a snapshot after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.changes.subscribe()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn hydrate(&self) -> Vec<CartLine> {
        let raw = match self.storage.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored cart, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<CartLine>>(&raw) {
            Ok(stored) => normalize(stored),
            Err(e) => {
                tracing::warn!(error = %e, "Stored cart is corrupt, starting empty");
                Vec::new()
            }
        }
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.lines)
            .map_err(crate::error::StorageError::from)
            .and_then(|json| self.storage.set(&self.storage_key, &json));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist cart");
        }
    }

    fn publish(&self) {
        self.changes.send_replace(self.snapshot());
    }
}

/// Re-derive keys, drop empty lines and merge duplicates from a stored
/// snapshot, so hand-edited or stale data cannot break the one-line-per-key
/// invariant.
fn normalize(stored: Vec<CartLine>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());
    for mut line in stored {
        if line.quantity == 0 {
            continue;
        }
        line.key = LineKey::new(&line.product_id, line.variant_id.as_ref());
        if let Some(existing) = lines.iter_mut().find(|l| l.key == line.key) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::data;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;

    const KEY: &str = "aurelia_cart";

    fn store_with(storage: Arc<dyn KeyValueStore>) -> CartStore {
        CartStore::open(Arc::new(data::builtin()), storage, KEY)
    }

    fn empty_store() -> (CartStore, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        (store_with(storage.clone()), storage)
    }

    fn pid(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_same_pair_twice_increments() {
        let (mut cart, _) = empty_store();
        cart.add_to_cart(&pid("p1"), None, AddOptions::default());
        cart.add_to_cart(&pid("p1"), None, AddOptions::default());

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines().first().unwrap().quantity, 2);
        assert_eq!(cart.subtotal(), Price::new(37_800));
    }

    #[test]
    fn test_variants_make_distinct_lines() {
        let (mut cart, _) = empty_store();
        let gold = VariantId::new("gold");
        let silver = VariantId::new("silver");
        cart.add_to_cart(&pid("p1"), Some(&gold), AddOptions::default());
        cart.add_to_cart(&pid("p1"), Some(&silver), AddOptions::default());
        cart.add_to_cart(&pid("p1"), None, AddOptions::default());

        assert_eq!(cart.lines().len(), 3);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_hyphenated_ids_keep_separate_lines() {
        let (mut cart, _) = empty_store();
        cart.add_to_cart(&pid("a-x"), None, AddOptions::default());
        cart.add_to_cart(&pid("a"), Some(&VariantId::new("x-default")), AddOptions::default());

        assert_eq!(cart.lines().len(), 2);
        assert!(cart.lines().iter().all(|l| l.quantity == 1));
    }

    #[test]
    fn test_add_with_open_drawer() {
        let (mut cart, _) = empty_store();
        cart.add_to_cart(&pid("p2"), None, AddOptions::default());
        assert!(!cart.is_drawer_open());
        cart.add_to_cart(&pid("p2"), None, AddOptions { open_drawer: true });
        assert!(cart.is_drawer_open());
    }

    #[test]
    fn test_drawer_toggles_are_idempotent() {
        let (mut cart, _) = empty_store();
        cart.close_drawer();
        assert!(!cart.is_drawer_open());
        cart.open_drawer();
        cart.open_drawer();
        assert!(cart.is_drawer_open());
        cart.close_drawer();
        assert!(!cart.is_drawer_open());
    }

    #[test]
    fn test_update_quantity_sets_exact_value() {
        let (mut cart, _) = empty_store();
        cart.add_to_cart(&pid("p2"), None, AddOptions::default());
        let key = LineKey::new(&pid("p2"), None);

        cart.update_quantity(&key, 5);
        assert_eq!(cart.line(&key).unwrap().quantity, 5);
        cart.update_quantity(&key, 2);
        assert_eq!(cart.line(&key).unwrap().quantity, 2);
    }

    #[test]
    fn test_update_quantity_non_positive_removes() {
        let (mut cart, _) = empty_store();
        cart.add_to_cart(&pid("p2"), None, AddOptions::default());
        cart.add_to_cart(&pid("p4"), None, AddOptions::default());

        cart.update_quantity(&LineKey::new(&pid("p2"), None), 0);
        cart.update_quantity(&LineKey::new(&pid("p4"), None), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unknown_key_is_noop() {
        let (mut cart, _) = empty_store();
        cart.add_to_cart(&pid("p2"), None, AddOptions::default());
        let missing = LineKey::from_raw("nope-default");

        cart.update_quantity(&missing, 4);
        cart.remove_from_cart(&missing);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_dangling_line_counts_items_but_not_subtotal() {
        let (mut cart, _) = empty_store();
        cart.add_to_cart(&pid("p4"), None, AddOptions::default());
        cart.add_to_cart(&pid("retired"), None, AddOptions::default());

        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.subtotal(), Price::new(9_900));
        assert_eq!(cart.line_views(Language::Es).len(), 1);
    }

    #[test]
    fn test_mutations_persist_and_rehydrate() {
        let (mut cart, storage) = empty_store();
        cart.add_to_cart(&pid("p1"), Some(&VariantId::new("gold")), AddOptions::default());
        cart.add_to_cart(&pid("p2"), None, AddOptions::default());
        cart.add_to_cart(&pid("p2"), None, AddOptions::default());

        let reopened = store_with(storage);
        assert_eq!(reopened.lines(), cart.lines());
        assert_eq!(reopened.subtotal(), Price::new(18_900 + 2 * 13_200));
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStore::with_entries([(KEY, "{oops")]));
        let cart = store_with(storage);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_hydrate_normalizes_stored_lines() {
        let stored = r#"[
            {"key":"bogus","product_id":"p2","variant_id":null,"quantity":2},
            {"key":"p2-default","product_id":"p2","variant_id":null,"quantity":1},
            {"key":"p4-default","product_id":"p4","variant_id":null,"quantity":0}
        ]"#;
        let storage = Arc::new(MemoryStore::with_entries([(KEY, stored)]));
        let cart = store_with(storage);

        assert_eq!(cart.lines().len(), 1);
        let line = cart.lines().first().unwrap();
        assert_eq!(line.key.as_str(), "p2-default");
        assert_eq!(line.quantity, 3);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Poisoned)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    #[test]
    fn test_storage_failures_are_absorbed() {
        let mut cart = store_with(Arc::new(FailingStore));
        assert!(cart.is_empty());
        cart.add_to_cart(&pid("p1"), None, AddOptions::default());
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_reload_from_storage_last_write_wins() {
        let storage = Arc::new(MemoryStore::new());
        let mut tab_a = store_with(storage.clone());
        let mut tab_b = store_with(storage);

        tab_a.add_to_cart(&pid("p1"), None, AddOptions::default());
        tab_b.add_to_cart(&pid("p4"), None, AddOptions::default());
        tab_a.reload_from_storage();

        assert_eq!(tab_a.lines(), tab_b.lines());
        assert_eq!(tab_a.subtotal(), Price::new(9_900));
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let (mut cart, _) = empty_store();
        let rx = cart.subscribe();

        cart.add_to_cart(&pid("p1"), None, AddOptions { open_drawer: true });
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.total_items, 1);
        assert_eq!(snapshot.subtotal, Price::new(18_900));
        assert!(snapshot.drawer_open);
    }

    #[test]
    fn test_line_views_localized() {
        let (mut cart, _) = empty_store();
        cart.add_to_cart(&pid("p1"), Some(&VariantId::new("gold")), AddOptions::default());
        cart.add_to_cart(&pid("p1"), Some(&VariantId::new("gold")), AddOptions::default());

        let views = cart.line_views(Language::Ko);
        let view = views.first().unwrap();
        assert_eq!(view.name, "시에나 귀걸이");
        assert_eq!(view.variant_label.as_deref(), Some("골드"));
        assert_eq!(view.pack_label, "6쌍 팩");
        assert_eq!(view.line_total, Price::new(37_800));
    }
}
