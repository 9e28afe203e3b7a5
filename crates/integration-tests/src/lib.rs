//! Integration tests for the Aurelia storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aurelia-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Price bands, search and pagination over the built-in catalog
//! - `cart` - Cart totals and persistence across sessions
//! - `checkout` - Full checkout runs, from contact to submission

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use aurelia_storefront::StorefrontConfig;
use aurelia_storefront::StorefrontState;
use aurelia_storefront::catalog::data;
use aurelia_storefront::storage::{KeyValueStore, MemoryStore};

/// A session over the built-in catalog with in-memory storage.
#[must_use]
pub fn memory_session() -> StorefrontState {
    session_with(Arc::new(MemoryStore::new()))
}

/// A session over the built-in catalog with the given storage.
#[must_use]
pub fn session_with(storage: Arc<dyn KeyValueStore>) -> StorefrontState {
    StorefrontState::open(StorefrontConfig::default(), data::builtin(), storage)
}
