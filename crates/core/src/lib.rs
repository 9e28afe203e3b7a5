//! Aurelia Core - Shared types library.
//!
//! This crate provides common types used across the Aurelia storefront:
//! - `storefront` - Catalog queries, cart store and checkout pipeline
//! - `integration-tests` - End-to-end scenarios over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no async runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, languages and stock

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
