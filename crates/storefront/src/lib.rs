//! Aurelia storefront library.
//!
//! The storefront core for a bilingual (Spanish/Korean) wholesale jewelry
//! shop: the product catalog and its query engine, the persisted cart, and
//! the gated checkout pipeline.
//!
//! # Modules
//!
//! - [`catalog`] - Product data, translations, filtering and pagination
//! - [`cart`] - Cart lines, totals and persistence
//! - [`checkout`] - Staged checkout form, lookups, discounts and submission
//! - [`services`] - Order requests and the language preference
//! - [`state`] - The per-session state container

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filters;
pub mod services;
pub mod state;
pub mod storage;
pub mod telemetry;

pub use config::StorefrontConfig;
pub use error::{Result, StorefrontError};
pub use state::StorefrontState;
