//! Storefront services.
//!
//! # Services
//!
//! - `order_request` - Send the cart to the sales team by email or WhatsApp
//! - `preferences` - Persisted display language

pub mod order_request;
pub mod preferences;

pub use order_request::{OrderChannel, OrderRequest, OrderRequestError, OrderVia, RecordingChannel};
pub use preferences::LanguagePreference;
