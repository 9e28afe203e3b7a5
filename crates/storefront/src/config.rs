//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! ## Catalog
//! - `AURELIA_PAGE_SIZE` - Products per catalog page (default: 8)
//! - `AURELIA_DEFAULT_LANGUAGE` - `es` or `ko` (default: es)
//!
//! ## Storage
//! - `AURELIA_CART_STORAGE_KEY` - Key the cart snapshot is stored under (default: `aurelia_cart`)
//! - `AURELIA_LANGUAGE_STORAGE_KEY` - Key the language preference is stored under (default: `aurelia_lang`)
//!
//! ## Checkout
//! - `AURELIA_SHIPPING_LATENCY_MS` - Simulated shipping-method lookup latency (default: 600)
//! - `AURELIA_INSTALLMENTS_LATENCY_MS` - Simulated installment lookup latency (default: 500)
//! - `AURELIA_LOOKUP_TIMEOUT_MS` - Timeout for every async lookup (default: 5000)
//! - `AURELIA_DISCOUNT_CODE` - The recognized discount code (default: AURELIA10)
//! - `AURELIA_DISCOUNT_PERCENT` - Percent taken off the subtotal, 1-100 (default: 10)
//!
//! ## Order requests
//! - `AURELIA_CONTACT_EMAIL` - Mail destination for order requests (default: ventas@aurelia.cl)
//! - `AURELIA_WHATSAPP_NUMBER` - Chat destination, digits only (default: 56900000000)

use std::str::FromStr;
use std::time::Duration;

use aurelia_core::{Email, Language};
use thiserror::Error;

const DEFAULT_PAGE_SIZE: usize = 8;
const DEFAULT_DISCOUNT_CODE: &str = "AURELIA10";
const DEFAULT_DISCOUNT_PERCENT: u32 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable name and the reason its value was rejected.
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, Default)]
pub struct StorefrontConfig {
    /// Catalog display settings
    pub catalog: CatalogConfig,
    /// Storage keys
    pub storage: StorageConfig,
    /// Checkout pipeline settings
    pub checkout: CheckoutConfig,
    /// Order request destinations
    pub order_request: OrderRequestConfig,
}

/// Catalog display settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Products per page
    pub page_size: usize,
    /// Language used before a preference is stored
    pub default_language: Language,
}

/// Fixed keys used in the key-value store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Key for the cart line snapshot
    pub cart_key: String,
    /// Key for the language preference
    pub language_key: String,
}

/// Checkout pipeline settings.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Simulated shipping-method lookup latency
    pub shipping_latency: Duration,
    /// Simulated installment lookup latency
    pub installments_latency: Duration,
    /// Upper bound on any async lookup
    pub lookup_timeout: Duration,
    /// The recognized discount code, uppercased
    pub discount_code: String,
    /// Percent taken off the pre-shipping subtotal
    pub discount_percent: u32,
}

/// Destinations for outbound order requests.
#[derive(Debug, Clone)]
pub struct OrderRequestConfig {
    /// Mail destination (validated on load)
    pub contact_email: String,
    /// Chat destination (international format, digits only)
    pub whatsapp_number: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_language: Language::Es,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cart_key: "aurelia_cart".to_string(),
            language_key: "aurelia_lang".to_string(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            shipping_latency: Duration::from_millis(600),
            installments_latency: Duration::from_millis(500),
            lookup_timeout: Duration::from_secs(5),
            discount_code: DEFAULT_DISCOUNT_CODE.to_string(),
            discount_percent: DEFAULT_DISCOUNT_PERCENT,
        }
    }
}

impl Default for OrderRequestConfig {
    fn default() -> Self {
        Self {
            contact_email: "ventas@aurelia.cl".to_string(),
            whatsapp_number: "56900000000".to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed or is
    /// out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed or is out of range.
    pub fn from_source<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let page_size = parse_or(&get, "AURELIA_PAGE_SIZE", defaults.catalog.page_size)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "AURELIA_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let default_language = parse_or(
            &get,
            "AURELIA_DEFAULT_LANGUAGE",
            defaults.catalog.default_language,
        )?;

        let storage = StorageConfig {
            cart_key: get("AURELIA_CART_STORAGE_KEY").unwrap_or(defaults.storage.cart_key),
            language_key: get("AURELIA_LANGUAGE_STORAGE_KEY")
                .unwrap_or(defaults.storage.language_key),
        };

        let discount_percent = parse_or(
            &get,
            "AURELIA_DISCOUNT_PERCENT",
            defaults.checkout.discount_percent,
        )?;
        if !(1..=100).contains(&discount_percent) {
            return Err(ConfigError::InvalidEnvVar(
                "AURELIA_DISCOUNT_PERCENT".to_string(),
                format!("must be between 1 and 100 (got {discount_percent})"),
            ));
        }
        let discount_code = get("AURELIA_DISCOUNT_CODE")
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .unwrap_or(defaults.checkout.discount_code);

        let checkout = CheckoutConfig {
            shipping_latency: millis_or(
                &get,
                "AURELIA_SHIPPING_LATENCY_MS",
                defaults.checkout.shipping_latency,
            )?,
            installments_latency: millis_or(
                &get,
                "AURELIA_INSTALLMENTS_LATENCY_MS",
                defaults.checkout.installments_latency,
            )?,
            lookup_timeout: millis_or(
                &get,
                "AURELIA_LOOKUP_TIMEOUT_MS",
                defaults.checkout.lookup_timeout,
            )?,
            discount_code,
            discount_percent,
        };

        let contact_email = match get("AURELIA_CONTACT_EMAIL") {
            Some(raw) => Email::parse(&raw)
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("AURELIA_CONTACT_EMAIL".to_string(), e.to_string())
                })?
                .into_inner(),
            None => defaults.order_request.contact_email,
        };
        let whatsapp_number = match get("AURELIA_WHATSAPP_NUMBER") {
            Some(raw) => validate_phone_digits(&raw, "AURELIA_WHATSAPP_NUMBER")?,
            None => defaults.order_request.whatsapp_number,
        };

        Ok(Self {
            catalog: CatalogConfig {
                page_size,
                default_language,
            },
            storage,
            checkout,
            order_request: OrderRequestConfig {
                contact_email,
                whatsapp_number,
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable, falling back to a default when unset.
fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a millisecond duration, falling back to a default when unset.
fn millis_or<F>(get: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Strip a phone number down to digits, rejecting empty results.
fn validate_phone_digits(raw: &str, key: &str) -> Result<String, ConfigError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must contain digits".to_string(),
        ));
    }
    Ok(digits)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StorefrontConfig::from_source(source(&[])).unwrap();
        assert_eq!(config.catalog.page_size, 8);
        assert_eq!(config.catalog.default_language, Language::Es);
        assert_eq!(config.storage.cart_key, "aurelia_cart");
        assert_eq!(config.checkout.discount_code, "AURELIA10");
        assert_eq!(config.checkout.discount_percent, 10);
        assert_eq!(config.checkout.shipping_latency, Duration::from_millis(600));
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_source(source(&[
            ("AURELIA_PAGE_SIZE", "12"),
            ("AURELIA_DEFAULT_LANGUAGE", "ko"),
            ("AURELIA_DISCOUNT_CODE", " verano20 "),
            ("AURELIA_DISCOUNT_PERCENT", "20"),
            ("AURELIA_LOOKUP_TIMEOUT_MS", "250"),
            ("AURELIA_WHATSAPP_NUMBER", "+56 9 1234 5678"),
        ]))
        .unwrap();
        assert_eq!(config.catalog.page_size, 12);
        assert_eq!(config.catalog.default_language, Language::Ko);
        assert_eq!(config.checkout.discount_code, "VERANO20");
        assert_eq!(config.checkout.discount_percent, 20);
        assert_eq!(config.checkout.lookup_timeout, Duration::from_millis(250));
        assert_eq!(config.order_request.whatsapp_number, "56912345678");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = StorefrontConfig::from_source(source(&[("AURELIA_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "AURELIA_PAGE_SIZE"));
    }

    #[test]
    fn test_discount_percent_out_of_range() {
        let result =
            StorefrontConfig::from_source(source(&[("AURELIA_DISCOUNT_PERCENT", "150")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_language() {
        let result = StorefrontConfig::from_source(source(&[("AURELIA_DEFAULT_LANGUAGE", "fr")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_contact_email() {
        let result =
            StorefrontConfig::from_source(source(&[("AURELIA_CONTACT_EMAIL", "ventas-at-aurelia")]));
        assert!(result.is_err());
    }
}
