//! Unified error handling.
//!
//! Validation and discount outcomes are not errors in this sense: they are
//! returned as values by the checkout module and shown next to the field
//! that produced them. The types here cover the library boundary: loading
//! configuration, talking to the key-value store, and async lookups.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by a key-value store backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The in-memory store lock was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Errors raised by an async checkout lookup.
///
/// The simulated lookups never fail on their own; a timeout is the only way
/// they produce one. Real backends may report `Unavailable`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The lookup did not finish within the configured timeout.
    #[error("Lookup timed out")]
    Timeout,

    /// The backend could not answer.
    #[error("Lookup unavailable: {0}")]
    Unavailable(String),
}

/// Application-level error type for the storefront library.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storefront_error_display() {
        let err = StorefrontError::from(StorageError::Poisoned);
        assert_eq!(err.to_string(), "Storage error: Storage lock poisoned");
    }

    #[test]
    fn test_lookup_error_unavailable() {
        let err = LookupError::Unavailable("carrier offline".to_string());
        assert_eq!(err.to_string(), "Lookup unavailable: carrier offline");
    }
}
