//! Shopper language preference.

use std::sync::{Arc, PoisonError, RwLock};

use aurelia_core::Language;

use crate::storage::KeyValueStore;

/// The chosen display language, persisted under a fixed key.
///
/// Stored as the bare language tag (`es`, `ko`). A missing or unrecognized
/// value falls back to the configured default.
pub struct LanguagePreference {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    current: RwLock<Language>,
}

impl std::fmt::Debug for LanguagePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguagePreference")
            .field("key", &self.key)
            .field("current", &self.get())
            .finish_non_exhaustive()
    }
}

impl LanguagePreference {
    /// Load the stored preference.
    #[must_use]
    pub fn open(storage: Arc<dyn KeyValueStore>, key: impl Into<String>, default: Language) -> Self {
        let key = key.into();
        let current = match storage.get(&key) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored language preference ignored");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read language preference");
                default
            }
        };
        Self {
            storage,
            key,
            current: RwLock::new(current),
        }
    }

    /// Current language.
    #[must_use]
    pub fn get(&self) -> Language {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change and persist the language. Storage failures are logged; the
    /// in-memory choice still applies.
    pub fn set(&self, lang: Language) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = lang;
        if let Err(e) = self.storage.set(&self.key, lang.tag()) {
            tracing::warn!(error = %e, "Failed to persist language preference");
        }
        tracing::debug!(%lang, "Language changed");
    }
}
