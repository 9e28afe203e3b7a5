//! Per-language overrides for catalog text.
//!
//! The catalog is authored in Spanish. Other languages supply overrides keyed
//! by product ID (names, descriptions) or by the raw Spanish label (variant,
//! pack and category labels). A missing override means "use the base text".

use std::collections::HashMap;

use aurelia_core::{Language, ProductId};

/// Translation tables.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    names: HashMap<Language, HashMap<ProductId, String>>,
    descriptions: HashMap<Language, HashMap<ProductId, String>>,
    labels: HashMap<Language, HashMap<String, String>>,
}

impl Translations {
    /// Create empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product name override.
    pub fn insert_name(&mut self, lang: Language, id: &str, name: &str) {
        self.names
            .entry(lang)
            .or_default()
            .insert(ProductId::new(id), name.to_string());
    }

    /// Add a product description override.
    pub fn insert_description(&mut self, lang: Language, id: &str, description: &str) {
        self.descriptions
            .entry(lang)
            .or_default()
            .insert(ProductId::new(id), description.to_string());
    }

    /// Add a label override.
    pub fn insert_label(&mut self, lang: Language, raw: &str, label: &str) {
        self.labels
            .entry(lang)
            .or_default()
            .insert(raw.to_string(), label.to_string());
    }

    pub(crate) fn name(&self, id: &ProductId, lang: Language) -> Option<&str> {
        self.names.get(&lang)?.get(id).map(String::as_str)
    }

    pub(crate) fn description(&self, id: &ProductId, lang: Language) -> Option<&str> {
        self.descriptions.get(&lang)?.get(id).map(String::as_str)
    }

    pub(crate) fn label(&self, raw: &str, lang: Language) -> Option<&str> {
        self.labels.get(&lang)?.get(raw).map(String::as_str)
    }
}
