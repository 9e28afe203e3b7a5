//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Catalog IDs are
//! short strings (`"p1"`, `"v-gold"`), so the wrappers own a `String`.

use core::fmt;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use aurelia_core::define_id;
/// define_id!(CollectionId);
/// define_id!(SupplierId);
///
/// let collection = CollectionId::new("verano");
/// let supplier = SupplierId::new("verano");
///
/// // These are different types, so this won't compile:
/// // let _: CollectionId = supplier;
/// # let _ = (collection, supplier);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(VariantId);
define_id!(ShippingMethodId);
define_id!(InstallmentPlanId);

/// Identifier of a cart line.
///
/// Derived deterministically from a product ID and an optional variant ID,
/// so each distinct purchasable combination maps to exactly one line.
/// Lines without a variant use [`LineKey::NO_VARIANT`] in place of the
/// variant ID.
///
/// The key reads `"{product}-{variant}"`. A `-` or `%` inside either ID is
/// percent-escaped, and a variant literally named `default` is escaped too,
/// so distinct lines never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineKey(String);

impl LineKey {
    /// Placeholder used when a line has no variant.
    pub const NO_VARIANT: &'static str = "default";

    /// Separator between the product and variant parts.
    const SEPARATOR: char = '-';

    /// Derive the key for a product and optional variant.
    #[must_use]
    pub fn new(product_id: &ProductId, variant_id: Option<&VariantId>) -> Self {
        let variant = match variant_id.map(VariantId::as_str) {
            None => Cow::Borrowed(Self::NO_VARIANT),
            Some(Self::NO_VARIANT) => Cow::Borrowed("%64efault"),
            Some(v) => escape_part(v),
        };
        Self(format!(
            "{}{}{variant}",
            escape_part(product_id.as_str()),
            Self::SEPARATOR
        ))
    }

    /// Wrap a raw key string, e.g. one received from the display layer.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn escape_part(part: &str) -> Cow<'_, str> {
    if !part.contains(['-', '%']) {
        return Cow::Borrowed(part);
    }
    let mut escaped = String::with_capacity(part.len() + 4);
    for c in part.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '-' => escaped.push_str("%2D"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_key_without_variant_uses_sentinel() {
        let key = LineKey::new(&ProductId::new("p1"), None);
        assert_eq!(key.as_str(), "p1-default");
    }

    #[test]
    fn test_line_key_with_variant() {
        let key = LineKey::new(&ProductId::new("p1"), Some(&VariantId::new("gold")));
        assert_eq!(key.as_str(), "p1-gold");
    }

    #[test]
    fn test_line_keys_differ_per_variant() {
        let product = ProductId::new("p1");
        let gold = LineKey::new(&product, Some(&VariantId::new("gold")));
        let silver = LineKey::new(&product, Some(&VariantId::new("silver")));
        let plain = LineKey::new(&product, None);
        assert_ne!(gold, silver);
        assert_ne!(gold, plain);
    }

    #[test]
    fn test_line_key_escapes_separator_in_ids() {
        let hyphenated = LineKey::new(&ProductId::new("a-x"), None);
        let variant_looks_like_default = LineKey::new(&ProductId::new("a"), Some(&VariantId::new("x-default")));
        assert_ne!(hyphenated, variant_looks_like_default);
        assert_eq!(hyphenated.as_str(), "a%2Dx-default");
        assert_eq!(variant_looks_like_default.as_str(), "a-x%2Ddefault");

        let percent = LineKey::new(&ProductId::new("a%2Dx"), None);
        assert_ne!(percent, hyphenated);
    }

    #[test]
    fn test_variant_named_default_differs_from_no_variant() {
        let product = ProductId::new("p1");
        assert_ne!(
            LineKey::new(&product, Some(&VariantId::new("default"))),
            LineKey::new(&product, None)
        );
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = ProductId::new("p7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"p7\"");
        let parsed: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
