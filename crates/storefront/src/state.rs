//! Session state container.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aurelia_core::Language;
use url::Url;

use crate::cart::CartStore;
use crate::catalog::{Catalog, data};
use crate::checkout::{CheckoutSession, LookupServices, SubmitOutcome};
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::services::order_request::{OrderChannel, OrderRequest, OrderRequestError, OrderVia};
use crate::services::preferences::LanguagePreference;
use crate::storage::KeyValueStore;

/// State for one shopper session.
///
/// This struct is cheaply cloneable via `Arc` and bundles the catalog, the
/// cart, the language preference and the lookup services checkout uses.
#[derive(Clone)]
pub struct StorefrontState {
    inner: Arc<StorefrontStateInner>,
}

struct StorefrontStateInner {
    config: StorefrontConfig,
    catalog: Arc<Catalog>,
    cart: Mutex<CartStore>,
    language: LanguagePreference,
    lookups: LookupServices,
}

impl std::fmt::Debug for StorefrontState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontState")
            .field("config", &self.inner.config)
            .field("products", &self.inner.catalog.len())
            .field("language", &self.inner.language)
            .finish_non_exhaustive()
    }
}

impl StorefrontState {
    /// Create the state and hydrate the cart and language from `storage`.
    ///
    /// Uses the simulated lookup services.
    #[must_use]
    pub fn open(config: StorefrontConfig, catalog: Catalog, storage: Arc<dyn KeyValueStore>) -> Self {
        let lookups = LookupServices::simulated(&config.checkout);
        Self::with_lookups(config, catalog, storage, lookups)
    }

    /// Like [`open`](Self::open), with explicit lookup services.
    #[must_use]
    pub fn with_lookups(
        config: StorefrontConfig,
        catalog: Catalog,
        storage: Arc<dyn KeyValueStore>,
        lookups: LookupServices,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let cart = CartStore::open(catalog.clone(), storage.clone(), &config.storage.cart_key);
        let language = LanguagePreference::open(
            storage,
            &config.storage.language_key,
            config.catalog.default_language,
        );
        tracing::debug!(
            products = catalog.len(),
            cart_lines = cart.lines().len(),
            "Storefront state opened"
        );

        Self {
            inner: Arc::new(StorefrontStateInner {
                config,
                catalog,
                cart: Mutex::new(cart),
                language,
                lookups,
            }),
        }
    }

    /// Load configuration from the environment and open the built-in
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn from_env(storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let config = StorefrontConfig::from_env()?;
        Ok(Self::open(config, data::builtin(), storage))
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Catalog page size.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.inner.config.catalog.page_size
    }

    /// Current display language.
    #[must_use]
    pub fn language(&self) -> Language {
        self.inner.language.get()
    }

    pub fn set_language(&self, lang: Language) {
        self.inner.language.set(lang);
    }

    /// Lock the cart for reading or mutation.
    pub fn cart(&self) -> MutexGuard<'_, CartStore> {
        self.inner.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a checkout for the current cart subtotal.
    #[must_use]
    pub fn checkout(&self) -> CheckoutSession {
        let subtotal = self.cart().subtotal();
        CheckoutSession::new(
            &self.inner.config.checkout,
            self.language(),
            subtotal,
            self.inner.lookups.clone(),
        )
    }

    /// Submit a checkout. A confirmed order empties the cart.
    pub fn complete_checkout(&self, session: &mut CheckoutSession) -> SubmitOutcome {
        let outcome = session.submit();
        if matches!(outcome, SubmitOutcome::Confirmed(_)) {
            self.cart().clear();
        }
        outcome
    }

    /// Send the cart to the sales team through `channel`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` when no cart line resolves to a product, or any
    /// error from building the link or opening it.
    pub fn request_order(
        &self,
        via: OrderVia,
        channel: &dyn OrderChannel,
    ) -> std::result::Result<Url, OrderRequestError> {
        let lang = self.language();
        let request = {
            let cart = self.cart();
            OrderRequest::compose(&cart.line_views(lang), cart.subtotal(), lang)
        };
        if request.is_empty() {
            return Err(OrderRequestError::EmptyCart);
        }

        let settings = &self.inner.config.order_request;
        let link = match via {
            OrderVia::Email => request
                .mailto_link(&settings.contact_email, OrderRequest::default_subject(lang))?,
            OrderVia::WhatsApp => request.whatsapp_link(&settings.whatsapp_number)?,
        };
        channel.open(&link)?;
        tracing::info!(?via, items = request.lines.len(), "Order request sent");
        Ok(link)
    }
}
