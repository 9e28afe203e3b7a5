//! Checkout pipeline.
//!
//! A [`CheckoutSession`] is a four-stage, forward-only form:
//!
//! 1. Contact: always enabled; complete once the email validates on blur.
//! 2. Shipping address: enabled after contact; six required fields.
//! 3. Shipping method: enabled once the address is valid. A lookup starts
//!    automatically and pre-selects the first method.
//! 4. Payment: enabled once a method is selected.
//!
//! Event handlers (`set_*`, `blur_*`, `apply_discount`, `submit`) are
//! synchronous. The two lookups run as tokio tasks and report back over a
//! channel; call [`CheckoutSession::poll_lookups`] or
//! [`CheckoutSession::settle`] to apply their results. Every lookup carries a
//! generation number, so a result that arrives after its input changed is
//! dropped.
//!
//! # Modules
//!
//! - [`discount`] - The percentage discount code
//! - [`lookup`] - Shipping-rate and installment-plan services
//! - [`validation`] - Field validators and their messages

pub mod discount;
pub mod lookup;
pub mod validation;

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use aurelia_core::{CheckoutStage, InstallmentPlanId, Language, PaymentMethod, Price, ShippingMethodId};
use futures::FutureExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::instrument;

pub use discount::{DiscountError, DiscountRule};
pub use lookup::{
    InstallmentOption, InstallmentPlans, LookupFuture, ShippingMethod, ShippingRates,
    SimulatedInstallmentPlans, SimulatedShippingRates,
};
pub use validation::FieldError;

use crate::config::CheckoutConfig;
use crate::error::LookupError;

/// Account hint substrings, matched case-insensitively against the email.
const ACCOUNT_HINT_MARKERS: [&str; 2] = ["aurelia", "cliente"];

// =============================================================================
// Form Types
// =============================================================================

/// Every input the session validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Contact email.
    Email,
    FirstName,
    LastName,
    /// Street and number.
    Address,
    PostalCode,
    City,
    /// Region. Drives the shipping-method lookup.
    Province,
    /// Selected shipping method.
    ShippingMethod,
    /// Name on the card.
    HolderName,
    /// Card number. Its first six digits drive the installment lookup.
    CardNumber,
    /// Card expiry as `MM/YY`.
    Expiry,
    Cvc,
    /// Selected installment plan.
    Installment,
    /// Billing street, when it differs from shipping.
    BillingAddress,
    /// Billing city, when it differs from shipping.
    BillingCity,
}

impl Field {
    /// Shipping address fields in submission order.
    pub const ADDRESS: [Self; 6] = [
        Self::FirstName,
        Self::LastName,
        Self::Address,
        Self::PostalCode,
        Self::City,
        Self::Province,
    ];

    /// Stage the field belongs to.
    #[must_use]
    pub const fn stage(self) -> CheckoutStage {
        match self {
            Self::Email => CheckoutStage::Contact,
            Self::FirstName
            | Self::LastName
            | Self::Address
            | Self::PostalCode
            | Self::City
            | Self::Province => CheckoutStage::ShippingAddress,
            Self::ShippingMethod => CheckoutStage::ShippingMethod,
            Self::HolderName
            | Self::CardNumber
            | Self::Expiry
            | Self::Cvc
            | Self::Installment
            | Self::BillingAddress
            | Self::BillingCity => CheckoutStage::Payment,
        }
    }
}

/// Shipping address inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    /// Street and number.
    pub address: String,
    /// At least four characters.
    pub postal_code: String,
    pub city: String,
    /// Region name as typed. Matching is trimmed and case-insensitive.
    pub province: String,
    /// Remember the address for next time. Not validated.
    pub save_info: bool,
}

impl ShippingAddress {
    /// Current value of an address field. Empty for non-address fields.
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Address => &self.address,
            Field::PostalCode => &self.postal_code,
            Field::City => &self.city,
            Field::Province => &self.province,
            _ => "",
        }
    }

    fn slot(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::FirstName => Some(&mut self.first_name),
            Field::LastName => Some(&mut self.last_name),
            Field::Address => Some(&mut self.address),
            Field::PostalCode => Some(&mut self.postal_code),
            Field::City => Some(&mut self.city),
            Field::Province => Some(&mut self.province),
            _ => None,
        }
    }

    /// Validate one address field.
    #[must_use]
    pub fn validate(&self, field: Field) -> Option<FieldError> {
        let value = self.value(field);
        if field == Field::PostalCode {
            validation::validate_postal_code(value)
        } else {
            validation::validate_required(value)
        }
    }

    /// Whether all six fields validate.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        Field::ADDRESS.iter().all(|&f| self.validate(f).is_none())
    }
}

/// Payment inputs. Card number and CVC never leave their secret wrappers
/// outside validation.
#[derive(Debug)]
pub struct PaymentForm {
    /// Card or external wallet.
    pub method: PaymentMethod,
    /// Name on the card.
    pub holder_name: String,
    /// Card number as typed, spaces included.
    pub card_number: SecretString,
    /// `MM/YY`.
    pub expiry: String,
    pub cvc: SecretString,
    /// Chosen plan, pre-selected when plans load.
    pub installment: Option<InstallmentPlanId>,
    /// When set, the billing fields are ignored.
    pub billing_same_as_shipping: bool,
    pub billing_address: String,
    pub billing_city: String,
}

impl Default for PaymentForm {
    fn default() -> Self {
        Self {
            method: PaymentMethod::default(),
            holder_name: String::new(),
            card_number: SecretString::from(String::new()),
            expiry: String::new(),
            cvc: SecretString::from(String::new()),
            installment: None,
            billing_same_as_shipping: true,
            billing_address: String::new(),
            billing_city: String::new(),
        }
    }
}

/// Amounts shown in the order summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub subtotal: Price,
    pub shipping: Price,
    pub discount: Price,
    /// `subtotal + shipping - discount`.
    pub total: Price,
}

/// Result of [`CheckoutSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Every check passed; go to the confirmation page.
    Confirmed(OrderSummary),
    /// Wallet payment chosen; hand off to the wallet without card checks.
    RedirectToWallet(OrderSummary),
    /// The first failing check.
    Blocked {
        stage: CheckoutStage,
        field: Field,
        error: FieldError,
    },
}

// =============================================================================
// Lookup Plumbing
// =============================================================================

/// Services the session calls out to.
#[derive(Clone)]
pub struct LookupServices {
    pub shipping: Arc<dyn ShippingRates>,
    pub installments: Arc<dyn InstallmentPlans>,
}

impl LookupServices {
    /// Simulated services with the configured latencies.
    #[must_use]
    pub fn simulated(config: &CheckoutConfig) -> Self {
        Self {
            shipping: SimulatedShippingRates::shared(config.shipping_latency),
            installments: SimulatedInstallmentPlans::shared(config.installments_latency),
        }
    }
}

fn province_key(province: &str) -> String {
    province.trim().to_lowercase()
}

enum LookupEvent {
    Shipping {
        generation: u64,
        result: Result<Vec<ShippingMethod>, LookupError>,
    },
    Installments {
        generation: u64,
        result: Result<Vec<InstallmentOption>, LookupError>,
    },
}

/// State of one kind of lookup.
struct LookupSlot<T> {
    generation: u64,
    loading: bool,
    /// Input the current items or in-flight request belong to.
    key: Option<String>,
    task: Option<JoinHandle<()>>,
    items: Vec<T>,
    error: Option<LookupError>,
}

impl<T> Default for LookupSlot<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            loading: false,
            key: None,
            task: None,
            items: Vec::new(),
            error: None,
        }
    }
}

impl<T> LookupSlot<T> {
    /// Drop results and abort any in-flight request.
    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.loading = false;
        self.key = None;
        self.items.clear();
        self.error = None;
    }

    fn begin(&mut self, key: String) -> u64 {
        self.invalidate();
        self.loading = true;
        self.key = Some(key);
        self.generation
    }

    /// Apply a result if it belongs to the current request.
    fn finish(&mut self, generation: u64, result: Result<Vec<T>, LookupError>) -> bool {
        if generation != self.generation || !self.loading {
            return false;
        }
        self.loading = false;
        self.task = None;
        match result {
            Ok(items) => self.items = items,
            Err(e) => self.error = Some(e),
        }
        true
    }
}

// =============================================================================
// Session
// =============================================================================

/// One shopper's pass through checkout.
pub struct CheckoutSession {
    lang: Language,
    subtotal: Price,
    discount_rule: DiscountRule,
    lookup_timeout: Duration,
    services: LookupServices,

    email: String,
    contact_complete: bool,
    address: ShippingAddress,
    shipping: LookupSlot<ShippingMethod>,
    selected_method: Option<ShippingMethodId>,
    payment: PaymentForm,
    installments: LookupSlot<InstallmentOption>,

    discount_code: String,
    discount: Price,
    discount_error: Option<DiscountError>,

    errors: BTreeMap<Field, FieldError>,
    failed_stage: Option<CheckoutStage>,

    events_tx: mpsc::UnboundedSender<LookupEvent>,
    events_rx: mpsc::UnboundedReceiver<LookupEvent>,
}

impl std::fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("lang", &self.lang)
            .field("subtotal", &self.subtotal)
            .field("stage", &self.stage())
            .field("address", &self.address)
            .field("selected_method", &self.selected_method)
            .field("payment", &self.payment)
            .field("discount", &self.discount)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl CheckoutSession {
    /// Start a checkout for a cart subtotal.
    #[must_use]
    pub fn new(
        config: &CheckoutConfig,
        lang: Language,
        subtotal: Price,
        services: LookupServices,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            lang,
            subtotal,
            discount_rule: DiscountRule::new(&config.discount_code, config.discount_percent),
            lookup_timeout: config.lookup_timeout,
            services,
            email: String::new(),
            contact_complete: false,
            address: ShippingAddress::default(),
            shipping: LookupSlot::default(),
            selected_method: None,
            payment: PaymentForm::default(),
            installments: LookupSlot::default(),
            discount_code: String::new(),
            discount: Price::ZERO,
            discount_error: None,
            errors: BTreeMap::new(),
            failed_stage: None,
            events_tx,
            events_rx,
        }
    }

    // =========================================================================
    // Stage Gating
    // =========================================================================

    /// Whether a stage's fields accept input.
    #[must_use]
    pub fn is_enabled(&self, stage: CheckoutStage) -> bool {
        match stage {
            CheckoutStage::Contact => true,
            CheckoutStage::ShippingAddress => self.contact_complete,
            CheckoutStage::ShippingMethod => self.contact_complete && self.address.is_complete(),
            CheckoutStage::Payment => {
                self.is_enabled(CheckoutStage::ShippingMethod) && self.selected_method.is_some()
            }
        }
    }

    /// Furthest enabled stage.
    #[must_use]
    pub fn stage(&self) -> CheckoutStage {
        [
            CheckoutStage::Payment,
            CheckoutStage::ShippingMethod,
            CheckoutStage::ShippingAddress,
        ]
        .into_iter()
        .find(|&s| self.is_enabled(s))
        .unwrap_or(CheckoutStage::Contact)
    }

    /// Stage whose check stopped the last submission.
    #[must_use]
    pub const fn failed_stage(&self) -> Option<CheckoutStage> {
        self.failed_stage
    }

    /// Current error for a field.
    #[must_use]
    pub fn error(&self, field: Field) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    /// Localized message for a field's current error.
    #[must_use]
    pub fn error_message(&self, field: Field) -> Option<&'static str> {
        self.error(field).map(|e| e.message(self.lang))
    }

    fn record(&mut self, field: Field, error: Option<FieldError>) -> Option<FieldError> {
        match error {
            Some(e) => {
                self.errors.insert(field, e);
            }
            None => {
                self.errors.remove(&field);
            }
        }
        error
    }

    // =========================================================================
    // Contact
    // =========================================================================

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.email = value.into();
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Validate the email. A valid email completes the contact stage.
    #[instrument(skip(self))]
    pub fn blur_email(&mut self) -> Option<FieldError> {
        let error = self.record(Field::Email, validation::validate_email(&self.email));
        let complete = error.is_none();
        if complete != self.contact_complete {
            tracing::debug!(complete, "Contact stage changed");
        }
        self.contact_complete = complete;
        error
    }

    /// Whether the contact stage is complete.
    #[must_use]
    pub const fn contact_complete(&self) -> bool {
        self.contact_complete
    }

    /// Whether to suggest signing in to an existing account.
    ///
    /// A substring heuristic on the email, not an account check.
    #[must_use]
    pub fn account_hint(&self) -> bool {
        let email = self.email.to_lowercase();
        self.contact_complete && ACCOUNT_HINT_MARKERS.iter().any(|m| email.contains(m))
    }

    // =========================================================================
    // Shipping Address
    // =========================================================================

    #[must_use]
    pub const fn address(&self) -> &ShippingAddress {
        &self.address
    }

    /// Edit an address field. Returns `false` while the stage is disabled.
    ///
    /// Changing the province drops the offered methods and any lookup in
    /// flight, since methods depend on it.
    #[instrument(skip(self, value))]
    pub fn set_address_field(&mut self, field: Field, value: impl Into<String>) -> bool {
        if !self.is_enabled(CheckoutStage::ShippingAddress) {
            return false;
        }
        let value = value.into();
        let Some(slot) = self.address.slot(field) else {
            return false;
        };
        *slot = value;

        // Methods belong to the province they were fetched for.
        if field == Field::Province
            && self.shipping.key.is_some()
            && self.shipping.key != Some(province_key(&self.address.province))
        {
            self.reset_shipping();
        }
        self.request_shipping_methods();
        true
    }

    pub fn set_save_info(&mut self, save_info: bool) {
        self.address.save_info = save_info;
    }

    /// Validate one address field.
    pub fn blur_address_field(&mut self, field: Field) -> Option<FieldError> {
        if self.address.slot(field).is_none() {
            return None;
        }
        let error = self.record(field, self.address.validate(field));
        self.request_shipping_methods();
        error
    }

    // =========================================================================
    // Shipping Method
    // =========================================================================

    /// Methods offered for the current address.
    #[must_use]
    pub fn shipping_methods(&self) -> &[ShippingMethod] {
        &self.shipping.items
    }

    #[must_use]
    pub const fn is_loading_shipping(&self) -> bool {
        self.shipping.loading
    }

    /// Failure of the last shipping lookup, if any.
    #[must_use]
    pub const fn shipping_lookup_error(&self) -> Option<&LookupError> {
        self.shipping.error.as_ref()
    }

    /// Choose an offered method. Returns `false` for unknown IDs or while
    /// the stage is disabled.
    pub fn select_shipping_method(&mut self, id: &ShippingMethodId) -> bool {
        if !self.is_enabled(CheckoutStage::ShippingMethod)
            || !self.shipping.items.iter().any(|m| &m.id == id)
        {
            return false;
        }
        self.selected_method = Some(id.clone());
        self.errors.remove(&Field::ShippingMethod);
        tracing::debug!(method = %id, "Shipping method selected");
        true
    }

    #[must_use]
    pub fn selected_shipping_method(&self) -> Option<&ShippingMethod> {
        let id = self.selected_method.as_ref()?;
        self.shipping.items.iter().find(|m| &m.id == id)
    }

    /// Start a shipping lookup if the address is valid and none is loaded
    /// or in flight. A failed lookup is retried on the next trigger.
    fn request_shipping_methods(&mut self) {
        if !self.is_enabled(CheckoutStage::ShippingMethod)
            || self.shipping.loading
            || !self.shipping.items.is_empty()
        {
            return;
        }
        let province = self.address.province.trim().to_string();
        let generation = self.shipping.begin(province_key(&province));
        tracing::debug!(generation, "Requesting shipping methods");

        let future = self.services.shipping.methods_for(&province, self.lang);
        match self.spawn_lookup(future, move |result| LookupEvent::Shipping { generation, result }) {
            Ok(task) => self.shipping.task = Some(task),
            Err(e) => {
                self.shipping.finish(generation, Err(e));
            }
        }
    }

    fn reset_shipping(&mut self) {
        self.shipping.invalidate();
        if self.selected_method.take().is_some() {
            tracing::debug!("Shipping method cleared after address change");
        }
    }

    // =========================================================================
    // Payment
    // =========================================================================

    #[must_use]
    pub const fn payment(&self) -> &PaymentForm {
        &self.payment
    }

    /// Choose card or wallet. Returns `false` while the stage is disabled.
    pub fn set_payment_method(&mut self, method: PaymentMethod) -> bool {
        self.edit_payment(|p| p.method = method)
    }

    pub fn set_holder_name(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        self.edit_payment(|p| p.holder_name = value)
    }

    pub fn set_card_number(&mut self, value: impl Into<String>) -> bool {
        let value = SecretString::from(value.into());
        self.edit_payment(|p| p.card_number = value)
    }

    pub fn set_expiry(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        self.edit_payment(|p| p.expiry = value)
    }

    pub fn set_cvc(&mut self, value: impl Into<String>) -> bool {
        let value = SecretString::from(value.into());
        self.edit_payment(|p| p.cvc = value)
    }

    pub fn set_billing_same_as_shipping(&mut self, same: bool) -> bool {
        self.edit_payment(|p| p.billing_same_as_shipping = same)
    }

    pub fn set_billing_address(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        self.edit_payment(|p| p.billing_address = value)
    }

    pub fn set_billing_city(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        self.edit_payment(|p| p.billing_city = value)
    }

    fn edit_payment(&mut self, edit: impl FnOnce(&mut PaymentForm)) -> bool {
        if !self.payment_enabled() {
            return false;
        }
        edit(&mut self.payment);
        true
    }

    /// Choose an offered installment plan.
    pub fn select_installment(&mut self, id: &InstallmentPlanId) -> bool {
        if !self.payment_enabled() || !self.installments.items.iter().any(|p| &p.id == id) {
            return false;
        }
        self.payment.installment = Some(id.clone());
        self.errors.remove(&Field::Installment);
        true
    }

    /// Plans offered for the current card.
    #[must_use]
    pub fn installment_options(&self) -> &[InstallmentOption] {
        &self.installments.items
    }

    #[must_use]
    pub const fn is_loading_installments(&self) -> bool {
        self.installments.loading
    }

    #[must_use]
    pub const fn installment_lookup_error(&self) -> Option<&LookupError> {
        self.installments.error.as_ref()
    }

    fn payment_enabled(&self) -> bool {
        self.is_enabled(CheckoutStage::Payment)
    }

    /// Validate the card number and, with enough digits, look up plans.
    ///
    /// Plans depend on the leading digits only: the same prefix never starts
    /// a second lookup, a different prefix replaces the one in flight.
    #[instrument(skip(self))]
    pub fn blur_card_number(&mut self) -> Option<FieldError> {
        let raw = self.payment.card_number.expose_secret();
        let error = validation::validate_card_number(raw);
        let digits = validation::card_digits(raw);
        let error = self.record(Field::CardNumber, error);

        let prefix: String = digits.chars().take(validation::INSTALLMENT_PREFIX_LEN).collect();
        if prefix.len() < validation::INSTALLMENT_PREFIX_LEN {
            if self.installments.key.is_some() {
                self.installments.invalidate();
                self.payment.installment = None;
            }
            return error;
        }
        if self.installments.key.as_deref() == Some(prefix.as_str())
            && self.installments.error.is_none()
        {
            return error;
        }

        self.payment.installment = None;
        let generation = self.installments.begin(prefix.clone());
        tracing::debug!(generation, "Requesting installment plans");
        let future = self.services.installments.plans_for(&prefix, self.lang);
        match self.spawn_lookup(future, move |result| LookupEvent::Installments {
            generation,
            result,
        }) {
            Ok(task) => self.installments.task = Some(task),
            Err(e) => {
                self.installments.finish(generation, Err(e));
            }
        }
        error
    }

    /// Validate one of the other payment fields.
    pub fn blur_payment_field(&mut self, field: Field) -> Option<FieldError> {
        let error = match field {
            Field::CardNumber => return self.blur_card_number(),
            Field::HolderName => validation::validate_required(&self.payment.holder_name),
            Field::Expiry => validation::validate_expiry(&self.payment.expiry),
            Field::Cvc => validation::validate_cvc(self.payment.cvc.expose_secret()),
            Field::Installment => validation::validate_installment(
                !self.installments.items.is_empty(),
                self.payment.installment.is_some(),
            ),
            Field::BillingAddress if !self.payment.billing_same_as_shipping => {
                validation::validate_billing(&self.payment.billing_address)
            }
            Field::BillingCity if !self.payment.billing_same_as_shipping => {
                validation::validate_billing(&self.payment.billing_city)
            }
            _ => return None,
        };
        self.record(field, error)
    }

    // =========================================================================
    // Discount and Totals
    // =========================================================================

    /// Apply a discount code to the subtotal.
    ///
    /// On failure the discount resets to zero and the error is kept for
    /// display.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError` for a blank or unrecognized code.
    pub fn apply_discount(&mut self, code: &str) -> Result<Price, DiscountError> {
        self.discount_code = code.trim().to_uppercase();
        let result = self.discount_rule.apply(code, self.subtotal);
        match result {
            Ok(amount) => {
                self.discount = amount;
                self.discount_error = None;
                tracing::debug!(amount = %amount, "Discount applied");
            }
            Err(e) => {
                self.discount = Price::ZERO;
                self.discount_error = Some(e);
            }
        }
        result
    }

    #[must_use]
    pub fn discount_code(&self) -> &str {
        &self.discount_code
    }

    #[must_use]
    pub const fn discount_error(&self) -> Option<DiscountError> {
        self.discount_error
    }

    /// Subtotal, shipping, discount and total.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        let shipping = self
            .selected_shipping_method()
            .map_or(Price::ZERO, |m| m.amount);
        OrderSummary {
            subtotal: self.subtotal,
            shipping,
            discount: self.discount,
            total: self.subtotal + shipping - self.discount,
        }
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.summary().total
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Run every check in order and stop at the first failure.
    ///
    /// The failing field's error is recorded and its stage marked failed.
    #[instrument(skip(self))]
    pub fn submit(&mut self) -> SubmitOutcome {
        self.failed_stage = None;
        if let Some((field, error)) = self.first_failure() {
            self.errors.insert(field, error);
            let stage = field.stage();
            self.failed_stage = Some(stage);
            tracing::debug!(?field, ?stage, "Checkout blocked");
            return SubmitOutcome::Blocked { stage, field, error };
        }

        let summary = self.summary();
        if self.payment.method == PaymentMethod::ExternalWallet {
            tracing::info!(total = %summary.total, "Redirecting to wallet");
            return SubmitOutcome::RedirectToWallet(summary);
        }
        tracing::info!(total = %summary.total, "Checkout confirmed");
        SubmitOutcome::Confirmed(summary)
    }

    fn first_failure(&self) -> Option<(Field, FieldError)> {
        if let Some(e) = validation::validate_email(&self.email) {
            return Some((Field::Email, e));
        }
        for field in Field::ADDRESS {
            if let Some(e) = self.address.validate(field) {
                return Some((field, e));
            }
        }
        if self.selected_shipping_method().is_none() {
            return Some((Field::ShippingMethod, FieldError::ShippingMethodRequired));
        }
        if self.payment.method == PaymentMethod::ExternalWallet {
            return None;
        }

        let p = &self.payment;
        let mut checks = vec![
            (Field::HolderName, validation::validate_required(&p.holder_name)),
            (
                Field::CardNumber,
                validation::validate_card_number(p.card_number.expose_secret()),
            ),
            (Field::Expiry, validation::validate_expiry(&p.expiry)),
            (Field::Cvc, validation::validate_cvc(p.cvc.expose_secret())),
            (
                Field::Installment,
                validation::validate_installment(
                    !self.installments.items.is_empty(),
                    p.installment.is_some(),
                ),
            ),
        ];
        if !p.billing_same_as_shipping {
            checks.push((
                Field::BillingAddress,
                validation::validate_billing(&p.billing_address),
            ));
            checks.push((Field::BillingCity, validation::validate_billing(&p.billing_city)));
        }
        checks
            .into_iter()
            .find_map(|(field, error)| error.map(|e| (field, e)))
    }

    // =========================================================================
    // Async Results
    // =========================================================================

    /// Apply any lookup results that have arrived. Returns `true` if state
    /// changed.
    pub fn poll_lookups(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            changed |= self.apply_event(event);
        }
        changed
    }

    /// Wait until no lookup is in flight, applying results as they arrive.
    pub async fn settle(&mut self) {
        self.poll_lookups();
        while self.shipping.loading || self.installments.loading {
            match self.events_rx.recv().await {
                Some(event) => {
                    self.apply_event(event);
                }
                None => break,
            }
        }
    }

    fn apply_event(&mut self, event: LookupEvent) -> bool {
        match event {
            LookupEvent::Shipping { generation, result } => {
                let failed = result.as_ref().err().cloned();
                if !self.shipping.finish(generation, result) {
                    tracing::debug!(generation, "Stale shipping result ignored");
                    return false;
                }
                if let Some(e) = failed {
                    tracing::warn!(error = %e, "Shipping lookup failed");
                    return true;
                }
                self.selected_method = self.shipping.items.first().map(|m| m.id.clone());
                tracing::debug!(
                    methods = self.shipping.items.len(),
                    "Shipping methods loaded"
                );
                true
            }
            LookupEvent::Installments { generation, result } => {
                let failed = result.as_ref().err().cloned();
                if !self.installments.finish(generation, result) {
                    tracing::debug!(generation, "Stale installment result ignored");
                    return false;
                }
                if let Some(e) = failed {
                    tracing::warn!(error = %e, "Installment lookup failed");
                    return true;
                }
                self.payment.installment = self.installments.items.first().map(|p| p.id.clone());
                tracing::debug!(
                    plans = self.installments.items.len(),
                    "Installment plans loaded"
                );
                true
            }
        }
    }

    /// Run a lookup on the current tokio runtime, bounded by the lookup
    /// timeout, and send its result back to this session.
    fn spawn_lookup<T, F>(
        &self,
        future: LookupFuture<T>,
        wrap: F,
    ) -> Result<JoinHandle<()>, LookupError>
    where
        T: Send + 'static,
        F: FnOnce(Result<T, LookupError>) -> LookupEvent + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            tracing::warn!("No async runtime available for checkout lookup");
            LookupError::Unavailable("no async runtime".to_string())
        })?;
        let tx = self.events_tx.clone();
        let limit = self.lookup_timeout;
        Ok(handle.spawn(async move {
            let guarded = AssertUnwindSafe(future).catch_unwind();
            let result = match tokio::time::timeout(limit, guarded).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => {
                    tracing::error!("Checkout lookup panicked");
                    Err(LookupError::Unavailable("lookup panicked".to_string()))
                }
                Err(_) => Err(LookupError::Timeout),
            };
            if tx.send(wrap(result)).is_err() {
                tracing::debug!("Checkout session closed before lookup finished");
            }
        }))
    }
}

impl Drop for CheckoutSession {
    fn drop(&mut self) {
        self.shipping.invalidate();
        self.installments.invalidate();
    }
}
