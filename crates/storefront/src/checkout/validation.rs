//! Checkout field validators.
//!
//! Each validator takes the raw field value and returns `None` when the value
//! is acceptable, or the [`FieldError`] to show next to the field.

use std::sync::LazyLock;

use aurelia_core::{Email, Language};
use regex::Regex;
use serde::Serialize;

/// Minimum postal code length after trimming.
pub const MIN_POSTAL_CODE_LEN: usize = 4;

/// Minimum card number length, counting digits only.
pub const MIN_CARD_DIGITS: usize = 16;

/// Number of leading digits sent to the installment lookup.
pub const INSTALLMENT_PREFIX_LEN: usize = 6;

/// Regex for `MM/YY` card expiry.
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}$").expect("Invalid regex"));

/// Regex for a 3 or 4 digit CVC.
static CVC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("Invalid regex"));

/// A per-field validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum FieldError {
    /// Email left blank.
    #[error("Enter your email")]
    EmailRequired,
    /// Email present but not a valid address.
    #[error("Enter a valid email")]
    EmailInvalid,
    /// A required text field is blank after trimming.
    #[error("This field is required")]
    Required,
    /// Fewer than [`MIN_POSTAL_CODE_LEN`] characters.
    #[error("Postal code must have at least 4 characters")]
    PostalCodeTooShort,
    /// No shipping method selected.
    #[error("Choose a shipping method")]
    ShippingMethodRequired,
    /// Fewer than [`MIN_CARD_DIGITS`] digits once separators are stripped.
    #[error("Card number must have at least 16 digits")]
    CardNumberTooShort,
    /// Expiry is not two digits, a slash and two digits.
    #[error("Use the MM/YY format")]
    ExpiryInvalid,
    /// CVC is not 3 or 4 digits.
    #[error("CVC must have 3 or 4 digits")]
    CvcInvalid,
    /// Plans were offered but none is chosen.
    #[error("Choose an installment plan")]
    InstallmentRequired,
    /// Separate billing requested but left blank.
    #[error("Enter the billing address")]
    BillingRequired,
}

impl FieldError {
    /// Message shown to the shopper.
    #[must_use]
    pub const fn message(self, lang: Language) -> &'static str {
        match lang {
            Language::Es => match self {
                Self::EmailRequired => "Ingresa tu correo electrónico",
                Self::EmailInvalid => "Ingresa un correo electrónico válido",
                Self::Required => "Este campo es obligatorio",
                Self::PostalCodeTooShort => "El código postal debe tener al menos 4 caracteres",
                Self::ShippingMethodRequired => "Elige un método de envío",
                Self::CardNumberTooShort => "El número de tarjeta debe tener al menos 16 dígitos",
                Self::ExpiryInvalid => "Usa el formato MM/AA",
                Self::CvcInvalid => "El CVC debe tener 3 o 4 dígitos",
                Self::InstallmentRequired => "Elige un plan de cuotas",
                Self::BillingRequired => "Ingresa la dirección de facturación",
            },
            Language::Ko => match self {
                Self::EmailRequired => "이메일을 입력하세요",
                Self::EmailInvalid => "올바른 이메일을 입력하세요",
                Self::Required => "필수 입력 항목입니다",
                Self::PostalCodeTooShort => "우편번호는 4자 이상이어야 합니다",
                Self::ShippingMethodRequired => "배송 방법을 선택하세요",
                Self::CardNumberTooShort => "카드 번호는 16자리 이상이어야 합니다",
                Self::ExpiryInvalid => "MM/YY 형식으로 입력하세요",
                Self::CvcInvalid => "CVC는 3~4자리 숫자입니다",
                Self::InstallmentRequired => "할부 옵션을 선택하세요",
                Self::BillingRequired => "청구지 주소를 입력하세요",
            },
        }
    }
}

/// Empty or whitespace → `EmailRequired`; malformed → `EmailInvalid`.
#[must_use]
pub fn validate_email(value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        return Some(FieldError::EmailRequired);
    }
    Email::parse(value).err().map(|_| FieldError::EmailInvalid)
}

/// Non-whitespace content required.
#[must_use]
pub fn validate_required(value: &str) -> Option<FieldError> {
    value.trim().is_empty().then_some(FieldError::Required)
}

#[must_use]
pub fn validate_postal_code(value: &str) -> Option<FieldError> {
    validate_required(value).or_else(|| {
        (value.trim().chars().count() < MIN_POSTAL_CODE_LEN)
            .then_some(FieldError::PostalCodeTooShort)
    })
}

/// Digits of a card number with spaces, dashes and other separators removed.
#[must_use]
pub fn card_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[must_use]
pub fn validate_card_number(value: &str) -> Option<FieldError> {
    validate_required(value).or_else(|| {
        (card_digits(value).len() < MIN_CARD_DIGITS).then_some(FieldError::CardNumberTooShort)
    })
}

#[must_use]
pub fn validate_expiry(value: &str) -> Option<FieldError> {
    validate_required(value)
        .or_else(|| (!EXPIRY_RE.is_match(value.trim())).then_some(FieldError::ExpiryInvalid))
}

#[must_use]
pub fn validate_cvc(value: &str) -> Option<FieldError> {
    validate_required(value)
        .or_else(|| (!CVC_RE.is_match(value.trim())).then_some(FieldError::CvcInvalid))
}

/// A plan must be chosen once plans have been offered.
#[must_use]
pub const fn validate_installment(plans_loaded: bool, chosen: bool) -> Option<FieldError> {
    if plans_loaded && !chosen {
        Some(FieldError::InstallmentRequired)
    } else {
        None
    }
}

#[must_use]
pub fn validate_billing(value: &str) -> Option<FieldError> {
    value.trim().is_empty().then_some(FieldError::BillingRequired)
}
