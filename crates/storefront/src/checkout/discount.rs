//! Discount codes.

use aurelia_core::{Language, Price};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

/// Why a code was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiscountError {
    /// The input was blank.
    #[error("Enter a discount code")]
    MissingCode,
    /// The input does not match the active code.
    #[error("Invalid discount code")]
    InvalidCode,
}

impl DiscountError {
    /// Message shown under the discount input.
    #[must_use]
    pub const fn message(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::MissingCode, Language::Es) => "Ingresa un código de descuento",
            (Self::InvalidCode, Language::Es) => "Código de descuento inválido",
            (Self::MissingCode, Language::Ko) => "할인 코드를 입력하세요",
            (Self::InvalidCode, Language::Ko) => "유효하지 않은 할인 코드입니다",
        }
    }
}

/// The single recognized percentage code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountRule {
    code: String,
    percent: u32,
}

impl DiscountRule {
    /// Create a rule. The code is matched case-insensitively.
    #[must_use]
    pub fn new(code: &str, percent: u32) -> Self {
        Self {
            code: code.trim().to_uppercase(),
            percent: percent.min(100),
        }
    }

    /// The normalized code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub const fn percent(&self) -> u32 {
        self.percent
    }

    /// Discount amount for `input` on `subtotal`.
    ///
    /// The input is trimmed and uppercased before matching. The amount is
    /// rounded to the nearest whole peso, halves away from zero.
    ///
    /// # Errors
    ///
    /// `MissingCode` for blank input, `InvalidCode` for anything else that
    /// does not match.
    pub fn apply(&self, input: &str, subtotal: Price) -> Result<Price, DiscountError> {
        let normalized = input.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(DiscountError::MissingCode);
        }
        if normalized != self.code {
            return Err(DiscountError::InvalidCode);
        }
        Ok(self.amount_for(subtotal))
    }

    fn amount_for(&self, subtotal: Price) -> Price {
        let amount = Decimal::from(subtotal.amount()) * Decimal::from(self.percent)
            / Decimal::ONE_HUNDRED;
        let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Price::new(rounded.to_i64().unwrap_or_default())
    }
}
