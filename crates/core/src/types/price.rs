//! Whole-unit price representation.
//!
//! Catalog prices have no minor units: `18900` means eighteen thousand
//! nine hundred pesos. Every amount in the storefront shares one currency,
//! so [`Price`] carries the amount only and exposes the currency as a
//! constant.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A whole-unit currency amount.
///
/// Arithmetic saturates instead of overflowing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// The currency every storefront amount is denominated in.
    pub const CURRENCY: CurrencyCode = CurrencyCode::CLP;

    /// A zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a price from a whole-unit amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the whole-unit amount.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, Self::CURRENCY.code())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self::Output {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Chilean peso (no minor units).
    #[default]
    CLP,
}

impl CurrencyCode {
    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CLP => "CLP",
        }
    }

    /// The display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::CLP => "$",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        assert_eq!(Price::new(18_900) * 2, Price::new(37_800));
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::new(37_800), Price::new(13_200)].into_iter().sum();
        assert_eq!(total, Price::new(51_000));
    }

    #[test]
    fn test_saturating_arithmetic() {
        assert_eq!(Price::new(i64::MAX) + Price::new(1), Price::new(i64::MAX));
        assert_eq!(Price::new(i64::MAX) * 3, Price::new(i64::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::new(3_900).to_string(), "3900 CLP");
    }
}
