//! Status enums shared by the catalog, cart and checkout.

use serde::{Deserialize, Serialize};

/// Whether a product (or one of its variants) can be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Units are available.
    InStock,
    /// Nothing left to sell.
    OutOfStock,
}

impl Availability {
    /// Derive availability from a stock count.
    #[must_use]
    pub const fn from_stock(stock: u32) -> Self {
        if stock == 0 {
            Self::OutOfStock
        } else {
            Self::InStock
        }
    }

    /// Returns `true` for [`Availability::InStock`].
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::InStock)
    }
}

/// The furthest checkout stage a session has unlocked.
///
/// Stages unlock strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    /// Email entry.
    Contact,
    /// Six required address fields.
    ShippingAddress,
    /// Choice among looked-up shipping methods.
    ShippingMethod,
    /// Card or external wallet.
    Payment,
}

/// How the buyer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card entered on the page.
    #[default]
    Card,
    /// Redirect to an external wallet provider.
    ExternalWallet,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::ExternalWallet => write!(f, "external_wallet"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "external_wallet" => Ok(Self::ExternalWallet),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_from_stock() {
        assert_eq!(Availability::from_stock(0), Availability::OutOfStock);
        assert_eq!(Availability::from_stock(3), Availability::InStock);
        assert!(!Availability::OutOfStock.is_available());
    }

    #[test]
    fn test_checkout_stage_order() {
        assert!(CheckoutStage::Contact < CheckoutStage::ShippingAddress);
        assert!(CheckoutStage::ShippingMethod < CheckoutStage::Payment);
    }

    #[test]
    fn test_payment_method_round_trip_str() {
        for method in [PaymentMethod::Card, PaymentMethod::ExternalWallet] {
            assert_eq!(method.to_string().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("cash".parse::<PaymentMethod>().is_err());
    }
}
