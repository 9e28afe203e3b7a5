//! Async checkout lookups.
//!
//! Shipping methods and installment plans come from services behind
//! dyn-compatible traits returning boxed futures. The simulated services
//! answer from fixed tables after a configurable delay; a real carrier or
//! card network client can be swapped in without touching the session.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use aurelia_core::{InstallmentPlanId, Language, Price, ShippingMethodId};
use serde::Serialize;

use crate::error::LookupError;

/// Boxed future returned by lookup services.
pub type LookupFuture<T> = Pin<Box<dyn Future<Output = Result<T, LookupError>> + Send>>;

/// Province substring that selects the metropolitan carrier table.
pub const METROPOLITAN_MARKER: &str = "metropolitana";

// =============================================================================
// Types
// =============================================================================

/// A shipping option offered for an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    /// Localized display name.
    pub label: String,
    pub amount: Price,
    /// Localized delivery estimate.
    pub eta: String,
}

/// An installment plan offered for a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallmentOption {
    pub id: InstallmentPlanId,
    /// Number of monthly payments.
    pub count: u32,
    pub interest_free: bool,
    /// Localized display name.
    pub label: String,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Shipping rate service.
pub trait ShippingRates: Send + Sync {
    /// Methods available for a province, first one preferred.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the service cannot answer.
    fn methods_for(&self, province: &str, lang: Language) -> LookupFuture<Vec<ShippingMethod>>;
}

/// Installment plan service.
pub trait InstallmentPlans: Send + Sync {
    /// Plans available for a card, given its leading digits.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the service cannot answer.
    fn plans_for(&self, card_prefix: &str, lang: Language) -> LookupFuture<Vec<InstallmentOption>>;
}

// =============================================================================
// Simulated Services
// =============================================================================

/// Fixed-table shipping rates with artificial latency.
#[derive(Debug, Clone)]
pub struct SimulatedShippingRates {
    latency: Duration,
}

impl SimulatedShippingRates {
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Creates an Arc-wrapped instance for sharing.
    #[must_use]
    pub fn shared(latency: Duration) -> Arc<dyn ShippingRates> {
        Arc::new(Self::new(latency))
    }

    /// The table for a province, without the delay.
    #[must_use]
    pub fn table(province: &str, lang: Language) -> Vec<ShippingMethod> {
        let metropolitan = province.to_lowercase().contains(METROPOLITAN_MARKER);
        let rows: [(&str, i64, &str, &str, &str, &str); 2] = if metropolitan {
            [
                ("standard", 3_900, "Despacho estándar", "2–3 días hábiles", "일반 배송", "영업일 기준 2–3일"),
                ("express", 6_900, "Despacho express", "24 horas", "특급 배송", "24시간 이내"),
            ]
        } else {
            [
                ("national_mail", 5_900, "Correo nacional", "4–6 días hábiles", "국내 우편", "영업일 기준 4–6일"),
                ("pickup", 0, "Retiro en sucursal", "Retira en la sucursal más cercana", "지점 수령", "가까운 지점에서 수령"),
            ]
        };
        rows.into_iter()
            .map(|(id, amount, label_es, eta_es, label_ko, eta_ko)| {
                let (label, eta) = match lang {
                    Language::Es => (label_es, eta_es),
                    Language::Ko => (label_ko, eta_ko),
                };
                ShippingMethod {
                    id: ShippingMethodId::new(id),
                    label: label.to_string(),
                    amount: Price::new(amount),
                    eta: eta.to_string(),
                }
            })
            .collect()
    }
}

impl ShippingRates for SimulatedShippingRates {
    fn methods_for(&self, province: &str, lang: Language) -> LookupFuture<Vec<ShippingMethod>> {
        let latency = self.latency;
        let methods = Self::table(province, lang);
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            Ok(methods)
        })
    }
}

/// Fixed-table installment plans with artificial latency.
///
/// Branches on the parity of the card's first digit.
#[derive(Debug, Clone)]
pub struct SimulatedInstallmentPlans {
    latency: Duration,
}

impl SimulatedInstallmentPlans {
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Creates an Arc-wrapped instance for sharing.
    #[must_use]
    pub fn shared(latency: Duration) -> Arc<dyn InstallmentPlans> {
        Arc::new(Self::new(latency))
    }

    /// The table for a card prefix, without the delay.
    #[must_use]
    pub fn table(card_prefix: &str, lang: Language) -> Vec<InstallmentOption> {
        let even = card_prefix
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .is_some_and(|d| d % 2 == 0);
        let tiers: [(u32, bool); 3] = if even {
            [(1, false), (3, true), (6, false)]
        } else {
            [(1, false), (6, false), (12, false)]
        };
        tiers
            .into_iter()
            .map(|(count, interest_free)| InstallmentOption {
                id: InstallmentPlanId::new(format!("{count}x")),
                count,
                interest_free,
                label: installment_label(count, interest_free, lang),
            })
            .collect()
    }
}

impl InstallmentPlans for SimulatedInstallmentPlans {
    fn plans_for(&self, card_prefix: &str, lang: Language) -> LookupFuture<Vec<InstallmentOption>> {
        let latency = self.latency;
        let plans = Self::table(card_prefix, lang);
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            Ok(plans)
        })
    }
}

fn installment_label(count: u32, interest_free: bool, lang: Language) -> String {
    match (lang, count, interest_free) {
        (Language::Es, 1, _) => "1 cuota".to_string(),
        (Language::Es, n, true) => format!("{n} cuotas sin interés"),
        (Language::Es, n, false) => format!("{n} cuotas"),
        (Language::Ko, 1, _) => "일시불".to_string(),
        (Language::Ko, n, true) => format!("{n}개월 무이자"),
        (Language::Ko, n, false) => format!("{n}개월 할부"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_metropolitan_table() {
        let methods = SimulatedShippingRates::table("Región Metropolitana", Language::Es);
        let ids: Vec<_> = methods.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["standard", "express"]);
        assert_eq!(methods.first().unwrap().amount, Price::new(3_900));
    }

    #[test]
    fn test_other_province_table() {
        let methods = SimulatedShippingRates::table("Valparaíso", Language::Ko);
        let ids: Vec<_> = methods.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["national_mail", "pickup"]);
        assert_eq!(methods.last().unwrap().amount, Price::ZERO);
        assert_eq!(methods.first().unwrap().label, "국내 우편");
    }

    #[test]
    fn test_installments_branch_on_first_digit() {
        let even = SimulatedInstallmentPlans::table("411111", Language::Es);
        let odd = SimulatedInstallmentPlans::table("511111", Language::Es);
        // 4 is even
        assert_eq!(even.iter().map(|p| p.count).collect::<Vec<_>>(), vec![1, 3, 6]);
        assert!(even.get(1).unwrap().interest_free);
        assert_eq!(even.get(1).unwrap().label, "3 cuotas sin interés");
        assert_eq!(odd.iter().map(|p| p.count).collect::<Vec<_>>(), vec![1, 6, 12]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_services_resolve_after_latency() {
        let rates = SimulatedShippingRates::shared(Duration::from_millis(600));
        let start = tokio::time::Instant::now();
        let methods = rates.methods_for("metropolitana", Language::Es).await.unwrap();
        assert_eq!(methods.len(), 2);
        assert!(start.elapsed() >= Duration::from_millis(600));

        let plans = SimulatedInstallmentPlans::shared(Duration::from_millis(500));
        assert_eq!(plans.plans_for("9", Language::Ko).await.unwrap().len(), 3);
    }
}
