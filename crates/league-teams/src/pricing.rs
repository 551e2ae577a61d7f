//! Team kit pricing
//!
//! Each team sets the price its players pay for the kit: the league's base
//! price plus the team's own markup, which becomes team revenue.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Result, TeamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitPricing {
    pub base_price: Decimal,
    pub markup: Decimal,
}

impl Default for KitPricing {
    fn default() -> Self {
        Self {
            base_price: dec!(150),
            markup: Decimal::ZERO,
        }
    }
}

impl KitPricing {
    pub fn total(&self) -> Decimal {
        self.base_price + self.markup
    }
}

/// Kit pricing keyed by the team's registration submission id
pub struct KitPricingRegistry {
    prices: RwLock<HashMap<u64, KitPricing>>,
}

impl KitPricingRegistry {
    pub fn new() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Pricing for a team, or the league default when none is set
    pub fn get(&self, submission_id: u64) -> KitPricing {
        self.prices.read().get(&submission_id).copied().unwrap_or_default()
    }

    pub fn set(&self, submission_id: u64, pricing: KitPricing) -> Result<KitPricing> {
        if pricing.base_price < Decimal::ZERO || pricing.markup < Decimal::ZERO {
            return Err(TeamError::Validation("kit prices cannot be negative".into()));
        }
        self.prices.write().insert(submission_id, pricing);
        tracing::info!(submission_id, total = %pricing.total(), "kit pricing updated");
        Ok(pricing)
    }

    /// Back to the default; returns whether custom pricing existed
    pub fn reset(&self, submission_id: u64) -> bool {
        self.prices.write().remove(&submission_id).is_some()
    }
}

impl Default for KitPricingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pricing() {
        let registry = KitPricingRegistry::new();
        let pricing = registry.get(7);
        assert_eq!(pricing.base_price, dec!(150));
        assert_eq!(pricing.markup, dec!(0));
        assert_eq!(pricing.total(), dec!(150));
    }

    #[test]
    fn test_set_and_reset() {
        let registry = KitPricingRegistry::new();
        let custom = KitPricing { base_price: dec!(150), markup: dec!(25) };
        registry.set(7, custom).unwrap();
        assert_eq!(registry.get(7).total(), dec!(175));
        assert_eq!(registry.get(8), KitPricing::default());

        assert!(registry.reset(7));
        assert!(!registry.reset(7));
        assert_eq!(registry.get(7), KitPricing::default());
    }

    #[test]
    fn test_negative_markup_rejected() {
        let registry = KitPricingRegistry::new();
        let bad = KitPricing { base_price: dec!(150), markup: dec!(-5) };
        assert!(matches!(registry.set(7, bad), Err(TeamError::Validation(_))));
    }
}
