//! Tax and shipping pricing policy applied at checkout.

use domain::Money;
use serde::{Deserialize, Serialize};

/// Shipping cost policy for physical orders.
///
/// Digital-only orders always ship for free regardless of policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShippingPolicy {
    /// A single flat rate per order.
    Flat { rate: Money },

    /// Flat rate waived once the subtotal reaches the threshold.
    FreeOverThreshold { rate: Money, threshold: Money },
}

impl ShippingPolicy {
    /// Computes the shipping cost for an order subtotal.
    pub fn cost(&self, subtotal: Money, digital_only: bool) -> Money {
        if digital_only {
            return Money::zero();
        }
        match self {
            ShippingPolicy::Flat { rate } => *rate,
            ShippingPolicy::FreeOverThreshold { rate, threshold } => {
                if subtotal >= *threshold {
                    Money::zero()
                } else {
                    *rate
                }
            }
        }
    }
}

/// Pricing inputs the orchestrator applies on top of the item subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Tax rate in basis points (825 = 8.25%). Applied to the subtotal,
    /// rounded down to whole cents.
    pub tax_rate_bps: u32,
    pub shipping: ShippingPolicy,
}

impl PricingPolicy {
    /// Computes the tax amount for a subtotal.
    pub fn tax(&self, subtotal: Money) -> Money {
        Money::from_cents(subtotal.cents() * i64::from(self.tax_rate_bps) / 10_000)
    }

    /// Computes (tax, shipping) for an order.
    pub fn quote(&self, subtotal: Money, digital_only: bool) -> (Money, Money) {
        (self.tax(subtotal), self.shipping.cost(subtotal, digital_only))
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_bps: 0,
            shipping: ShippingPolicy::Flat { rate: Money::zero() },
        }
    }
}
