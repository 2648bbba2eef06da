//! Checkout configuration.

use chrono::Duration;
use domain::Currency;

use crate::pricing::PricingPolicy;

/// Tunables for the checkout orchestrator and transition services.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// How long a stock reservation is held before it expires.
    pub reservation_ttl: Duration,

    /// Upper bound on the payment gateway call when creating an intent.
    /// A timeout is treated as a gateway failure.
    pub gateway_timeout: std::time::Duration,

    /// How many times a transition is retried after losing an
    /// optimistic version check before surfacing the conflict.
    pub transition_retry_budget: u32,

    /// Whether digital-only orders advance straight to `Delivered`
    /// once payment is received.
    pub auto_advance_digital: bool,

    /// Settlement currency for new orders.
    pub currency: Currency,

    /// Tax and shipping policy.
    pub pricing: PricingPolicy,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            reservation_ttl: Duration::minutes(15),
            gateway_timeout: std::time::Duration::from_secs(10),
            transition_retry_budget: 3,
            auto_advance_digital: false,
            currency: Currency::usd(),
            pricing: PricingPolicy::default(),
        }
    }
}
