//! Checkout orchestration for the storefront order core.
//!
//! Ties the basket, catalog, inventory ledger, payment gateway, and
//! order store together:
//!
//! - [`CheckoutService`] turns a basket into a pending order with
//!   all-or-nothing stock reservations and a payment intent.
//! - [`TransitionService`] executes status changes against the order
//!   state machine, with the inventory side effects each edge implies.
//! - [`ReconciliationService`] applies payment gateway webhooks
//!   (success, failure, refund) idempotently.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pricing;
pub mod reconciliation;
pub mod services;
pub mod store;
pub mod transition;

pub use config::CheckoutConfig;
pub use error::{CheckoutError, Result};
pub use orchestrator::{CheckoutRequest, CheckoutService};
pub use pricing::{PricingPolicy, ShippingPolicy};
pub use reconciliation::ReconciliationService;
pub use store::{InMemoryOrderStore, OrderStore};
pub use transition::{TransitionRequest, TransitionService};
