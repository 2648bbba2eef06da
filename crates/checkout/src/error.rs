//! Checkout error types.

use common::{BasketId, OrderId, ProductId, VariantId};
use domain::DomainError;
use inventory::InventoryError;
use thiserror::Error;

/// Errors that can occur during checkout, transitions, and reconciliation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The basket does not exist.
    #[error("basket {basket_id} not found")]
    BasketNotFound { basket_id: BasketId },

    /// The basket has no items to check out.
    #[error("basket is empty")]
    EmptyBasket,

    /// A basket line refers to a product or variant the catalog no
    /// longer offers.
    #[error("product {product_id} variant {variant_id:?} is unavailable")]
    ProductUnavailable {
        product_id: ProductId,
        variant_id: Option<VariantId>,
    },

    /// Not enough stock for one of the basket lines. Names the
    /// offending item so the buyer knows what to remove.
    #[error("insufficient stock for '{product_name}': requested {requested}, available {available}")]
    InsufficientStock {
        product_name: String,
        requested: u32,
        available: i64,
    },

    /// The payment gateway refused or timed out creating the intent.
    #[error("payment setup failed: {0}")]
    PaymentSetup(String),

    /// No order exists with the given id.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// No order carries the given payment intent reference.
    #[error("no order found for payment intent '{intent_id}'")]
    UnknownPaymentIntent { intent_id: String },

    /// An optimistic version check lost against a concurrent writer.
    #[error("concurrent modification of order {order_id}")]
    ConcurrencyConflict { order_id: OrderId },

    /// Basket service error. Clearing the basket after checkout is
    /// best-effort; callers log instead of propagating.
    #[error("basket service error: {0}")]
    BasketService(String),

    /// A customer notification could not be delivered. Callers treat
    /// this as best-effort and log instead of propagating.
    #[error("notification failed: {0}")]
    Notification(String),

    /// Digital download access could not be granted. Best-effort like
    /// notifications; reconciliation logs and continues.
    #[error("digital delivery failed: {0}")]
    DigitalDelivery(String),

    /// Domain rule violation (invalid transition, totals mismatch, ...).
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Inventory ledger error.
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
