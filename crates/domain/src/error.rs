//! Domain error types.

use thiserror::Error;

use crate::order::{Money, OrderStatus};

/// Errors raised by the order aggregate and its value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The stored totals disagree with the recomputed ones.
    #[error("order totals mismatch: stated total {stated}, computed total {computed}")]
    TotalsMismatch { stated: Money, computed: Money },

    /// The requested status transition is not in the transition table.
    #[error("invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// An item quantity was zero.
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: u32 },

    /// An order must contain at least one item.
    #[error("order has no items")]
    EmptyOrder,

    /// A monetary amount that must be non-negative was negative.
    #[error("negative amount: {amount}")]
    NegativeAmount { amount: Money },

    /// A refund would exceed the refundable remainder of a payment.
    #[error("refund of {requested} exceeds refundable amount {refundable}")]
    OverRefund {
        requested: Money,
        refundable: Money,
    },

    /// Items may not change once the order has left Pending.
    #[error("order items are immutable in status {status}")]
    ItemsFrozen { status: OrderStatus },
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
