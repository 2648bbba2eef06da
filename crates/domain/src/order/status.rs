//! Order and payment status state machines.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Allowed transitions:
/// ```text
/// Pending ──► Confirmed ──► PaymentReceived ──► Processing ──► Shipped ──► Delivered
///    │            │                │                │             │            │
///    │            │                ├──► Returned    │             └──► Returned┘
///    └────────────┴────────────────┴────────────────┴──► Cancelled
/// ```
/// `Cancelled` and `Returned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order created from a basket, awaiting confirmation.
    #[default]
    Pending,

    /// Order confirmed, inventory committed.
    Confirmed,

    /// Payment has been captured.
    PaymentReceived,

    /// Order is being fulfilled.
    Processing,

    /// Order handed to the carrier.
    Shipped,

    /// Order received by the customer (terminal except for returns).
    Delivered,

    /// Order was cancelled (terminal).
    Cancelled,

    /// Order was returned (terminal).
    Returned,
}

impl OrderStatus {
    /// Returns the statuses reachable from this one.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[PaymentReceived, Cancelled],
            PaymentReceived => &[Processing, Cancelled, Returned],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered, Returned],
            Delivered => &[Returned],
            Cancelled | Returned => &[],
        }
    }

    /// Returns true if the transition to `to` is allowed.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    /// Returns true if payment has not yet been captured for this status.
    pub fn is_pre_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::PaymentReceived => "PaymentReceived",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
        }
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> &'static [OrderStatus] {
        use OrderStatus::*;
        &[
            Pending,
            Confirmed,
            PaymentReceived,
            Processing,
            Shipped,
            Delivered,
            Cancelled,
            Returned,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status of payment for an order or a single payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Payment intent created, awaiting capture.
    #[default]
    Pending,

    /// Payment captured successfully.
    Succeeded,

    /// Payment attempt failed; the order may be retried.
    Failed,

    /// Payment fully refunded.
    Refunded,

    /// Payment partially refunded.
    PartiallyRefunded,
}

impl PaymentStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Succeeded => "Succeeded",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
            PaymentStatus::PartiallyRefunded => "PartiallyRefunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
