//! Append-only order status history records.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;

/// Who performed a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// An automated path (checkout, payment reconciliation, sweeper).
    System,

    /// A named user, typically an admin identifier or email.
    User(String),
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Actor::User(id.into())
    }

    /// Returns the display label recorded on history rows.
    pub fn label(&self) -> &str {
        match self {
            Actor::System => "System",
            Actor::User(id) => id,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One entry in an order's status history log.
///
/// Rows are never mutated or deleted after creation and are strictly
/// ordered by `changed_at` within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusHistory {
    pub id: Uuid,
    pub order_id: OrderId,
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub changed_by: Actor,
}

impl OrderStatusHistory {
    /// Creates a new history row for a committed transition.
    pub fn new(
        order_id: OrderId,
        from_status: OrderStatus,
        to_status: OrderStatus,
        changed_by: Actor,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            from_status,
            to_status,
            changed_at,
            notes: None,
            tracking_number: None,
            changed_by,
        }
    }

    /// Attaches free-form notes to the row.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attaches a tracking number to the row.
    pub fn with_tracking_number(mut self, tracking_number: impl Into<String>) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_labels() {
        assert_eq!(Actor::System.label(), "System");
        assert_eq!(Actor::user("admin@shop.test").label(), "admin@shop.test");
    }

    #[test]
    fn test_history_row_builders() {
        let order_id = OrderId::new();
        let row = OrderStatusHistory::new(
            order_id,
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            Actor::System,
            Utc::now(),
        )
        .with_notes("payment captured")
        .with_tracking_number("TRACK-1");

        assert_eq!(row.order_id, order_id);
        assert_eq!(row.from_status, OrderStatus::Pending);
        assert_eq!(row.to_status, OrderStatus::Confirmed);
        assert_eq!(row.notes.as_deref(), Some("payment captured"));
        assert_eq!(row.tracking_number.as_deref(), Some("TRACK-1"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let row = OrderStatusHistory::new(
            OrderId::new(),
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            Actor::user("ops-42"),
            Utc::now(),
        );
        let json = serde_json::to_string(&row).unwrap();
        let deserialized: OrderStatusHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(row, deserialized);
    }
}
