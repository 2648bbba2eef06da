//! Reservation records held by the inventory ledger.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReservationId, VariantId};
use serde::{Deserialize, Serialize};

/// The stock row a reservation holds against: a product, optionally
/// narrowed to one of its variants.
pub type StockKey = (ProductId, Option<VariantId>);

/// Lifecycle of a reservation.
///
/// A reservation is immutable once it leaves `Active`: `Released`
/// returns the held quantity to the pool, `Committed` converts it into
/// a permanent stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationState {
    Active,
    Released,
    Committed,
}

impl ReservationState {
    /// Returns the state name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Active => "active",
            ReservationState::Released => "released",
            ReservationState::Committed => "committed",
        }
    }

    /// Parses a state name from the database.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ReservationState::Active),
            "released" => Some(ReservationState::Released),
            "committed" => Some(ReservationState::Committed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A temporary hold of stock for an in-progress order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReservation {
    pub id: ReservationId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub state: ReservationState,
}

impl InventoryReservation {
    /// Returns the stock row this reservation holds against.
    pub fn stock_key(&self) -> StockKey {
        (self.product_id, self.variant_id)
    }

    /// Returns true if the expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Returns true if this reservation still holds stock: state is
    /// `Active` and the expiry has not passed. An expired reservation is
    /// treated as released by every reader, even before the sweeper
    /// flips its state.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.state == ReservationState::Active && !self.is_expired(now)
    }
}
