//! Inventory error types.

use common::{ProductId, ReservationId, VariantId};
use thiserror::Error;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Not enough unreserved stock to satisfy the request.
    #[error(
        "insufficient stock for product {product_id} variant {variant_id:?}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        variant_id: Option<VariantId>,
        requested: u32,
        available: i64,
    },

    /// The reservation passed its expiry before it could be committed.
    #[error("reservation {reservation_id} has expired")]
    ReservationExpired { reservation_id: ReservationId },

    /// The reservation was already released and cannot be committed.
    #[error("reservation {reservation_id} was already released")]
    ReservationReleased { reservation_id: ReservationId },

    /// No reservation exists with the given id.
    #[error("reservation {reservation_id} not found")]
    ReservationNotFound { reservation_id: ReservationId },

    /// A reservation quantity must be positive.
    #[error("invalid reservation quantity: {quantity}")]
    InvalidQuantity { quantity: u32 },

    /// Database error from the PostgreSQL ledger.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for inventory results.
pub type Result<T> = std::result::Result<T, InventoryError>;
