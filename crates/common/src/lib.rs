//! Shared identifier types used across the storefront order core.

pub mod types;

pub use types::{BasketId, CustomerId, OrderId, ProductId, ReservationId, VariantId};
