//! Inventory ledger for the storefront order core.
//!
//! Tracks stock on hand per (product, variant) and grants time-boxed
//! reservations against it. The ledger is the only contended structure in
//! the system: `reserve` must be atomic so concurrent checkouts can never
//! together exceed available stock. Two implementations are provided:
//! an in-memory ledger (tests, default wiring) and a PostgreSQL ledger
//! that serializes reservations with row-level locks.

pub mod error;
pub mod ledger;
pub mod postgres;
pub mod reservation;

pub use error::{InventoryError, Result};
pub use ledger::{InMemoryInventoryLedger, InventoryLedger};
pub use postgres::PostgresInventoryLedger;
pub use reservation::{InventoryReservation, ReservationState, StockKey};
