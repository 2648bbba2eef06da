//! Inventory ledger trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{OrderId, ProductId, ReservationId, VariantId};
use tokio::sync::RwLock;

use crate::error::{InventoryError, Result};
use crate::reservation::{InventoryReservation, ReservationState, StockKey};

/// Ledger of stock on hand and active reservations.
///
/// `reserve` must be atomic with respect to other callers targeting the
/// same (product, variant): two concurrent reservations must never
/// together exceed available stock.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Seeds or adjusts the permanent stock count for a stock row.
    async fn set_stock(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        on_hand: i64,
    ) -> Result<()>;

    /// Returns the permanent stock count for a stock row (0 if unknown).
    async fn stock_on_hand(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<i64>;

    /// Returns stock on hand minus all active, unexpired reservations.
    async fn available(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<i64>;

    /// Atomically reserves `quantity` units for `order_id`, expiring
    /// after `ttl`. Fails with [`InventoryError::InsufficientStock`]
    /// without side effects if not enough stock is available.
    async fn reserve(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: u32,
        order_id: OrderId,
        ttl: Duration,
    ) -> Result<ReservationId>;

    /// Releases a reservation, returning its stock to the pool.
    /// Idempotent: releasing an already released or committed
    /// reservation is a no-op.
    async fn release(&self, reservation_id: ReservationId) -> Result<()>;

    /// Commits a reservation: permanently decrements stock on hand and
    /// retires the hold. Idempotent on already committed reservations;
    /// fails with [`InventoryError::ReservationExpired`] past the expiry
    /// (the caller must re-reserve).
    async fn commit(&self, reservation_id: ReservationId) -> Result<()>;

    /// Marks every expired, still-active reservation as released and
    /// returns how many were swept.
    async fn sweep_expired(&self) -> Result<usize>;

    /// Returns all reservations belonging to an order, newest last.
    async fn reservations_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<InventoryReservation>>;

    /// Looks up a single reservation.
    async fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<InventoryReservation>>;
}

#[derive(Debug, Default)]
struct LedgerState {
    stock: HashMap<StockKey, i64>,
    reservations: HashMap<ReservationId, InventoryReservation>,
}

impl LedgerState {
    fn reserved_quantity(&self, key: &StockKey, now: chrono::DateTime<Utc>) -> i64 {
        self.reservations
            .values()
            .filter(|r| r.stock_key() == *key && r.is_active(now))
            .map(|r| i64::from(r.quantity))
            .sum()
    }
}

/// In-memory inventory ledger.
///
/// All operations take a single write lock, which serializes concurrent
/// `reserve` calls the way the PostgreSQL ledger's row lock does.
#[derive(Clone, Default)]
pub struct InMemoryInventoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryInventoryLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of reservations in any state.
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reservations.len()
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn set_stock(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        on_hand: i64,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.stock.insert((product_id, variant_id), on_hand);
        Ok(())
    }

    async fn stock_on_hand(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.stock.get(&(product_id, variant_id)).copied().unwrap_or(0))
    }

    async fn available(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<i64> {
        let state = self.state.read().await;
        let key = (product_id, variant_id);
        let on_hand = state.stock.get(&key).copied().unwrap_or(0);
        Ok(on_hand - state.reserved_quantity(&key, Utc::now()))
    }

    async fn reserve(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: u32,
        order_id: OrderId,
        ttl: Duration,
    ) -> Result<ReservationId> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }

        let mut state = self.state.write().await;
        let now = Utc::now();
        let key = (product_id, variant_id);

        let on_hand = state.stock.get(&key).copied().unwrap_or(0);
        let available = on_hand - state.reserved_quantity(&key, now);
        if i64::from(quantity) > available {
            return Err(InventoryError::InsufficientStock {
                product_id,
                variant_id,
                requested: quantity,
                available,
            });
        }

        let reservation = InventoryReservation {
            id: ReservationId::new(),
            order_id,
            product_id,
            variant_id,
            quantity,
            reserved_at: now,
            expires_at: now + ttl,
            state: ReservationState::Active,
        };
        let id = reservation.id;
        state.reservations.insert(id, reservation);
        Ok(id)
    }

    async fn release(&self, reservation_id: ReservationId) -> Result<()> {
        let mut state = self.state.write().await;
        let reservation = state
            .reservations
            .get_mut(&reservation_id)
            .ok_or(InventoryError::ReservationNotFound { reservation_id })?;

        if reservation.state == ReservationState::Active {
            reservation.state = ReservationState::Released;
        }
        Ok(())
    }

    async fn commit(&self, reservation_id: ReservationId) -> Result<()> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let reservation = state
            .reservations
            .get(&reservation_id)
            .ok_or(InventoryError::ReservationNotFound { reservation_id })?
            .clone();

        match reservation.state {
            ReservationState::Committed => Ok(()),
            ReservationState::Released => {
                Err(InventoryError::ReservationReleased { reservation_id })
            }
            ReservationState::Active if reservation.is_expired(now) => {
                // An expired hold no longer backs any stock.
                if let Some(r) = state.reservations.get_mut(&reservation_id) {
                    r.state = ReservationState::Released;
                }
                Err(InventoryError::ReservationExpired { reservation_id })
            }
            ReservationState::Active => {
                let key = reservation.stock_key();
                *state.stock.entry(key).or_insert(0) -= i64::from(reservation.quantity);
                if let Some(r) = state.reservations.get_mut(&reservation_id) {
                    r.state = ReservationState::Committed;
                }
                Ok(())
            }
        }
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut swept = 0;
        for reservation in state.reservations.values_mut() {
            if reservation.state == ReservationState::Active && reservation.is_expired(now) {
                reservation.state = ReservationState::Released;
                swept += 1;
            }
        }
        if swept > 0 {
            tracing::debug!(swept, "released expired reservations");
        }
        Ok(swept)
    }

    async fn reservations_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<InventoryReservation>> {
        let state = self.state.read().await;
        let mut reservations: Vec<_> = state
            .reservations
            .values()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect();
        reservations.sort_by_key(|r| r.reserved_at);
        Ok(reservations)
    }

    async fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<InventoryReservation>> {
        let state = self.state.read().await;
        Ok(state.reservations.get(&reservation_id).cloned())
    }
}
