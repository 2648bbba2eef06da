//! Order status transition executor.
//!
//! Validates the requested edge against the state machine, applies the
//! inventory side effects the edge implies, stores the order through
//! the version check, and appends exactly one history row. Concurrent
//! transitions on the same order serialize through the store: the
//! loser reloads and retries within a bounded budget.

use chrono::Utc;
use common::OrderId;
use domain::{Actor, Order, OrderStatus, OrderStatusHistory};
use inventory::{InventoryError, InventoryLedger, ReservationState};

use crate::error::{CheckoutError, Result};
use crate::services::NotificationService;
use crate::store::OrderStore;

/// A requested status change.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub to: OrderStatus,
    pub actor: Actor,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
}

impl TransitionRequest {
    /// A system-initiated transition with no annotations.
    pub fn system(to: OrderStatus) -> Self {
        Self {
            to,
            actor: Actor::System,
            notes: None,
            tracking_number: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_tracking_number(mut self, tracking_number: impl Into<String>) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self
    }
}

/// Executes order status transitions with their side effects.
#[derive(Clone)]
pub struct TransitionService<S, L, N>
where
    S: OrderStore,
    L: InventoryLedger,
    N: NotificationService,
{
    store: S,
    ledger: L,
    notifications: N,
    retry_budget: u32,
}

impl<S, L, N> TransitionService<S, L, N>
where
    S: OrderStore,
    L: InventoryLedger,
    N: NotificationService,
{
    /// Creates a new transition service.
    pub fn new(store: S, ledger: L, notifications: N, retry_budget: u32) -> Self {
        Self {
            store,
            ledger,
            notifications,
            retry_budget,
        }
    }

    /// Moves an order to a new status.
    ///
    /// Fails with [`CheckoutError::Domain`] wrapping `InvalidTransition`
    /// on a disallowed edge, leaving the order untouched. A lost version
    /// check is retried against fresh state up to the configured budget;
    /// inventory writes only happen after the version check succeeds, so
    /// a lost attempt leaves the ledger untouched.
    #[tracing::instrument(skip(self, request), fields(%order_id, to = %request.to))]
    pub async fn transition(&self, order_id: OrderId, request: TransitionRequest) -> Result<Order> {
        let mut attempts = 0;
        loop {
            match self.try_transition(order_id, &request).await {
                Err(CheckoutError::ConcurrencyConflict { .. }) if attempts < self.retry_budget => {
                    attempts += 1;
                    metrics::counter!("order_transition_retries_total").increment(1);
                    continue;
                }
                Err(e) => {
                    metrics::counter!("order_transition_failures_total").increment(1);
                    return Err(e);
                }
                Ok(order) => {
                    metrics::counter!("order_transitions_total").increment(1);
                    return Ok(order);
                }
            }
        }
    }

    async fn try_transition(
        &self,
        order_id: OrderId,
        request: &TransitionRequest,
    ) -> Result<Order> {
        let mut order = self
            .store
            .get(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        let now = Utc::now();
        let from = order.apply_transition(request.to, now)?;

        if let Some(tracking) = &request.tracking_number {
            order.set_tracking_number(tracking.clone());
        }
        if let Some(notes) = &request.notes {
            order.set_notes(notes.clone());
        }

        // The preconditions are checked read-only first, so an expired
        // reservation aborts the transition before anything is written.
        // The ledger writes run only after the version check succeeds:
        // a transition that loses the race leaves stock untouched.
        self.check_side_effects(order_id, request.to).await?;
        let stored = self.store.update(order).await?;
        self.apply_side_effects(order_id, request.to).await?;

        let mut row = OrderStatusHistory::new(order_id, from, request.to, request.actor.clone(), now);
        if let Some(notes) = &request.notes {
            row = row.with_notes(notes.clone());
        }
        if let Some(tracking) = &request.tracking_number {
            row = row.with_tracking_number(tracking.clone());
        }
        self.store.append_history(row).await?;

        if let Err(e) = self
            .notifications
            .order_status_changed(&stored, from, request.to)
            .await
        {
            tracing::warn!(%order_id, error = %e, "failed to notify status change");
        }

        tracing::info!(%order_id, %from, to = %request.to, "order status changed");
        Ok(stored)
    }

    /// Verifies the inventory effects of entering a status can succeed,
    /// without writing anything.
    async fn check_side_effects(&self, order_id: OrderId, to: OrderStatus) -> Result<()> {
        if matches!(to, OrderStatus::Confirmed | OrderStatus::PaymentReceived) {
            let now = Utc::now();
            for reservation in self.ledger.reservations_for_order(order_id).await? {
                match reservation.state {
                    ReservationState::Committed => {}
                    ReservationState::Released => {
                        return Err(InventoryError::ReservationReleased {
                            reservation_id: reservation.id,
                        }
                        .into());
                    }
                    ReservationState::Active if reservation.is_expired(now) => {
                        return Err(InventoryError::ReservationExpired {
                            reservation_id: reservation.id,
                        }
                        .into());
                    }
                    ReservationState::Active => {}
                }
            }
        }
        Ok(())
    }

    /// Inventory consequences of entering a status.
    ///
    /// Entering `Confirmed` or `PaymentReceived` converts the order's
    /// holds into permanent stock decrements; entering `Cancelled`
    /// returns still-active holds to the pool. Committed reservations
    /// are never released (cancelling a paid order does not restock).
    async fn apply_side_effects(&self, order_id: OrderId, to: OrderStatus) -> Result<()> {
        match to {
            OrderStatus::Confirmed | OrderStatus::PaymentReceived => {
                for reservation in self.ledger.reservations_for_order(order_id).await? {
                    if reservation.state != ReservationState::Committed {
                        self.ledger.commit(reservation.id).await?;
                    }
                }
            }
            OrderStatus::Cancelled => {
                for reservation in self.ledger.reservations_for_order(order_id).await? {
                    if reservation.state == ReservationState::Active {
                        self.ledger.release(reservation.id).await?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
