//! Payment reconciliation: gateway webhooks to order state.
//!
//! Webhooks arrive at-least-once and out of band, so every handler is
//! keyed by the payment intent reference and the success path is
//! idempotent: a duplicate succeeded event is a no-op.

use chrono::Utc;
use domain::{Order, OrderStatus, Payment, PaymentStatus};
use inventory::InventoryLedger;

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::services::{DigitalDeliveryService, NotificationService};
use crate::store::OrderStore;
use crate::transition::{TransitionRequest, TransitionService};

/// Applies payment gateway events to orders.
pub struct ReconciliationService<S, L, N, D>
where
    S: OrderStore + Clone,
    L: InventoryLedger,
    N: NotificationService,
    D: DigitalDeliveryService,
{
    store: S,
    transitions: TransitionService<S, L, N>,
    digital: D,
    config: CheckoutConfig,
}

impl<S, L, N, D> ReconciliationService<S, L, N, D>
where
    S: OrderStore + Clone,
    L: InventoryLedger,
    N: NotificationService,
    D: DigitalDeliveryService,
{
    /// Creates a new reconciliation service.
    pub fn new(
        store: S,
        transitions: TransitionService<S, L, N>,
        digital: D,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            store,
            transitions,
            digital,
            config,
        }
    }

    /// Handles a successful payment capture.
    ///
    /// Records the payment, marks the order paid, and advances it
    /// `Pending -> Confirmed -> PaymentReceived` (committing its
    /// reservations on the way). Digital lines get download access, and
    /// digital-only orders auto-advance to `Delivered` when configured.
    /// Replayed events, including one arriving after a refund, return
    /// the order unchanged.
    #[tracing::instrument(skip(self, charge_id))]
    pub async fn on_payment_succeeded(
        &self,
        intent_id: &str,
        charge_id: &str,
        amount: domain::Money,
    ) -> Result<Order> {
        let mut order = self.find_order(intent_id).await?;

        // Anything past Pending/Failed (Succeeded, Refunded,
        // PartiallyRefunded) means this intent was already captured; a
        // redelivered event must not overwrite refund accounting.
        if !matches!(
            order.payment_status(),
            PaymentStatus::Pending | PaymentStatus::Failed
        ) {
            metrics::counter!("payment_webhooks_duplicate_total").increment(1);
            tracing::info!(order_id = %order.id(), intent_id, "duplicate success webhook ignored");
            return Ok(order);
        }

        let now = Utc::now();
        self.store
            .record_payment(
                order.id(),
                Payment::succeeded(intent_id, charge_id, amount, order.currency().clone(), now),
            )
            .await?;

        order.set_payment_status(PaymentStatus::Succeeded, now);
        let mut order = self.store.update(order).await?;

        // Walk the order up to PaymentReceived. A webhook can arrive
        // for an order an admin already confirmed, so start wherever
        // the order is.
        if order.status() == OrderStatus::Pending {
            order = self
                .transitions
                .transition(
                    order.id(),
                    TransitionRequest::system(OrderStatus::Confirmed)
                        .with_notes("Payment received"),
                )
                .await?;
        }
        if order.status() == OrderStatus::Confirmed {
            order = self
                .transitions
                .transition(
                    order.id(),
                    TransitionRequest::system(OrderStatus::PaymentReceived),
                )
                .await?;
        }

        if order.contains_digital_products() {
            if let Err(e) = self.digital.grant_access(&order).await {
                tracing::warn!(order_id = %order.id(), error = %e, "failed to grant digital access");
            }
        }

        if self.config.auto_advance_digital && order.is_digital_only() {
            for to in [
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ] {
                order = self
                    .transitions
                    .transition(
                        order.id(),
                        TransitionRequest::system(to).with_notes("Digital order auto-fulfilled"),
                    )
                    .await?;
            }
        }

        metrics::counter!("payments_reconciled_total").increment(1);
        Ok(order)
    }

    /// Handles a failed payment attempt.
    ///
    /// Records the failure and reason. The order is not cancelled: the
    /// buyer may retry with another payment method while the
    /// reservations last.
    #[tracing::instrument(skip(self, reason))]
    pub async fn on_payment_failed(&self, intent_id: &str, reason: &str) -> Result<Order> {
        let mut order = self.find_order(intent_id).await?;

        let now = Utc::now();
        self.store
            .record_payment(
                order.id(),
                Payment::failed(
                    intent_id,
                    order.total_amount(),
                    order.currency().clone(),
                    reason,
                    now,
                ),
            )
            .await?;

        order.set_payment_status(PaymentStatus::Failed, now);
        let order = self.store.update(order).await?;

        metrics::counter!("payment_failures_total").increment(1);
        tracing::info!(order_id = %order.id(), intent_id, reason, "payment failed");
        Ok(order)
    }

    /// Handles a refund against a captured payment.
    ///
    /// Accumulates the refunded amount on the payment record matching
    /// the intent, rejecting anything that would exceed the captured
    /// amount, and mirrors the resulting status onto the order.
    #[tracing::instrument(skip(self))]
    pub async fn on_refund(&self, intent_id: &str, amount: domain::Money) -> Result<Order> {
        let mut order = self.find_order(intent_id).await?;

        let mut payments = self.store.payments_for_order(order.id()).await?;
        let payment = payments
            .iter_mut()
            .find(|p| p.payment_intent_id == intent_id && p.status != PaymentStatus::Failed)
            .ok_or_else(|| CheckoutError::UnknownPaymentIntent {
                intent_id: intent_id.to_string(),
            })?;

        payment.apply_refund(amount)?;
        let new_status = payment.status;
        self.store.save_payments(order.id(), payments).await?;

        let now = Utc::now();
        order.set_payment_status(new_status, now);
        let order = self.store.update(order).await?;

        metrics::counter!("refunds_total").increment(1);
        tracing::info!(order_id = %order.id(), intent_id, amount = %amount, "refund applied");
        Ok(order)
    }

    async fn find_order(&self, intent_id: &str) -> Result<Order> {
        self.store
            .find_by_payment_intent(intent_id)
            .await?
            .ok_or_else(|| CheckoutError::UnknownPaymentIntent {
                intent_id: intent_id.to_string(),
            })
    }
}
