//! Checkout orchestrator: basket to pending order.
//!
//! The flow is all-or-nothing around inventory: every line is reserved
//! before the gateway is contacted, and any failure past that point
//! releases everything acquired so far. The order record is only
//! persisted once a payment intent exists, so a gateway failure leaves
//! no half-created order behind.

use chrono::Utc;
use common::{BasketId, CustomerId, OrderId, ReservationId};
use domain::{Actor, Address, NewOrder, Order, OrderItem, OrderStatusHistory};
use inventory::{InventoryError, InventoryLedger};

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::services::{BasketService, CatalogService, NotificationService, PaymentGateway};
use crate::store::OrderStore;

/// What a buyer submits to turn a basket into an order.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub basket_id: BasketId,
    pub customer_id: Option<CustomerId>,
    pub buyer_email: String,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
}

/// Orchestrates checkout across the basket, catalog, inventory ledger,
/// payment gateway, and order store.
pub struct CheckoutService<B, C, L, G, N, S>
where
    B: BasketService,
    C: CatalogService,
    L: InventoryLedger,
    G: PaymentGateway,
    N: NotificationService,
    S: OrderStore,
{
    basket: B,
    catalog: C,
    ledger: L,
    gateway: G,
    notifications: N,
    store: S,
    config: CheckoutConfig,
}

impl<B, C, L, G, N, S> CheckoutService<B, C, L, G, N, S>
where
    B: BasketService,
    C: CatalogService,
    L: InventoryLedger,
    G: PaymentGateway,
    N: NotificationService,
    S: OrderStore,
{
    /// Creates a new checkout service.
    pub fn new(
        basket: B,
        catalog: C,
        ledger: L,
        gateway: G,
        notifications: N,
        store: S,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            basket,
            catalog,
            ledger,
            gateway,
            notifications,
            store,
            config,
        }
    }

    /// Creates a pending order from a basket.
    ///
    /// On success the order is persisted in `Pending` status with a
    /// payment intent attached, one history row, and one active
    /// reservation per line. On any failure no order record survives
    /// and every reservation acquired along the way is released.
    #[tracing::instrument(skip(self, request), fields(basket_id = %request.basket_id))]
    pub async fn create_order(&self, request: CheckoutRequest) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        // 1. Load the basket.
        let basket = self
            .basket
            .get_basket(request.basket_id)
            .await?
            .ok_or(CheckoutError::BasketNotFound {
                basket_id: request.basket_id,
            })?;
        if basket.is_empty() {
            return Err(CheckoutError::EmptyBasket);
        }

        // 2. Snapshot every line against the live catalog.
        let mut items = Vec::with_capacity(basket.items.len());
        for line in &basket.items {
            let listing = self
                .catalog
                .resolve(line.product_id, line.variant_id)
                .await?
                .ok_or(CheckoutError::ProductUnavailable {
                    product_id: line.product_id,
                    variant_id: line.variant_id,
                })?;
            items.push(OrderItem {
                product_id: listing.product_id,
                variant_id: listing.variant_id,
                product_name: listing.name,
                description: listing.description,
                image_url: listing.image_url,
                unit_price: listing.unit_price,
                quantity: line.quantity,
                attributes: listing.attributes,
                is_digital: listing.is_digital,
            });
        }

        // 3. Price and build the aggregate (not yet persisted).
        let subtotal: domain::Money = items.iter().map(OrderItem::line_total).sum();
        let digital_only = items.iter().all(|i| i.is_digital);
        let (tax_amount, shipping_cost) = self.config.pricing.quote(subtotal, digital_only);

        let now = Utc::now();
        let mut order = Order::create(
            NewOrder {
                customer_id: request.customer_id,
                buyer_email: request.buyer_email,
                currency: self.config.currency.clone(),
                shipping_address: request.shipping_address,
                billing_address: request.billing_address,
                items,
                tax_amount,
                shipping_cost,
            },
            now,
        )?;

        // 4. Reserve every line, rolling back on the first failure.
        let mut reserved: Vec<ReservationId> = Vec::with_capacity(order.items().len());
        for item in order.items() {
            let result = self
                .ledger
                .reserve(
                    item.product_id,
                    item.variant_id,
                    item.quantity,
                    order.id(),
                    self.config.reservation_ttl,
                )
                .await;
            match result {
                Ok(id) => reserved.push(id),
                Err(InventoryError::InsufficientStock {
                    requested,
                    available,
                    ..
                }) => {
                    self.release_all(order.id(), &reserved).await;
                    metrics::counter!("checkout_insufficient_stock_total").increment(1);
                    return Err(CheckoutError::InsufficientStock {
                        product_name: item.product_name.clone(),
                        requested,
                        available,
                    });
                }
                Err(e) => {
                    self.release_all(order.id(), &reserved).await;
                    return Err(e.into());
                }
            }
        }

        // 5. Create the payment intent, bounded by the configured timeout.
        let intent = match tokio::time::timeout(
            self.config.gateway_timeout,
            self.gateway
                .create_intent(order.id(), order.total_amount(), order.currency()),
        )
        .await
        {
            Ok(Ok(intent)) => intent,
            Ok(Err(e)) => {
                self.release_all(order.id(), &reserved).await;
                metrics::counter!("checkout_payment_setup_failures_total").increment(1);
                return Err(e);
            }
            Err(_) => {
                self.release_all(order.id(), &reserved).await;
                metrics::counter!("checkout_payment_setup_failures_total").increment(1);
                return Err(CheckoutError::PaymentSetup(
                    "payment gateway timed out".to_string(),
                ));
            }
        };
        order.set_payment_intent(intent.intent_id);

        // 6. Persist the order and its creation history row.
        if let Err(e) = self.store.insert(order.clone()).await {
            self.release_all(order.id(), &reserved).await;
            return Err(e);
        }
        self.store
            .append_history(
                OrderStatusHistory::new(
                    order.id(),
                    order.status(),
                    order.status(),
                    Actor::System,
                    now,
                )
                .with_notes("Order created"),
            )
            .await?;

        // Basket clearing and the confirmation email are best-effort.
        if let Err(e) = self.basket.clear_basket(request.basket_id).await {
            tracing::warn!(order_id = %order.id(), error = %e, "failed to clear basket");
        }
        if let Err(e) = self.notifications.order_created(&order).await {
            tracing::warn!(order_id = %order.id(), error = %e, "failed to send order confirmation");
        }

        metrics::counter!("checkout_orders_created_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id(),
            order_number = %order.order_number(),
            total = %order.total_amount(),
            "order created"
        );

        Ok(order)
    }

    /// Releases reservations acquired during a failed checkout.
    /// Best-effort: release is idempotent and expiry sweeps up stragglers.
    async fn release_all(&self, order_id: OrderId, reservations: &[ReservationId]) {
        for &reservation_id in reservations {
            if let Err(e) = self.ledger.release(reservation_id).await {
                tracing::warn!(
                    %order_id,
                    %reservation_id,
                    error = %e,
                    "failed to release reservation during checkout rollback"
                );
            }
        }
    }
}
