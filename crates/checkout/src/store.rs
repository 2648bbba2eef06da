//! Order storage with optimistic concurrency.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderStatusHistory, Payment};
use tokio::sync::RwLock;

use crate::error::{CheckoutError, Result};

/// Persistent home of orders, their status history, and their payment
/// records.
///
/// `update` is a compare-and-swap on the order's version: it only
/// applies if the caller read the currently stored version, and it
/// bumps the version on success. Concurrent writers lose with
/// [`CheckoutError::ConcurrencyConflict`] and must reload.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a freshly created order at version 0.
    async fn insert(&self, order: Order) -> Result<()>;

    /// Loads an order by id.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Stores an updated order if the version still matches, returning
    /// the stored copy with its bumped version.
    async fn update(&self, order: Order) -> Result<Order>;

    /// Lists all orders, newest first.
    async fn list(&self) -> Result<Vec<Order>>;

    /// Finds the order carrying a payment intent reference.
    async fn find_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>>;

    /// Appends one status history row. Rows are never updated or
    /// removed.
    async fn append_history(&self, row: OrderStatusHistory) -> Result<()>;

    /// Returns an order's history rows ordered by change time.
    async fn history_for_order(&self, order_id: OrderId) -> Result<Vec<OrderStatusHistory>>;

    /// Appends one payment record to an order.
    async fn record_payment(&self, order_id: OrderId, payment: Payment) -> Result<()>;

    /// Replaces an order's payment records (used when a refund mutates
    /// an existing record).
    async fn save_payments(&self, order_id: OrderId, payments: Vec<Payment>) -> Result<()>;

    /// Returns an order's payment records in creation order.
    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>>;
}

#[derive(Debug, Default)]
struct StoreState {
    orders: HashMap<OrderId, Order>,
    history: HashMap<OrderId, Vec<OrderStatusHistory>>,
    payments: HashMap<OrderId, Vec<Payment>>,
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, mut order: Order) -> Result<()> {
        let mut state = self.state.write().await;
        order.set_version(0);
        state.orders.insert(order.id(), order);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn update(&self, mut order: Order) -> Result<Order> {
        let mut state = self.state.write().await;
        let order_id = order.id();
        let stored = state
            .orders
            .get(&order_id)
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if stored.version() != order.version() {
            return Err(CheckoutError::ConcurrencyConflict { order_id });
        }

        order.set_version(order.version() + 1);
        state.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state.orders.values().cloned().collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        Ok(orders)
    }

    async fn find_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .find(|o| o.payment_intent_id() == Some(intent_id))
            .cloned())
    }

    async fn append_history(&self, row: OrderStatusHistory) -> Result<()> {
        let mut state = self.state.write().await;
        state.history.entry(row.order_id).or_default().push(row);
        Ok(())
    }

    async fn history_for_order(&self, order_id: OrderId) -> Result<Vec<OrderStatusHistory>> {
        let state = self.state.read().await;
        let mut rows = state.history.get(&order_id).cloned().unwrap_or_default();
        rows.sort_by_key(|r| r.changed_at);
        Ok(rows)
    }

    async fn record_payment(&self, order_id: OrderId, payment: Payment) -> Result<()> {
        let mut state = self.state.write().await;
        state.payments.entry(order_id).or_default().push(payment);
        Ok(())
    }

    async fn save_payments(&self, order_id: OrderId, payments: Vec<Payment>) -> Result<()> {
        let mut state = self.state.write().await;
        state.payments.insert(order_id, payments);
        Ok(())
    }

    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let state = self.state.read().await;
        Ok(state.payments.get(&order_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{CustomerId, ProductId};
    use domain::{Actor, Address, Currency, Money, NewOrder, OrderItem, OrderStatus};

    fn sample_order() -> Order {
        Order::create(
            NewOrder {
                customer_id: Some(CustomerId::new()),
                buyer_email: "buyer@example.com".to_string(),
                currency: Currency::usd(),
                shipping_address: Address {
                    full_name: "Test Buyer".to_string(),
                    line1: "1 Test St".to_string(),
                    line2: None,
                    city: "Testville".to_string(),
                    state: None,
                    postal_code: "00000".to_string(),
                    country: "US".to_string(),
                },
                billing_address: None,
                items: vec![OrderItem {
                    product_id: ProductId::new(),
                    variant_id: None,
                    product_name: "Widget".to_string(),
                    description: None,
                    image_url: None,
                    unit_price: Money::from_cents(1000),
                    quantity: 1,
                    attributes: vec![],
                    is_digital: false,
                }],
                tax_amount: Money::zero(),
                shipping_cost: Money::zero(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        let order_id = order.id();

        store.insert(order).await.unwrap();

        let loaded = store.get(order_id).await.unwrap().unwrap();
        assert_eq!(loaded.id(), order_id);
        assert_eq!(loaded.version(), 0);
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        let order_id = order.id();
        store.insert(order).await.unwrap();

        let mut loaded = store.get(order_id).await.unwrap().unwrap();
        loaded.set_notes("gift wrap");
        let stored = store.update(loaded).await.unwrap();

        assert_eq!(stored.version(), 1);
        assert_eq!(stored.notes(), Some("gift wrap"));
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        let order_id = order.id();
        store.insert(order).await.unwrap();

        let first = store.get(order_id).await.unwrap().unwrap();
        let second = first.clone();

        store.update(first).await.unwrap();
        let result = store.update(second).await;

        assert!(matches!(
            result,
            Err(CheckoutError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_by_payment_intent() {
        let store = InMemoryOrderStore::new();
        let mut order = sample_order();
        order.set_payment_intent("pi_42");
        let order_id = order.id();
        store.insert(order).await.unwrap();

        let found = store.find_by_payment_intent("pi_42").await.unwrap();
        assert_eq!(found.map(|o| o.id()), Some(order_id));

        let missing = store.find_by_payment_intent("pi_other").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_history_is_ordered() {
        let store = InMemoryOrderStore::new();
        let order_id = OrderId::new();
        let base = Utc::now();

        let later = OrderStatusHistory::new(
            order_id,
            OrderStatus::Confirmed,
            OrderStatus::PaymentReceived,
            Actor::System,
            base + chrono::Duration::seconds(10),
        );
        let earlier = OrderStatusHistory::new(
            order_id,
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            Actor::System,
            base,
        );
        store.append_history(later).await.unwrap();
        store.append_history(earlier).await.unwrap();

        let rows = store.history_for_order(order_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_status, OrderStatus::Confirmed);
        assert_eq!(rows[1].to_status, OrderStatus::PaymentReceived);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = InMemoryOrderStore::new();
        let first = sample_order();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = sample_order();
        let second_id = second.id();

        store.insert(first).await.unwrap();
        store.insert(second).await.unwrap();

        let orders = store.list().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id(), second_id);
    }
}
