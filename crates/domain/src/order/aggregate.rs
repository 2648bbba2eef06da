//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

use super::{
    Address, Currency, Money, OrderItem, OrderNumber, OrderStatus, PaymentStatus,
};

/// Parameters for creating a new order.
///
/// Totals are computed from the items; tax and shipping come from the
/// caller's pricing policy.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub buyer_email: String,
    pub currency: Currency,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub items: Vec<OrderItem>,
    pub tax_amount: Money,
    pub shipping_cost: Money,
}

/// Order aggregate root.
///
/// Created in `Pending` status by the checkout orchestrator and mutated
/// only through status transitions and payment reconciliation. Orders are
/// never deleted, only moved to a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: OrderNumber,
    customer_id: Option<CustomerId>,
    buyer_email: String,
    status: OrderStatus,
    contains_digital_products: bool,
    requires_shipping: bool,
    subtotal: Money,
    tax_amount: Money,
    shipping_cost: Money,
    total_amount: Money,
    currency: Currency,
    payment_intent_id: Option<String>,
    payment_status: PaymentStatus,
    shipping_address: Address,
    billing_address: Option<Address>,
    items: Vec<OrderItem>,
    notes: Option<String>,
    tracking_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    /// Version for optimistic concurrency, bumped by the order store.
    #[serde(default)]
    version: u64,
}

impl Order {
    /// Creates a new order in `Pending` status with a fresh order number.
    ///
    /// Validates that there is at least one item, every quantity is
    /// positive, tax and shipping are non-negative, and the resulting
    /// totals are consistent.
    pub fn create(params: NewOrder, now: DateTime<Utc>) -> Result<Self> {
        if params.items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        for item in &params.items {
            if item.quantity == 0 {
                return Err(DomainError::InvalidQuantity { quantity: 0 });
            }
        }
        for amount in [params.tax_amount, params.shipping_cost] {
            if amount.is_negative() {
                return Err(DomainError::NegativeAmount { amount });
            }
        }

        let subtotal: Money = params.items.iter().map(OrderItem::line_total).sum();
        let total_amount = subtotal + params.tax_amount + params.shipping_cost;
        let contains_digital_products = params.items.iter().any(|i| i.is_digital);
        let requires_shipping = params.items.iter().any(|i| !i.is_digital);

        let mut order = Self {
            id: OrderId::new(),
            order_number: OrderNumber::generate(now),
            customer_id: params.customer_id,
            buyer_email: params.buyer_email,
            status: OrderStatus::Pending,
            contains_digital_products,
            requires_shipping,
            subtotal,
            tax_amount: params.tax_amount,
            shipping_cost: params.shipping_cost,
            total_amount,
            currency: params.currency,
            payment_intent_id: None,
            payment_status: PaymentStatus::Pending,
            shipping_address: params.shipping_address,
            billing_address: params.billing_address,
            items: params.items,
            notes: None,
            tracking_number: None,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        order.compute_totals()?;
        Ok(order)
    }

    /// Recomputes the subtotal from the items and validates that
    /// `subtotal + tax + shipping == total`.
    ///
    /// Only called during creation; items are immutable afterwards.
    pub fn compute_totals(&mut self) -> Result<()> {
        self.subtotal = self.items.iter().map(OrderItem::line_total).sum();
        let computed = self.subtotal + self.tax_amount + self.shipping_cost;
        if computed != self.total_amount {
            return Err(DomainError::TotalsMismatch {
                stated: self.total_amount,
                computed,
            });
        }
        Ok(())
    }

    /// Moves the order to `to` if the transition table allows it,
    /// returning the previous status.
    ///
    /// On a disallowed edge the order is left unchanged.
    pub fn apply_transition(&mut self, to: OrderStatus, now: DateTime<Utc>) -> Result<OrderStatus> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        let from = self.status;
        self.status = to;
        self.updated_at = now;
        Ok(from)
    }

    /// Records the payment intent reference returned by the gateway.
    pub fn set_payment_intent(&mut self, intent_id: impl Into<String>) {
        self.payment_intent_id = Some(intent_id.into());
    }

    /// Updates the order-level payment status.
    pub fn set_payment_status(&mut self, status: PaymentStatus, now: DateTime<Utc>) {
        self.payment_status = status;
        self.updated_at = now;
    }

    /// Sets the carrier tracking number.
    pub fn set_tracking_number(&mut self, tracking_number: impl Into<String>) {
        self.tracking_number = Some(tracking_number.into());
    }

    /// Replaces the free-form notes on the order.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = Some(notes.into());
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn buyer_email(&self) -> &str {
        &self.buyer_email
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn contains_digital_products(&self) -> bool {
        self.contains_digital_products
    }

    pub fn requires_shipping(&self) -> bool {
        self.requires_shipping
    }

    /// True for orders with only digital lines and no physical fulfillment.
    pub fn is_digital_only(&self) -> bool {
        self.contains_digital_products && !self.requires_shipping
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax_amount(&self) -> Money {
        self.tax_amount
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn payment_intent_id(&self) -> Option<&str> {
        self.payment_intent_id.as_deref()
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn address() -> Address {
        Address {
            full_name: "Ada Lovelace".to_string(),
            line1: "1 Analytical Way".to_string(),
            line2: None,
            city: "London".to_string(),
            state: None,
            postal_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
        }
    }

    fn item(quantity: u32, unit_cents: i64, digital: bool) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(),
            variant_id: None,
            product_name: "Widget".to_string(),
            description: Some("A fine widget".to_string()),
            image_url: None,
            unit_price: Money::from_cents(unit_cents),
            quantity,
            attributes: vec![],
            is_digital: digital,
        }
    }

    fn new_order(items: Vec<OrderItem>) -> NewOrder {
        NewOrder {
            customer_id: Some(common::CustomerId::new()),
            buyer_email: "ada@example.com".to_string(),
            currency: Currency::usd(),
            shipping_address: address(),
            billing_address: None,
            items,
            tax_amount: Money::zero(),
            shipping_cost: Money::zero(),
        }
    }

    #[test]
    fn test_create_computes_totals() {
        let mut params = new_order(vec![item(2, 1000, false), item(1, 500, false)]);
        params.tax_amount = Money::from_cents(250);
        params.shipping_cost = Money::from_cents(500);

        let order = Order::create(params, Utc::now()).unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.subtotal().cents(), 2500);
        assert_eq!(order.total_amount().cents(), 3250);
        assert!(order.requires_shipping());
        assert!(!order.contains_digital_products());
    }

    #[test]
    fn test_create_empty_order_fails() {
        let result = Order::create(new_order(vec![]), Utc::now());
        assert_eq!(result.unwrap_err(), DomainError::EmptyOrder);
    }

    #[test]
    fn test_create_zero_quantity_fails() {
        let result = Order::create(new_order(vec![item(0, 1000, false)]), Utc::now());
        assert_eq!(
            result.unwrap_err(),
            DomainError::InvalidQuantity { quantity: 0 }
        );
    }

    #[test]
    fn test_create_negative_shipping_fails() {
        let mut params = new_order(vec![item(1, 1000, false)]);
        params.shipping_cost = Money::from_cents(-100);
        let result = Order::create(params, Utc::now());
        assert!(matches!(
            result.unwrap_err(),
            DomainError::NegativeAmount { .. }
        ));
    }

    #[test]
    fn test_digital_only_flags() {
        let order = Order::create(new_order(vec![item(1, 1000, true)]), Utc::now()).unwrap();
        assert!(order.contains_digital_products());
        assert!(!order.requires_shipping());
        assert!(order.is_digital_only());

        let mixed = Order::create(
            new_order(vec![item(1, 1000, true), item(1, 500, false)]),
            Utc::now(),
        )
        .unwrap();
        assert!(mixed.contains_digital_products());
        assert!(mixed.requires_shipping());
        assert!(!mixed.is_digital_only());
    }

    #[test]
    fn test_compute_totals_detects_mismatch() {
        let mut order = Order::create(new_order(vec![item(2, 1000, false)]), Utc::now()).unwrap();
        order.total_amount = Money::from_cents(9999);
        let result = order.compute_totals();
        assert!(matches!(
            result.unwrap_err(),
            DomainError::TotalsMismatch { .. }
        ));
    }

    #[test]
    fn test_apply_transition_follows_table() {
        let mut order = Order::create(new_order(vec![item(1, 1000, false)]), Utc::now()).unwrap();

        let from = order.apply_transition(OrderStatus::Confirmed, Utc::now()).unwrap();
        assert_eq!(from, OrderStatus::Pending);
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn test_apply_invalid_transition_leaves_order_unchanged() {
        let mut order = Order::create(new_order(vec![item(1, 1000, false)]), Utc::now()).unwrap();
        let updated_before = order.updated_at();

        let result = order.apply_transition(OrderStatus::Delivered, Utc::now());

        assert_eq!(
            result.unwrap_err(),
            DomainError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered,
            }
        );
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.updated_at(), updated_before);
    }

    #[test]
    fn test_payment_fields() {
        let mut order = Order::create(new_order(vec![item(1, 1000, false)]), Utc::now()).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Pending);

        order.set_payment_intent("pi_123");
        order.set_payment_status(PaymentStatus::Succeeded, Utc::now());

        assert_eq!(order.payment_intent_id(), Some("pi_123"));
        assert_eq!(order.payment_status(), PaymentStatus::Succeeded);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let order = Order::create(new_order(vec![item(2, 1000, false)]), Utc::now()).unwrap();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id(), order.id());
        assert_eq!(deserialized.total_amount(), order.total_amount());
        assert_eq!(deserialized.order_number(), order.order_number());
    }
}
