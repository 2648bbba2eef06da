//! Integration tests for the Order aggregate lifecycle.

use chrono::Utc;
use domain::{
    Actor, Address, Currency, DomainError, Money, NewOrder, Order, OrderItem, OrderStatus,
    OrderStatusHistory,
};

fn address() -> Address {
    Address {
        full_name: "Grace Hopper".to_string(),
        line1: "1 Compiler Court".to_string(),
        line2: Some("Suite 1906".to_string()),
        city: "Arlington".to_string(),
        state: Some("VA".to_string()),
        postal_code: "22202".to_string(),
        country: "US".to_string(),
    }
}

fn item(name: &str, quantity: u32, unit_cents: i64) -> OrderItem {
    OrderItem {
        product_id: common::ProductId::new(),
        variant_id: Some(common::VariantId::new()),
        product_name: name.to_string(),
        description: None,
        image_url: None,
        unit_price: Money::from_cents(unit_cents),
        quantity,
        attributes: vec![domain::AttributeSnapshot::new("color", "navy")],
        is_digital: false,
    }
}

fn create_order() -> Order {
    Order::create(
        NewOrder {
            customer_id: Some(common::CustomerId::new()),
            buyer_email: "grace@example.com".to_string(),
            currency: Currency::usd(),
            shipping_address: address(),
            billing_address: Some(address()),
            items: vec![item("Compiler Manual", 2, 1500), item("Nanosecond", 1, 30)],
            tax_amount: Money::from_cents(150),
            shipping_cost: Money::from_cents(500),
        },
        Utc::now(),
    )
    .unwrap()
}

#[test]
fn full_lifecycle_to_delivered() {
    let mut order = create_order();
    let mut history: Vec<OrderStatusHistory> = Vec::new();

    for to in [
        OrderStatus::Confirmed,
        OrderStatus::PaymentReceived,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let now = Utc::now();
        let from = order.apply_transition(to, now).unwrap();
        history.push(OrderStatusHistory::new(
            order.id(),
            from,
            to,
            Actor::System,
            now,
        ));
    }

    assert_eq!(order.status(), OrderStatus::Delivered);
    assert_eq!(history.len(), 5);

    // Each row's from_status chains onto the previous row's to_status.
    for pair in history.windows(2) {
        assert_eq!(pair[0].to_status, pair[1].from_status);
    }
    // Rows are ordered by changed_at.
    for pair in history.windows(2) {
        assert!(pair[0].changed_at <= pair[1].changed_at);
    }
}

#[test]
fn cancelled_is_terminal() {
    let mut order = create_order();
    order.apply_transition(OrderStatus::Cancelled, Utc::now()).unwrap();

    for to in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Delivered,
        OrderStatus::Returned,
    ] {
        let result = order.apply_transition(to, Utc::now());
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { .. })
        ));
    }
    assert_eq!(order.status(), OrderStatus::Cancelled);
}

#[test]
fn delivered_order_can_be_returned() {
    let mut order = create_order();
    for to in [
        OrderStatus::Confirmed,
        OrderStatus::PaymentReceived,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Returned,
    ] {
        order.apply_transition(to, Utc::now()).unwrap();
    }
    assert_eq!(order.status(), OrderStatus::Returned);
    assert!(order.status().is_terminal());
}

#[test]
fn totals_stay_consistent_for_non_pending_orders() {
    let mut order = create_order();
    order.apply_transition(OrderStatus::Confirmed, Utc::now()).unwrap();

    let computed = order.subtotal() + order.tax_amount() + order.shipping_cost();
    assert_eq!(computed, order.total_amount());

    let item_sum: Money = order.items().iter().map(|i| i.line_total()).sum();
    assert_eq!(item_sum, order.subtotal());
}
