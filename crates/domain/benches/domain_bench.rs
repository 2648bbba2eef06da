use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Address, Currency, Money, NewOrder, Order, OrderItem, OrderStatus};
use std::hint::black_box;

fn address() -> Address {
    Address {
        full_name: "Bench Customer".to_string(),
        line1: "1 Benchmark Road".to_string(),
        line2: None,
        city: "Testville".to_string(),
        state: None,
        postal_code: "00000".to_string(),
        country: "US".to_string(),
    }
}

fn items(n: usize) -> Vec<OrderItem> {
    (0..n)
        .map(|i| OrderItem {
            product_id: common::ProductId::new(),
            variant_id: None,
            product_name: format!("Product {i}"),
            description: None,
            image_url: None,
            unit_price: Money::from_cents(100 + i as i64),
            quantity: 1 + (i as u32 % 4),
            attributes: vec![],
            is_digital: false,
        })
        .collect()
}

fn bench_create_order(c: &mut Criterion) {
    let items = items(50);

    c.bench_function("domain/create_order_50_items", |b| {
        b.iter(|| {
            let params = NewOrder {
                customer_id: Some(common::CustomerId::new()),
                buyer_email: "bench@example.com".to_string(),
                currency: Currency::usd(),
                shipping_address: address(),
                billing_address: None,
                items: items.clone(),
                tax_amount: Money::zero(),
                shipping_cost: Money::from_cents(500),
            };
            black_box(Order::create(params, Utc::now()).unwrap());
        });
    });
}

fn bench_transition_table(c: &mut Criterion) {
    c.bench_function("domain/transition_table_full_scan", |b| {
        b.iter(|| {
            let mut allowed = 0usize;
            for from in OrderStatus::all() {
                for to in OrderStatus::all() {
                    if from.can_transition_to(*to) {
                        allowed += 1;
                    }
                }
            }
            black_box(allowed)
        });
    });
}

criterion_group!(benches, bench_create_order, bench_transition_table);
criterion_main!(benches);
