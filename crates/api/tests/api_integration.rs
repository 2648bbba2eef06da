//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::CheckoutConfig;
use checkout::services::{Basket, CatalogListing};
use common::{BasketId, ProductId};
use domain::Money;
use inventory::{InMemoryInventoryLedger, InventoryLedger};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    services: api::DefaultServices,
    ledger: InMemoryInventoryLedger,
}

fn setup() -> TestApp {
    let ledger = InMemoryInventoryLedger::new();
    let (state, services) = api::create_default_state(ledger.clone(), CheckoutConfig::default());
    let app = api::create_app(state, get_metrics_handle());
    TestApp {
        app,
        services,
        ledger,
    }
}

/// Seeds a product with stock and a basket holding `quantity` of it.
async fn seed_basket(test: &TestApp, price_cents: i64, stock: i64, quantity: u32) -> BasketId {
    let product_id = ProductId::new();
    test.services.catalog.put_listing(CatalogListing {
        product_id,
        variant_id: None,
        name: "Widget".to_string(),
        description: None,
        image_url: None,
        unit_price: Money::from_cents(price_cents),
        is_digital: false,
        attributes: vec![],
    });
    test.ledger.set_stock(product_id, None, stock).await.unwrap();

    let mut basket = Basket::new(None);
    basket.add(product_id, None, quantity);
    let basket_id = basket.id;
    test.services.basket.put_basket(basket);
    basket_id
}

fn checkout_body(basket_id: BasketId) -> String {
    serde_json::to_string(&serde_json::json!({
        "basket_id": basket_id.as_uuid(),
        "email": "buyer@example.com",
        "shipping_address": {
            "full_name": "Test Buyer",
            "line1": "1 Test St",
            "line2": null,
            "city": "Testville",
            "state": null,
            "postal_code": "00000",
            "country": "US"
        }
    }))
    .unwrap()
}

async fn post_json(app: &axum::Router, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let test = setup();
    let (status, json) = get_json(&test.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_checkout_creates_pending_order() {
    let test = setup();
    let basket_id = seed_basket(&test, 1000, 5, 2).await;

    let (status, order) = post_json(&test.app, "/checkout", checkout_body(basket_id)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["total_cents"], 2000);
    assert!(order["payment_intent_id"].as_str().is_some());
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
}

#[tokio::test]
async fn test_checkout_empty_basket_is_bad_request() {
    let test = setup();
    let basket = Basket::new(None);
    let basket_id = basket.id;
    test.services.basket.put_basket(basket);

    let (status, _) = post_json(&test.app, "/checkout", checkout_body(basket_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_insufficient_stock_is_conflict() {
    let test = setup();
    let basket_id = seed_basket(&test, 1000, 1, 3).await;

    let (status, json) = post_json(&test.app, "/checkout", checkout_body(basket_id)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("insufficient stock"));
}

#[tokio::test]
async fn test_get_order_and_history() {
    let test = setup();
    let basket_id = seed_basket(&test, 1000, 5, 1).await;
    let (_, created) = post_json(&test.app, "/checkout", checkout_body(basket_id)).await;
    let order_id = created["id"].as_str().unwrap();

    let (status, order) = get_json(&test.app, &format!("/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["id"], order_id);
    assert_eq!(order["items"].as_array().unwrap().len(), 1);

    let (status, history) = get_json(&test.app, &format!("/orders/{order_id}/history")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = history.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["notes"], "Order created");
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let test = setup();
    let fake_id = uuid::Uuid::new_v4();
    let (status, _) = get_json(&test.app, &format!("/orders/{fake_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let test = setup();
    let (status, _) = get_json(&test.app, "/orders/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_orders() {
    let test = setup();
    let basket_id = seed_basket(&test, 500, 5, 1).await;
    post_json(&test.app, "/checkout", checkout_body(basket_id)).await;

    let (status, orders) = get_json(&test.app, "/orders").await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["total_cents"], 500);
}

#[tokio::test]
async fn test_webhook_success_advances_order() {
    let test = setup();
    let basket_id = seed_basket(&test, 1000, 5, 2).await;
    let (_, created) = post_json(&test.app, "/checkout", checkout_body(basket_id)).await;
    let intent_id = created["payment_intent_id"].as_str().unwrap();

    let (status, result) = post_json(
        &test.app,
        "/webhooks/payment",
        serde_json::to_string(&serde_json::json!({
            "type": "payment_succeeded",
            "intent_id": intent_id,
            "charge_id": "ch_1",
            "amount_cents": 2000
        }))
        .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["status"], "PaymentReceived");
    assert_eq!(result["payment_status"], "Succeeded");
}

#[tokio::test]
async fn test_webhook_unknown_intent_is_not_found() {
    let test = setup();
    let (status, _) = post_json(
        &test.app,
        "/webhooks/payment",
        serde_json::to_string(&serde_json::json!({
            "type": "payment_failed",
            "intent_id": "pi_unknown",
            "reason": "card_declined"
        }))
        .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_transition() {
    let test = setup();
    let basket_id = seed_basket(&test, 1000, 5, 1).await;
    let (_, created) = post_json(&test.app, "/checkout", checkout_body(basket_id)).await;
    let order_id = created["id"].as_str().unwrap();

    let (status, order) = post_json(
        &test.app,
        &format!("/orders/{order_id}/transition"),
        serde_json::to_string(&serde_json::json!({
            "to": "Cancelled",
            "actor": "ops@shop.test",
            "notes": "customer request"
        }))
        .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "Cancelled");

    let (_, history) = get_json(&test.app, &format!("/orders/{order_id}/history")).await;
    let rows = history.as_array().unwrap();
    assert_eq!(rows.last().unwrap()["changed_by"], "ops@shop.test");
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let test = setup();
    let basket_id = seed_basket(&test, 1000, 5, 1).await;
    let (_, created) = post_json(&test.app, "/checkout", checkout_body(basket_id)).await;
    let order_id = created["id"].as_str().unwrap();

    let (status, _) = post_json(
        &test.app,
        &format!("/orders/{order_id}/transition"),
        serde_json::to_string(&serde_json::json!({ "to": "Delivered" })).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test = setup();
    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
