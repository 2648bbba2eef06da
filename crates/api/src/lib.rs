//! HTTP API for the storefront order core.
//!
//! Exposes checkout, order reads, admin transitions, and payment
//! webhooks, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::services::{
    InMemoryBasketService, InMemoryCatalogService, InMemoryDigitalDeliveryService,
    InMemoryNotificationService, InMemoryPaymentGateway,
};
use checkout::{
    CheckoutConfig, CheckoutService, InMemoryOrderStore, ReconciliationService, TransitionService,
};
use inventory::InventoryLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L: InventoryLedger + Clone + 'static>(
    state: Arc<AppState<L>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout", post(routes::checkout::create::<L>))
        .route("/orders", get(routes::orders::list::<L>))
        .route("/orders/{id}", get(routes::orders::get::<L>))
        .route("/orders/{id}/history", get(routes::orders::history::<L>))
        .route("/orders/{id}/transition", post(routes::orders::transition::<L>))
        .route("/webhooks/payment", post(routes::webhooks::payment::<L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Handles to the in-memory collaborators backing the default wiring,
/// returned so callers can seed catalog entries, stock, and baskets.
pub struct DefaultServices {
    pub basket: InMemoryBasketService,
    pub catalog: InMemoryCatalogService,
}

/// Creates application state wired to in-memory collaborators around
/// the given inventory ledger.
pub fn create_default_state<L: InventoryLedger + Clone + 'static>(
    ledger: L,
    config: CheckoutConfig,
) -> (Arc<AppState<L>>, DefaultServices) {
    let basket = InMemoryBasketService::new();
    let catalog = InMemoryCatalogService::new();
    let gateway = InMemoryPaymentGateway::new();
    let notifications = InMemoryNotificationService::new();
    let digital = InMemoryDigitalDeliveryService::new();
    let store = InMemoryOrderStore::new();

    let checkout = CheckoutService::new(
        basket.clone(),
        catalog.clone(),
        ledger.clone(),
        gateway,
        notifications.clone(),
        store.clone(),
        config.clone(),
    );
    let transitions = TransitionService::new(
        store.clone(),
        ledger,
        notifications,
        config.transition_retry_budget,
    );
    let reconciliation =
        ReconciliationService::new(store.clone(), transitions.clone(), digital, config);

    let state = Arc::new(AppState {
        checkout,
        transitions,
        reconciliation,
        store,
    });

    (state, DefaultServices { basket, catalog })
}
