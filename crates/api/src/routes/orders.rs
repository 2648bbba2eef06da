//! Order read and admin transition endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::services::{
    InMemoryBasketService, InMemoryCatalogService, InMemoryDigitalDeliveryService,
    InMemoryNotificationService, InMemoryPaymentGateway,
};
use checkout::{
    CheckoutService, InMemoryOrderStore, OrderStore, ReconciliationService, TransitionRequest,
    TransitionService,
};
use common::OrderId;
use domain::{Actor, Address, Order, OrderStatus, OrderStatusHistory};
use inventory::InventoryLedger;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// Generic over the inventory ledger so the same wiring runs against
/// the in-memory ledger or PostgreSQL.
pub struct AppState<L: InventoryLedger + Clone> {
    pub checkout: CheckoutService<
        InMemoryBasketService,
        InMemoryCatalogService,
        L,
        InMemoryPaymentGateway,
        InMemoryNotificationService,
        InMemoryOrderStore,
    >,
    pub transitions: TransitionService<InMemoryOrderStore, L, InMemoryNotificationService>,
    pub reconciliation: ReconciliationService<
        InMemoryOrderStore,
        L,
        InMemoryNotificationService,
        InMemoryDigitalDeliveryService,
    >,
    pub store: InMemoryOrderStore,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total_cents: i64,
    pub is_digital: bool,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: String,
    pub payment_intent_id: Option<String>,
    pub buyer_email: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub shipping_address: Address,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl OrderResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            status: order.status(),
            payment_status: order.payment_status().to_string(),
            payment_intent_id: order.payment_intent_id().map(str::to_string),
            buyer_email: order.buyer_email().to_string(),
            subtotal_cents: order.subtotal().cents(),
            tax_cents: order.tax_amount().cents(),
            shipping_cents: order.shipping_cost().cents(),
            total_cents: order.total_amount().cents(),
            currency: order.currency().to_string(),
            shipping_address: order.shipping_address().clone(),
            tracking_number: order.tracking_number().map(str::to_string),
            notes: order.notes().map(str::to_string),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    variant_id: item.variant_id.map(|v| v.to_string()),
                    product_name: item.product_name.clone(),
                    unit_price_cents: item.unit_price.cents(),
                    quantity: item.quantity,
                    line_total_cents: item.line_total().cents(),
                    is_digital: item.is_digital,
                })
                .collect(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
pub struct HistoryRowResponse {
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
    pub changed_at: chrono::DateTime<chrono::Utc>,
    pub changed_by: String,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
}

impl HistoryRowResponse {
    fn from_row(row: &OrderStatusHistory) -> Self {
        Self {
            from_status: row.from_status,
            to_status: row.to_status,
            changed_at: row.changed_at,
            changed_by: row.changed_by.label().to_string(),
            notes: row.notes.clone(),
            tracking_number: row.tracking_number.clone(),
        }
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct TransitionBody {
    pub to: OrderStatus,
    /// Admin identifier; omitted for system-initiated changes.
    pub actor: Option<String>,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
}

// -- Handlers --

/// GET /orders — list all orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<L: InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError> {
    let orders = state.store.list().await?;
    let summaries = orders
        .iter()
        .map(|order| OrderSummaryResponse {
            id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            status: order.status(),
            total_cents: order.total_amount().cents(),
            created_at: order.created_at(),
        })
        .collect();
    Ok(Json(summaries))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<L: InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .store
        .get(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(OrderResponse::from_order(&order)))
}

/// GET /orders/:id/history — the order's status change log.
#[tracing::instrument(skip(state))]
pub async fn history<L: InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryRowResponse>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    if state.store.get(order_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Order {id} not found")));
    }
    let rows = state.store.history_for_order(order_id).await?;
    Ok(Json(rows.iter().map(HistoryRowResponse::from_row).collect()))
}

/// POST /orders/:id/transition — admin status update.
#[tracing::instrument(skip(state, body))]
pub async fn transition<L: InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;

    let request = TransitionRequest {
        to: body.to,
        actor: body.actor.map(Actor::user).unwrap_or(Actor::System),
        notes: body.notes,
        tracking_number: body.tracking_number,
    };
    let order = state.transitions.transition(order_id, request).await?;
    Ok(Json(OrderResponse::from_order(&order)))
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    uuid::Uuid::parse_str(id)
        .map(OrderId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}
