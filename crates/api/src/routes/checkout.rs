//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use checkout::CheckoutRequest;
use common::{BasketId, CustomerId};
use domain::Address;
use inventory::InventoryLedger;
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::orders::{AppState, OrderResponse};

#[derive(Deserialize)]
pub struct CheckoutBody {
    pub basket_id: uuid::Uuid,
    pub customer_id: Option<uuid::Uuid>,
    pub email: String,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
}

/// POST /checkout — create a pending order from a basket.
#[tracing::instrument(skip(state, body))]
pub async fn create<L: InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let request = CheckoutRequest {
        basket_id: BasketId::from_uuid(body.basket_id),
        customer_id: body.customer_id.map(CustomerId::from_uuid),
        buyer_email: body.email,
        shipping_address: body.shipping_address,
        billing_address: body.billing_address,
    };

    let order = state.checkout.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from_order(&order))))
}
