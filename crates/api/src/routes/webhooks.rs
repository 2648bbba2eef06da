//! Payment gateway webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::Money;
use inventory::InventoryLedger;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// Payment events the gateway delivers, keyed by intent reference.
/// Delivery is at-least-once; the success path is idempotent.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentWebhook {
    PaymentSucceeded {
        intent_id: String,
        charge_id: String,
        amount_cents: i64,
    },
    PaymentFailed {
        intent_id: String,
        reason: String,
    },
    Refund {
        intent_id: String,
        amount_cents: i64,
    },
}

#[derive(Serialize)]
pub struct WebhookResponse {
    pub order_id: String,
    pub status: String,
    pub payment_status: String,
}

/// POST /webhooks/payment — apply a gateway event to its order.
#[tracing::instrument(skip(state, event))]
pub async fn payment<L: InventoryLedger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(event): Json<PaymentWebhook>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let order = match event {
        PaymentWebhook::PaymentSucceeded {
            intent_id,
            charge_id,
            amount_cents,
        } => {
            state
                .reconciliation
                .on_payment_succeeded(&intent_id, &charge_id, Money::from_cents(amount_cents))
                .await?
        }
        PaymentWebhook::PaymentFailed { intent_id, reason } => {
            state
                .reconciliation
                .on_payment_failed(&intent_id, &reason)
                .await?
        }
        PaymentWebhook::Refund {
            intent_id,
            amount_cents,
        } => {
            state
                .reconciliation
                .on_refund(&intent_id, Money::from_cents(amount_cents))
                .await?
        }
    };

    Ok(Json(WebhookResponse {
        order_id: order.id().to_string(),
        status: order.status().to_string(),
        payment_status: order.payment_status().to_string(),
    }))
}
