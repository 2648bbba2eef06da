//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::DomainError;
use inventory::InventoryError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout, transition, or reconciliation error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    let status = match &err {
        CheckoutError::BasketNotFound { .. }
        | CheckoutError::OrderNotFound(_)
        | CheckoutError::UnknownPaymentIntent { .. } => StatusCode::NOT_FOUND,

        CheckoutError::EmptyBasket | CheckoutError::ProductUnavailable { .. } => {
            StatusCode::BAD_REQUEST
        }

        CheckoutError::InsufficientStock { .. } | CheckoutError::ConcurrencyConflict { .. } => {
            StatusCode::CONFLICT
        }

        CheckoutError::PaymentSetup(_) => StatusCode::BAD_GATEWAY,

        CheckoutError::Domain(domain_err) => match domain_err {
            DomainError::InvalidTransition { .. } => StatusCode::CONFLICT,
            DomainError::OverRefund { .. }
            | DomainError::InvalidQuantity { .. }
            | DomainError::EmptyOrder
            | DomainError::NegativeAmount { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },

        CheckoutError::Inventory(inventory_err) => match inventory_err {
            InventoryError::InsufficientStock { .. }
            | InventoryError::ReservationExpired { .. }
            | InventoryError::ReservationReleased { .. } => StatusCode::CONFLICT,
            InventoryError::ReservationNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },

        CheckoutError::BasketService(_)
        | CheckoutError::Notification(_)
        | CheckoutError::DigitalDelivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    }
    (status, err.to_string())
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
