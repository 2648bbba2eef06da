//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{Currency, Money};

use crate::error::{CheckoutError, Result};

/// A payment intent created with the gateway before an order is
/// persisted. The client secret is handed to the frontend to collect
/// the payment.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: Option<String>,
}

/// Trait for payment gateway operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent for an order total.
    async fn create_intent(
        &self,
        order_id: OrderId,
        amount: Money,
        currency: &Currency,
    ) -> Result<PaymentIntent>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    intents: HashMap<String, (OrderId, Money)>,
    next_id: u32,
    fail_on_create: bool,
    delay: Option<std::time::Duration>,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to refuse the next create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Adds artificial latency to create calls, for timeout testing.
    pub fn set_delay(&self, delay: std::time::Duration) {
        self.state.write().unwrap().delay = Some(delay);
    }

    /// Returns the number of intents created.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }

    /// Returns the amount an intent was created for.
    pub fn intent_amount(&self, intent_id: &str) -> Option<Money> {
        self.state
            .read()
            .unwrap()
            .intents
            .get(intent_id)
            .map(|(_, amount)| *amount)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_intent(
        &self,
        order_id: OrderId,
        amount: Money,
        _currency: &Currency,
    ) -> Result<PaymentIntent> {
        let delay = self.state.read().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        if state.fail_on_create {
            return Err(CheckoutError::PaymentSetup(
                "gateway refused the request".to_string(),
            ));
        }

        state.next_id += 1;
        let intent_id = format!("pi_{:04}", state.next_id);
        state.intents.insert(intent_id.clone(), (order_id, amount));

        Ok(PaymentIntent {
            client_secret: Some(format!("{intent_id}_secret")),
            intent_id,
        })
    }
}
