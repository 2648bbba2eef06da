//! Customer notification trait and in-memory implementation.
//!
//! Notifications are best-effort everywhere they are sent: a delivery
//! failure is logged and never fails the surrounding operation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Order, OrderStatus};

use crate::error::{CheckoutError, Result};

/// Trait for customer-facing notifications.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends the order confirmation after checkout.
    async fn order_created(&self, order: &Order) -> Result<()>;

    /// Notifies the customer of a status change.
    async fn order_status_changed(
        &self,
        order: &Order,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<String>,
    fail: bool,
}

/// In-memory notification service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    /// Creates a new in-memory notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every send.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    /// Returns the number of notifications delivered.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns the delivered notification summaries, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn order_created(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return Err(CheckoutError::Notification("smtp unavailable".to_string()));
        }
        state
            .sent
            .push(format!("created {} -> {}", order.order_number(), order.buyer_email()));
        Ok(())
    }

    async fn order_status_changed(
        &self,
        order: &Order,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return Err(CheckoutError::Notification("smtp unavailable".to_string()));
        }
        state
            .sent
            .push(format!("{} {from} -> {to}", order.order_number()));
        Ok(())
    }
}
