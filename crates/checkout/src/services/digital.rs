//! Digital delivery trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, ProductId};
use domain::Order;

use crate::error::{CheckoutError, Result};

/// Trait for granting download access once a digital order is paid.
#[async_trait]
pub trait DigitalDeliveryService: Send + Sync {
    /// Grants download access for every digital line of a paid order.
    async fn grant_access(&self, order: &Order) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryDigitalState {
    grants: Vec<(OrderId, ProductId)>,
    fail: bool,
}

/// In-memory digital delivery service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDigitalDeliveryService {
    state: Arc<RwLock<InMemoryDigitalState>>,
}

impl InMemoryDigitalDeliveryService {
    /// Creates a new in-memory digital delivery service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail grant calls.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    /// Returns the number of product grants issued.
    pub fn grant_count(&self) -> usize {
        self.state.read().unwrap().grants.len()
    }

    /// Returns true if a grant exists for (order, product).
    pub fn has_grant(&self, order_id: OrderId, product_id: ProductId) -> bool {
        self.state
            .read()
            .unwrap()
            .grants
            .contains(&(order_id, product_id))
    }
}

#[async_trait]
impl DigitalDeliveryService for InMemoryDigitalDeliveryService {
    async fn grant_access(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return Err(CheckoutError::DigitalDelivery(
                "digital delivery unavailable".to_string(),
            ));
        }
        for item in order.items().iter().filter(|i| i.is_digital) {
            let grant = (order.id(), item.product_id);
            if !state.grants.contains(&grant) {
                state.grants.push(grant);
            }
        }
        Ok(())
    }
}
