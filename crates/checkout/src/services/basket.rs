//! Basket service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{BasketId, CustomerId, ProductId, VariantId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One line in a basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItem {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

/// A shopping basket.
///
/// Items are insertion-ordered and keyed by (product, variant): adding
/// an already present key merges quantities instead of creating a
/// second line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    pub id: BasketId,
    pub customer_id: Option<CustomerId>,
    pub items: Vec<BasketItem>,
}

impl Basket {
    /// Creates an empty basket.
    pub fn new(customer_id: Option<CustomerId>) -> Self {
        Self {
            id: BasketId::new(),
            customer_id,
            items: Vec::new(),
        }
    }

    /// Adds quantity for a (product, variant) key, merging into an
    /// existing line if one is present.
    pub fn add(&mut self, product_id: ProductId, variant_id: Option<VariantId>, quantity: u32) {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id && i.variant_id == variant_id)
        {
            item.quantity += quantity;
        } else {
            self.items.push(BasketItem {
                product_id,
                variant_id,
                quantity,
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Trait for basket storage owned by the storefront frontend.
#[async_trait]
pub trait BasketService: Send + Sync {
    /// Loads a basket by id.
    async fn get_basket(&self, basket_id: BasketId) -> Result<Option<Basket>>;

    /// Empties a basket after a successful checkout.
    async fn clear_basket(&self, basket_id: BasketId) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryBasketState {
    baskets: HashMap<BasketId, Basket>,
    fail_on_clear: bool,
}

/// In-memory basket service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBasketService {
    state: Arc<RwLock<InMemoryBasketState>>,
}

impl InMemoryBasketService {
    /// Creates a new in-memory basket service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a basket, replacing any existing one with the same id.
    pub fn put_basket(&self, basket: Basket) {
        self.state
            .write()
            .unwrap()
            .baskets
            .insert(basket.id, basket);
    }

    /// Configures the service to fail clear calls.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.state.write().unwrap().fail_on_clear = fail;
    }

    /// Returns true if a basket still holds items.
    pub fn has_items(&self, basket_id: BasketId) -> bool {
        self.state
            .read()
            .unwrap()
            .baskets
            .get(&basket_id)
            .is_some_and(|b| !b.is_empty())
    }
}

#[async_trait]
impl BasketService for InMemoryBasketService {
    async fn get_basket(&self, basket_id: BasketId) -> Result<Option<Basket>> {
        Ok(self.state.read().unwrap().baskets.get(&basket_id).cloned())
    }

    async fn clear_basket(&self, basket_id: BasketId) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_clear {
            return Err(crate::error::CheckoutError::BasketService(
                "basket service unavailable".to_string(),
            ));
        }
        if let Some(basket) = state.baskets.get_mut(&basket_id) {
            basket.items.clear();
        }
        Ok(())
    }
}
