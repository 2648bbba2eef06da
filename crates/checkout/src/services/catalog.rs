//! Catalog service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ProductId, VariantId};
use domain::{AttributeSnapshot, Money};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A resolved, purchasable catalog entry: a product, optionally
/// narrowed to one of its variants, with its current price.
///
/// This is what the orchestrator snapshots into order items: the price
/// and presentation come from the catalog at order-creation time, not
/// from whatever the basket captured earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogListing {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub is_digital: bool,
    pub attributes: Vec<AttributeSnapshot>,
}

/// Trait for catalog lookups.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Resolves a (product, variant) key to its current listing, or
    /// `None` if the catalog no longer offers it.
    async fn resolve(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Option<CatalogListing>>;
}

/// In-memory catalog service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogService {
    listings: Arc<RwLock<HashMap<(ProductId, Option<VariantId>), CatalogListing>>>,
}

impl InMemoryCatalogService {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a listing.
    pub fn put_listing(&self, listing: CatalogListing) {
        self.listings
            .write()
            .unwrap()
            .insert((listing.product_id, listing.variant_id), listing);
    }

    /// Removes a listing, simulating a delisted product.
    pub fn remove_listing(&self, product_id: ProductId, variant_id: Option<VariantId>) {
        self.listings
            .write()
            .unwrap()
            .remove(&(product_id, variant_id));
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalogService {
    async fn resolve(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Option<CatalogListing>> {
        Ok(self
            .listings
            .read()
            .unwrap()
            .get(&(product_id, variant_id))
            .cloned())
    }
}
