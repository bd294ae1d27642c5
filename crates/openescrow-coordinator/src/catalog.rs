//! Minimal product catalog.
//!
//! Reference data, not contended state — checkout only reads it. The
//! full catalog (media, search, descriptions) lives outside this core;
//! this is the slice checkout needs: who sells the product and at what
//! base price.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use openescrow_types::{OpenescrowError, PartyId, ProductId, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sellable product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: PartyId,
    pub title: String,
    pub base_price: Decimal,
}

impl Product {
    #[must_use]
    pub fn new(seller_id: PartyId, title: impl Into<String>, base_price: Decimal) -> Self {
        Self {
            id: ProductId::new(),
            seller_id,
            title: title.into(),
            base_price,
        }
    }
}

/// In-memory product registry.
#[derive(Debug, Default)]
pub struct ProductCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl ProductCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn products(&self) -> MutexGuard<'_, HashMap<ProductId, Product>> {
        self.products.lock().expect("product catalog lock poisoned")
    }

    pub fn register(&self, product: Product) -> ProductId {
        let id = product.id;
        self.products().insert(id, product);
        id
    }

    pub fn get(&self, product_id: ProductId) -> Result<Product> {
        self.products()
            .get(&product_id)
            .cloned()
            .ok_or(OpenescrowError::ProductNotFound(product_id))
    }
}
