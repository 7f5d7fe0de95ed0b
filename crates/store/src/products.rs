//! Product catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use domain::Product;
use tokio::sync::RwLock;

use crate::error::Result;

/// Read-mostly product catalog: point lookups by id and scans by
/// category. `put` exists for seeding.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Point lookup by product id.
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Returns the whole catalog.
    async fn list(&self) -> Result<Vec<Product>>;

    /// Returns all products in a category.
    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>>;

    /// Inserts or replaces a product.
    async fn put(&self, product: &Product) -> Result<()>;
}

/// In-memory product catalog for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductStore {
    /// Creates a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the catalog from an iterator of products.
    pub async fn seed(&self, products: impl IntoIterator<Item = Product>) {
        let mut map = self.products.write().await;
        for product in products {
            map.insert(product.product_id.clone(), product);
        }
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(product_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.product_id.as_str().cmp(b.product_id.as_str()));
        Ok(products)
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.product_id.as_str().cmp(b.product_id.as_str()));
        Ok(products)
    }

    async fn put(&self, product: &Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.product_id.clone(), product.clone());
        Ok(())
    }
}
