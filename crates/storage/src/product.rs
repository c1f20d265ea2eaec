use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::Product;

use crate::Result;

/// Storage for the product catalogue.
///
/// Product writes carry no outbox entry, so each call is its own
/// transaction.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create_product(&self, product: &Product) -> Result<()>;

    async fn get_product(&self, id: &str) -> Result<Product>;

    /// Lists products by ascending id, optionally within one category.
    async fn list_products(
        &self,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Product>>;

    /// Replaces every mutable column of an existing product.
    ///
    /// Returns `NotFound` when no row matched.
    async fn update_product(&self, product: &Product) -> Result<()>;

    /// Returns `NotFound` when no row matched.
    async fn delete_product(&self, id: &str) -> Result<()>;
}
