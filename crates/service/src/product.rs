//! Product catalogue service.

use common::{Page, PageRequest};
use domain::{NewProduct, Product, ProductUpdate, ValidationError, timestamp_now};
use storage::ProductStore;

use crate::Result;

/// CRUD over the product catalogue. Product writes emit no outbox entries.
pub struct ProductService<P> {
    store: P,
}

impl<P: ProductStore> ProductService<P> {
    pub fn new(store: P) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip_all, fields(name = %new_product.name))]
    pub async fn create_product(&self, new_product: NewProduct) -> Result<Product> {
        new_product.validate()?;

        let product = new_product.prepare(timestamp_now());
        self.store.create_product(&product).await?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> Result<Product> {
        require_id(id)?;
        Ok(self.store.get_product(id).await?)
    }

    /// Lists products by id. An empty category means every category.
    #[tracing::instrument(skip(self, page), fields(page_size = page.page_size()))]
    pub async fn list_products(
        &self,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Product>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        Ok(self.store.list_products(category, page).await?)
    }

    /// Replaces a product's fields, keeping its id and creation time.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> Result<Product> {
        require_id(id)?;
        update.validate()?;

        let current = self.store.get_product(id).await?;
        let product = update.apply_to(&current, timestamp_now());
        self.store.update_product(&product).await?;

        tracing::info!(product_id = %product.id, status = %product.status, "Product updated");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<()> {
        require_id(id)?;
        self.store.get_product(id).await?;
        self.store.delete_product(id).await?;

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::IdRequired { entity: "product" }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use domain::ProductStatus;
    use storage::InMemoryStore;

    use super::*;
    use crate::ServiceError;

    fn widget(category: &str) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            price: 1299,
            stock: 10,
            category: category.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let service = ProductService::new(InMemoryStore::new());

        let created = service.create_product(widget("tools")).await.unwrap();
        assert_eq!(created.status, ProductStatus::Active);

        let fetched = service.get_product(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let service = ProductService::new(InMemoryStore::new());

        let mut bad = widget("tools");
        bad.price = 0;
        let err = service.create_product(bad).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NonPositivePrice(0))
        ));

        let mut bad = widget("tools");
        bad.name.clear();
        let err = service.create_product(bad).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NameRequired)
        ));
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let service = ProductService::new(InMemoryStore::new());
        let created = service.create_product(widget("tools")).await.unwrap();

        let updated = service
            .update_product(
                &created.id,
                ProductUpdate {
                    name: "Widget v2".to_string(),
                    price: 1499,
                    stock: 0,
                    category: "tools".to_string(),
                    status: ProductStatus::OutOfStock,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.price, 1499);
        assert_eq!(updated.status, ProductStatus::OutOfStock);
        assert_eq!(service.get_product(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_and_delete_missing_product_are_not_found() {
        let service = ProductService::new(InMemoryStore::new());

        let err = service
            .update_product(
                "missing",
                ProductUpdate {
                    name: "x".to_string(),
                    price: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "product", .. }));

        let err = service.delete_product("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_filters_by_category_and_pages() {
        let service = ProductService::new(InMemoryStore::new());
        for _ in 0..3 {
            service.create_product(widget("tools")).await.unwrap();
        }
        service.create_product(widget("toys")).await.unwrap();

        let first = service
            .list_products(Some("tools"), &PageRequest::first(2))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        let token = first.next_page_token.clone().unwrap();

        let second = service
            .list_products(Some("tools"), &PageRequest::after(2, token))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(second.is_last());

        let all = service
            .list_products(Some(""), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.items.len(), 4);
    }

    #[tokio::test]
    async fn delete_removes_product() {
        let service = ProductService::new(InMemoryStore::new());
        let created = service.create_product(widget("tools")).await.unwrap();

        service.delete_product(&created.id).await.unwrap();

        let err = service.get_product(&created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
