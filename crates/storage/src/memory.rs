use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::{NewOrder, Order, OrderId, OrderStatus, OutboxEntry, Product, timestamp_now};
use tokio::sync::RwLock;

use crate::{OrderStore, OutboxStore, ProductStore, Result, StoreError};

#[derive(Default)]
struct Tables {
    orders: BTreeMap<OrderId, Order>,
    outbox: Vec<OutboxEntry>,
    products: BTreeMap<String, Product>,
}

/// Writes staged by an open in-memory transaction.
///
/// Nothing is visible to readers until [`OrderStore::commit`]. Dropping the
/// handle discards the staged writes.
#[derive(Debug, Default)]
pub struct MemoryTx {
    orders: BTreeMap<OrderId, Order>,
    created: Vec<OrderId>,
    outbox: Vec<OutboxEntry>,
}

/// In-memory store for tests and local runs.
///
/// Orders, outbox entries and products share one lock, so a committed
/// transaction becomes visible all at once.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every committed outbox entry in insertion order.
    pub async fn outbox_entries(&self) -> Vec<OutboxEntry> {
        self.tables.read().await.outbox.clone()
    }

    /// Returns the committed outbox entries for one order.
    pub async fn outbox_entries_for(&self, order_id: &OrderId) -> Vec<OutboxEntry> {
        self.tables
            .read()
            .await
            .outbox
            .iter()
            .filter(|e| e.aggregate_id == order_id.as_str())
            .cloned()
            .collect()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of committed outbox entries.
    pub async fn outbox_count(&self) -> usize {
        self.tables.read().await.outbox.len()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.orders.clear();
        tables.outbox.clear();
        tables.products.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        Ok(MemoryTx::default())
    }

    async fn commit(&self, tx: MemoryTx) -> Result<()> {
        let mut tables = self.tables.write().await;

        // Another transaction may have committed the same id since it was staged.
        if let Some(id) = tx.created.iter().find(|id| tables.orders.contains_key(*id)) {
            return Err(StoreError::AlreadyExists {
                entity: "order",
                id: id.to_string(),
            });
        }

        tables.orders.extend(tx.orders);
        tables.outbox.extend(tx.outbox);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<()> {
        drop(tx);
        Ok(())
    }

    async fn create_order_with_tx(&self, tx: &mut MemoryTx, order: NewOrder) -> Result<Order> {
        let order = order.prepare(timestamp_now())?;

        let exists = tx.orders.contains_key(&order.id)
            || self.tables.read().await.orders.contains_key(&order.id);
        if exists {
            return Err(StoreError::AlreadyExists {
                entity: "order",
                id: order.id.to_string(),
            });
        }

        tx.created.push(order.id.clone());
        tx.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn update_order_status_with_tx(
        &self,
        tx: &mut MemoryTx,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        let current = match tx.orders.get(id) {
            Some(staged) => staged.clone(),
            None => self
                .tables
                .read()
                .await
                .orders
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::order_not_found(id.as_str()))?,
        };

        let updated = Order {
            status,
            updated_at: timestamp_now(),
            ..current
        };
        tx.orders.insert(id.clone(), updated.clone());
        Ok(updated)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order> {
        self.tables
            .read()
            .await
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::order_not_found(id.as_str()))
    }

    async fn list_orders(&self, customer_id: &str, page: &PageRequest) -> Result<Page<Order>> {
        let tables = self.tables.read().await;
        let rows: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .filter(|o| page.page_token().is_none_or(|token| o.id.as_str() > token))
            .take(page.fetch_limit() as usize)
            .cloned()
            .collect();

        Ok(Page::from_overfetch(rows, page, |o| o.id.to_string()))
    }
}

#[async_trait]
impl OutboxStore for InMemoryStore {
    type Tx = MemoryTx;

    async fn save_outbox_entry_with_tx(
        &self,
        tx: &mut MemoryTx,
        entry: &OutboxEntry,
    ) -> Result<()> {
        tx.outbox.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn create_product(&self, product: &Product) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.products.contains_key(&product.id) {
            return Err(StoreError::AlreadyExists {
                entity: "product",
                id: product.id.clone(),
            });
        }
        tables.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn get_product(&self, id: &str) -> Result<Product> {
        self.tables
            .read()
            .await
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::product_not_found(id))
    }

    async fn list_products(
        &self,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Product>> {
        let tables = self.tables.read().await;
        let rows: Vec<Product> = tables
            .products
            .values()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .filter(|p| page.page_token().is_none_or(|token| p.id.as_str() > token))
            .take(page.fetch_limit() as usize)
            .cloned()
            .collect();

        Ok(Page::from_overfetch(rows, page, |p| p.id.clone()))
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(StoreError::product_not_found(&product.id)),
        }
    }

    async fn delete_product(&self, id: &str) -> Result<()> {
        self.tables
            .write()
            .await
            .products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::product_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderStoreExt;
    use domain::{NewProduct, OrderItem};

    fn new_order(customer_id: &str) -> NewOrder {
        NewOrder::new(
            customer_id,
            vec![OrderItem::new("p1", 2, 1000), OrderItem::new("p2", 1, 1500)],
        )
    }

    #[tokio::test]
    async fn staged_writes_are_invisible_until_commit() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let order = store
            .create_order_with_tx(&mut tx, new_order("c1"))
            .await
            .unwrap();
        let entry = OutboxEntry::order_created(&order).unwrap();
        store
            .save_outbox_entry_with_tx(&mut tx, &entry)
            .await
            .unwrap();

        assert!(store.get_order(&order.id).await.unwrap_err().is_not_found());
        assert_eq!(store.outbox_count().await, 0);

        store.commit(tx).await.unwrap();

        assert_eq!(store.get_order(&order.id).await.unwrap(), order);
        assert_eq!(store.outbox_entries().await, vec![entry]);
    }

    #[tokio::test]
    async fn create_rejects_invalid_order_before_staging() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let mut order = new_order("c1");
        order.status = OrderStatus::Shipped;

        let err = store
            .create_order_with_tx(&mut tx, order)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        store.commit(tx).await.unwrap();
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn rollback_discards_staged_writes() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let order = store
            .create_order_with_tx(&mut tx, new_order("c1"))
            .await
            .unwrap();
        let entry = OutboxEntry::order_created(&order).unwrap();
        store
            .save_outbox_entry_with_tx(&mut tx, &entry)
            .await
            .unwrap();
        store.rollback(tx).await.unwrap();

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.outbox_count().await, 0);
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = InMemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            store
                .create_order_with_tx(&mut tx, new_order("c1"))
                .await
                .unwrap();
        }
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn update_status_of_missing_order_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update_order_status(&OrderId::new("missing"), OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_status_sees_order_staged_in_same_transaction() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let order = store
            .create_order_with_tx(&mut tx, new_order("c1"))
            .await
            .unwrap();
        let updated = store
            .update_order_status_with_tx(&mut tx, &order.id, OrderStatus::Processing)
            .await
            .unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(updated.items, order.items);
        assert_eq!(
            store.get_order(&order.id).await.unwrap().status,
            OrderStatus::Processing
        );
    }

    #[tokio::test]
    async fn duplicate_order_id_is_rejected() {
        let store = InMemoryStore::new();
        store
            .create_order(new_order("c1").with_id("dup"))
            .await
            .unwrap();

        let err = store
            .create_order(new_order("c1").with_id("dup"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { entity: "order", .. }));
    }

    #[tokio::test]
    async fn list_orders_pages_by_id_per_customer() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .create_order(new_order("c1").with_id(format!("o{i}")))
                .await
                .unwrap();
        }
        store
            .create_order(new_order("c2").with_id("o9"))
            .await
            .unwrap();

        let first = store
            .list_orders("c1", &PageRequest::first(2))
            .await
            .unwrap();
        let ids: Vec<_> = first.items.iter().map(|o| o.id.to_string()).collect();
        assert_eq!(ids, ["o0", "o1"]);
        assert_eq!(first.next_page_token.as_deref(), Some("o1"));

        let last = store
            .list_orders("c1", &PageRequest::after(3, "o1"))
            .await
            .unwrap();
        let ids: Vec<_> = last.items.iter().map(|o| o.id.to_string()).collect();
        assert_eq!(ids, ["o2", "o3", "o4"]);
        assert!(last.is_last());
    }

    #[tokio::test]
    async fn product_crud() {
        let store = InMemoryStore::new();
        let product = NewProduct {
            name: "Widget".to_string(),
            price: 500,
            category: "tools".to_string(),
            ..Default::default()
        }
        .prepare(timestamp_now());

        store.create_product(&product).await.unwrap();
        assert_eq!(store.get_product(&product.id).await.unwrap(), product);

        let mut changed = product.clone();
        changed.stock = 9;
        store.update_product(&changed).await.unwrap();
        assert_eq!(store.get_product(&product.id).await.unwrap().stock, 9);

        let tools = store
            .list_products(Some("tools"), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(tools.items.len(), 1);
        let toys = store
            .list_products(Some("toys"), &PageRequest::default())
            .await
            .unwrap();
        assert!(toys.items.is_empty());

        store.delete_product(&product.id).await.unwrap();
        assert!(
            store
                .delete_product(&product.id)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}
