use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::{NewOrder, Order, OrderId, OrderStatus};

use crate::Result;

/// Transactional storage for orders.
///
/// Writes go through an explicit transaction handle so that callers can pair
/// them with other writes (see [`crate::OutboxStore`]). Dropping a handle
/// without committing discards its writes.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Transaction handle shared with stores that write alongside orders.
    type Tx: Send + 'static;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Commits every write made through `tx`.
    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    /// Discards every write made through `tx`.
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;

    /// Prepares `order` (id, timestamps, total, default status) and inserts
    /// the order row and its item rows.
    ///
    /// An id collision returns `AlreadyExists` and is not retried.
    async fn create_order_with_tx(&self, tx: &mut Self::Tx, order: NewOrder) -> Result<Order>;

    /// Sets `status` and bumps `updated_at`, returning the reloaded order.
    ///
    /// Returns `NotFound` when no row matched.
    async fn update_order_status_with_tx(
        &self,
        tx: &mut Self::Tx,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order>;

    /// Loads an order with its items in insertion order.
    async fn get_order(&self, id: &OrderId) -> Result<Order>;

    /// Lists a customer's orders by ascending id.
    async fn list_orders(&self, customer_id: &str, page: &PageRequest) -> Result<Page<Order>>;
}

/// Single-write helpers that manage their own transaction.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Creates an order in its own transaction.
    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        let mut tx = self.begin().await?;
        match self.create_order_with_tx(&mut tx, order).await {
            Ok(order) => {
                self.commit(tx).await?;
                Ok(order)
            }
            Err(e) => {
                self.rollback_logged(tx).await;
                Err(e)
            }
        }
    }

    /// Updates an order's status in its own transaction.
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        let mut tx = self.begin().await?;
        match self.update_order_status_with_tx(&mut tx, id, status).await {
            Ok(order) => {
                self.commit(tx).await?;
                Ok(order)
            }
            Err(e) => {
                self.rollback_logged(tx).await;
                Err(e)
            }
        }
    }

    /// Rolls back `tx`, logging instead of returning a rollback failure so
    /// the caller can report the error that caused it.
    async fn rollback_logged(&self, tx: Self::Tx) {
        if let Err(e) = self.rollback(tx).await {
            tracing::warn!(error = %e, "Transaction rollback failed");
        }
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
