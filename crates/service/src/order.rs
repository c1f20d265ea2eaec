//! The order write service.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{Page, PageRequest};
use domain::{NewOrder, Order, OrderId, OrderStatus, OutboxEntry, ValidationError};
use storage::{OrderStore, OrderStoreExt, OutboxStore};

use crate::{Outcome, Result, ServiceError, WriteMetrics, WriteOperation};

/// Upper bound on one write transaction unless configured otherwise.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates orders and changes their status, recording one outbox entry per
/// write in the same transaction.
///
/// The outbox store must use the order store's transaction handle, which is
/// what lets both writes commit together.
pub struct OrderService<S, O> {
    orders: S,
    outbox: O,
    metrics: Arc<dyn WriteMetrics>,
    tx_timeout: Duration,
}

impl<S, O> OrderService<S, O>
where
    S: OrderStore,
    O: OutboxStore<Tx = S::Tx>,
{
    pub fn new(orders: S, outbox: O, metrics: Arc<dyn WriteMetrics>) -> Self {
        Self {
            orders,
            outbox,
            metrics,
            tx_timeout: DEFAULT_TX_TIMEOUT,
        }
    }

    /// Sets how long a write transaction may run before it is abandoned.
    pub fn with_tx_timeout(mut self, tx_timeout: Duration) -> Self {
        self.tx_timeout = tx_timeout;
        self
    }

    pub fn tx_timeout(&self) -> Duration {
        self.tx_timeout
    }

    /// Returns the order store.
    pub fn store(&self) -> &S {
        &self.orders
    }

    /// Validates and persists a new order together with its `order_created`
    /// outbox entry.
    #[tracing::instrument(
        skip_all,
        fields(
            customer_id = %new_order.customer_id,
            items = new_order.items.len(),
            order_id = tracing::field::Empty
        )
    )]
    pub async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let started = Instant::now();
        let result = self.create_order_inner(new_order).await;
        self.metrics
            .record_write(WriteOperation::CreateOrder, Outcome::of(&result), started.elapsed());
        result
    }

    async fn create_order_inner(&self, new_order: NewOrder) -> Result<Order> {
        new_order.validate()?;

        let (order, entry) = self.bounded(self.commit_created(new_order)).await?;

        self.metrics.record_outbox_entry(entry.event_type);
        tracing::Span::current().record("order_id", tracing::field::display(&order.id));
        tracing::info!(
            order_id = %order.id,
            total_amount = order.total_amount,
            outbox_entry_id = %entry.id,
            "Order created"
        );
        Ok(order)
    }

    async fn commit_created(&self, new_order: NewOrder) -> Result<(Order, OutboxEntry)> {
        let mut tx = self.orders.begin().await?;
        let written = self.write_created(&mut tx, new_order).await;
        self.finish(tx, written).await
    }

    async fn write_created(
        &self,
        tx: &mut S::Tx,
        new_order: NewOrder,
    ) -> Result<(Order, OutboxEntry)> {
        let order = self.orders.create_order_with_tx(tx, new_order).await?;
        let entry = OutboxEntry::order_created(&order)?;
        self.outbox.save_outbox_entry_with_tx(tx, &entry).await?;
        Ok((order, entry))
    }

    /// Sets an order's status and records an `order_status_updated` outbox
    /// entry in the same transaction.
    ///
    /// Any status may follow any other. Only the UNSPECIFIED sentinel is
    /// rejected.
    #[tracing::instrument(skip(self, id), fields(order_id = %id))]
    pub async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        let started = Instant::now();
        let result = self.update_order_status_inner(id, status).await;
        self.metrics.record_write(
            WriteOperation::UpdateOrderStatus,
            Outcome::of(&result),
            started.elapsed(),
        );
        result
    }

    async fn update_order_status_inner(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        require_id(id)?;
        if status.is_unspecified() {
            return Err(ValidationError::UnspecifiedStatus.into());
        }

        let (order, entry) = self
            .bounded(self.commit_status_updated(id, status))
            .await?;

        self.metrics.record_outbox_entry(entry.event_type);
        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            outbox_entry_id = %entry.id,
            "Order status updated"
        );
        Ok(order)
    }

    async fn commit_status_updated(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(Order, OutboxEntry)> {
        let mut tx = self.orders.begin().await?;
        let written = self.write_status_updated(&mut tx, id, status).await;
        self.finish(tx, written).await
    }

    async fn write_status_updated(
        &self,
        tx: &mut S::Tx,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(Order, OutboxEntry)> {
        let order = self
            .orders
            .update_order_status_with_tx(tx, id, status)
            .await?;
        let entry = OutboxEntry::order_status_updated(&order)?;
        self.outbox.save_outbox_entry_with_tx(tx, &entry).await?;
        Ok((order, entry))
    }

    /// Loads one order with its items.
    #[tracing::instrument(skip(self, id), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        require_id(id)?;
        Ok(self.orders.get_order(id).await?)
    }

    /// Lists a customer's orders, one keyset page at a time.
    #[tracing::instrument(skip(self, page), fields(page_size = page.page_size()))]
    pub async fn list_orders(&self, customer_id: &str, page: &PageRequest) -> Result<Page<Order>> {
        if customer_id.trim().is_empty() {
            return Err(ValidationError::CustomerIdRequired.into());
        }
        Ok(self.orders.list_orders(customer_id, page).await?)
    }

    /// Commits `tx` if both writes succeeded, otherwise rolls it back and
    /// returns the write error.
    async fn finish<T>(&self, tx: S::Tx, written: Result<T>) -> Result<T> {
        match written {
            Ok(value) => {
                self.orders.commit(tx).await?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rolling back order transaction");
                self.orders.rollback_logged(tx).await;
                Err(e)
            }
        }
    }

    /// Runs a transaction under the timeout. On expiry the future, and with
    /// it the open transaction, is dropped.
    async fn bounded<T>(&self, transaction: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.tx_timeout, transaction).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout = ?self.tx_timeout, "Order transaction timed out");
                Err(ServiceError::Timeout(self.tx_timeout))
            }
        }
    }
}

fn require_id(id: &OrderId) -> Result<()> {
    if id.as_str().trim().is_empty() {
        return Err(ValidationError::IdRequired { entity: "order" }.into());
    }
    Ok(())
}
