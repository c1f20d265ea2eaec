use std::collections::HashMap;

use async_trait::async_trait;
use common::{Page, PageRequest};
use domain::{
    NewOrder, Order, OrderId, OrderItem, OrderStatus, OutboxEntry, Product, ProductStatus,
    timestamp_now,
};
use sqlx::{PgConnection, PgPool, Postgres, Row, postgres::PgRow};

use crate::{OrderStore, OutboxStore, ProductStore, Result, StoreError, TxStage};

/// Transaction handle for [`PostgresStore`].
///
/// Rolls back when dropped without a commit, which also covers a caller
/// future being cancelled mid-transaction.
pub type PgTx = sqlx::Transaction<'static, Postgres>;

const ORDER_COLUMNS: &str = "id, customer_id, status, total_amount, created_at, updated_at";

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, category, status, created_at, updated_at";

/// PostgreSQL-backed order, outbox and product store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn decode_error(message: String) -> StoreError {
        StoreError::Database(sqlx::Error::Decode(message.into()))
    }

    /// Maps an order row. Items are loaded separately.
    fn row_to_order(row: &PgRow) -> Result<Order> {
        let code: i16 = row.try_get("status")?;
        let status = OrderStatus::from_code(code)
            .ok_or_else(|| Self::decode_error(format!("unknown order status code {code}")))?;

        Ok(Order {
            id: OrderId::new(row.try_get::<String, _>("id")?),
            customer_id: row.try_get("customer_id")?,
            items: Vec::new(),
            status,
            total_amount: row.try_get("total_amount")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
        })
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let code: i16 = row.try_get("status")?;
        let status = ProductStatus::from_code(code)
            .ok_or_else(|| Self::decode_error(format!("unknown product status code {code}")))?;

        Ok(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            category: row.try_get("category")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn insert_items(conn: &mut PgConnection, order: &Order) -> Result<()> {
        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, quantity, price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id.as_str())
            .bind(position as i32)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Loads one order and its items on `conn`.
    async fn fetch_order(conn: &mut PgConnection, id: &OrderId) -> Result<Order> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::order_not_found(id.as_str()))?;
        let mut order = Self::row_to_order(&row)?;

        let item_rows = sqlx::query(
            r#"
            SELECT product_id, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&mut *conn)
        .await?;

        order.items = item_rows
            .iter()
            .map(Self::row_to_item)
            .collect::<Result<_>>()?;
        Ok(order)
    }

    /// Fills in the items of every order on a page with one query.
    async fn attach_items(&self, orders: &mut [Order]) -> Result<()> {
        if orders.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = orders.iter().map(|o| o.id.to_string()).collect();
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id ASC, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let order_id: String = row.try_get("order_id")?;
            by_order
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }

        for order in orders.iter_mut() {
            order.items = by_order.remove(order.id.as_str()).unwrap_or_default();
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        self.pool.begin().await.map_err(StoreError::at(TxStage::Begin))
    }

    async fn commit(&self, tx: PgTx) -> Result<()> {
        tx.commit().await.map_err(StoreError::at(TxStage::Commit))
    }

    async fn rollback(&self, tx: PgTx) -> Result<()> {
        tx.rollback().await.map_err(StoreError::at(TxStage::Rollback))
    }

    #[tracing::instrument(skip_all, fields(customer_id = %order.customer_id))]
    async fn create_order_with_tx(&self, tx: &mut PgTx, order: NewOrder) -> Result<Order> {
        let order = order.prepare(timestamp_now())?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, total_amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_str())
        .bind(&order.customer_id)
        .bind(order.status.code())
        .bind(order.total_amount)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::on_insert("order", order.id.as_str()))?;

        Self::insert_items(&mut **tx, &order).await?;

        tracing::debug!(order_id = %order.id, items = order.item_count(), "Order rows inserted");
        Ok(order)
    }

    #[tracing::instrument(skip(self, tx, id), fields(order_id = %id))]
    async fn update_order_status_with_tx(
        &self,
        tx: &mut PgTx,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE id = $1")
            .bind(id.as_str())
            .fetch_one(&mut **tx)
            .await?;
        if existing == 0 {
            return Err(StoreError::order_not_found(id.as_str()));
        }

        sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status.code())
            .bind(timestamp_now())
            .bind(id.as_str())
            .execute(&mut **tx)
            .await?;

        Self::fetch_order(&mut **tx, id).await
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_order(&mut conn, id).await
    }

    async fn list_orders(&self, customer_id: &str, page: &PageRequest) -> Result<Page<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE customer_id = $1 AND ($2::TEXT IS NULL OR id > $2)
            ORDER BY id ASC
            LIMIT $3
            "#
        ))
        .bind(customer_id)
        .bind(page.page_token())
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        let mut result = Page::from_overfetch(orders, page, |o| o.id.to_string());
        self.attach_items(&mut result.items).await?;
        Ok(result)
    }
}

#[async_trait]
impl OutboxStore for PostgresStore {
    type Tx = PgTx;

    #[tracing::instrument(skip_all, fields(aggregate_id = %entry.aggregate_id, event_type = %entry.event_type))]
    async fn save_outbox_entry_with_tx(&self, tx: &mut PgTx, entry: &OutboxEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_outbox (id, aggregate_type, aggregate_id, event_type, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.aggregate_type.as_str())
        .bind(&entry.aggregate_id)
        .bind(entry.event_type.as_str())
        .bind(&entry.payload)
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn create_product(&self, product: &Product) -> Result<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO products ({PRODUCT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#
        ))
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.status.code())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::on_insert("product", product.id.as_str()))?;

        Ok(())
    }

    async fn get_product(&self, id: &str) -> Result<Product> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::product_not_found(id))?;

        Self::row_to_product(&row)
    }

    async fn list_products(
        &self,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Product>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR id > $2)
            ORDER BY id ASC
            LIMIT $3
            "#
        ))
        .bind(category)
        .bind(page.page_token())
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        let products = rows
            .iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::from_overfetch(products, page, |p| p.id.clone()))
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, stock = $5,
                category = $6, status = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.status.code())
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::product_not_found(&product.id));
        }
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::product_not_found(id));
        }
        Ok(())
    }
}
