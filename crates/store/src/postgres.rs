//! PostgreSQL-backed store implementations.
//!
//! Schema lives in [`SCHEMA`] and is applied by [`run_migrations`].
//! Queries use runtime binding so the crate builds without a live
//! database.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{Cart, CartItem, InteractionEvent, LineItem, Order, Product, ShippingInfo};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::carts::CartStore;
use crate::documents::{Document, DocumentStore};
use crate::error::{Result, StoreError};
use crate::interactions::InteractionStore;
use crate::orders::OrderStore;
use crate::products::ProductStore;
use crate::queue::{QueueMessage, WorkQueue};

/// DDL for every table this crate owns.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    order_id UUID PRIMARY KEY,
    user_id TEXT NOT NULL,
    items JSONB NOT NULL,
    total_cents BIGINT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    processed_at TIMESTAMPTZ,
    shipping_info JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS orders_user_id_idx ON orders (user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS carts (
    user_id TEXT PRIMARY KEY,
    items JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    product_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    price_cents BIGINT NOT NULL,
    category TEXT NOT NULL,
    description TEXT
);
CREATE INDEX IF NOT EXISTS products_category_idx ON products (category);

CREATE TABLE IF NOT EXISTS interactions (
    user_id TEXT NOT NULL,
    product_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    category TEXT NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (user_id, occurred_at, product_id)
);

CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY,
    body BYTEA NOT NULL,
    content_type TEXT NOT NULL,
    metadata JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS order_jobs (
    id BIGSERIAL PRIMARY KEY,
    body TEXT NOT NULL,
    visible_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    receive_count INT NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS order_jobs_visible_at_idx ON order_jobs (visible_at, id);
"#;

/// Applies the schema to the given pool.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::info!("database schema applied");
    Ok(())
}

// ---------------------------------------------------------------------------
// Orders

/// PostgreSQL order store.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<LineItem> = serde_json::from_value(items_json)?;
        let shipping_json: serde_json::Value = row.try_get("shipping_info")?;
        let shipping_info: ShippingInfo = serde_json::from_value(shipping_json)?;
        let status: String = row.try_get("status")?;
        let status = status.parse().map_err(StoreError::Corrupt)?;

        Ok(Order {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            items,
            total: common::Money::from_cents(row.try_get("total_cents")?),
            status,
            created_at: row.try_get("created_at")?,
            processed_at: row.try_get("processed_at")?,
            shipping_info,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn put(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (order_id, user_id, items, total_cents, status, created_at, processed_at, shipping_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.order_id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(serde_json::to_value(&order.items)?)
        .bind(order.total.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.processed_at)
        .bind(serde_json::to_value(&order.shipping_info)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, user_id, items, total_cents, status, created_at, processed_at, shipping_info
            FROM orders WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, user_id, items, total_cents, status, created_at, processed_at, shipping_info
            FROM orders WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: domain::OrderStatus,
        processed_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, processed_at = $3 WHERE order_id = $1",
        )
        .bind(order_id.as_uuid())
        .bind(status.as_str())
        .bind(processed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Carts

/// PostgreSQL cart store.
#[derive(Debug, Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    /// Creates a new PostgreSQL cart store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT items FROM carts WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let items_json: serde_json::Value = row.try_get("items")?;
            let items: Vec<CartItem> = serde_json::from_value(items_json)?;
            Ok(Cart {
                user_id: user_id.clone(),
                items,
            })
        })
        .transpose()
    }

    async fn put(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (user_id, items) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items
            "#,
        )
        .bind(cart.user_id.as_str())
        .bind(serde_json::to_value(&cart.items)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (user_id, items) VALUES ($1, '[]'::jsonb)
            ON CONFLICT (user_id) DO UPDATE SET items = '[]'::jsonb
            "#,
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Products

/// PostgreSQL product catalog.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Creates a new PostgreSQL product catalog.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            name: row.try_get("name")?,
            price: common::Money::from_cents(row.try_get("price_cents")?),
            category: row.try_get("category")?,
            description: row.try_get("description")?,
        })
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT product_id, name, price_cents, category, description FROM products WHERE product_id = $1",
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT product_id, name, price_cents, category, description FROM products ORDER BY product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, name, price_cents, category, description
            FROM products WHERE category = $1
            ORDER BY product_id
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn put(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (product_id, name, price_cents, category, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (product_id) DO UPDATE
            SET name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                category = EXCLUDED.category,
                description = EXCLUDED.description
            "#,
        )
        .bind(product.product_id.as_str())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.category)
        .bind(&product.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Interactions

/// PostgreSQL interaction log.
#[derive(Debug, Clone)]
pub struct PostgresInteractionStore {
    pool: PgPool,
}

impl PostgresInteractionStore {
    /// Creates a new PostgreSQL interaction log.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionStore for PostgresInteractionStore {
    async fn append(&self, event: &InteractionEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interactions (user_id, product_id, event_type, category, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(event.user_id.as_str())
        .bind(event.product_id.as_str())
        .bind(event.event_type.as_str())
        .bind(&event.category)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<InteractionEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, product_id, event_type, category, occurred_at
            FROM interactions WHERE user_id = $1
            ORDER BY occurred_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let event_type: String = row.try_get("event_type")?;
                let event_type = event_type
                    .parse()
                    .map_err(|e: domain::ValidationError| StoreError::Corrupt(e.to_string()))?;
                Ok(InteractionEvent {
                    user_id: UserId::new(row.try_get::<String, _>("user_id")?),
                    product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
                    event_type,
                    category: row.try_get("category")?,
                    timestamp: row.try_get("occurred_at")?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Documents

/// PostgreSQL document store.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn put(&self, key: &str, document: Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (key, body, content_type, metadata)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET body = EXCLUDED.body,
                content_type = EXCLUDED.content_type,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(key)
        .bind(&document.body)
        .bind(&document.content_type)
        .bind(serde_json::to_value(&document.metadata)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT body, content_type, metadata FROM documents WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let metadata_json: serde_json::Value = row.try_get("metadata")?;
            Ok(Document {
                body: row.try_get("body")?,
                content_type: row.try_get("content_type")?,
                metadata: serde_json::from_value(metadata_json)?,
            })
        })
        .transpose()
    }
}

// ---------------------------------------------------------------------------
// Work queue

/// PostgreSQL-backed work queue using `FOR UPDATE SKIP LOCKED` and a
/// visibility deadline column for at-least-once delivery.
#[derive(Debug, Clone)]
pub struct PostgresWorkQueue {
    pool: PgPool,
    visibility: Duration,
}

impl PostgresWorkQueue {
    /// Creates a queue with a 30 second visibility window.
    pub fn new(pool: PgPool) -> Self {
        Self::with_visibility(pool, Duration::from_secs(30))
    }

    /// Creates a queue with the given visibility window.
    pub fn with_visibility(pool: PgPool, visibility: Duration) -> Self {
        Self { pool, visibility }
    }
}

#[async_trait]
impl WorkQueue for PostgresWorkQueue {
    async fn send(&self, body: String) -> Result<()> {
        sqlx::query("INSERT INTO order_jobs (body) VALUES ($1)")
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
        let rows = sqlx::query(
            r#"
            UPDATE order_jobs
            SET visible_at = now() + make_interval(secs => $2),
                receive_count = receive_count + 1
            WHERE id IN (
                SELECT id FROM order_jobs
                WHERE visible_at <= now()
                ORDER BY id
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, body, receive_count
            "#,
        )
        .bind(max as i64)
        .bind(self.visibility.as_secs_f64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let id: i64 = row.try_get("id")?;
                let receive_count: i32 = row.try_get("receive_count")?;
                if receive_count > 1 {
                    tracing::warn!(id, receive_count, "redelivering queued job");
                }
                Ok(QueueMessage {
                    receipt: id.to_string(),
                    body: row.try_get("body")?,
                })
            })
            .collect()
    }

    async fn delete(&self, receipt: &str) -> Result<()> {
        let id: i64 = receipt
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("bad receipt handle: {receipt}")))?;
        let result = sqlx::query("DELETE FROM order_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        // A second delete for the same receipt lands here; harmless.
        if result.rows_affected() == 0 {
            tracing::warn!(id, "delete matched no queued job");
        }
        Ok(())
    }
}
