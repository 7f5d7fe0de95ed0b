//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{Money, OrderId, ProductId, UserId};
use domain::{
    Cart, EventType, InteractionEvent, LineItem, Order, OrderStatus, Product, ProductSnapshot,
    ShippingInfo,
};
use sqlx::PgPool;
use store::{
    CartStore, Document, DocumentStore, InteractionStore, OrderStore, PostgresCartStore,
    PostgresDocumentStore, PostgresInteractionStore, PostgresOrderStore, PostgresProductStore,
    PostgresWorkQueue, ProductStore, StoreError, WorkQueue, run_migrations,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh pool with cleared tables
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, carts, products, interactions, documents, order_jobs")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn sample_order(user: &str) -> Order {
    Order {
        order_id: OrderId::new(),
        user_id: UserId::new(user),
        items: vec![LineItem {
            product_id: ProductId::new("p1"),
            quantity: 2,
            product: ProductSnapshot {
                name: "Widget".to_string(),
                price: Money::from_cents(5999),
                category: Some("gadgets".to_string()),
            },
        }],
        total: Money::from_cents(11998),
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        processed_at: None,
        shipping_info: ShippingInfo {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            address: "1 St".to_string(),
            city: "C".to_string(),
            zip_code: "00000".to_string(),
        },
    }
}

#[tokio::test]
async fn order_put_get_roundtrip() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = sample_order("u1");
    store.put(&order).await.unwrap();

    let loaded = store.get(order.order_id).await.unwrap().unwrap();
    assert_eq!(loaded.order_id, order.order_id);
    assert_eq!(loaded.user_id, order.user_id);
    assert_eq!(loaded.items, order.items);
    assert_eq!(loaded.total, order.total);
    assert_eq!(loaded.status, OrderStatus::Pending);
    assert_eq!(loaded.shipping_info, order.shipping_info);
    assert!(loaded.processed_at.is_none());
}

#[tokio::test]
async fn order_get_unknown_returns_none() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    assert!(store.get(OrderId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn order_list_for_user_is_newest_first() {
    let store = PostgresOrderStore::new(get_test_pool().await);

    let mut older = sample_order("u1");
    older.created_at = Utc::now() - chrono::Duration::minutes(10);
    let newer = sample_order("u1");
    let other = sample_order("u2");

    store.put(&older).await.unwrap();
    store.put(&newer).await.unwrap();
    store.put(&other).await.unwrap();

    let listed = store.list_for_user(&UserId::new("u1")).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].order_id, newer.order_id);
    assert_eq!(listed[1].order_id, older.order_id);

    assert!(store
        .list_for_user(&UserId::new("nobody"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn order_update_status() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = sample_order("u1");
    store.put(&order).await.unwrap();

    let now = Utc::now();
    store
        .update_status(order.order_id, OrderStatus::Processed, now)
        .await
        .unwrap();

    let loaded = store.get(order.order_id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Processed);
    assert!(loaded.processed_at.is_some());

    let missing = store
        .update_status(OrderId::new(), OrderStatus::Processed, now)
        .await;
    assert!(matches!(missing, Err(StoreError::OrderNotFound(_))));
}

#[tokio::test]
async fn cart_put_get_clear() {
    let store = PostgresCartStore::new(get_test_pool().await);
    let user = UserId::new("u1");

    assert!(store.get(&user).await.unwrap().is_none());

    let mut cart = Cart::empty("u1");
    cart.add_item(ProductId::new("p1"), 3);
    store.put(&cart).await.unwrap();
    assert_eq!(store.get(&user).await.unwrap().unwrap(), cart);

    store.clear(&user).await.unwrap();
    assert!(store.get(&user).await.unwrap().unwrap().is_empty());

    // clearing an absent cart upserts an empty record
    let ghost = UserId::new("ghost");
    store.clear(&ghost).await.unwrap();
    assert!(store.get(&ghost).await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn product_catalog_queries() {
    let store = PostgresProductStore::new(get_test_pool().await);
    store
        .put(&Product::new("p1", "Widget", Money::from_cents(5999), "gadgets"))
        .await
        .unwrap();
    store
        .put(&Product::new("p2", "Gizmo", Money::from_cents(2999), "gadgets"))
        .await
        .unwrap();
    store
        .put(&Product::new("p3", "Mug", Money::from_cents(1299), "kitchen"))
        .await
        .unwrap();

    let widget = store.get(&ProductId::new("p1")).await.unwrap().unwrap();
    assert_eq!(widget.price.cents(), 5999);

    assert_eq!(store.list().await.unwrap().len(), 3);
    let gadgets = store.list_by_category("gadgets").await.unwrap();
    assert_eq!(gadgets.len(), 2);
    assert_eq!(gadgets[0].product_id.as_str(), "p1");
}

#[tokio::test]
async fn interactions_recent_for_user() {
    let store = PostgresInteractionStore::new(get_test_pool().await);

    let mut first = InteractionEvent::now("u1", "p1", EventType::ProductView, "gadgets");
    first.timestamp = Utc::now() - chrono::Duration::minutes(5);
    let second = InteractionEvent::now("u1", "p2", EventType::AddToCart, "kitchen");
    let other = InteractionEvent::now("u2", "p3", EventType::Purchase, "gadgets");

    store.append(&first).await.unwrap();
    store.append(&second).await.unwrap();
    store.append(&other).await.unwrap();

    let recent = store
        .recent_for_user(&UserId::new("u1"), 10)
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].product_id.as_str(), "p2");
    assert_eq!(recent[0].event_type, EventType::AddToCart);

    let capped = store.recent_for_user(&UserId::new("u1"), 1).await.unwrap();
    assert_eq!(capped.len(), 1);
}

#[tokio::test]
async fn document_put_overwrites_by_key() {
    let store = PostgresDocumentStore::new(get_test_pool().await);

    let first = Document::plain_text("v1").with_metadata("orderId", "o1");
    store.put("invoices/2026/08/25/o1.txt", first).await.unwrap();

    let second = Document::plain_text("v2").with_metadata("orderId", "o1");
    store.put("invoices/2026/08/25/o1.txt", second).await.unwrap();

    let loaded = store
        .get("invoices/2026/08/25/o1.txt")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.body_text(), "v2");
    assert_eq!(loaded.content_type, "text/plain");
    assert_eq!(loaded.metadata["orderId"], "o1");

    assert!(store.get("invoices/missing.txt").await.unwrap().is_none());
}

#[tokio::test]
async fn queue_send_receive_delete() {
    let queue = PostgresWorkQueue::new(get_test_pool().await);

    queue.send("a".to_string()).await.unwrap();
    queue.send("b".to_string()).await.unwrap();

    let messages = queue.receive(10).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].body, "a");

    // invisible while in flight
    assert!(queue.receive(10).await.unwrap().is_empty());

    for message in &messages {
        queue.delete(&message.receipt).await.unwrap();
    }
}

#[tokio::test]
async fn queue_delete_is_idempotent() {
    let queue = PostgresWorkQueue::new(get_test_pool().await);

    queue.send("job".to_string()).await.unwrap();
    let messages = queue.receive(1).await.unwrap();

    queue.delete(&messages[0].receipt).await.unwrap();
    // a stale receipt is a warning, not an error
    queue.delete(&messages[0].receipt).await.unwrap();

    assert!(matches!(
        queue.delete("not-a-receipt").await,
        Err(StoreError::Corrupt(_))
    ));
}

#[tokio::test]
async fn queue_redelivers_unacknowledged_messages() {
    // zero visibility makes received messages immediately visible again
    let queue = PostgresWorkQueue::with_visibility(get_test_pool().await, Duration::ZERO);

    queue.send("job".to_string()).await.unwrap();

    let first = queue.receive(1).await.unwrap();
    assert_eq!(first.len(), 1);

    let second = queue.receive(1).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].body, "job");

    queue.delete(&second[0].receipt).await.unwrap();
    assert!(queue.receive(1).await.unwrap().is_empty());
}
