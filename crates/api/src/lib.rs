//! HTTP API server with observability for the CloudShop backend.
//!
//! REST endpoints for orders, the product catalog, carts, interaction
//! tracking, and recommendations, with structured logging (tracing)
//! and Prometheus metrics. The fulfillment consumer runs alongside the
//! server and drains the order queue.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use fulfillment::{
    FulfillmentWorker, InMemoryEmailSender, QueueConsumer, SimulatedPaymentGateway, WorkerConfig,
};
use intake::OrderIntakeService;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{
    CartStore, DocumentStore, InMemoryCartStore, InMemoryDocumentStore, InMemoryInteractionStore,
    InMemoryOrderStore, InMemoryProductStore, InMemoryWorkQueue, InteractionStore, OrderStore,
    ProductStore, WorkQueue,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::orders::AppState;

/// The collaborator stores the application is wired over, either all
/// in-memory or all PostgreSQL-backed.
#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderStore>,
    pub carts: Arc<dyn CartStore>,
    pub products: Arc<dyn ProductStore>,
    pub interactions: Arc<dyn InteractionStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub queue: Arc<dyn WorkQueue>,
}

impl Stores {
    /// Creates a fully in-memory store set.
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(InMemoryOrderStore::new()),
            carts: Arc::new(InMemoryCartStore::new()),
            products: Arc::new(InMemoryProductStore::new()),
            interactions: Arc::new(InMemoryInteractionStore::new()),
            documents: Arc::new(InMemoryDocumentStore::new()),
            queue: Arc::new(InMemoryWorkQueue::new()),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/products", get(routes::products::list))
        .route("/products/{id}", get(routes::products::get))
        .route("/cart", get(routes::cart::get))
        .route("/cart", post(routes::cart::add_item))
        .route("/cart", put(routes::cart::set_quantity))
        .route("/cart", delete(routes::cart::remove))
        .route("/events", post(routes::events::track))
        .route("/recommendations", get(routes::recommendations::get))
        .with_state(state)
        .merge(routes::metrics::router(metrics_handle))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the application state and the fulfillment consumer over a
/// store set. The consumer is returned unstarted; the caller spawns
/// its run loop.
pub fn create_state(stores: Stores, sender_email: Option<String>) -> (Arc<AppState>, QueueConsumer) {
    let email = Arc::new(InMemoryEmailSender::new());
    let payment = Arc::new(SimulatedPaymentGateway::new());

    let worker = FulfillmentWorker::new(
        stores.orders.clone(),
        stores.carts.clone(),
        stores.documents.clone(),
        email,
        payment,
        WorkerConfig { sender_email },
    );
    let consumer = QueueConsumer::new(stores.queue.clone(), worker);

    let state = Arc::new(AppState {
        intake: OrderIntakeService::new(stores.orders, stores.queue),
        products: stores.products,
        carts: stores.carts,
        interactions: stores.interactions,
    });

    (state, consumer)
}
