//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::Stores;
use common::Money;
use domain::Product;
use sqlx::postgres::PgPoolOptions;
use store::{
    PostgresCartStore, PostgresDocumentStore, PostgresInteractionStore, PostgresOrderStore,
    PostgresProductStore, PostgresWorkQueue, ProductStore,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn postgres_stores(database_url: &str) -> Stores {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .expect("failed to connect to PostgreSQL");
    store::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    Stores {
        orders: Arc::new(PostgresOrderStore::new(pool.clone())),
        carts: Arc::new(PostgresCartStore::new(pool.clone())),
        products: Arc::new(PostgresProductStore::new(pool.clone())),
        interactions: Arc::new(PostgresInteractionStore::new(pool.clone())),
        documents: Arc::new(PostgresDocumentStore::new(pool.clone())),
        queue: Arc::new(PostgresWorkQueue::new(pool)),
    }
}

/// Seeds a small demo catalog so a fresh in-memory run is browsable.
async fn seed_demo_catalog(products: &dyn ProductStore) {
    let demo = [
        Product::new(
            "prod-1",
            "Wireless Bluetooth Headphones",
            Money::from_cents(19999),
            "Electronics",
        ),
        Product::new("prod-2", "Smart Watch", Money::from_cents(29999), "Electronics"),
        Product::new(
            "prod-3",
            "Laptop Backpack",
            Money::from_cents(7999),
            "Accessories",
        ),
        Product::new("prod-4", "Wireless Mouse", Money::from_cents(4999), "Electronics"),
        Product::new("prod-5", "USB-C Hub", Money::from_cents(3999), "Accessories"),
    ];
    for product in demo {
        if let Err(error) = products.put(&product).await {
            tracing::warn!(%error, "failed to seed demo product");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let stores = match &config.database_url {
        Some(url) => {
            tracing::info!("using PostgreSQL stores");
            postgres_stores(url).await
        }
        None => {
            tracing::info!("no DATABASE_URL set, using in-memory stores");
            let stores = Stores::in_memory();
            seed_demo_catalog(stores.products.as_ref()).await;
            stores
        }
    };

    if config.sender_email.is_none() {
        tracing::warn!("SENDER_EMAIL not set, order confirmations will be skipped");
    }

    let (state, consumer) = api::create_state(stores, config.sender_email.clone());
    let consumer = consumer.with_poll_interval(config.queue_poll_interval);
    let consumer_task = tokio::spawn(consumer.run());

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    consumer_task.abort();
    tracing::info!("server shut down gracefully");
}
