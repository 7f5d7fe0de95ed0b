//! Collaborator stores and the work queue for the CloudShop backend.
//!
//! Every external dependency of the order pipeline is behind a trait
//! here: the order table, the per-user cart table, the product catalog,
//! the interaction log, the invoice blob store, and the at-least-once
//! work queue. Each trait ships an in-memory implementation used by
//! tests and the default runtime, and a PostgreSQL implementation for
//! durable deployments.

pub mod carts;
pub mod documents;
pub mod error;
pub mod interactions;
pub mod orders;
pub mod postgres;
pub mod products;
pub mod queue;

pub use carts::{CartStore, InMemoryCartStore};
pub use documents::{Document, DocumentStore, InMemoryDocumentStore};
pub use error::{Result, StoreError};
pub use interactions::{InMemoryInteractionStore, InteractionStore};
pub use orders::{InMemoryOrderStore, OrderStore};
pub use postgres::{
    PostgresCartStore, PostgresDocumentStore, PostgresInteractionStore, PostgresOrderStore,
    PostgresProductStore, PostgresWorkQueue, run_migrations,
};
pub use products::{InMemoryProductStore, ProductStore};
pub use queue::{InMemoryWorkQueue, QueueMessage, WorkQueue};
