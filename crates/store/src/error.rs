//! Store error types.

use common::OrderId;
use thiserror::Error;

/// Errors raised by collaborator stores and the work queue.
///
/// Whether a store error is fatal is decided by the caller: the primary
/// order write and the fulfillment status update propagate it, while
/// the best-effort steps log and continue.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record could not be interpreted.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The backing service refused or failed the call.
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
