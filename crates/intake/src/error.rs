//! Intake error types.

use common::OrderId;
use domain::ValidationError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during order intake operations.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The creation payload failed validation; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The order store call failed.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for intake operations.
pub type Result<T> = std::result::Result<T, IntakeError>;
