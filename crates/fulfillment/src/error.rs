//! Fulfillment error types.

use store::StoreError;
use thiserror::Error;

/// Errors that abort a fulfillment job.
///
/// Only store calls on the fatal path (the status update, or the
/// status write after a declined payment) abort a job. Best-effort
/// step failures never surface here; they become
/// [`crate::step::StepOutcome::Skipped`].
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// A store call on the fatal path failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The email service failed.
    #[error("Email service error: {0}")]
    Email(String),
}

/// Result type for fulfillment operations.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
