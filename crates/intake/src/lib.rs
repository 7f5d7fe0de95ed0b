//! Order intake: the producer side of the order lifecycle pipeline.
//!
//! Validates a creation request, assigns identity, persists durably,
//! and hands off to the fulfillment pipeline via the work queue. The
//! enqueue is deliberately best-effort: once the order write has
//! succeeded, a queue outage must not fail the creation.

pub mod error;
pub mod service;

pub use error::IntakeError;
pub use service::{OrderIntakeService, OrderReceipt};
