//! Order fulfillment worker.
//!
//! Consumes fulfillment jobs from the work queue and drives each order
//! through a fixed five-step pipeline:
//! 1. Payment simulation (declined → `PAYMENT_FAILED`, stop)
//! 2. Confirmation email (best-effort)
//! 3. Status transition to `PROCESSED` (fatal on failure)
//! 4. Invoice generation and storage (best-effort)
//! 5. Cart clearing (best-effort)
//!
//! The queue delivers at-least-once, so every step tolerates replay:
//! the email and invoice are idempotent-by-overwrite and clearing an
//! empty cart is a no-op.

pub mod consumer;
pub mod error;
pub mod invoice;
pub mod notify;
pub mod services;
pub mod step;
pub mod worker;

pub use consumer::QueueConsumer;
pub use error::FulfillmentError;
pub use services::{
    EmailMessage, EmailSender, InMemoryEmailSender, PaymentDecision, PaymentGateway,
    SimulatedPaymentGateway, VerificationStatus,
};
pub use step::{FulfillmentReport, JobDisposition, SkippedStep, StepOutcome};
pub use worker::{FulfillmentWorker, WorkerConfig};
