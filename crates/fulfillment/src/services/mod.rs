//! External service traits and in-memory implementations for
//! fulfillment steps.

pub mod email;
pub mod payment;

pub use email::{EmailMessage, EmailSender, InMemoryEmailSender, VerificationStatus};
pub use payment::{PaymentDecision, PaymentGateway, SimulatedPaymentGateway};
