//! Payment gateway trait and the simulated implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{Money, OrderId};

/// Result of asking the gateway to charge an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDecision {
    /// The charge went through.
    Approved,
    /// The charge was declined; the order becomes `PAYMENT_FAILED`.
    Declined { reason: String },
}

impl PaymentDecision {
    /// Returns true if the charge was approved.
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentDecision::Approved)
    }
}

/// Trait for payment processing.
///
/// The hook point for a real gateway integration; the shipped
/// implementation simulates one.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the order total.
    async fn charge(&self, order_id: OrderId, total: Money) -> PaymentDecision;
}

/// Stand-in for a real payment gateway.
///
/// Always approves, unless a test flips [`Self::set_decline_all`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedPaymentGateway {
    decline_all: Arc<AtomicBool>,
}

impl SimulatedPaymentGateway {
    /// Creates a gateway that approves every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline every charge.
    pub fn set_decline_all(&self, decline: bool) {
        self.decline_all.store(decline, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn charge(&self, order_id: OrderId, total: Money) -> PaymentDecision {
        tracing::info!(%order_id, %total, "simulating payment gateway call");

        if self.decline_all.load(Ordering::SeqCst) {
            return PaymentDecision::Declined {
                reason: "payment declined (simulated)".to_string(),
            };
        }

        PaymentDecision::Approved
    }
}
