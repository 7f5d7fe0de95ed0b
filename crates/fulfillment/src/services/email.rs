//! Email sending service trait and in-memory implementation.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::FulfillmentError;

/// The email service's attestation of whether it may deliver to an
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Delivery to the address is permitted.
    Verified,
    /// Verification requested but not confirmed.
    Pending,
    /// The address is not verified.
    Unverified,
}

impl VerificationStatus {
    /// Returns true if the address can be delivered to.
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }
}

/// A composed email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Trait for the external email-sending service.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Queries the verification status of an address.
    async fn verification_status(
        &self,
        address: &str,
    ) -> Result<VerificationStatus, FulfillmentError>;

    /// Sends a message, returning the provider's message id.
    async fn send(&self, message: EmailMessage) -> Result<String, FulfillmentError>;
}

#[derive(Debug, Default)]
struct InMemoryEmailState {
    verified: HashSet<String>,
    sent: Vec<EmailMessage>,
    next_id: u32,
    fail_on_send: bool,
    fail_on_verification: bool,
}

/// In-memory email service for testing.
///
/// Addresses are unverified unless registered via
/// [`Self::verify_address`], mirroring a sandboxed email provider.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmailSender {
    state: Arc<RwLock<InMemoryEmailState>>,
}

impl InMemoryEmailSender {
    /// Creates a new in-memory email service with no verified addresses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an address as verified.
    pub fn verify_address(&self, address: impl Into<String>) {
        self.state.write().unwrap().verified.insert(address.into());
    }

    /// Returns copies of all sent messages.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of sent messages.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Configures the service to fail send calls.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Configures the service to fail verification lookups.
    pub fn set_fail_on_verification(&self, fail: bool) {
        self.state.write().unwrap().fail_on_verification = fail;
    }
}

#[async_trait]
impl EmailSender for InMemoryEmailSender {
    async fn verification_status(
        &self,
        address: &str,
    ) -> Result<VerificationStatus, FulfillmentError> {
        let state = self.state.read().unwrap();
        if state.fail_on_verification {
            return Err(FulfillmentError::Email(
                "verification lookup failed".to_string(),
            ));
        }
        if state.verified.contains(address) {
            Ok(VerificationStatus::Verified)
        } else {
            Ok(VerificationStatus::Unverified)
        }
    }

    async fn send(&self, message: EmailMessage) -> Result<String, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(FulfillmentError::Email("send failed".to_string()));
        }
        state.next_id += 1;
        let message_id = format!("MSG-{:04}", state.next_id);
        state.sent.push(message);
        Ok(message_id)
    }
}
