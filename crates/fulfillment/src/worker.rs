//! The fulfillment worker: drives one job through the five-step
//! pipeline with the partial-failure policy encoded in [`StepOutcome`].

use std::sync::Arc;

use chrono::Utc;
use domain::{FulfillmentJob, OrderStatus};
use store::{CartStore, DocumentStore, OrderStore};

use crate::error::Result;
use crate::invoice::{invoice_document, invoice_key};
use crate::notify::{compose_confirmation, resolve_recipient};
use crate::services::email::EmailSender;
use crate::services::payment::{PaymentDecision, PaymentGateway};
use crate::step::{
    FulfillmentReport, JobDisposition, SkippedStep, STEP_CLEAR_CART, STEP_INVOICE, STEP_NOTIFY,
    StepOutcome,
};

/// Worker configuration.
#[derive(Debug, Clone, Default)]
pub struct WorkerConfig {
    /// Verified operator address confirmations are sent from, and fall
    /// back to. When unset the notification step is skipped.
    pub sender_email: Option<String>,
}

/// Consumes fulfillment jobs and applies the pipeline to each order.
#[derive(Clone)]
pub struct FulfillmentWorker {
    orders: Arc<dyn OrderStore>,
    carts: Arc<dyn CartStore>,
    documents: Arc<dyn DocumentStore>,
    email: Arc<dyn EmailSender>,
    payment: Arc<dyn PaymentGateway>,
    config: WorkerConfig,
}

impl FulfillmentWorker {
    /// Creates a new worker over its collaborator stores and services.
    pub fn new(
        orders: Arc<dyn OrderStore>,
        carts: Arc<dyn CartStore>,
        documents: Arc<dyn DocumentStore>,
        email: Arc<dyn EmailSender>,
        payment: Arc<dyn PaymentGateway>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            orders,
            carts,
            documents,
            email,
            payment,
            config,
        }
    }

    /// Runs the pipeline for one job.
    ///
    /// Returns `Err` only for fatal failures (the status update, or
    /// the status write after a declined payment), in which case the
    /// message is left on the queue for redelivery. Every step is safe
    /// to repeat, so replay of an already `PROCESSED` order re-runs
    /// steps 2-5 harmlessly.
    #[tracing::instrument(skip(self, job), fields(order_id = %job.order_id))]
    pub async fn process_job(&self, job: &FulfillmentJob) -> Result<FulfillmentReport> {
        metrics::counter!("fulfillment_jobs_total").increment(1);
        let started = std::time::Instant::now();

        // Step 1: payment simulation. Declined is terminal.
        let decision = self.payment.charge(job.order_id, job.total).await;
        if let PaymentDecision::Declined { reason } = decision {
            tracing::warn!(order_id = %job.order_id, reason = %reason, "payment declined");
            metrics::counter!("payment_declined_total").increment(1);
            self.orders
                .update_status(job.order_id, OrderStatus::PaymentFailed, Utc::now())
                .await?;
            return Ok(FulfillmentReport {
                order_id: job.order_id,
                disposition: JobDisposition::PaymentFailed,
                skipped: Vec::new(),
            });
        }

        let mut skipped: Vec<SkippedStep> = Vec::new();
        let mut record = |outcome: StepOutcome| {
            if let StepOutcome::Skipped(step) = outcome {
                metrics::counter!("fulfillment_steps_skipped_total").increment(1);
                tracing::warn!(
                    order_id = %job.order_id,
                    step = step.step,
                    reason = %step.reason,
                    "pipeline step skipped"
                );
                skipped.push(step);
            }
        };

        // Step 2: confirmation email, best-effort.
        record(self.send_confirmation(job).await);

        // Step 3: mark processed. Fatal on failure; downstream steps
        // assume the order is durably marked.
        self.orders
            .update_status(job.order_id, OrderStatus::Processed, Utc::now())
            .await?;
        tracing::info!(order_id = %job.order_id, "order marked PROCESSED");

        // Step 4: invoice, best-effort.
        record(self.store_invoice(job).await);

        // Step 5: cart clearing, best-effort.
        record(self.clear_cart(job).await);

        metrics::histogram!("fulfillment_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(FulfillmentReport {
            order_id: job.order_id,
            disposition: JobDisposition::Processed,
            skipped,
        })
    }

    async fn send_confirmation(&self, job: &FulfillmentJob) -> StepOutcome {
        let Some(sender_address) = self.config.sender_email.as_deref() else {
            return StepOutcome::skipped(STEP_NOTIFY, "no sender address configured");
        };
        let customer_address = job.shipping_info.email.as_str();
        if customer_address.is_empty() {
            return StepOutcome::skipped(STEP_NOTIFY, "no recipient email in order");
        }

        let recipient = resolve_recipient(self.email.as_ref(), customer_address, sender_address).await;
        let message = compose_confirmation(job, sender_address, &recipient, Utc::now());

        match self.email.send(message).await {
            Ok(message_id) => {
                tracing::info!(
                    order_id = %job.order_id,
                    to = %recipient.address,
                    message_id = %message_id,
                    "confirmation email sent"
                );
                StepOutcome::Completed
            }
            Err(error) => StepOutcome::skipped(STEP_NOTIFY, error.to_string()),
        }
    }

    async fn store_invoice(&self, job: &FulfillmentJob) -> StepOutcome {
        let now = Utc::now();
        let key = invoice_key(job.order_id, now);
        let document = invoice_document(job, now);

        match self.documents.put(&key, document).await {
            Ok(()) => {
                tracing::info!(order_id = %job.order_id, key = %key, "invoice stored");
                StepOutcome::Completed
            }
            Err(error) => StepOutcome::skipped(STEP_INVOICE, error.to_string()),
        }
    }

    async fn clear_cart(&self, job: &FulfillmentJob) -> StepOutcome {
        match self.carts.clear(&job.user_id).await {
            Ok(()) => {
                tracing::info!(user_id = %job.user_id, "cart cleared");
                StepOutcome::Completed
            }
            Err(error) => StepOutcome::skipped(STEP_CLEAR_CART, error.to_string()),
        }
    }
}
