//! Queue consumption loop.

use std::sync::Arc;
use std::time::Duration;

use domain::FulfillmentJob;
use store::{QueueMessage, WorkQueue};

use crate::worker::FulfillmentWorker;

/// Polls the work queue and feeds each delivered job to the worker.
///
/// Jobs in a batch are processed independently: one job's failure
/// never prevents the others from running. A fatally failed job is
/// left on the queue for redelivery; a job that cannot be decoded is
/// deleted after logging, since redelivering it could never succeed.
#[derive(Clone)]
pub struct QueueConsumer {
    queue: Arc<dyn WorkQueue>,
    worker: FulfillmentWorker,
    batch_size: usize,
    poll_interval: Duration,
}

impl QueueConsumer {
    /// Creates a consumer polling up to ten messages per second.
    pub fn new(queue: Arc<dyn WorkQueue>, worker: FulfillmentWorker) -> Self {
        Self {
            queue,
            worker,
            batch_size: 10,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Overrides the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Receives one batch and processes every message in it.
    ///
    /// Returns the number of messages acknowledged.
    #[tracing::instrument(skip(self))]
    pub async fn poll_once(&self) -> usize {
        let messages = match self.queue.receive(self.batch_size).await {
            Ok(messages) => messages,
            Err(error) => {
                tracing::error!(%error, "failed to receive from work queue");
                return 0;
            }
        };

        if !messages.is_empty() {
            tracing::info!(count = messages.len(), "processing queued fulfillment jobs");
        }

        let mut acknowledged = 0;
        for message in messages {
            if self.process_message(&message).await {
                acknowledged += 1;
            }
        }
        acknowledged
    }

    /// Runs the poll loop until the task is dropped or aborted.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.poll_once().await;
        }
    }

    /// Handles one delivered message; returns true if it was deleted.
    async fn process_message(&self, message: &QueueMessage) -> bool {
        let job: FulfillmentJob = match serde_json::from_str(&message.body) {
            Ok(job) => job,
            Err(error) => {
                // Redelivery cannot fix a bad body; shed it.
                tracing::error!(%error, "dropping undecodable job message");
                self.ack(message).await;
                return true;
            }
        };

        match self.worker.process_job(&job).await {
            Ok(report) => {
                tracing::info!(
                    order_id = %report.order_id,
                    disposition = ?report.disposition,
                    skipped = report.skipped.len(),
                    "fulfillment job finished"
                );
                self.ack(message).await;
                true
            }
            Err(error) => {
                // Leave the message for queue-driven redelivery.
                tracing::error!(order_id = %job.order_id, %error, "fulfillment job failed");
                false
            }
        }
    }

    async fn ack(&self, message: &QueueMessage) {
        if let Err(error) = self.queue.delete(&message.receipt).await {
            tracing::warn!(%error, receipt = %message.receipt, "failed to delete queue message");
        }
    }
}
