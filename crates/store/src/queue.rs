//! Work queue trait and in-memory implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};

/// A delivered queue message with the receipt needed to delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Opaque handle identifying this delivery.
    pub receipt: String,
    /// JSON-encoded message body.
    pub body: String,
}

/// Durable at-least-once message queue carrying fulfillment jobs.
///
/// Semantics follow the usual managed-queue model: `receive` makes a
/// message invisible for a visibility window; deleting it inside the
/// window acknowledges it, otherwise it is redelivered. Consumers must
/// therefore tolerate replay.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Enqueues a message body.
    async fn send(&self, body: String) -> Result<()>;

    /// Receives up to `max` visible messages, making them invisible
    /// for the visibility window.
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>>;

    /// Acknowledges a delivered message, removing it permanently.
    async fn delete(&self, receipt: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    pending: VecDeque<(u64, String)>,
    in_flight: HashMap<u64, (String, Option<Instant>)>,
    fail_on_send: bool,
}

/// In-memory work queue for tests and local runs.
#[derive(Debug, Clone)]
pub struct InMemoryWorkQueue {
    state: Arc<Mutex<QueueState>>,
    visibility: Duration,
}

impl Default for InMemoryWorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWorkQueue {
    /// Creates a new empty queue with a 30 second visibility window.
    pub fn new() -> Self {
        Self::with_visibility(Duration::from_secs(30))
    }

    /// Creates a new empty queue with the given visibility window.
    pub fn with_visibility(visibility: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            visibility,
        }
    }

    /// Configures the queue to fail `send` calls, simulating an
    /// unavailable queue at enqueue time.
    pub async fn set_fail_on_send(&self, fail: bool) {
        self.state.lock().await.fail_on_send = fail;
    }

    /// Number of messages waiting to be received.
    pub async fn pending_count(&self) -> usize {
        let mut state = self.state.lock().await;
        Self::requeue_expired(&mut state);
        state.pending.len()
    }

    /// Number of received-but-unacknowledged messages.
    pub async fn in_flight_count(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// Expires every in-flight message immediately, forcing the next
    /// `receive` to redeliver them. Test hook for replay scenarios.
    pub async fn expire_in_flight(&self) {
        let mut state = self.state.lock().await;
        for (_, deadline) in state.in_flight.values_mut() {
            *deadline = None;
        }
        Self::requeue_expired(&mut state);
    }

    fn requeue_expired(state: &mut QueueState) {
        let now = Instant::now();
        let expired: Vec<u64> = state
            .in_flight
            .iter()
            .filter(|(_, (_, deadline))| deadline.is_none_or(|d| d <= now))
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            let (body, _) = state.in_flight.remove(&id).unwrap();
            state.pending.push_back((id, body));
        }
        state.pending.make_contiguous().sort_by_key(|(id, _)| *id);
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn send(&self, body: String) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.fail_on_send {
            return Err(StoreError::Unavailable {
                service: "work queue",
                reason: "simulated enqueue failure".to_string(),
            });
        }
        let id = state.next_id;
        state.next_id += 1;
        state.pending.push_back((id, body));
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
        let mut state = self.state.lock().await;
        Self::requeue_expired(&mut state);

        let mut messages = Vec::new();
        while messages.len() < max {
            let Some((id, body)) = state.pending.pop_front() else {
                break;
            };
            state
                .in_flight
                .insert(id, (body.clone(), Some(Instant::now() + self.visibility)));
            messages.push(QueueMessage {
                receipt: id.to_string(),
                body,
            });
        }
        Ok(messages)
    }

    async fn delete(&self, receipt: &str) -> Result<()> {
        let id: u64 = receipt
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("bad receipt handle: {receipt}")))?;
        self.state.lock().await.in_flight.remove(&id);
        Ok(())
    }
}
