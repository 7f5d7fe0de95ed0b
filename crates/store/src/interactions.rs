//! Interaction event log trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use domain::InteractionEvent;
use tokio::sync::RwLock;

use crate::error::Result;

/// Append-only log of behavioral interaction events, keyed by
/// user + time.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Appends one event.
    async fn append(&self, event: &InteractionEvent) -> Result<()>;

    /// Returns a user's most recent events, newest first, capped at
    /// `limit`. An unknown user yields an empty list.
    async fn recent_for_user(&self, user_id: &UserId, limit: usize) -> Result<Vec<InteractionEvent>>;
}

/// In-memory interaction log for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInteractionStore {
    events: Arc<RwLock<Vec<InteractionEvent>>>,
}

impl InMemoryInteractionStore {
    /// Creates a new empty in-memory log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored events.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl InteractionStore for InMemoryInteractionStore {
    async fn append(&self, event: &InteractionEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<InteractionEvent>> {
        let events = self.events.read().await;
        let mut matching: Vec<InteractionEvent> = events
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }
}
