//! Document (blob) store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

/// A stored blob with its content type and free-form metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Creates a plain-text document.
    pub fn plain_text(body: impl Into<String>) -> Self {
        Self {
            body: body.into().into_bytes(),
            content_type: "text/plain".to_string(),
            metadata: HashMap::new(),
        }
    }

    /// Attaches a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the body interpreted as UTF-8 text.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Object store for generated artifacts such as invoices.
///
/// Writes overwrite by key, which is what makes invoice generation
/// replay-safe: the key is derived from the date and the order id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a document at a key, replacing any existing document.
    async fn put(&self, key: &str, document: Document) -> Result<()>;

    /// Fetches a document by key.
    async fn get(&self, key: &str) -> Result<Option<Document>>;
}

/// In-memory document store for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, Document>>>,
    fail_on_put: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored documents.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns all stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.documents.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Configures the store to fail `put` calls.
    pub fn set_fail_on_put(&self, fail: bool) {
        self.fail_on_put.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put(&self, key: &str, document: Document) -> Result<()> {
        if self.fail_on_put.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                service: "document store",
                reason: "simulated write failure".to_string(),
            });
        }
        self.documents
            .write()
            .await
            .insert(key.to_string(), document);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Document>> {
        Ok(self.documents.read().await.get(key).cloned())
    }
}
