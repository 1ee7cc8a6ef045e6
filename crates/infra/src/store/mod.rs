//! Key-value storage boundary.
//!
//! The application persists each collection as a JSON document under a fixed
//! key. Backends only need get/set of string values; they make no
//! assumptions about what the values contain.

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use thiserror::Error;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Storage operation error.
///
/// These are infrastructure errors. Command execution logs them and carries
/// on; the in-memory state stays authoritative.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failed during {operation}: {reason}")]
    Backend {
        operation: &'static str,
        reason: String,
    },

    #[error("failed to encode value for '{key}': {reason}")]
    Encode { key: String, reason: String },

    #[error("failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },
}

impl StoreError {
    pub fn backend(operation: &'static str, reason: impl ToString) -> Self {
        Self::Backend {
            operation,
            reason: reason.to_string(),
        }
    }
}

/// Durable string-to-string storage.
///
/// Writes are idempotent overwrites: the last writer wins.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }
}
