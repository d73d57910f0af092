//! On-device key-value persistence.
//!
//! The rest of the crate only sees [`KeyValueStore`]: string keys, string
//! values, no transactions. [`SqliteStore`] is the durable backend used by the
//! CLI; [`MemoryStore`] keeps everything in process and can be told to fail
//! individual keys.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

/// Failure reading, writing or decoding persisted state
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store rejected the operation
    #[error("storage backend error on {key}: {message}")]
    Backend {
        /// Key being accessed
        key: String,
        /// Backend message
        message: String,
    },

    /// A stored value could not be encoded or decoded
    #[error("invalid stored value for {key}: {source}")]
    Serialization {
        /// Key being accessed
        key: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Backend failure for `key`
    pub fn backend(key: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Async string-keyed storage primitive
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; removing an absent key succeeds
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove several keys; no atomicity across keys is promised
    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
