//! In-process key-value store with failure injection.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{KeyValueStore, StorageError};

/// Key-value store held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<HashMap<String, usize>>,
    failing_reads: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, key: &str) -> Result<MutexGuard<'a, T>, StorageError> {
    mutex
        .lock()
        .map_err(|_| StorageError::backend(key, "memory store lock poisoned"))
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read of `key` fail
    pub fn fail_reads_for(&self, key: &str) {
        if let Ok(mut keys) = self.failing_reads.lock() {
            keys.insert(key.to_string());
        }
    }

    /// Make every write or removal of `key` fail
    pub fn fail_writes_for(&self, key: &str) {
        if let Ok(mut keys) = self.failing_writes.lock() {
            keys.insert(key.to_string());
        }
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        if let Ok(mut keys) = self.failing_reads.lock() {
            keys.clear();
        }
        if let Ok(mut keys) = self.failing_writes.lock() {
            keys.clear();
        }
    }

    /// Number of successful `set` calls for `key`
    pub fn write_count(&self, key: &str) -> usize {
        self.writes
            .lock()
            .map(|w| w.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Raw value currently stored under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().ok().and_then(|v| v.get(key).cloned())
    }

    /// Number of keys present
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, set: &Mutex<HashSet<String>>, key: &str, op: &str) -> Result<(), StorageError> {
        if lock(set, key)?.contains(key) {
            return Err(StorageError::backend(key, format!("injected {op} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        // Let other tasks run between a read and the write that follows it.
        tokio::task::yield_now().await;
        self.check(&self.failing_reads, key, "read")?;
        Ok(lock(&self.values, key)?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check(&self.failing_writes, key, "write")?;
        lock(&self.values, key)?.insert(key.to_string(), value.to_string());
        *lock(&self.writes, key)?.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check(&self.failing_writes, key, "remove")?;
        lock(&self.values, key)?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.write_count("k"), 1);

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();

        store.fail_reads_for("k");
        assert!(store.get("k").await.is_err());
        assert!(store.get("other").await.is_ok());

        store.fail_writes_for("k");
        assert!(store.set("k", "w").await.is_err());
        assert!(store.remove("k").await.is_err());

        store.heal();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_multi_remove() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.set("c", "3").await.unwrap();

        store.multi_remove(&["a", "b", "missing"]).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.raw("c").as_deref(), Some("3"));
    }
}
