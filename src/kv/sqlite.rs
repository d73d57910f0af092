//! `SQLite`-backed key-value store.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tokio::sync::Mutex;

use super::{KeyValueStore, StorageError};
use crate::paths;

/// Durable key-value store in a single `SQLite` table
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at the default location
    pub fn open() -> anyhow::Result<Self> {
        let path = paths::store_path()?;
        Ok(Self::open_path(&path)?)
    }

    /// Open or create the store at a specific path
    pub fn open_path(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::backend(&path.display().to_string(), e.to_string())
            })?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Initialize the schema
    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock().await;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r"INSERT INTO kv (key, value) VALUES (?1, ?2)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let _store = SqliteStore::open_path(&path).unwrap();
        // Should create without error
    }

    #[tokio::test]
    async fn test_schema_is_key_and_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.conn.lock().await;
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('kv')").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(columns, vec!["key".to_string(), "value".to_string()]);
    }

    #[tokio::test]
    async fn test_kv_crud() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.get("zyora:user").await.unwrap(), None);

        store.set("zyora:user", "{}").await.unwrap();
        store.set("zyora:user", "{\"uid\":\"1\"}").await.unwrap();
        assert_eq!(
            store.get("zyora:user").await.unwrap().as_deref(),
            Some("{\"uid\":\"1\"}")
        );

        store.remove("zyora:user").await.unwrap();
        assert_eq!(store.get("zyora:user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite");

        {
            let store = SqliteStore::open_path(&path).unwrap();
            store.set("zyora:dev_mode", "true").await.unwrap();
            store.set("zyora:saved_looks", "[]").await.unwrap();
            store.multi_remove(&["zyora:saved_looks"]).await.unwrap();
        }

        let store = SqliteStore::open_path(&path).unwrap();
        assert_eq!(store.get("zyora:dev_mode").await.unwrap().as_deref(), Some("true"));
        assert_eq!(store.get("zyora:saved_looks").await.unwrap(), None);
    }
}
