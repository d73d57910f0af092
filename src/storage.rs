//! Typed storage adapters over the key-value store.
//!
//! Each adapter owns one persisted key and its JSON encoding; nothing else in
//! the crate reads or writes those keys.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::kv::KeyValueStore;
pub use crate::kv::StorageError;
use crate::models::{SavedLook, UserProfile, prepend_capped};

/// Persisted keys
pub mod keys {
    /// Signed-in user profile (JSON object)
    pub const USER: &str = "zyora:user";
    /// Legacy generation counter, only ever cleared
    pub const LOOKS_COUNT: &str = "zyora:looks:count";
    /// Saved looks (JSON array, newest first)
    pub const SAVED_LOOKS: &str = "zyora:saved_looks";
    /// Developer-mode flag (`"true"` / `"false"`)
    pub const DEV_MODE: &str = "zyora:dev_mode";

    /// Every key the app owns
    pub const ALL: &[&str] = &[USER, LOOKS_COUNT, SAVED_LOOKS, DEV_MODE];
}

async fn read_json<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match kv.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Serialization {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

async fn write_json<T: Serialize + ?Sized>(
    kv: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })?;
    kv.set(key, &raw).await
}

/// All adapters over one key-value store
#[derive(Clone)]
pub struct Storage {
    kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    /// Wrap a key-value store
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// User profile adapter
    pub fn user(&self) -> UserStorage {
        UserStorage {
            kv: Arc::clone(&self.kv),
        }
    }

    /// Saved looks adapter
    pub fn looks(&self) -> LooksStorage {
        LooksStorage {
            kv: Arc::clone(&self.kv),
        }
    }

    /// Developer-mode adapter
    pub fn dev_mode(&self) -> DevModeStorage {
        DevModeStorage {
            kv: Arc::clone(&self.kv),
        }
    }

    /// Remove every key the app owns
    pub async fn clear_all_data(&self) -> Result<(), StorageError> {
        self.kv.multi_remove(keys::ALL).await
    }
}

/// Persisted user profile
#[derive(Clone)]
pub struct UserStorage {
    kv: Arc<dyn KeyValueStore>,
}

impl UserStorage {
    /// Store the profile
    pub async fn save(&self, user: &UserProfile) -> Result<(), StorageError> {
        write_json(self.kv.as_ref(), keys::USER, user).await
    }

    /// Load the profile, if any
    pub async fn get(&self) -> Result<Option<UserProfile>, StorageError> {
        read_json(self.kv.as_ref(), keys::USER).await
    }

    /// Forget the profile
    pub async fn remove(&self) -> Result<(), StorageError> {
        self.kv.remove(keys::USER).await
    }

    /// Overwrite the stored quota; no-op when nobody is stored
    pub async fn update_quota(&self, quota: u32) -> Result<(), StorageError> {
        if let Some(mut user) = self.get().await? {
            user.quota = quota;
            self.save(&user).await?;
        }
        Ok(())
    }
}

/// Persisted saved-looks gallery
#[derive(Clone)]
pub struct LooksStorage {
    kv: Arc<dyn KeyValueStore>,
}

impl LooksStorage {
    /// Prepend a look, keeping the newest [`crate::models::MAX_SAVED_LOOKS`]
    ///
    /// Read-modify-write of the whole list: concurrent callers can lose an
    /// update.
    pub async fn save(&self, look: &SavedLook) -> Result<(), StorageError> {
        let mut looks = self.get_all().await?;
        prepend_capped(&mut looks, look.clone());
        write_json(self.kv.as_ref(), keys::SAVED_LOOKS, &looks).await
    }

    /// Load every saved look, newest first
    pub async fn get_all(&self) -> Result<Vec<SavedLook>, StorageError> {
        Ok(read_json(self.kv.as_ref(), keys::SAVED_LOOKS)
            .await?
            .unwrap_or_default())
    }

    /// Drop the look with `id`; absent ids leave the list unchanged
    pub async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let looks = self.get_all().await?;
        let filtered: Vec<SavedLook> = looks.into_iter().filter(|l| l.id != id).collect();
        write_json(self.kv.as_ref(), keys::SAVED_LOOKS, &filtered).await
    }

    /// Forget every saved look
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(keys::SAVED_LOOKS).await
    }
}

/// Persisted developer-mode flag
#[derive(Clone)]
pub struct DevModeStorage {
    kv: Arc<dyn KeyValueStore>,
}

impl DevModeStorage {
    /// Only the literal `"true"` counts as enabled
    pub async fn is_enabled(&self) -> Result<bool, StorageError> {
        Ok(self.kv.get(keys::DEV_MODE).await?.as_deref() == Some("true"))
    }

    /// Store the flag
    pub async fn set_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.kv
            .set(keys::DEV_MODE, if enabled { "true" } else { "false" })
            .await
    }

    /// Forget the flag; reads as disabled afterwards
    pub async fn remove(&self) -> Result<(), StorageError> {
        self.kv.remove(keys::DEV_MODE).await
    }
}
