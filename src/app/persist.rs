//! Background persistence for the app store
//!
//! Store actions update memory synchronously and hand the matching write to
//! this worker over a channel. Commands are applied in the order they were
//! sent; a failed write is logged and counted, never rolled back into memory.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};

use crate::models::{SavedLook, UserProfile};
use crate::storage::{Storage, StorageError};

/// Writes sent from the store to the worker
#[derive(Debug)]
pub enum PersistCommand {
    /// Store the whole profile
    SaveUser(UserProfile),
    /// Forget the profile
    RemoveUser,
    /// Prepend a saved look
    SaveLook(SavedLook),
    /// Drop a saved look by id
    RemoveLook { id: String },
    /// Store the developer-mode flag
    SetDevMode(bool),
    /// Forget the developer-mode flag
    RemoveDevMode,
    /// Remove every persisted key
    ClearAll,
    /// Reply once every earlier command has been applied
    Flush { done: oneshot::Sender<()> },
    /// Stop the worker
    Shutdown,
}

/// Channel handle for the persistence worker
#[derive(Debug, Clone)]
pub struct PersistHandle {
    cmd_tx: mpsc::UnboundedSender<PersistCommand>,
    failures: Arc<AtomicUsize>,
}

impl PersistHandle {
    /// Queue a write without waiting for it
    pub fn enqueue(&self, cmd: PersistCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Persistence worker is gone; write dropped");
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Wait until everything queued so far has been applied
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.cmd_tx.send(PersistCommand::Flush { done }).is_ok() {
            let _ = wait.await;
        }
    }

    /// Number of writes that failed since the worker started
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Ask the worker to stop after the commands already queued
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(PersistCommand::Shutdown);
    }
}

/// Spawn the worker on the current runtime and return its handle
pub fn spawn_worker(storage: Storage) -> PersistHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<PersistCommand>();
    let failures = Arc::new(AtomicUsize::new(0));
    let worker_failures = Arc::clone(&failures);

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                PersistCommand::Shutdown => {
                    tracing::debug!("Persistence worker shutting down");
                    break;
                }
                PersistCommand::Flush { done } => {
                    let _ = done.send(());
                }
                cmd => {
                    let label = cmd_label(&cmd);
                    if let Err(e) = apply(&storage, cmd).await {
                        tracing::error!("Failed to persist {label}: {e}");
                        worker_failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }
    });

    PersistHandle { cmd_tx, failures }
}

const fn cmd_label(cmd: &PersistCommand) -> &'static str {
    match cmd {
        PersistCommand::SaveUser(_) => "user",
        PersistCommand::RemoveUser => "user removal",
        PersistCommand::SaveLook(_) => "saved look",
        PersistCommand::RemoveLook { .. } => "saved look removal",
        PersistCommand::SetDevMode(_) => "developer mode",
        PersistCommand::RemoveDevMode => "developer mode removal",
        PersistCommand::ClearAll => "data clear",
        PersistCommand::Flush { .. } | PersistCommand::Shutdown => "control",
    }
}

async fn apply(storage: &Storage, cmd: PersistCommand) -> Result<(), StorageError> {
    match cmd {
        PersistCommand::SaveUser(user) => storage.user().save(&user).await,
        PersistCommand::RemoveUser => storage.user().remove().await,
        PersistCommand::SaveLook(look) => storage.looks().save(&look).await,
        PersistCommand::RemoveLook { id } => storage.looks().remove(&id).await,
        PersistCommand::SetDevMode(enabled) => storage.dev_mode().set_enabled(enabled).await,
        PersistCommand::RemoveDevMode => storage.dev_mode().remove().await,
        PersistCommand::ClearAll => storage.clear_all_data().await,
        PersistCommand::Flush { .. } | PersistCommand::Shutdown => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::storage::keys;

    #[tokio::test]
    async fn test_commands_apply_in_order() {
        let kv = Arc::new(MemoryStore::new());
        let handle = spawn_worker(Storage::new(kv.clone()));

        handle.enqueue(PersistCommand::SetDevMode(true));
        handle.enqueue(PersistCommand::SetDevMode(false));
        handle.enqueue(PersistCommand::RemoveDevMode);
        handle.enqueue(PersistCommand::SetDevMode(true));
        handle.flush().await;

        assert_eq!(kv.raw(keys::DEV_MODE).as_deref(), Some("true"));
        assert_eq!(kv.write_count(keys::DEV_MODE), 3);
        assert_eq!(handle.failures(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let kv = Arc::new(MemoryStore::new());
        kv.fail_writes_for(keys::USER);
        let handle = spawn_worker(Storage::new(kv.clone()));

        handle.enqueue(PersistCommand::RemoveUser);
        handle.enqueue(PersistCommand::SetDevMode(true));
        handle.flush().await;

        assert_eq!(handle.failures(), 1);
        assert_eq!(kv.raw(keys::DEV_MODE).as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_counts_as_failure() {
        let kv = Arc::new(MemoryStore::new());
        let handle = spawn_worker(Storage::new(kv.clone()));

        handle.shutdown();
        handle.flush().await;
        handle.enqueue(PersistCommand::SetDevMode(true));

        assert_eq!(handle.failures(), 1);
        assert!(kv.is_empty());
    }
}
