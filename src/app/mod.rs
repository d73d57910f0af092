//! Application store
//!
//! [`AppStore`] owns the in-memory session ([`AppState`]) and mirrors every
//! durable change to storage through a background worker.

mod persist;
mod state;
mod store;

pub use persist::{PersistCommand, PersistHandle, spawn_worker};
pub use state::{AppState, Session};
pub use store::AppStore;
