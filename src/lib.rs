//! # Zyora
//!
//! Client core for a virtual try-on app: stage a photo of yourself and a
//! garment, let the backend composite them, keep the looks you like.
//!
//! ## Overview
//!
//! Zyora holds the session in memory, mirrors it to an on-device key-value
//! store, and talks to a remote try-on backend over HTTP. Sign-in goes through
//! an identity provider (Google) or a local developer path.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        AppStore                             │
//! │   In-memory session, actions, background persistence       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Storage     │ │    Identity     │ │       API       │
//! │                 │ │                 │ │                 │
//! │ • User          │ │ • Developer     │ │ • Generate look │
//! │ • Saved looks   │ │ • Google OAuth  │ │ • Fetch image   │
//! │ • Dev mode      │ │ • Credentials   │ │ • Health        │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  KeyValueStore  │
//! │                 │
//! │ • SQLite        │
//! │ • Memory        │
//! └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Try-on backend client
//! - [`app`] - Application state, actions and persistence worker
//! - [`config`] - Configuration management
//! - [`credentials`] - Encrypted provider tokens
//! - [`generate`] - Generation workflow
//! - [`identity`] - Identity providers
//! - [`images`] - Image URL, MIME and data URI helpers
//! - [`kv`] - Key-value backends
//! - [`models`] - Data models (profile, looks, images)
//! - [`storage`] - Typed adapters over the key-value store
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zyora::{AppStore, DeveloperIdentity, SqliteStore, Storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Storage::new(Arc::new(SqliteStore::open()?));
//!     let mut store = AppStore::new(storage, Arc::new(DeveloperIdentity), 10);
//!     store.load_from_storage().await;
//!     store.sign_in_as_developer().await;
//!     store.flush().await;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/zyora/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::collapsible_if)]

pub mod api;
pub mod app;
pub mod config;
pub mod credentials;
pub mod generate;
pub mod identity;
pub mod images;
pub mod kv;
pub mod models;
pub mod paths;
pub mod storage;

// Re-export main types for convenience
pub use api::ApiClient;
pub use app::{AppState, AppStore, Session};
pub use config::Config;
pub use credentials::CredentialStore;
pub use generate::GenerateError;
pub use identity::{DeveloperIdentity, GoogleIdentity, IdentityError, IdentityProvider};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore, StorageError};
pub use models::{GenerationResult, ImageAsset, ImageKind, SavedLook, UserProfile};
pub use storage::Storage;

/// ASCII logo for the application
pub const LOGO: &str = r"
  _____                       
 |__  /_   _  ___  _ __ __ _ 
   / /| | | |/ _ \| '__/ _` |
  / /_| |_| | (_) | | | (_| |
 /____|\__, |\___/|_|  \__,_|
       |___/                  
";

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
