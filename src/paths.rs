//! Common paths for Zyora data storage
//!
//! All Zyora data is stored under ~/.config/zyora/ on all platforms:
//! - config.toml - User configuration
//! - credentials.enc - Encrypted provider credentials
//! - store.sqlite - On-device key-value store

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the Zyora data directory (~/.config/zyora/)
///
/// This is consistent across all platforms for simplicity.
pub fn zyora_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let zyora_dir = home.join(".config").join("zyora");
    fs::create_dir_all(&zyora_dir).context("Failed to create zyora directory")?;
    Ok(zyora_dir)
}

/// Get the config file path (~/.config/zyora/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(zyora_dir()?.join("config.toml"))
}

/// Get the key-value store path (~/.config/zyora/store.sqlite)
pub fn store_path() -> Result<PathBuf> {
    Ok(zyora_dir()?.join("store.sqlite"))
}

/// Get the credentials file path (~/.config/zyora/credentials.enc)
pub fn credentials_path() -> Result<PathBuf> {
    Ok(zyora_dir()?.join("credentials.enc"))
}
