//! Configuration module for Zyora

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths;

/// Environment variable that overrides the configured backend URL
pub const API_BASE_URL_ENV: &str = "ZYORA_API_BASE_URL";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the try-on backend
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Generations allowed on the free tier
    #[serde(default = "default_max_free_quota")]
    pub max_free_quota: u32,

    /// OAuth client id used for Google sign-in
    #[serde(default = "default_google_client_id")]
    pub google_client_id: String,

    /// Largest image accepted for staging, in megabytes
    #[serde(default = "default_max_image_size_mb")]
    pub max_image_size_mb: u64,

    /// Directory generated looks are written to (current directory when unset)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "https://zyora-szo7.vercel.app".to_string()
}

fn default_max_free_quota() -> u32 {
    10
}

fn default_google_client_id() -> String {
    "61715353016-3gus22f2fn3ms300g36a74kbim8181uu.apps.googleusercontent.com".to_string()
}

fn default_max_image_size_mb() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            max_free_quota: default_max_free_quota(),
            google_client_id: default_google_client_id(),
            max_image_size_mb: default_max_image_size_mb(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load config from the default path or create default
    ///
    /// `ZYORA_API_BASE_URL` takes precedence over the file.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(&path)?;
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().to_string();
            }
        }
        Ok(config)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Largest accepted image in bytes
    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_size_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_free_quota, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"http://localhost:3000\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.max_free_quota, 10);
        assert_eq!(config.max_image_size_mb, 10);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            max_free_quota: 25,
            output_dir: Some(dir.path().join("looks")),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_max_image_bytes() {
        let config = Config::default();
        assert_eq!(config.max_image_bytes(), 10 * 1024 * 1024);
    }
}
