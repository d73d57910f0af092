//! Encrypted file-based credential storage
//!
//! Provider access tokens are stored encrypted with AES-256-GCM in
//! ~/.config/zyora/credentials.enc. The encryption key is derived from
//! machine-specific identifiers.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const NONCE_SIZE: usize = 12;

/// Get machine ID for key derivation (cross-platform)
fn get_machine_id() -> String {
    // Linux: /etc/machine-id or /var/lib/dbus/machine-id
    #[cfg(target_os = "linux")]
    {
        if let Ok(id) = fs::read_to_string("/etc/machine-id") {
            return id.trim().to_string();
        }
        if let Ok(id) = fs::read_to_string("/var/lib/dbus/machine-id") {
            return id.trim().to_string();
        }
    }

    // macOS: IOPlatformUUID via ioreg
    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            for line in stdout.lines() {
                if line.contains("IOPlatformUUID") {
                    if let Some(uuid) = line.split('"').nth(3) {
                        return uuid.to_string();
                    }
                }
            }
        }
    }

    dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "zyora-fallback-key".to_string())
}

/// Derive encryption key from machine-specific data
fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(get_machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    hasher.update(b"zyora-try-on-client-v1");
    hasher.finalize().into()
}

fn cipher() -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(&derive_key()).map_err(|_| anyhow::anyhow!("Invalid key length"))
}

/// Encrypted token file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Credential file at the default location
    pub fn open() -> Result<Self> {
        Ok(Self::at(paths::credentials_path()?))
    }

    /// Credential file at a specific path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the encrypted file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all credentials from the encrypted file
    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let encrypted = fs::read(&self.path).context("Failed to read credentials file")?;
        if encrypted.len() < NONCE_SIZE {
            return Ok(HashMap::new());
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher()?
            .decrypt(nonce, ciphertext)
            .map_err(|_| anyhow::anyhow!("Failed to decrypt credentials"))?;

        let json = String::from_utf8(plaintext).context("Invalid UTF-8 in credentials")?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save all credentials to the encrypted file
    fn save(&self, creds: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }

        let json = serde_json::to_string(creds)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher()?
            .encrypt(nonce, json.as_bytes())
            .map_err(|_| anyhow::anyhow!("Failed to encrypt credentials"))?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);

        fs::write(&self.path, output).context("Failed to write credentials file")?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    /// Store the access token for a provider
    pub fn store_token(&self, provider: &str, token: &str) -> Result<()> {
        let mut creds = self.load().unwrap_or_default();
        creds.insert(token_key(provider), token.to_string());
        self.save(&creds)
    }

    /// Get the access token for a provider
    pub fn get_token(&self, provider: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(&token_key(provider)).cloned())
    }

    /// Forget the access token for a provider
    pub fn delete_token(&self, provider: &str) -> Result<()> {
        let mut creds = self.load().unwrap_or_default();
        if creds.remove(&token_key(provider)).is_some() {
            self.save(&creds)?;
        }
        Ok(())
    }
}

fn token_key(provider: &str) -> String {
    format!("zyora:{provider}:access_token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_token_round_trip() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("credentials.enc"));

        assert_eq!(store.get_token("google").unwrap(), None);

        store.store_token("google", "ya29.token").unwrap();
        assert_eq!(store.get_token("google").unwrap().as_deref(), Some("ya29.token"));

        store.delete_token("google").unwrap();
        assert_eq!(store.get_token("google").unwrap(), None);
    }

    #[test]
    fn test_file_is_not_plaintext() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("credentials.enc"));
        store.store_token("google", "very-secret-token").unwrap();

        let raw = fs::read(store.path()).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("very-secret-token"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("credentials.enc"));
        store.store_token("google", "t").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
