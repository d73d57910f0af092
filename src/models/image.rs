//! Staged image model

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::images;

/// Role of an image in the try-on flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// Photo of the person trying the garment on
    User,
    /// Garment photo
    Fit,
    /// Composited result
    Generated,
}

impl ImageKind {
    /// Get the display label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::User => "Subject",
            Self::Fit => "Garment",
            Self::Generated => "Look",
        }
    }
}

/// An image held in memory while a look is being prepared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Unique, time-ordered identifier
    pub id: String,
    /// Where the image came from (file URI, remote URL or data URI)
    pub uri: String,
    /// Role of the image
    #[serde(rename = "type")]
    pub kind: ImageKind,
    /// When the image was staged
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    /// Cached base64 payload, when already loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
}

impl ImageAsset {
    /// Create an asset pointing at `uri` without loading it
    pub fn new(uri: impl Into<String>, kind: ImageKind) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            uri: uri.into(),
            kind,
            date: Utc::now(),
            base64: None,
        }
    }

    /// Load a local image file, checking its type and size
    pub fn from_path(path: &Path, kind: ImageKind, max_bytes: u64) -> Result<Self> {
        if images::mime_from_extension(path).is_none() {
            bail!(
                "Unsupported image type: {} (expected one of {})",
                path.display(),
                images::SUPPORTED_IMAGE_TYPES.join(", ")
            );
        }

        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if metadata.len() > max_bytes {
            bail!(
                "{} is too large ({} bytes, limit {} bytes)",
                path.display(),
                metadata.len(),
                max_bytes
            );
        }

        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        let mut asset = Self::new(format!("file://{}", absolute.display()), kind);
        asset.base64 = Some(STANDARD.encode(bytes));
        Ok(asset)
    }

    /// Wrap an image already encoded as a data URI (e.g. fetched by URL)
    pub fn from_data_uri(uri: impl Into<String>, kind: ImageKind) -> Self {
        Self::new(uri, kind)
    }

    /// Base64 payload if it is available without I/O
    pub fn cached_base64(&self) -> Option<&str> {
        self.base64.as_deref().or_else(|| {
            self.uri
                .starts_with("data:")
                .then(|| images::strip_data_uri_prefix(&self.uri))
        })
    }
}
