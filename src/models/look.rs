//! Saved look model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of saved looks kept, newest first
pub const MAX_SAVED_LOOKS: usize = 50;

/// A generated look kept in the gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLook {
    /// Unique identifier
    pub id: String,
    /// Data URI or remote URI of the composited image
    pub image: String,
    /// Creation time, stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Subject image the look was generated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image_uri: Option<String>,
    /// Garment image the look was generated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_image_uri: Option<String>,
}

impl SavedLook {
    /// Create a look with a fresh time-ordered id
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            image: image.into(),
            created_at: Utc::now(),
            user_image_uri: None,
            fit_image_uri: None,
        }
    }

    /// Record the source images
    pub fn with_sources(mut self, user_image_uri: &str, fit_image_uri: &str) -> Self {
        self.user_image_uri = Some(user_image_uri.to_string());
        self.fit_image_uri = Some(fit_image_uri.to_string());
        self
    }

    /// Human-friendly relative time ("5m", "2h", "3d")
    pub fn relative_time(&self) -> String {
        let duration = Utc::now().signed_duration_since(self.created_at);

        if duration.num_days() > 0 {
            format!("{}d", duration.num_days())
        } else if duration.num_hours() > 0 {
            format!("{}h", duration.num_hours())
        } else if duration.num_minutes() > 0 {
            format!("{}m", duration.num_minutes())
        } else {
            "now".to_string()
        }
    }
}

/// Prepend a look and drop everything past [`MAX_SAVED_LOOKS`]
pub fn prepend_capped(looks: &mut Vec<SavedLook>, look: SavedLook) {
    looks.insert(0, look);
    looks.truncate(MAX_SAVED_LOOKS);
}
