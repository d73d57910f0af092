//! User profile model

use serde::{Deserialize, Serialize};

/// The signed-in user and their generation quota
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable user id (provider uid or `dev-user-<millis>`)
    pub uid: String,
    /// Display name
    pub display_name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Avatar URI
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// Generations used so far
    pub quota: u32,
    /// Generations allowed
    pub max_quota: u32,
}

impl UserProfile {
    /// Synthesize the local developer profile
    pub fn developer(max_quota: u32) -> Self {
        Self {
            uid: format!("dev-user-{}", chrono::Utc::now().timestamp_millis()),
            display_name: Some("Developer".to_string()),
            email: Some("dev@zyora.app".to_string()),
            photo_url: None,
            quota: 0,
            max_quota,
        }
    }

    /// Build a fresh profile from identity-provider fields; quota starts at zero
    pub fn from_provider(provider: ProviderProfile, max_quota: u32) -> Self {
        Self {
            uid: provider.uid,
            display_name: provider.display_name,
            email: provider.email,
            photo_url: provider.photo_url,
            quota: 0,
            max_quota,
        }
    }

    /// Generations left before the quota is reached
    pub const fn remaining(&self) -> u32 {
        self.max_quota.saturating_sub(self.quota)
    }

    /// Whether another generation is allowed
    pub const fn has_quota(&self) -> bool {
        self.quota < self.max_quota
    }

    /// Percentage of the quota used, clamped to 100
    pub fn usage_percent(&self) -> u32 {
        if self.max_quota == 0 {
            return 100;
        }
        (self.quota.saturating_mul(100) / self.max_quota).min(100)
    }

    /// Apply a personal-info edit; blank or missing fields keep the current value
    pub fn apply_edit(&mut self, edit: ProfileEdit) {
        if let Some(name) = non_blank(edit.display_name) {
            self.display_name = Some(name);
        }
        if let Some(email) = non_blank(edit.email) {
            self.email = Some(email);
        }
        if let Some(photo) = non_blank(edit.photo_url) {
            self.photo_url = Some(photo);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// User fields reported by an identity provider
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    /// Provider user id
    pub uid: String,
    /// Display name
    pub display_name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Avatar URL
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// Personal-info edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEdit {
    /// New display name
    pub display_name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New avatar URI
    pub photo_url: Option<String>,
}
