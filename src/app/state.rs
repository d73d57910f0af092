//! Application state

use crate::models::{ImageAsset, SavedLook, UserProfile};

/// Whether someone is signed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    /// No user profile is loaded
    #[default]
    SignedOut,
    /// A user profile is loaded
    SignedIn,
}

/// In-memory session truth owned by [`super::AppStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    /// Signed-in user
    pub user: Option<UserProfile>,
    /// Hydration from storage is in progress
    pub is_loading: bool,
    /// Session was started through the developer path
    pub is_dev_mode: bool,
    /// Staged subject image
    pub user_img: Option<ImageAsset>,
    /// Staged garment image
    pub fit_img: Option<ImageAsset>,
    /// Saved looks, newest first
    pub saved_looks: Vec<SavedLook>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user: None,
            // Nothing is shown until the first load finishes.
            is_loading: true,
            is_dev_mode: false,
            user_img: None,
            fit_img: None,
            saved_looks: Vec::new(),
        }
    }
}

impl AppState {
    /// Current session status
    pub const fn session(&self) -> Session {
        if self.user.is_some() {
            Session::SignedIn
        } else {
            Session::SignedOut
        }
    }

    /// Both images are staged
    pub const fn is_ready(&self) -> bool {
        self.user_img.is_some() && self.fit_img.is_some()
    }

    /// Generations left for the signed-in user
    pub fn quota_remaining(&self) -> Option<u32> {
        self.user.as_ref().map(UserProfile::remaining)
    }

    /// Whether a generation may start; signed-out sessions are not quota-limited
    pub fn has_quota(&self) -> bool {
        self.user.as_ref().is_none_or(UserProfile::has_quota)
    }

    /// Look up a saved look
    pub fn saved_look(&self, id: &str) -> Option<&SavedLook> {
        self.saved_looks.iter().find(|look| look.id == id)
    }
}
