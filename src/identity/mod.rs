//! Identity providers.
//!
//! Sign-in is delegated: a provider turns an access token into a
//! [`ProviderProfile`] and the app store builds its own [`UserProfile`] from
//! it. [`DeveloperIdentity`] is the always-available local path;
//! [`GoogleIdentity`] talks to Google's OAuth user-info endpoint.
//!
//! [`UserProfile`]: crate::models::UserProfile

mod developer;
mod google;

pub use developer::DeveloperIdentity;
pub use google::{GOOGLE_PROVIDER, GoogleIdentity, GoogleUserInfo, authorization_url};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ProviderProfile;

/// Failure reported by an identity provider
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Provider sign-in is unavailable in this build or configuration
    #[error("{0}")]
    NotConfigured(String),

    /// The provider rejected the request
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Transport failure talking to the provider
    #[error("identity request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider credentials could not be stored or removed
    #[error("credential storage error: {0}")]
    Credentials(String),
}

/// Capability set of an identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &'static str;

    /// Prepare the provider for a local developer session
    async fn sign_in_developer(&self) -> Result<(), IdentityError>;

    /// Resolve a provider access token into the user's profile fields
    async fn sign_in_with_provider(&self, token: &str) -> Result<ProviderProfile, IdentityError>;

    /// End the provider session
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Bearer token to present to the backend, if the provider holds one
    fn access_token(&self) -> Option<String> {
        None
    }
}
