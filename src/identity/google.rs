//! Google OAuth identity.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{IdentityError, IdentityProvider};
use crate::credentials::CredentialStore;
use crate::models::ProviderProfile;

/// Credential-store name for Google tokens
pub const GOOGLE_PROVIDER: &str = "google";

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const USERINFO_URL: &str = "https://www.googleapis.com/userinfo/v2/me";
const SCOPES: &str = "profile email";

/// Browser URL that starts the implicit-grant flow for `client_id`
pub fn authorization_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=token&scope={}",
        AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(SCOPES)
    )
}

/// Response of the user-info endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    /// Google account id
    pub id: String,
    /// Full name
    #[serde(default)]
    pub name: Option<String>,
    /// Primary email
    #[serde(default)]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub picture: Option<String>,
}

impl From<GoogleUserInfo> for ProviderProfile {
    fn from(info: GoogleUserInfo) -> Self {
        Self {
            uid: info.id,
            display_name: info.name,
            email: info.email,
            photo_url: info.picture,
        }
    }
}

/// Google sign-in backed by an access token
pub struct GoogleIdentity {
    client: Client,
    client_id: String,
    userinfo_url: String,
    credentials: CredentialStore,
}

impl GoogleIdentity {
    /// Create a provider for the OAuth client `client_id`
    pub fn new(client_id: &str, credentials: CredentialStore) -> Self {
        Self {
            client: Client::new(),
            client_id: client_id.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
            credentials,
        }
    }

    /// Point user-info lookups somewhere else
    pub fn with_userinfo_url(mut self, url: &str) -> Self {
        self.userinfo_url = url.to_string();
        self
    }

    /// Browser URL that starts the implicit-grant flow
    pub fn authorization_url(&self, redirect_uri: &str) -> String {
        authorization_url(&self.client_id, redirect_uri)
    }

    async fn fetch_user_info(&self, token: &str) -> Result<GoogleUserInfo, IdentityError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Google user info failed: {status}: {body}");
            return Err(IdentityError::Provider(format!(
                "Failed to get user info (HTTP {status})"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    fn name(&self) -> &'static str {
        GOOGLE_PROVIDER
    }

    async fn sign_in_developer(&self) -> Result<(), IdentityError> {
        // Developer sessions never present a Google token to the backend.
        self.credentials
            .delete_token(GOOGLE_PROVIDER)
            .map_err(|e| IdentityError::Credentials(format!("{e:#}")))
    }

    async fn sign_in_with_provider(&self, token: &str) -> Result<ProviderProfile, IdentityError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::Provider("Empty access token".to_string()));
        }

        let info = self.fetch_user_info(token).await?;
        self.credentials
            .store_token(GOOGLE_PROVIDER, token)
            .map_err(|e| IdentityError::Credentials(format!("{e:#}")))?;

        tracing::info!("Signed in with Google as {}", info.id);
        Ok(info.into())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.credentials
            .delete_token(GOOGLE_PROVIDER)
            .map_err(|e| IdentityError::Credentials(format!("{e:#}")))
    }

    fn access_token(&self) -> Option<String> {
        match self.credentials.get_token(GOOGLE_PROVIDER) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Could not read Google token: {e:#}");
                None
            }
        }
    }
}
