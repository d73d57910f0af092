//! Local developer identity.

use async_trait::async_trait;

use super::{IdentityError, IdentityProvider};
use crate::models::ProviderProfile;

/// Identity that only supports developer sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct DeveloperIdentity;

#[async_trait]
impl IdentityProvider for DeveloperIdentity {
    fn name(&self) -> &'static str {
        "developer"
    }

    async fn sign_in_developer(&self) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn sign_in_with_provider(&self, _token: &str) -> Result<ProviderProfile, IdentityError> {
        Err(IdentityError::NotConfigured(
            "Google sign-in requires OAuth configuration; use developer mode".to_string(),
        ))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    #[test]
    fn test_provider_sign_in_is_unavailable() {
        let identity = DeveloperIdentity;
        assert!(block_on(identity.sign_in_developer()).is_ok());
        assert!(matches!(
            block_on(identity.sign_in_with_provider("token")),
            Err(IdentityError::NotConfigured(_))
        ));
        assert!(block_on(identity.sign_out()).is_ok());
        assert!(identity.access_token().is_none());
    }
}
