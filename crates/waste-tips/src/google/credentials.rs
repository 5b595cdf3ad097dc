use std::fmt;
use std::sync::Arc;

use gcp_auth::TokenProvider;

/// OAuth scope covering both reCAPTCHA Enterprise and Vertex AI.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("no application default credentials found: {0}")]
    Discovery(#[source] gcp_auth::Error),
    #[error("access token request failed: {0}")]
    Token(#[source] gcp_auth::Error),
}

/// Where OAuth bearer tokens for Google APIs come from.
///
/// Application default credentials cover `GOOGLE_APPLICATION_CREDENTIALS`
/// service-account keys, gcloud user credentials and the metadata server.
/// The provider caches and refreshes tokens itself.
#[derive(Clone)]
pub enum AccessTokenSource {
    Static(String),
    ApplicationDefault(Arc<dyn TokenProvider>),
}

impl AccessTokenSource {
    /// A configured static token wins over application default credentials.
    pub async fn from_config(access_token: Option<&str>) -> Result<Self, CredentialsError> {
        match access_token.map(str::trim).filter(|token| !token.is_empty()) {
            Some(token) => Ok(Self::Static(token.to_string())),
            None => gcp_auth::provider()
                .await
                .map(Self::ApplicationDefault)
                .map_err(CredentialsError::Discovery),
        }
    }

    pub async fn access_token(&self) -> Result<String, CredentialsError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ApplicationDefault(provider) => {
                let token = provider
                    .token(&[CLOUD_PLATFORM_SCOPE])
                    .await
                    .map_err(CredentialsError::Token)?;
                Ok(token.as_str().to_string())
            }
        }
    }
}

impl fmt::Debug for AccessTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static(***)"),
            Self::ApplicationDefault(_) => f.write_str("ApplicationDefault"),
        }
    }
}
