//! Google Cloud adapters for the sorting pipeline: reCAPTCHA Enterprise for
//! token verification and Gemini on Vertex AI for image analysis.

pub mod credentials;
pub mod gemini;
pub mod media;
pub mod recaptcha;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::config::GoogleConfig;
use crate::error::AppError;
use crate::sorting::{Localizer, WasteSortingService};

pub use credentials::{AccessTokenSource, CredentialsError};
pub use gemini::VertexGeminiClient;
pub use media::{sniff_image_type, upload_media_type};
pub use recaptcha::{RecaptchaEnterpriseClient, MINIMUM_RISK_SCORE};

const USER_AGENT: &str = concat!("waste-tips/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pipeline wired to the live Google services.
pub type GoogleSortingService = WasteSortingService<RecaptchaEnterpriseClient, VertexGeminiClient>;

/// Shared HTTP client for outbound Google API calls.
pub fn http_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Builds the production pipeline; incomplete settings or missing credentials fail before serving.
pub async fn sorting_service(config: &GoogleConfig) -> Result<GoogleSortingService, AppError> {
    config.require_complete()?;

    let client = http_client();
    let credentials = AccessTokenSource::from_config(config.access_token.as_deref()).await?;

    let verifier = RecaptchaEnterpriseClient::new(
        client.clone(),
        config.project_id.clone(),
        config.recaptcha_site_key.clone(),
        credentials.clone(),
    )
    .with_base_url(config.recaptcha_endpoint.clone())
    .with_api_key(config.recaptcha_api_key.clone());

    let analyzer = VertexGeminiClient::new(
        client,
        config.project_id.clone(),
        config.gemini_location.clone(),
        config.gemini_model.clone(),
        credentials,
    )
    .with_base_url(config.gemini_endpoint.clone());

    info!(
        project_id = %config.project_id,
        model = %config.gemini_model,
        location = %config.gemini_location,
        "google gateways configured"
    );

    Ok(WasteSortingService::new(
        Arc::new(verifier),
        Arc::new(analyzer),
        Localizer::shared(),
    ))
}
