use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::credentials::AccessTokenSource;
use crate::sorting::{GatewayError, VerificationGateway};

pub const DEFAULT_RECAPTCHA_ENDPOINT: &str = "https://recaptchaenterprise.googleapis.com";

/// Lowest risk score (0.0 bot, 1.0 human) accepted as a real visitor.
pub const MINIMUM_RISK_SCORE: f64 = 0.5;

/// reCAPTCHA Enterprise assessment client.
#[derive(Debug, Clone)]
pub struct RecaptchaEnterpriseClient {
    client: Client,
    base_url: String,
    project_id: String,
    site_key: String,
    api_key: Option<String>,
    credentials: AccessTokenSource,
}

#[derive(Serialize)]
struct AssessmentRequest<'a> {
    event: AssessmentEvent<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentEvent<'a> {
    token: &'a str,
    site_key: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Assessment {
    #[serde(default)]
    token_properties: TokenProperties,
    #[serde(default)]
    risk_analysis: RiskAnalysis,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenProperties {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    invalid_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RiskAnalysis {
    #[serde(default)]
    score: f64,
}

impl Assessment {
    pub(crate) fn passes(&self) -> bool {
        self.token_properties.valid && self.risk_analysis.score >= MINIMUM_RISK_SCORE
    }
}

impl RecaptchaEnterpriseClient {
    pub fn new(
        client: Client,
        project_id: impl Into<String>,
        site_key: impl Into<String>,
        credentials: AccessTokenSource,
    ) -> Self {
        Self {
            client,
            base_url: DEFAULT_RECAPTCHA_ENDPOINT.to_string(),
            project_id: project_id.into(),
            site_key: site_key.into(),
            api_key: None,
            credentials,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate with an API key instead of bearer credentials.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    fn assessments_url(&self) -> Result<Url, GatewayError> {
        let raw = format!(
            "{}/v1/projects/{}/assessments",
            self.base_url, self.project_id
        );
        let url = match &self.api_key {
            Some(key) => Url::parse_with_params(&raw, [("key", key.as_str())]),
            None => Url::parse(&raw),
        };
        url.map_err(|err| GatewayError::Configuration(format!("invalid reCAPTCHA endpoint: {err}")))
    }

    async fn assess(&self, token: &str) -> Result<Assessment, GatewayError> {
        if self.project_id.trim().is_empty() || self.site_key.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "missing reCAPTCHA project id or site key".to_string(),
            ));
        }

        let body = AssessmentRequest {
            event: AssessmentEvent {
                token,
                site_key: &self.site_key,
            },
        };

        let mut request = self.client.post(self.assessments_url()?).json(&body);
        if self.api_key.is_none() {
            let bearer = self
                .credentials
                .access_token()
                .await
                .map_err(GatewayError::upstream)?;
            request = request.bearer_auth(bearer);
        }

        let response = request.send().await.map_err(GatewayError::upstream)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!(
                "reCAPTCHA returned {status}: {detail}"
            )));
        }

        response.json().await.map_err(GatewayError::upstream)
    }
}

#[async_trait]
impl VerificationGateway for RecaptchaEnterpriseClient {
    async fn verify(&self, token: &str) -> Result<bool, GatewayError> {
        let assessment = self.assess(token).await?;
        debug!(
            valid = assessment.token_properties.valid,
            score = assessment.risk_analysis.score,
            invalid_reason = assessment.token_properties.invalid_reason.as_deref(),
            "reCAPTCHA assessment received"
        );
        Ok(assessment.passes())
    }
}
