use async_trait::async_trait;

/// Anti-abuse check on the opaque token the browser widget produced.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    /// `Ok(false)` means the service answered and rejected the token.
    async fn verify(&self, token: &str) -> Result<bool, GatewayError>;
}

/// Image analysis backend producing an HTML fragment with sorting guidance.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<String, GatewayError>;
}

/// Everything the analysis backend needs about one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRequest<'a> {
    pub image: &'a [u8],
    /// Client-declared type, already checked against the allow-list.
    pub declared_content_type: &'a str,
    pub postal_code: &'a str,
    pub language_code: &'a str,
    pub language_name: &'a str,
}

/// Failure raised by an upstream gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway misconfigured: {0}")]
    Configuration(String),
    #[error("upstream call failed: {0}")]
    Upstream(String),
    #[error("upstream returned no usable content")]
    EmptyResponse,
}

impl GatewayError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::Upstream(err.to_string())
    }
}
