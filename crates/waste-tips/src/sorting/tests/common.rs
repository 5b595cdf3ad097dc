use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::time::Instant;

use crate::config::RequestLimits;
use crate::sorting::{
    sorting_router, AnalysisGateway, AnalysisRequest, GatewayError, ImageUpload, Localizer,
    SortingRequest, VerificationGateway, WasteSortingService,
};

pub(super) const BOUNDARY: &str = "waste-tips-test-boundary";

/// Smallest byte run the sniffer recognizes as JPEG.
pub(super) fn jpeg_bytes() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00]
}

pub(super) fn jpeg_upload() -> ImageUpload {
    ImageUpload {
        bytes: jpeg_bytes(),
        declared_content_type: Some("image/jpeg".to_string()),
        file_name: Some("bottle.jpg".to_string()),
    }
}

pub(super) fn sorting_request(postal_code: &str, token: &str, language: &str) -> SortingRequest {
    SortingRequest {
        postal_code: postal_code.to_string(),
        verification_token: token.to_string(),
        language_code: language.to_string(),
        image: Some(jpeg_upload()),
    }
}

pub(super) fn far_deadline() -> Instant {
    Instant::now() + Duration::from_secs(30)
}

#[derive(Debug, Clone, Copy)]
pub(super) enum VerifierScript {
    Accept,
    Reject,
    Fail,
    Misconfigured,
    Hang,
}

pub(super) struct FakeVerifier {
    script: VerifierScript,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
}

impl FakeVerifier {
    pub(super) fn new(script: VerifierScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn tokens(&self) -> Vec<String> {
        self.tokens.lock().expect("token mutex poisoned").clone()
    }
}

#[async_trait]
impl VerificationGateway for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<bool, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .push(token.to_string());

        match self.script {
            VerifierScript::Accept => Ok(true),
            VerifierScript::Reject => Ok(false),
            VerifierScript::Fail => Err(GatewayError::Upstream("assessment timed out".to_string())),
            VerifierScript::Misconfigured => Err(GatewayError::Configuration(
                "missing reCAPTCHA site key".to_string(),
            )),
            VerifierScript::Hang => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) enum AnalyzerScript {
    Html(&'static str),
    Empty,
    Fail,
    Hang,
}

/// Owned copy of an `AnalysisRequest` so assertions can run after the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RecordedAnalysis {
    pub(super) image: Vec<u8>,
    pub(super) declared_content_type: String,
    pub(super) postal_code: String,
    pub(super) language_code: String,
    pub(super) language_name: String,
}

pub(super) struct FakeAnalyzer {
    script: AnalyzerScript,
    requests: Mutex<Vec<RecordedAnalysis>>,
}

impl FakeAnalyzer {
    pub(super) fn new(script: AnalyzerScript) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.requests.lock().expect("analysis mutex poisoned").len()
    }

    pub(super) fn requests(&self) -> Vec<RecordedAnalysis> {
        self.requests.lock().expect("analysis mutex poisoned").clone()
    }
}

#[async_trait]
impl AnalysisGateway for FakeAnalyzer {
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<String, GatewayError> {
        self.requests
            .lock()
            .expect("analysis mutex poisoned")
            .push(RecordedAnalysis {
                image: request.image.to_vec(),
                declared_content_type: request.declared_content_type.to_string(),
                postal_code: request.postal_code.to_string(),
                language_code: request.language_code.to_string(),
                language_name: request.language_name.to_string(),
            });

        match &self.script {
            AnalyzerScript::Html(html) => Ok(html.to_string()),
            AnalyzerScript::Empty => Err(GatewayError::EmptyResponse),
            AnalyzerScript::Fail => Err(GatewayError::Upstream("model unavailable".to_string())),
            AnalyzerScript::Hang => std::future::pending().await,
        }
    }
}

pub(super) type FakeService = WasteSortingService<FakeVerifier, FakeAnalyzer>;

pub(super) fn build_service(
    verifier: VerifierScript,
    analyzer: AnalyzerScript,
) -> (FakeService, Arc<FakeVerifier>, Arc<FakeAnalyzer>) {
    let verifier = Arc::new(FakeVerifier::new(verifier));
    let analyzer = Arc::new(FakeAnalyzer::new(analyzer));
    let service = WasteSortingService::new(verifier.clone(), analyzer.clone(), Localizer::shared());
    (service, verifier, analyzer)
}

pub(super) fn router_with(service: FakeService, limits: RequestLimits) -> axum::Router {
    sorting_router(Arc::new(service), limits)
}

/// Hand-assembled `multipart/form-data` body.
#[derive(Default)]
pub(super) struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub(super) fn file(
        mut self,
        name: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub(super) fn sorting_form(postal_code: &str, token: &str, language: &str) -> Self {
        Self::new()
            .text("postal_code", postal_code)
            .text("recaptcha_code", token)
            .text("language", language)
            .file("image", "bottle.jpg", "image/jpeg", &jpeg_bytes())
    }

    pub(super) fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

pub(super) fn multipart_post(body: MultipartBody) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post("/")
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(body.finish()))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
