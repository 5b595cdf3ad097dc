use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::domain::{ImageUpload, SortingOutcome, SortingRequest};
use super::gateways::{AnalysisGateway, AnalysisRequest, GatewayError, VerificationGateway};
use super::localization::{ErrorKind, Localizer};
use super::validation::{is_valid_image_type, is_valid_postal_code};

/// Pipeline composing validation, verification and analysis for one upload.
///
/// Steps run strictly in order and the first failure ends the request, so the
/// two upstream services are only called for well-formed input.
pub struct WasteSortingService<V, A> {
    verifier: Arc<V>,
    analyzer: Arc<A>,
    localizer: Arc<Localizer>,
}

impl<V, A> WasteSortingService<V, A>
where
    V: VerificationGateway + 'static,
    A: AnalysisGateway + 'static,
{
    pub fn new(verifier: Arc<V>, analyzer: Arc<A>, localizer: Arc<Localizer>) -> Self {
        Self {
            verifier,
            analyzer,
            localizer,
        }
    }

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    /// Run the pipeline; upstream calls are abandoned once `deadline` passes.
    pub async fn process(&self, request: SortingRequest, deadline: Instant) -> SortingOutcome {
        let language = self.localizer.normalize(&request.language_code);
        if language != request.language_code {
            debug!(
                requested = %request.language_code,
                language,
                "unsupported language replaced with fallback"
            );
        }

        match self.run(&request, language, deadline).await {
            Ok(html) => {
                info!(language, postal_code = %request.postal_code, "sorting guidance produced");
                SortingOutcome::Sorted { html }
            }
            Err(kind) => SortingOutcome::Rejected {
                kind,
                language,
                message: self.localizer.error_message(language, kind).to_string(),
            },
        }
    }

    async fn run(
        &self,
        request: &SortingRequest,
        language: &'static str,
        deadline: Instant,
    ) -> Result<String, ErrorKind> {
        if request.postal_code.is_empty() || request.verification_token.is_empty() {
            debug!("request rejected: missing postal code or verification token");
            return Err(ErrorKind::MissingFields);
        }

        if !is_valid_postal_code(&request.postal_code) {
            debug!(postal_code = %request.postal_code, "request rejected: invalid postal code");
            return Err(ErrorKind::InvalidPostalCode);
        }

        let (image, declared_content_type) =
            accepted_image(request.image.as_ref()).ok_or(ErrorKind::InvalidImage)?;

        match with_deadline(deadline, self.verifier.verify(&request.verification_token)).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("verification token rejected");
                return Err(ErrorKind::RecaptchaFailed);
            }
            Err(err) => {
                warn!(error = %err, "verification gateway failed");
                return Err(ErrorKind::RecaptchaFailed);
            }
        }

        let analysis = AnalysisRequest {
            image: &image.bytes,
            declared_content_type,
            postal_code: &request.postal_code,
            language_code: language,
            language_name: self.localizer.language_name(language),
        };

        with_deadline(deadline, self.analyzer.analyze(analysis))
            .await
            .map_err(|err| {
                error!(error = %err, language, "image analysis failed");
                ErrorKind::ProcessingError
            })
    }
}

fn accepted_image(image: Option<&ImageUpload>) -> Option<(&ImageUpload, &str)> {
    let image = image.filter(|image| !image.bytes.is_empty())?;
    let declared = image.declared_content_type.as_deref()?;

    if is_valid_image_type(declared) {
        Some((image, declared))
    } else {
        debug!(
            declared,
            file_name = image.file_name.as_deref().unwrap_or_default(),
            "request rejected: image type not accepted"
        );
        None
    }
}

async fn with_deadline<T, F>(deadline: Instant, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Upstream(
            "request deadline elapsed before the upstream call completed".to_string(),
        )),
    }
}
