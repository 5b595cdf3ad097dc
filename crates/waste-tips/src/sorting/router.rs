use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{field, info_span, warn, Instrument};

use super::domain::{ImageUpload, SortingOutcome, SortingRequest, SortingResult};
use super::gateways::{AnalysisGateway, VerificationGateway};
use super::localization::ErrorKind;
use super::service::WasteSortingService;
use crate::config::RequestLimits;
use crate::telemetry::{parse_cloud_trace_context, CLOUD_TRACE_HEADER};

/// Returned when the body cannot be read as a form; the language is unknown at that point.
pub const FORM_PARSE_ERROR: &str = "Failed to parse form";

pub const METHOD_NOT_ALLOWED_ERROR: &str = "Method not allowed";

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

pub(crate) struct SortingState<V, A> {
    service: Arc<WasteSortingService<V, A>>,
    request_timeout: Duration,
}

impl<V, A> SortingState<V, A> {
    pub(crate) fn new(service: Arc<WasteSortingService<V, A>>, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }
}

impl<V, A> Clone for SortingState<V, A> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            request_timeout: self.request_timeout,
        }
    }
}

/// Router exposing the single sorting endpoint at `/`.
pub fn sorting_router<V, A>(service: Arc<WasteSortingService<V, A>>, limits: RequestLimits) -> Router
where
    V: VerificationGateway + 'static,
    A: AnalysisGateway + 'static,
{
    let state = SortingState::new(service, limits.request_timeout);

    Router::new()
        .route("/", post(sort_handler::<V, A>).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(limits.max_request_bytes))
        .layer(cors_layer())
        .with_state(state)
}

/// Every OPTIONS request, preflight or not, is answered by the layer itself with 200 and an empty body.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(PREFLIGHT_MAX_AGE)
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, OPTIONS")],
        Json(SortingResult::failure(METHOD_NOT_ALLOWED_ERROR)),
    )
        .into_response()
}

pub(crate) async fn sort_handler<V, A>(
    State(state): State<SortingState<V, A>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    V: VerificationGateway + 'static,
    A: AnalysisGateway + 'static,
{
    let deadline = Instant::now() + state.request_timeout;

    let span = info_span!(
        "sorting_request",
        trace_id = field::Empty,
        span_id = field::Empty
    );
    let trace = headers
        .get(CLOUD_TRACE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_cloud_trace_context);
    if let Some(trace) = trace {
        span.record("trace_id", trace.trace_id.as_str());
        if let Some(span_id) = trace.span_id.as_deref() {
            span.record("span_id", span_id);
        }
    }

    handle_sorting_form(state, multipart, deadline)
        .instrument(span)
        .await
}

async fn handle_sorting_form<V, A>(
    state: SortingState<V, A>,
    multipart: Result<Multipart, MultipartRejection>,
    deadline: Instant,
) -> Response
where
    V: VerificationGateway + 'static,
    A: AnalysisGateway + 'static,
{
    let request = match multipart {
        Ok(multipart) => read_sorting_form(multipart).await,
        Err(rejection) => Err(FormError::Rejected(rejection)),
    };

    let request = match request {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "unable to read sorting form");
            let body = SortingResult::failure(FORM_PARSE_ERROR);
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let outcome = state.service.process(request, deadline).await;
    outcome_response(outcome)
}

pub(crate) fn outcome_response(outcome: SortingOutcome) -> Response {
    let status = match outcome.error_kind() {
        None => StatusCode::OK,
        Some(ErrorKind::ProcessingError) => StatusCode::INTERNAL_SERVER_ERROR,
        Some(_) => StatusCode::BAD_REQUEST,
    };

    (status, Json(outcome.into_result())).into_response()
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FormError {
    #[error("request is not a readable multipart form: {0}")]
    Rejected(MultipartRejection),
    #[error("malformed multipart field: {0}")]
    Field(#[from] MultipartError),
}

/// Collects the known fields; the first occurrence of a repeated field wins.
async fn read_sorting_form(mut multipart: Multipart) -> Result<SortingRequest, FormError> {
    let mut postal_code = None;
    let mut verification_token = None;
    let mut language_code = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "postal_code" if postal_code.is_none() => postal_code = Some(field.text().await?),
            "recaptcha_code" if verification_token.is_none() => {
                verification_token = Some(field.text().await?)
            }
            "language" if language_code.is_none() => language_code = Some(field.text().await?),
            // A plain text part named `image` is not a file upload.
            "image" if image.is_none() && field.file_name().is_some() => {
                let file_name = field.file_name().map(str::to_owned);
                let declared_content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                image = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    declared_content_type,
                    file_name,
                });
            }
            _ => {}
        }
    }

    Ok(SortingRequest {
        postal_code: postal_code.unwrap_or_default(),
        verification_token: verification_token.unwrap_or_default(),
        language_code: language_code.unwrap_or_default(),
        image,
    })
}
