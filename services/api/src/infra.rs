use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use waste_tips::config::GoogleConfig;
use waste_tips::error::AppError;
use waste_tips::google::{self, GoogleSortingService};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the live reCAPTCHA and Gemini gateways into the sorting pipeline.
pub(crate) async fn build_sorting_service(
    config: &GoogleConfig,
) -> Result<Arc<GoogleSortingService>, AppError> {
    google::sorting_service(config).await.map(Arc::new)
}
