use crate::cli::ServeArgs;
use crate::infra::{build_sorting_service, AppState};
use crate::routes::with_sorting_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use waste_tips::config::AppConfig;
use waste_tips::error::AppError;
use waste_tips::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let sorting_service = build_sorting_service(&config.google).await?;

    let app = with_sorting_routes(sorting_service, config.limits)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        application = %config.telemetry.application_name,
        ?config.environment,
        %addr,
        "waste sorting service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
