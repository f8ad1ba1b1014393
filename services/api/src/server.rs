use crate::cli::ServeArgs;
use crate::coordinator::SessionCoordinator;
use crate::infra::AppState;
use crate::routes::with_allocation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use club_allocator::config::AppConfig;
use club_allocator::error::AppError;
use club_allocator::telemetry;
use club_allocator::workflows::storage::JsonFileCapacityStore;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let store = Arc::new(JsonFileCapacityStore::new(
        config.allocation.capacity_store.clone(),
    ));
    let coordinator = Arc::new(SessionCoordinator::new(config.allocation.clone(), store));

    let app = with_allocation_routes(coordinator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "club allocation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
