use club_allocator::config::AllocationConfig;
use club_allocator::workflows::allocation::AllocationEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Engine honouring the configured round override, if any.
pub(crate) fn engine_for(config: &AllocationConfig) -> AllocationEngine {
    match config.rounds {
        Some(rounds) => AllocationEngine::new().with_rounds(rounds),
        None => AllocationEngine::new(),
    }
}
