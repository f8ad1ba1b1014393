use crate::coordinator::{AdjustmentResult, AllocationRun, CapacityUpdate, SessionCoordinator};
use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use club_allocator::error::AppError;
use club_allocator::workflows::allocation::{AllocationSnapshot, ClubKey};
use club_allocator::workflows::storage::CapacityConfig;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct LoadSessionRequest {
    pub(crate) submissions_csv: String,
    #[serde(default)]
    pub(crate) history_csv: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdjustmentRequest {
    pub(crate) pupil: String,
    pub(crate) club: ClubKey,
}

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Session endpoints under `/api/v1` plus the operational probes.
pub(crate) fn with_allocation_routes(coordinator: Arc<SessionCoordinator>) -> Router {
    Router::new()
        .route("/api/v1/sessions", post(load_session))
        .route("/api/v1/session", get(current_session))
        .route("/api/v1/capacities", put(update_capacities))
        .route("/api/v1/allocate", post(run_allocation))
        .route(
            "/api/v1/allocations",
            post(add_allocation).delete(remove_allocation),
        )
        .route("/api/v1/export/pupils.csv", get(export_pupils))
        .route("/api/v1/export/clubs.csv", get(export_clubs))
        .with_state(coordinator)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn load_session(
    State(coordinator): State<Arc<SessionCoordinator>>,
    Json(payload): Json<LoadSessionRequest>,
) -> Result<Json<AllocationSnapshot>, AppError> {
    let snapshot = coordinator.load(&payload.submissions_csv, payload.history_csv.as_deref())?;
    Ok(Json(snapshot))
}

pub(crate) async fn current_session(
    State(coordinator): State<Arc<SessionCoordinator>>,
) -> Result<Json<AllocationSnapshot>, AppError> {
    Ok(Json(coordinator.snapshot()?))
}

pub(crate) async fn update_capacities(
    State(coordinator): State<Arc<SessionCoordinator>>,
    Json(capacities): Json<CapacityConfig>,
) -> Result<Json<CapacityUpdate>, AppError> {
    Ok(Json(coordinator.update_capacities(&capacities)?))
}

pub(crate) async fn run_allocation(
    State(coordinator): State<Arc<SessionCoordinator>>,
) -> Result<Json<AllocationRun>, AppError> {
    Ok(Json(coordinator.allocate()?))
}

pub(crate) async fn add_allocation(
    State(coordinator): State<Arc<SessionCoordinator>>,
    Json(request): Json<AdjustmentRequest>,
) -> Result<Json<AdjustmentResult>, AppError> {
    Ok(Json(coordinator.add_allocation(&request.pupil, &request.club)?))
}

pub(crate) async fn remove_allocation(
    State(coordinator): State<Arc<SessionCoordinator>>,
    Json(request): Json<AdjustmentRequest>,
) -> Result<Json<AdjustmentResult>, AppError> {
    Ok(Json(
        coordinator.remove_allocation(&request.pupil, &request.club)?,
    ))
}

pub(crate) async fn export_pupils(
    State(coordinator): State<Arc<SessionCoordinator>>,
) -> Result<impl IntoResponse, AppError> {
    let body = coordinator.export_pupils()?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, CSV_CONTENT_TYPE)], body))
}

pub(crate) async fn export_clubs(
    State(coordinator): State<Arc<SessionCoordinator>>,
) -> Result<impl IntoResponse, AppError> {
    let body = coordinator.export_clubs()?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, CSV_CONTENT_TYPE)], body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use club_allocator::config::AllocationConfig;
    use club_allocator::workflows::storage::{CapacityStore, MemoryCapacityStore};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    const SUBMISSIONS: &str = "Time,Name,Class,P1,P2,P3,Count\n\
2019/05/01 9:00:00 am,Amy Smith,P5A,Chess (Friday) - Mr Brown,Art (Monday) - Ms Lee,,2\n\
2019/05/01 9:10:00 am,Ben Jones,P5B,Chess (Friday) - Mr Brown,,,1\n";

    fn router(store: MemoryCapacityStore, ready: bool) -> Router {
        let coordinator = Arc::new(SessionCoordinator::new(
            AllocationConfig::default(),
            Arc::new(store),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_allocation_routes(coordinator).layer(Extension(state))
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        (status, body.to_vec())
    }

    fn json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).expect("json body")
    }

    fn chess() -> Value {
        serde_json::json!({ "name": "Chess", "weekday": "Friday", "term_band": 1 })
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (status, _) = send(
            &router(MemoryCapacityStore::default(), false),
            empty_request(Method::GET, "/ready"),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = send(
            &router(MemoryCapacityStore::default(), true),
            empty_request(Method::GET, "/health"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "ok");
    }

    #[tokio::test]
    async fn session_routes_conflict_before_load() {
        let app = router(MemoryCapacityStore::default(), true);

        let (status, body) = send(&app, empty_request(Method::GET, "/api/v1/session")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(json(&body)["error"]
            .as_str()
            .expect("error message")
            .contains("no allocation session"));

        let (status, _) = send(&app, empty_request(Method::POST, "/api/v1/allocate")).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_submissions_are_bad_requests() {
        let app = router(MemoryCapacityStore::default(), true);
        let payload = serde_json::json!({
            "submissions_csv": "Time,Name,Class,P1,P2,P3,Count\nyesterday,Amy,P5A,,,,1\n"
        });

        let (status, body) =
            send(&app, json_request(Method::POST, "/api/v1/sessions", payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"]
            .as_str()
            .expect("error message")
            .contains("line 2"));
    }

    #[tokio::test]
    async fn load_configure_allocate_adjust_and_export() {
        let store = MemoryCapacityStore::default();
        let app = router(store.clone(), true);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/sessions",
                serde_json::json!({ "submissions_csv": SUBMISSIONS }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let snapshot = json(&body);
        assert_eq!(snapshot["pupils"].as_object().map(|pupils| pupils.len()), Some(2));
        assert_eq!(
            snapshot["clubs"]["Chess (Friday) term 1"]["maximum"],
            Value::from(30)
        );

        let mut capacity = chess();
        capacity["maximum"] = Value::from(1);
        let (status, body) = send(
            &app,
            json_request(Method::PUT, "/api/v1/capacities", Value::Array(vec![capacity])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["applied"], Value::from(1));
        let stored = store.load().expect("store readable");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.get(&ClubKey::new("Chess", "Friday", 1)), Some(1));

        let (status, body) = send(&app, empty_request(Method::POST, "/api/v1/allocate")).await;
        assert_eq!(status, StatusCode::OK);
        let run = json(&body);
        assert_eq!(run["outcome"]["rounds"], Value::from(2));
        assert_eq!(run["outcome"]["commits"], Value::from(2));
        let chess_club = &run["snapshot"]["clubs"]["Chess (Friday) term 1"];
        assert_eq!(chess_club["allocated"], serde_json::json!(["Amy Smith"]));
        assert_eq!(chess_club["waitlist"], serde_json::json!(["Ben Jones"]));
        assert_eq!(
            run["summary"]["unfilled_pupils"][0]["name"],
            Value::from("Ben Jones")
        );

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/allocations",
                serde_json::json!({ "pupil": "Ben Jones", "club": chess() }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let adjusted = json(&body);
        assert_eq!(adjusted["changed"], Value::from(true));
        assert_eq!(
            adjusted["pupil"]["allocated"],
            serde_json::json!(["Chess (Friday) term 1"])
        );

        let (status, body) =
            send(&app, empty_request(Method::GET, "/api/v1/export/pupils.csv")).await;
        assert_eq!(status, StatusCode::OK);
        let csv = String::from_utf8(body).expect("utf8");
        assert_eq!(
            csv,
            "Name,Class,Term 1\n\
Amy Smith,P5A,Chess (Friday) and Art (Monday)\n\
Ben Jones,P5B,Chess (Friday)\n"
        );

        let (status, body) = send(
            &app,
            json_request(
                Method::DELETE,
                "/api/v1/allocations",
                serde_json::json!({ "pupil": "Ben Jones", "club": chess() }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["changed"], Value::from(true));

        let (status, body) =
            send(&app, empty_request(Method::GET, "/api/v1/export/clubs.csv")).await;
        assert_eq!(status, StatusCode::OK);
        let csv = String::from_utf8(body).expect("utf8");
        assert_eq!(csv, "Art (Monday) term 1,Chess (Friday) term 1\nAmy Smith,Amy Smith\n");
    }

    #[tokio::test]
    async fn unknown_pupil_is_not_found() {
        let app = router(MemoryCapacityStore::default(), true);
        send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/sessions",
                serde_json::json!({ "submissions_csv": SUBMISSIONS }),
            ),
        )
        .await;

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/allocations",
                serde_json::json!({ "pupil": "Nobody", "club": chess() }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stored_capacities_apply_on_load() {
        let stored: CapacityConfig = [(ClubKey::new("Art", "Monday", 1), 3)].into_iter().collect();
        let app = router(MemoryCapacityStore::with_config(stored), true);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/sessions",
                serde_json::json!({ "submissions_csv": SUBMISSIONS }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json(&body)["clubs"]["Art (Monday) term 1"]["maximum"],
            Value::from(3)
        );
    }
}
