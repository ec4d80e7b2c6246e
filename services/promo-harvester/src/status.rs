//! Health and metrics listener
//!
//! Read-only view of the running engine. Serving stops when the engine's
//! cancellation token fires.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use promo_engine::EngineStats;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared state for the status handlers
#[derive(Clone)]
pub struct StatusState {
    pub stats: Arc<EngineStats>,
    pub units: usize,
    pub credentials: usize,
    pub prometheus: PrometheusHandle,
}

pub fn build_router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Serve `router` on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

async fn health_handler(State(state): State<StatusState>) -> impl IntoResponse {
    let stats = state.stats.snapshot();
    let body = serde_json::json!({
        "status": "running",
        "units": state.units,
        "credentials": state.credentials,
        "uptime_seconds": stats.uptime_seconds,
        "codes_persisted": stats.codes_persisted,
        "duplicate_codes": stats.duplicate_codes,
        "cycles_completed": stats.cycles_completed,
        "auth_failures": stats.auth_failures,
        "unit_restarts": stats.unit_restarts,
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus text exposition format
async fn metrics_handler(State(state): State<StatusState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    /// PrometheusHandle without installing a global recorder.
    fn test_prometheus_handle() -> PrometheusHandle {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        recorder.handle()
    }

    fn test_state() -> StatusState {
        StatusState {
            stats: Arc::new(EngineStats::new()),
            units: 3,
            credentials: 7,
            prometheus: test_prometheus_handle(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_engine_counters() {
        let state = test_state();
        state.stats.codes_persisted.fetch_add(4, Ordering::Relaxed);
        state.stats.duplicate_codes.fetch_add(1, Ordering::Relaxed);
        state.stats.cycles_completed.fetch_add(5, Ordering::Relaxed);
        state.stats.unit_restarts.fetch_add(2, Ordering::Relaxed);

        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let json = body_json(response).await;
        assert_eq!(json["status"], "running");
        assert_eq!(json["units"], 3);
        assert_eq!(json["credentials"], 7);
        assert_eq!(json["codes_persisted"], 4);
        assert_eq!(json["duplicate_codes"], 1);
        assert_eq!(json["cycles_completed"], 5);
        assert_eq!(json["unit_restarts"], 2);
        assert!(json["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let response = build_router(test_state())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"), "got: {content_type}");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = build_router(test_state())
            .oneshot(Request::get("/codes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, build_router(test_state()), cancel.clone()));

        cancel.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("server must stop after cancel")
            .unwrap();
        assert!(result.is_ok());
    }
}
