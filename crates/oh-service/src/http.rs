//! Ops HTTP surface: liveness, readiness, and metrics.
//!
//! `/health` returns plain text "OK" for liveness probes. `/ready` pings
//! the store and reports JSON for readiness probes. `/metrics` renders the
//! Prometheus registry.
//!
//! No coordination operation is reachable over HTTP; the request layer that
//! maps transport calls onto the coordinator lives outside this service.

use crate::store::StateStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared state for the ops endpoints.
pub struct OpsState<S> {
    /// Store handle, pinged by the readiness probe.
    pub store: Arc<S>,
    /// Prometheus render handle. `None` when no recorder is installed
    /// (unit tests).
    pub metrics: Option<PrometheusHandle>,
}

impl<S> Clone for OpsState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            metrics: self.metrics.clone(),
        }
    }
}

/// Build the ops router.
pub fn build_router<S: StateStore>(state: OpsState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready::<S>))
        .route("/metrics", get(metrics_endpoint::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe: the process is up.
async fn health() -> &'static str {
    "OK"
}

/// Readiness probe: the store answers a ping.
async fn ready<S: StateStore>(State(state): State<OpsState<S>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "store": "ok" }))),
        Err(e) => {
            warn!(error = %e, "readiness store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "store": "unavailable" })),
            )
        }
    }
}

/// Prometheus metrics in text exposition format.
async fn metrics_endpoint<S: StateStore>(State(state): State<OpsState<S>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{StateStore, StoreError};
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use tower::util::ServiceExt;

    /// Store stub whose only behavior is the ping outcome.
    struct PingStore {
        healthy: bool,
    }

    #[async_trait]
    impl StateStore for PingStore {
        async fn hash_get_all(&self, _: &str) -> Result<HashMap<String, String>, StoreError> {
            Ok(HashMap::new())
        }
        async fn hash_set(&self, _: &str, _: &[(&str, String)]) -> Result<(), StoreError> {
            Ok(())
        }
        async fn hash_delete_fields(&self, _: &str, _: &[&str]) -> Result<(), StoreError> {
            Ok(())
        }
        async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        async fn set(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn set_add(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn set_remove(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn set_members(&self, _: &str) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
        async fn zset_add(&self, _: &str, _: i64, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn zset_remove(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn zset_range(&self, _: &str, _: isize, _: isize) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
        async fn ping(&self) -> Result<(), StoreError> {
            if self.healthy {
                Ok(())
            } else {
                Err(StoreError::Io("connection refused".to_string()))
            }
        }
    }

    fn router(healthy: bool) -> Router {
        build_router(OpsState {
            store: Arc::new(PingStore { healthy }),
            metrics: None,
        })
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = router(true)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn test_ready_reports_store_ok() {
        let response = router(true)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ready")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["store"], "ok");
    }

    #[tokio::test]
    async fn test_ready_reports_store_unavailable() {
        let response = router(false)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ready")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["store"], "unavailable");
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let response = router(true)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/v1/nonexistent")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
