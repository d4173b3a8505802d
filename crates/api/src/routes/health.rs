//! Health check endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Optional collaborators that are configured.
    pub services: ServiceFlags,
}

/// Which optional collaborators are wired in.
#[derive(Serialize)]
pub struct ServiceFlags {
    /// Receipt storage backend, if any.
    pub storage: Option<&'static str>,
    /// Vision extraction.
    pub vision: bool,
    /// Identity-provider admin API.
    pub identity: bool,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        services: ServiceFlags {
            storage: state.storage.as_ref().map(|s| s.provider_name()),
            vision: state.vision.is_some(),
            identity: state.identity.is_some(),
        },
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use crate::test_support;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = crate::create_router(test_support::state());
        let response = app
            .oneshot(test_support::get("/api/v1/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["vision"], false);
        assert!(body["services"]["storage"].is_null());
    }
}
