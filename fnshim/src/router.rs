//! HTTP router for the local function host

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use fnshim_function::{function_router, FunctionState};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the main application router
pub fn create_router(state: Arc<FunctionState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .with_state(state.clone())
        .merge(function_router(state))
        .layer(TraceLayer::new_for_http())
}

async fn health_check(State(state): State<Arc<FunctionState>>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "running",
        "functions": state.function_names(),
    });
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use fnshim_function::{FunctionConfig, FunctionHandler};
    use tower::ServiceExt;

    fn router() -> Router {
        let config = FunctionConfig {
            interpreter: "fnshim-no-such-interpreter".to_string(),
            sample_window_ms: 10,
            ..Default::default()
        };
        create_router(Arc::new(FunctionState::new(Arc::new(
            FunctionHandler::new(config),
        ))))
    }

    #[tokio::test]
    async fn test_health_lists_function() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["functions"], serde_json::json!(["server"]));
    }

    #[tokio::test]
    async fn test_function_route_is_mounted() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/.netlify/functions/server")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = router()
            .oneshot(Request::builder().uri("/admin/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
