use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

mod anime;
mod calculate;
pub mod error;
mod extract;

/// Versioned API routes, mounted under the configured prefix
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/anime", anime::routes())
        .merge(calculate::routes())
}

#[derive(Debug, Serialize)]
pub struct WelcomeMessage {
    pub message: String,
}

/// GET /
async fn root_handler(State(state): State<Arc<AppState>>) -> Json<WelcomeMessage> {
    Json(WelcomeMessage {
        message: format!("Welcome to {}", state.config.api.project_name),
    })
}

/// Full application router with CORS and request tracing
pub fn router(state: Arc<AppState>) -> Router {
    let prefix = state.config.api.prefix.clone();

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(|| async { "OK" }));

    let app = if prefix.is_empty() {
        app.merge(routes())
    } else {
        app.nest(&prefix, routes())
    };

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_json, get, test_app};
    use super::*;
    use crate::config::AppConfig;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_root_welcome() {
        let response = get(test_app("http://127.0.0.1:9"), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Welcome to AniTime API");
    }

    #[tokio::test]
    async fn test_health() {
        let response = get(test_app("http://127.0.0.1:9"), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = get(test_app("http://127.0.0.1:9"), "/api/v1/nothing-here").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_prefix_mounts_at_root() {
        let mut config = AppConfig::default();
        config.api.prefix = String::new();
        let app = router(Arc::new(AppState::new(config)));

        let response = test_support::post_json(
            app,
            "/calculate",
            serde_json::json!({ "total_episodes": 4, "episodes_per_day": 2 }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
