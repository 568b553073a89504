//! HTTP surface: the three entry pages, static assets and the WebSocket endpoint.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::ws;

pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let static_dir = &config.static_dir;

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/fellow", ServeFile::new(static_dir.join("fellow.html")))
        .route_service("/coach", ServeFile::new(static_dir.join("coach.html")))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app_with_pages() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        for page in ["index.html", "fellow.html", "coach.html", "app.js"] {
            std::fs::write(dir.path().join(page), format!("<!-- {} -->", page)).unwrap();
        }
        let config = ServerConfig {
            static_dir: dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        (router(Arc::new(AppState::new()), &config), dir)
    }

    async fn status_of(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_entry_pages_are_served() {
        let (app, _dir) = app_with_pages();

        for uri in ["/", "/fellow", "/coach", "/app.js"] {
            assert_eq!(status_of(app.clone(), uri).await, StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let (app, _dir) = app_with_pages();
        assert_eq!(
            status_of(app, "/missing.css").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let (app, _dir) = app_with_pages();
        assert!(status_of(app, "/ws").await.is_client_error());
    }

    #[tokio::test]
    async fn test_coach_page_renders_names_as_text() {
        let config = ServerConfig {
            static_dir: std::path::PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/public")),
            ..ServerConfig::default()
        };
        let app = router(Arc::new(AppState::new()), &config);

        let response = app
            .oneshot(Request::builder().uri("/coach").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();

        // Fellow names are user input and must never be parsed as markup
        assert!(!page.contains("innerHTML"));
        assert!(page.contains("new Option(f.name, f.id)"));
    }
}
