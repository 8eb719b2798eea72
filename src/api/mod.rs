//! HTTP API backing the fasting tracker.
//!
//! | Route | Methods |
//! |---|---|
//! | `/health` | GET |
//! | `/api/timer/:user_id` | GET, POST, PATCH, DELETE |
//! | `/api/fasts/:user_id` | GET, POST |
//! | `/api/fasts/:user_id/stats` | GET |
//! | `/api/fasts/:user_id/:fast_id` | DELETE |
//!
//! Anything else falls through to the static frontend when one is configured.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::db::Database;

pub mod error;
pub mod routes;

pub use error::AppError;

pub struct AppState {
    pub db: Database,
}

#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub enable_cors: bool,
    pub static_dir: Option<PathBuf>,
}

pub fn build_router(state: Arc<AppState>, options: &RouterOptions) -> Router {
    let mut app = Router::new()
        .route("/health", get(routes::health_check))
        .route(
            "/api/timer/:user_id",
            get(routes::get_timer)
                .post(routes::start_timer)
                .patch(routes::update_timer)
                .delete(routes::delete_timer),
        )
        .route(
            "/api/fasts/:user_id",
            get(routes::list_fasts).post(routes::add_fast),
        )
        .route("/api/fasts/:user_id/stats", get(routes::fast_stats))
        .route("/api/fasts/:user_id/:fast_id", delete(routes::delete_fast))
        .with_state(state);

    if let Some(dir) = &options.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    if options.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE])
            .allow_origin(tower_http::cors::Any)
            .max_age(Duration::from_secs(60 * 60));
        app = app.layer(cors);
    }

    app
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::db::test_support::open_temp;

    fn app() -> (tempfile::TempDir, Router) {
        let (dir, db) = open_temp();
        let router = build_router(Arc::new(AppState { db }), &RouterOptions::default());
        (dir, router)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (_dir, app) = app();
        let response = send(&app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn timer_lifecycle() {
        let (_dir, app) = app();

        let response = send(&app, "GET", "/api/timer/alice", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, Value::Null);

        let start = json!({"startTime": "2024-03-01T20:00:00Z", "notes": "evening"});
        let response = send(&app, "POST", "/api/timer/alice", Some(start)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let timer = json_body(response).await;
        assert_eq!(timer["ownerId"], "alice");
        assert_eq!(timer["isPaused"], false);

        let pause = json!({"isPaused": true, "pausedAt": "2024-03-01T22:00:00Z"});
        let response = send(&app, "PATCH", "/api/timer/alice", Some(pause)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let timer = json_body(response).await;
        assert_eq!(timer["isPaused"], true);
        assert_eq!(timer["pausedAt"], "2024-03-01T22:00:00Z");

        let resume = json!({"isPaused": false, "startTime": "2024-03-01T20:30:00Z"});
        let response = send(&app, "PATCH", "/api/timer/alice", Some(resume)).await;
        let timer = json_body(response).await;
        assert_eq!(timer["isPaused"], false);
        assert_eq!(timer["pausedAt"], Value::Null);
        assert_eq!(timer["startTime"], "2024-03-01T20:30:00Z");

        let response = send(&app, "DELETE", "/api/timer/alice", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", "/api/timer/alice", None).await;
        assert_eq!(json_body(response).await, Value::Null);
    }

    #[tokio::test]
    async fn second_start_conflicts() {
        let (_dir, app) = app();
        let start = json!({"startTime": "2024-03-01T20:00:00Z"});
        send(&app, "POST", "/api/timer/alice", Some(start.clone())).await;

        let response = send(&app, "POST", "/api/timer/alice", Some(start)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["code"], 409);
    }

    #[tokio::test]
    async fn missing_timer_is_not_found() {
        let (_dir, app) = app();
        let response = send(&app, "DELETE", "/api/timer/ghost", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let patch = json!({"notes": "hello"});
        let response = send(&app, "PATCH", "/api/timer/ghost", Some(patch)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let (_dir, app) = app();
        send(
            &app,
            "POST",
            "/api/timer/alice",
            Some(json!({"startTime": "2024-03-01T20:00:00Z"})),
        )
        .await;
        let response = send(&app, "PATCH", "/api/timer/alice", Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn fast_history_and_stats() {
        let (_dir, app) = app();

        let fast = json!({
            "startTime": "2024-03-01T20:00:00Z",
            "endTime": "2024-03-02T12:00:00Z",
            "notes": "16:8"
        });
        let response = send(&app, "POST", "/api/fasts/alice", Some(fast)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["durationSeconds"], 16 * 3600);
        let id = created["id"].as_str().unwrap().to_string();

        let response = send(&app, "GET", "/api/fasts/alice", None).await;
        let list = json_body(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["notes"], "16:8");

        let response = send(&app, "GET", "/api/fasts/alice/stats", None).await;
        let stats = json_body(response).await;
        assert_eq!(stats["count"], 1);
        assert_eq!(stats["longestHours"], 16.0);

        let uri = format!("/api/fasts/alice/{id}");
        let response = send(&app, "DELETE", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, "DELETE", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn inverted_fast_is_rejected() {
        let (_dir, app) = app();
        let fast = json!({
            "startTime": "2024-03-02T12:00:00Z",
            "endTime": "2024-03-02T12:00:00Z"
        });
        let response = send(&app, "POST", "/api/fasts/alice", Some(fast)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "GET", "/api/fasts/alice", None).await;
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn empty_history_stats_are_zero() {
        let (_dir, app) = app();
        let response = send(&app, "GET", "/api/fasts/nobody/stats", None).await;
        let stats = json_body(response).await;
        assert_eq!(stats["count"], 0);
        assert_eq!(stats["totalHours"], 0.0);
        assert_eq!(stats["currentStreakDays"], 0);
    }
}
