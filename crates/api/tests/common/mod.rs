#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use mediagrid_api::auth::jwt::{generate_access_token, JwtConfig};
use mediagrid_api::config::ServerConfig;
use mediagrid_api::router::build_app_router;
use mediagrid_api::state::AppState;
use mediagrid_core::roles::{ROLE_ADMIN, ROLE_USER};

/// Test application: the router plus the temp storage directory backing
/// it (dropped with the struct, removing all files written by the test).
pub struct TestApp {
    pub router: Router,
    pub config: Arc<ServerConfig>,
    pub storage: tempfile::TempDir,
}

/// Build a test `ServerConfig` rooted at a temp storage directory.
pub fn test_config(storage_dir: std::path::PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![],
        request_timeout_secs: 30,
        storage_dir,
        max_body_size: 64 * 1024 * 1024,
        stalled_job_ttl_secs: 0,
        stalled_jobs_interval_secs: 60,
        runner_delete_aborts_jobs: false,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool. Mirrors the construction in `main.rs` so
/// integration tests exercise the production middleware stack.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let storage = tempfile::tempdir().expect("temp storage dir");
    let config = Arc::new(test_config(storage.path().to_path_buf()));

    let state = AppState {
        pool,
        config: Arc::clone(&config),
        event_bus: Arc::new(mediagrid_events::EventBus::default()),
    };

    TestApp {
        router: build_app_router(state, &config),
        config,
        storage,
    }
}

/// Mint an admin JWT for the test config.
pub fn admin_token(app: &TestApp) -> String {
    generate_access_token(1, ROLE_ADMIN, &app.config.jwt).expect("admin token")
}

/// Mint a non-admin JWT for the test config.
pub fn user_token(app: &TestApp) -> String {
    generate_access_token(2, ROLE_USER, &app.config.jwt).expect("user token")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(router: Router, path: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(
    router: Router,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    router
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn delete(router: Router, path: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("DELETE").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// POST a multipart form: `fields` are text parts, `files` are
/// `(field, filename, bytes)` file parts.
pub async fn post_multipart(
    router: Router,
    path: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Response<Body> {
    const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    router.oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Create a video through the admin API and return its uuid string.
pub async fn create_video(app: &TestApp, name: &str) -> String {
    let token = admin_token(app);
    let response = post_json(
        app.router.clone(),
        "/api/v1/videos",
        Some(&token),
        serde_json::json!({ "name": name }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["uuid"].as_str().unwrap().to_string()
}

/// Enqueue a job through the admin API and return its uuid string.
pub async fn enqueue_job(app: &TestApp, job_type: &str, video_uuid: &str, payload: Value) -> String {
    let token = admin_token(app);
    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/jobs",
        Some(&token),
        serde_json::json!({
            "type": job_type,
            "videoUuid": video_uuid,
            "payload": payload,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["uuid"].as_str().unwrap().to_string()
}

/// Register a runner and return its session token.
pub async fn register_runner(app: &TestApp, name: &str) -> String {
    let token = admin_token(app);
    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/registration-tokens",
        Some(&token),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let registration_token = body_json(response).await["data"]["registrationToken"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/register",
        None,
        serde_json::json!({
            "name": name,
            "registrationToken": registration_token,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["runnerToken"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Accept a pending job as `runner_token`, returning the job token.
pub async fn accept_job(app: &TestApp, job_uuid: &str, runner_token: &str) -> String {
    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/accept"),
        None,
        serde_json::json!({ "runnerToken": runner_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["jobToken"]
        .as_str()
        .unwrap()
        .to_string()
}
