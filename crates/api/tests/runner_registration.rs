//! Integration tests for runner registration and unregistration.

mod common;

use axum::http::StatusCode;
use common::{admin_token, body_json, build_test_app, get, post_json, register_runner};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn register_returns_runner_token(pool: PgPool) {
    let app = build_test_app(pool);

    let runner_token = register_runner(&app, "gpu-box").await;
    assert!(runner_token.starts_with("mgrt-"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_validates_name_and_description(pool: PgPool) {
    let app = build_test_app(pool);

    // Registration token validity is checked after payload shape, so any
    // well-formed token works for the 400 cases.
    let cases: Vec<(String, Option<String>)> = vec![
        (String::new(), None),
        ("a".repeat(101), None),
        ("ok-runner".to_string(), Some("b".repeat(1001))),
    ];
    for (name, description) in cases {
        let response = post_json(
            app.router.clone(),
            "/api/v1/runners/register",
            None,
            json!({
                "name": name,
                "description": description,
                "registrationToken": "mgreg-abcdef",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "name={name:?}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_distinguishes_malformed_from_unknown_token(pool: PgPool) {
    let app = build_test_app(pool);

    // Oversized token: rejected before any lookup.
    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/register",
        None,
        json!({ "name": "runner", "registrationToken": "a".repeat(4000) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Well-formed but unknown token.
    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/register",
        None,
        json!({ "name": "runner", "registrationToken": "mgreg-unknown" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_duplicate_name(pool: PgPool) {
    let app = build_test_app(pool);

    register_runner(&app, "gpu-box").await;

    let token = admin_token(&app);
    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/registration-tokens",
        Some(&token),
        json!({}),
    )
    .await;
    let registration_token = body_json(response).await["data"]["registrationToken"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/register",
        None,
        json!({ "name": "gpu-box", "registrationToken": registration_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unregister_deletes_the_runner(pool: PgPool) {
    let app = build_test_app(pool);

    let runner_token = register_runner(&app, "gpu-box").await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/unregister",
        None,
        json!({ "runnerToken": runner_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The session is gone.
    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/unregister",
        None,
        json!({ "runnerToken": runner_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unregister_rejects_malformed_token(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/unregister",
        None,
        json!({ "runnerToken": "a".repeat(4000) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_lists_registered_runners(pool: PgPool) {
    let app = build_test_app(pool);

    register_runner(&app, "runner-a").await;
    register_runner(&app, "runner-b").await;

    let token = admin_token(&app);
    let response = get(app.router.clone(), "/api/v1/runners", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"runner-a") && names.contains(&"runner-b"));

    // The session token never leaks through the admin surface.
    assert!(json["data"][0].get("runnerToken").is_none());
}
