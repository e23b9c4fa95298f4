//! File access gateway: scoped source/preview/studio downloads for
//! runners holding a processing lease.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::*;

fn access_body(runner_token: &str, job_token: &str) -> serde_json::Value {
    json!({ "runnerToken": runner_token, "jobToken": job_token })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn max_quality_streams_the_source_file(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "source video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "fetching-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    let video_dir = app.storage.path().join("videos").join(&video_uuid);
    tokio::fs::create_dir_all(&video_dir).await.unwrap();
    tokio::fs::write(video_dir.join("max-quality"), b"source bytes")
        .await
        .unwrap();

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/files/videos/{video_uuid}/max-quality"),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"source bytes");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_file_answers_not_found(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "fileless video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "fileless-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/files/videos/{video_uuid}/previews/max-quality"),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn video_scope_tiers(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "scoped video").await;
    let other_uuid = create_video(&app, "other video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "scoped-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    // Malformed videoUUID.
    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/files/videos/not-a-uuid/max-quality"),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Well-formed but unknown.
    let unknown = uuid::Uuid::new_v4();
    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/files/videos/{unknown}/max-quality"),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Known video, but not the one this job is scoped to.
    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/files/videos/{other_uuid}/max-quality"),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn studio_files_require_a_payload_reference(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "studio video").await;
    let job_uuid = enqueue_job(
        &app,
        "video-studio-transcoding",
        &video_uuid,
        json!({
            "tasks": [
                { "name": "add-intro", "options": { "file": "intro.mp4" } },
                { "name": "add-watermark", "options": { "file": "logo.png" } },
            ]
        }),
    )
    .await;
    let runner_token = register_runner(&app, "studio-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    let studio_dir = app
        .storage
        .path()
        .join("videos")
        .join(&video_uuid)
        .join("studio");
    tokio::fs::create_dir_all(&studio_dir).await.unwrap();
    tokio::fs::write(studio_dir.join("intro.mp4"), b"intro bytes")
        .await
        .unwrap();
    tokio::fs::write(studio_dir.join("secret.mp4"), b"secret bytes")
        .await
        .unwrap();

    // Referenced by a task: served.
    let response = post_json(
        app.router.clone(),
        &format!(
            "/api/v1/runners/jobs/{job_uuid}/files/videos/{video_uuid}/studio/task-files/intro.mp4"
        ),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"intro bytes");

    // Present on disk but not referenced by the payload: rejected.
    let response = post_json(
        app.router.clone(),
        &format!(
            "/api/v1/runners/jobs/{job_uuid}/files/videos/{video_uuid}/studio/task-files/secret.mp4"
        ),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn studio_route_rejects_non_studio_jobs(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "plain video").await;
    let job_uuid = enqueue_job(&app, "vod-hls-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "plain-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    let response = post_json(
        app.router.clone(),
        &format!(
            "/api/v1/runners/jobs/{job_uuid}/files/videos/{video_uuid}/studio/task-files/intro.mp4"
        ),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn file_routes_require_a_live_lease(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "released video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "released-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    // Finish the job; the lease token dies with the transition.
    let response = post_multipart(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/success"),
        &[("runnerToken", &runner_token), ("jobToken", &job_token)],
        &[("payload[videoFile]", "out.mp4", b"bytes")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/files/videos/{video_uuid}/max-quality"),
        None,
        access_body(&runner_token, &job_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
