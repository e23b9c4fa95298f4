//! End-to-end coverage of the runner job protocol: request, accept,
//! update, abort, error and success, including the token checks every
//! owned-job endpoint performs.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::*;

#[sqlx::test(migrations = "../db/migrations")]
async fn full_job_lifecycle_ends_in_success(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "lifecycle video").await;
    let job_uuid = enqueue_job(
        &app,
        "vod-web-video-transcoding",
        &video_uuid,
        json!({ "input": { "videoFileUrl": "https://example.com/source" } }),
    )
    .await;
    let runner_token = register_runner(&app, "lifecycle-runner").await;

    // The pending job shows up in the advisory listing.
    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/jobs/request",
        None,
        json!({ "runnerToken": runner_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed["availableJobs"][0]["uuid"], json!(job_uuid));
    assert_eq!(
        listed["availableJobs"][0]["type"],
        json!("vod-web-video-transcoding")
    );

    let job_token = accept_job(&app, &job_uuid, &runner_token).await;
    assert!(job_token.starts_with("mgjt-"));

    // Progress report.
    let response = post_multipart(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/update"),
        &[
            ("runnerToken", &runner_token),
            ("jobToken", &job_token),
            ("progress", "42"),
        ],
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Success with the produced file.
    let response = post_multipart(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/success"),
        &[("runnerToken", &runner_token), ("jobToken", &job_token)],
        &[("payload[videoFile]", "out.mp4", b"encoded bytes")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The result file landed intact under results/{jobUUID}/.
    let result = app
        .storage
        .path()
        .join("results")
        .join(&job_uuid)
        .join("videoFile");
    assert_eq!(tokio::fs::read(&result).await.unwrap(), b"encoded bytes");

    // A second success on the same lease is a state conflict, not a
    // repeatable no-op.
    let response = post_multipart(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/success"),
        &[("runnerToken", &runner_token), ("jobToken", &job_token)],
        &[("payload[videoFile]", "out.mp4", b"encoded bytes")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // And the admin view agrees: completed, progress 100.
    let admin = admin_token(&app);
    let response = get(app.router.clone(), "/api/v1/runners/jobs", Some(&admin)).await;
    let jobs = body_json(response).await;
    assert_eq!(jobs["data"][0]["state"]["id"], json!(3));
    assert_eq!(jobs["data"][0]["progress"], json!(100));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn request_filters_by_job_type(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "typed video").await;
    enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let hls_uuid = enqueue_job(&app, "vod-hls-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "typed-runner").await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/jobs/request",
        None,
        json!({
            "runnerToken": runner_token,
            "jobTypes": ["vod-hls-transcoding"],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed["availableJobs"].as_array().unwrap().len(), 1);
    assert_eq!(listed["availableJobs"][0]["uuid"], json!(hls_uuid));

    // Unknown declared type is rejected up front.
    let response = post_json(
        app.router.clone(),
        "/api/v1/runners/jobs/request",
        None,
        json!({
            "runnerToken": runner_token,
            "jobTypes": ["quantum-transcoding"],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn accept_requires_a_pending_job(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "contended video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;

    let first = register_runner(&app, "first-runner").await;
    let second = register_runner(&app, "second-runner").await;

    accept_job(&app, &job_uuid, &first).await;

    // The job is already leased; the second accept loses.
    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/accept"),
        None,
        json!({ "runnerToken": second }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], json!("INVALID_STATE"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn owned_job_token_checks(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "guarded video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "guarded-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    let abort = |job: String, runner: String, lease: String| {
        let router = app.router.clone();
        async move {
            post_json(
                router,
                &format!("/api/v1/runners/jobs/{job}/abort"),
                None,
                json!({ "runnerToken": runner, "jobToken": lease, "reason": "test" }),
            )
            .await
        }
    };

    // Malformed job uuid: rejected before any lookup.
    let response = abort(
        "not-a-uuid".to_string(),
        runner_token.clone(),
        job_token.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Well-formed but unknown job uuid.
    let response = abort(
        uuid::Uuid::new_v4().to_string(),
        runner_token.clone(),
        job_token.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Plausible but unknown runner token.
    let response = abort(
        job_uuid.clone(),
        format!("mgrt-{}", "a".repeat(32)),
        job_token.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Right runner, wrong lease token: looks like a foreign job.
    let response = abort(
        job_uuid.clone(),
        runner_token.clone(),
        format!("mgjt-{}", "b".repeat(32)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Malformed tokens fail the format check with 400.
    let response = abort(job_uuid.clone(), "x".repeat(4000), job_token.clone()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The real triple still works.
    let response = abort(job_uuid.clone(), runner_token, job_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn abort_returns_the_job_to_the_pool(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "retried video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let first = register_runner(&app, "giving-up-runner").await;
    let second = register_runner(&app, "retry-runner").await;

    let job_token = accept_job(&app, &job_uuid, &first).await;

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/abort"),
        None,
        json!({ "runnerToken": first, "jobToken": job_token, "reason": "out of disk" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The abort released ownership entirely; the old triple now looks
    // like someone else's job.
    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/abort"),
        None,
        json!({ "runnerToken": first, "jobToken": job_token, "reason": "again" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Another runner can pick the job up with a fresh lease.
    let second_token = accept_job(&app, &job_uuid, &second).await;
    assert_ne!(second_token, job_token);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn abort_reason_is_validated(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "reasoned video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "reasoned-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    for reason in [String::new(), "r".repeat(5001)] {
        let response = post_json(
            app.router.clone(),
            &format!("/api/v1/runners/jobs/{job_uuid}/abort"),
            None,
            json!({ "runnerToken": runner_token, "jobToken": job_token, "reason": reason }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn errored_jobs_are_terminal(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "doomed video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "doomed-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    // An oversized message is rejected first.
    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/error"),
        None,
        json!({ "runnerToken": runner_token, "jobToken": job_token, "message": "m".repeat(5001) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/error"),
        None,
        json!({ "runnerToken": runner_token, "jobToken": job_token, "message": "ffmpeg exited 1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Terminal: no runner can accept it again.
    let other = register_runner(&app, "scavenger-runner").await;
    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/accept"),
        None,
        json!({ "runnerToken": other }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let admin = admin_token(&app);
    let response = get(app.router.clone(), "/api/v1/runners/jobs", Some(&admin)).await;
    let jobs = body_json(response).await;
    assert_eq!(jobs["data"][0]["state"]["id"], json!(4));
    assert_eq!(jobs["data"][0]["error"], json!("ffmpeg exited 1"));
    assert_eq!(jobs["data"][0]["failures"], json!(1));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_validates_progress(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "progressing video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "progressing-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    for progress in ["101", "-1", "not-a-number"] {
        let response = post_multipart(
            app.router.clone(),
            &format!("/api/v1/runners/jobs/{job_uuid}/update"),
            &[
                ("runnerToken", &runner_token),
                ("jobToken", &job_token),
                ("progress", progress),
            ],
            &[],
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "progress {progress}");
    }

    // An update without a progress field is still a valid heartbeat.
    let response = post_multipart(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/update"),
        &[("runnerToken", &runner_token), ("jobToken", &job_token)],
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn success_payload_must_match_the_job_type(pool: PgPool) {
    let app = build_test_app(pool);
    let video_uuid = create_video(&app, "strict video").await;
    let job_uuid = enqueue_job(&app, "vod-web-video-transcoding", &video_uuid, json!({})).await;
    let runner_token = register_runner(&app, "strict-runner").await;
    let job_token = accept_job(&app, &job_uuid, &runner_token).await;

    // Missing videoFile: payload does not match the type schema.
    let response = post_multipart(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/success"),
        &[("runnerToken", &runner_token), ("jobToken", &job_token)],
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The failed attempt did not consume the lease.
    let response = post_multipart(
        app.router.clone(),
        &format!("/api/v1/runners/jobs/{job_uuid}/success"),
        &[("runnerToken", &runner_token), ("jobToken", &job_token)],
        &[("payload[videoFile]", "out.mp4", b"bytes")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
