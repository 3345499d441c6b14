mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

const RELOAD_URI: &str = "/api/admin/reload";

#[tokio::test]
async fn test_reload_requires_credentials() {
    let (app, _) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(common::admin_post(RELOAD_URI, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("www-authenticate").is_some());

    let (status, _) = common::send(&app, common::admin_post(RELOAD_URI, Some("admin:wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reload_replaces_question_set() {
    let (app, state) = common::create_test_app();
    let path = state.config.questions_path.clone();

    std::fs::write(
        &path,
        json!([
            { "id": "fresh", "question": "New?", "options": ["yes", "no"], "answer": 0 },
            { "id": "broken", "question": "No options" }
        ])
        .to_string(),
    )
    .unwrap();

    let (status, report) = common::send(
        &app,
        common::admin_post(RELOAD_URI, Some(common::ADMIN_AUTH)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["loaded"], 1);
    assert_eq!(report["skipped"][0]["index"], 1);
    assert_eq!(report["skipped"][0]["id"], "broken");
    assert_eq!(report["skipped"][0]["problem"]["kind"], "too_few_options");

    let (_, status_json) = common::send(&app, common::get("/api/status")).await;
    assert_eq!(status_json["questions_loaded"], 1);

    let (status, _) = common::send(
        &app,
        common::post_json("/api/grade", &json!({ "id": "q0", "selected": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, grade) = common::send(
        &app,
        common::post_json("/api/grade", &json!({ "id": "fresh", "selected": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grade["correct"], true);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_set() {
    let (app, state) = common::create_test_app();
    let path = state.config.questions_path.clone();

    std::fs::write(&path, "not json {").unwrap();
    let (status, json) = common::send(
        &app,
        common::admin_post(RELOAD_URI, Some(common::ADMIN_AUTH)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("failed to parse"));

    std::fs::write(&path, r#"{"questions": []}"#).unwrap();
    let (status, _) = common::send(
        &app,
        common::admin_post(RELOAD_URI, Some(common::ADMIN_AUTH)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    std::fs::remove_file(&path).unwrap();
    let (status, json) = common::send(
        &app,
        common::admin_post(RELOAD_URI, Some(common::ADMIN_AUTH)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));

    assert_eq!(state.questions.count(), 5);
    let (status, grade) = common::send(
        &app,
        common::post_json("/api/grade", &json!({ "id": "q1", "selected": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grade["correct"], true);
}

#[tokio::test]
async fn test_reload_recovers_after_startup_failure() {
    let path = common::missing_path();
    let (app, _) = common::create_test_app_from(path.clone());

    let (status, _) = common::send(&app, common::get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    std::fs::write(&path, common::question_fixture().to_string()).unwrap();
    let (status, report) = common::send(
        &app,
        common::admin_post(RELOAD_URI, Some(common::ADMIN_AUTH)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["loaded"], 5);

    let (status, _) = common::send(&app, common::get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_requires_auth() {
    let (app, _) = common::create_test_app();

    let (status, _) = common::send(&app, common::get("/metrics")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // generate some traffic first
    common::send(&app, common::get("/api/sample?n=2")).await;
    common::send(
        &app,
        common::post_json("/api/grade", &json!({ "id": "q0", "selected": 0 })),
    )
    .await;

    let request = common::authorized_get("/metrics", common::ADMIN_AUTH);
    let (status, body) = common::send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("metrics are plain text");
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("path=\"/api/sample\""));
    assert!(text.contains("questions_sampled_total"));
    assert!(text.contains("answers_graded_total"));
}
