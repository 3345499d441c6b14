#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use quiz_api::{config::Config, create_router, services::AppState};
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_AUTH: &str = "admin:test-secret";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Writes a question fixture to a unique temp file.
pub fn write_questions(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("quiz-api-test-{}.json", Uuid::new_v4()));
    std::fs::write(&path, contents).expect("Failed to write question fixture");
    path
}

/// Creates a unique temp directory holding the given `(file name, contents)`
/// pairs.
pub fn static_site(files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quiz-api-static-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create static dir");
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).expect("Failed to write static file");
    }
    dir
}

pub fn missing_path() -> PathBuf {
    std::env::temp_dir().join(format!("quiz-api-missing-{}.json", Uuid::new_v4()))
}

/// Five valid questions `q0..q4`; `qN` has answer `N % 3` and only `q0`
/// carries an explanation.
pub fn question_fixture() -> Value {
    let records: Vec<Value> = (0..5)
        .map(|i| {
            let mut record = json!({
                "id": format!("q{}", i),
                "question": format!("Question number {}?", i),
                "options": ["alpha", "beta", "gamma"],
                "answer": i % 3
            });
            if i == 0 {
                record["explanation"] = json!("Alpha is always first.");
            }
            record
        })
        .collect();
    json!({ "questions": records })
}

pub fn test_config(questions_path: PathBuf) -> Config {
    Config {
        questions_path,
        admin_auth: ADMIN_AUTH.to_string(),
        ..Config::default()
    }
}

pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    init_tracing();
    let app_state = Arc::new(AppState::new(config));
    (create_router(app_state.clone()), app_state)
}

pub fn create_test_app_from(questions_path: PathBuf) -> (Router, Arc<AppState>) {
    create_test_app_with(test_config(questions_path))
}

pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_from(write_questions(&question_fixture().to_string()))
}

pub fn basic_auth(credentials: &str) -> String {
    format!("Basic {}", general_purpose::STANDARD.encode(credentials))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn authorized_get(uri: &str, credentials: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", basic_auth(credentials))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub fn admin_post(uri: &str, credentials: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(credentials) = credentials {
        builder = builder.header("authorization", basic_auth(credentials));
    }
    builder.body(Body::empty()).unwrap()
}

/// Sends one request and decodes the body: JSON when possible, otherwise the
/// raw text, `Value::Null` when empty.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, json)
}
