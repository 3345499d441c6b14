use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::{question_repository::QuestionSet, AppState};

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut dependencies = serde_json::Map::new();

    let questions = check_question_set(&state.questions.snapshot());
    let healthy = questions.get("status").and_then(|v| v.as_str()) == Some("healthy");
    dependencies.insert("question_set".to_string(), json!(questions));

    let (status_code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "quiz-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

fn check_question_set(set: &QuestionSet) -> serde_json::Map<String, serde_json::Value> {
    let mut result = serde_json::Map::new();

    if set.is_empty() {
        result.insert("status".to_string(), json!("unhealthy"));
        result.insert("error".to_string(), json!("No questions loaded"));
    } else {
        result.insert("status".to_string(), json!("healthy"));
        result.insert("questions".to_string(), json!(set.len()));
    }

    result
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Protects operator endpoints (/metrics, /api/admin) with HTTP Basic Auth
pub async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if basic_credentials(&headers).as_deref() == Some(state.config.admin_auth.as_str()) {
        return next.run(request).await;
    }

    tracing::warn!(
        "Rejected unauthenticated request to {}",
        request.uri().path()
    );
    let mut response = StatusCode::UNAUTHORIZED.into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"quiz-api\""),
    );
    response
}

/// Decodes `Authorization: Basic ...` into its `user:password` form.
fn basic_credentials(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;
    let encoded = auth_header.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(decoded).ok()
}

pub mod admin;
pub mod quiz;
