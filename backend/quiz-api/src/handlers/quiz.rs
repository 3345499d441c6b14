use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::{
    extractors::{AppJson, INVALID_PAYLOAD},
    models::{ErrorBody, GradeRequest, GradeResponse, PublicQuestion, SampleQuery, StatusResponse},
    services::{
        question_repository::{LoadError, QuestionNotFound},
        AppState,
    },
};

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.questions.snapshot();

    Json(StatusResponse {
        questions_loaded: snapshot.len(),
        has_questions: !snapshot.is_empty(),
        source: snapshot.source().map(|path| path.display().to_string()),
        loaded_at: snapshot.loaded_at(),
    })
}

pub async fn sample(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SampleQuery>,
) -> Result<Json<Vec<PublicQuestion>>, QuizApiError> {
    if state.questions.count() == 0 {
        return Err(QuizApiError::unavailable("no questions loaded"));
    }

    let requested = query
        .n
        .as_deref()
        .and_then(|n| n.trim().parse::<i64>().ok());
    let n = state.config.clamp_sample_size(requested);

    let questions = state.questions.sample_public(n);
    tracing::debug!(
        "Sampled {} questions (requested {:?})",
        questions.len(),
        query.n
    );

    Ok(Json(questions))
}

pub async fn grade(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<GradeRequest>,
) -> Result<Json<GradeResponse>, QuizApiError> {
    let id = payload
        .id
        .as_ref()
        .and_then(question_id)
        .ok_or_else(|| QuizApiError::bad_request(INVALID_PAYLOAD))?;
    let selected = payload
        .selected
        .as_ref()
        .and_then(selected_index)
        .ok_or_else(|| QuizApiError::bad_request(INVALID_PAYLOAD))?;

    let outcome = state.questions.grade_with_feedback(&id, selected)?;
    tracing::info!(
        "Graded question {}: selected={}, correct={}",
        id,
        selected,
        outcome.correct
    );

    Ok(Json(outcome))
}

/// Question ids arrive as JSON strings or integers.
fn question_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) if id.is_i64() || id.is_u64() => Some(id.to_string()),
        _ => None,
    }
}

/// Option indexes arrive as JSON integers or as strings holding one.
fn selected_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug)]
pub enum QuizApiError {
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    Unavailable(String),
    Internal(String),
}

impl QuizApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        QuizApiError::BadRequest(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        QuizApiError::Unavailable(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        QuizApiError::Internal(message.into())
    }
}

impl From<QuestionNotFound> for QuizApiError {
    fn from(err: QuestionNotFound) -> Self {
        tracing::debug!("{}", err);
        QuizApiError::NotFound("question not found".to_string())
    }
}

impl From<LoadError> for QuizApiError {
    fn from(err: LoadError) -> Self {
        let message = err.to_string();
        match err {
            LoadError::NotFound { .. } => QuizApiError::NotFound(message),
            LoadError::Parse { .. } | LoadError::Empty { .. } => {
                QuizApiError::Unprocessable(message)
            }
            LoadError::Io { .. } | LoadError::NoSource => QuizApiError::Internal(message),
        }
    }
}

impl IntoResponse for QuizApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            QuizApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            QuizApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            QuizApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            QuizApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            QuizApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}
