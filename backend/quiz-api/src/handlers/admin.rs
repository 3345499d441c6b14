use std::sync::Arc;

use axum::{extract::State, Json};

use crate::services::{question_repository::LoadReport, AppState};

use super::quiz::QuizApiError;

/// Re-reads the configured question file. The current set keeps serving if the
/// new file cannot be loaded.
pub async fn reload_questions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LoadReport>, QuizApiError> {
    tracing::info!("Question reload requested");

    let worker_state = state.clone();
    let report = tokio::task::spawn_blocking(move || worker_state.questions.reload())
        .await
        .map_err(|err| QuizApiError::internal(format!("Reload task failed: {}", err)))??;

    Ok(Json(report))
}
