use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod question;

pub use question::{PublicQuestion, Question, RecordProblem};

#[derive(Debug, Deserialize)]
pub struct SampleQuery {
    /// Kept as raw text: a non-numeric `n` falls back to the default size.
    pub n: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub id: Option<Value>,
    pub selected: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResponse {
    pub correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub questions_loaded: usize,
    pub has_questions: bool,
    pub source: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
