use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const MIN_OPTIONS: usize = 2;

/// A single multiple-choice item. Fields are private so a question cannot be
/// changed once it has been built from its source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: String,
    prompt: String,
    options: Vec<String>,
    correct_index: Option<i64>,
    explanation: Option<String>,
}

/// Answer-redacted projection of a [`Question`] that is safe to send to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordProblem {
    #[error("entry is not a JSON object")]
    NotAnObject,
    #[error("missing id")]
    MissingId,
    #[error("missing question text")]
    MissingPrompt,
    #[error("expected at least 2 options, found {found}")]
    TooFewOptions { found: usize },
    #[error("missing answer index")]
    MissingAnswer,
    #[error("answer index {answer} is outside 0..{options}")]
    AnswerOutOfRange { answer: i64, options: usize },
    #[error("duplicate id, first defined by entry {first_index}")]
    DuplicateId { first_index: usize },
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            options,
            correct_index,
            explanation: None,
        }
    }

    /// Builds a question from a loosely typed JSON record.
    ///
    /// Missing or wrongly typed fields fall back to empty/absent values instead
    /// of failing, so one bad record never aborts a whole load. Use
    /// [`Question::validate`] to decide whether the result is servable.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let id = match record.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) if id.is_i64() || id.is_u64() => id.to_string(),
            _ => String::new(),
        };

        let prompt = record
            .get("question")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // a single non-string entry makes the whole list unusable
        let options = record
            .get("options")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .unwrap_or_default();

        let correct_index = record.get("answer").and_then(Value::as_i64);

        let explanation = record
            .get("explanation")
            .and_then(Value::as_str)
            .and_then(|text| non_blank(text.to_string()));

        Self {
            id,
            prompt,
            options,
            correct_index,
            explanation,
        }
    }

    pub fn validate(&self) -> Result<(), RecordProblem> {
        if self.id.is_empty() {
            return Err(RecordProblem::MissingId);
        }
        if self.prompt.trim().is_empty() {
            return Err(RecordProblem::MissingPrompt);
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(RecordProblem::TooFewOptions {
                found: self.options.len(),
            });
        }
        match self.correct_index {
            None => Err(RecordProblem::MissingAnswer),
            Some(answer) if !self.in_range(answer) => Err(RecordProblem::AnswerOutOfRange {
                answer,
                options: self.options.len(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Grades a submitted option index. Indexes outside the option list are
    /// never correct.
    pub fn is_correct(&self, selected: i64) -> bool {
        self.in_range(selected) && self.correct_index == Some(selected)
    }

    pub fn to_public_view(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id.clone(),
            prompt: self.prompt.clone(),
            options: self.options.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_index(&self) -> Option<i64> {
        self.correct_index
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    fn in_range(&self, index: i64) -> bool {
        usize::try_from(index).is_ok_and(|index| index < self.options.len())
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
