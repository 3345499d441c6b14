use std::{
    collections::HashMap,
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::metrics::{
    record_question_load, ANSWERS_GRADED_TOTAL, QUESTIONS_SAMPLED_TOTAL,
    QUESTION_RECORDS_SKIPPED_TOTAL,
};
use crate::models::{GradeResponse, PublicQuestion, Question, RecordProblem};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("expected an array of questions or an object with a \"questions\" array")]
    UnexpectedRoot,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("question file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
    #[error("no valid questions in {} ({skipped} entries skipped)", path.display())]
    Empty { path: PathBuf, skipped: usize },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no question source configured")]
    NoSource,
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::NotFound { .. } => "not_found",
            LoadError::Parse { .. } => "parse_error",
            LoadError::Empty { .. } => "empty",
            LoadError::Io { .. } => "io_error",
            LoadError::NoSource => "no_source",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("question not found: {id}")]
pub struct QuestionNotFound {
    pub id: String,
}

/// A record that was left out of a load, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordIssue {
    pub index: usize,
    pub id: Option<String>,
    pub problem: RecordProblem,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "entry {} (id {:?}): {}", self.index, id, self.problem),
            None => write!(f, "entry {}: {}", self.index, self.problem),
        }
    }
}

#[derive(Debug, Default)]
pub struct ParsedQuestions {
    pub questions: Vec<Question>,
    pub skipped: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub source: PathBuf,
    pub loaded: usize,
    pub skipped: Vec<RecordIssue>,
    pub loaded_at: DateTime<Utc>,
}

/// Verdict of checking a question file outside the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCheck {
    /// Every record loaded.
    Clean,
    /// The file loads, but some records were skipped.
    Partial,
    Failed,
}

impl FileCheck {
    pub fn from_load(result: &Result<LoadReport, LoadError>) -> Self {
        match result {
            Ok(report) if report.skipped.is_empty() => FileCheck::Clean,
            Ok(_) => FileCheck::Partial,
            Err(_) => FileCheck::Failed,
        }
    }

    /// Process exit status for `validate-questions`.
    pub fn exit_code(self) -> u8 {
        match self {
            FileCheck::Clean => 0,
            FileCheck::Failed => 1,
            FileCheck::Partial => 2,
        }
    }
}

/// Immutable snapshot of everything served by one successful load.
#[derive(Debug, Default)]
pub struct QuestionSet {
    questions: Vec<Question>,
    by_id: HashMap<String, usize>,
    source: Option<PathBuf>,
    loaded_at: Option<DateTime<Utc>>,
}

impl QuestionSet {
    fn new(questions: Vec<Question>, source: PathBuf, loaded_at: DateTime<Utc>) -> Self {
        let by_id = questions
            .iter()
            .enumerate()
            .map(|(position, question)| (question.id().to_string(), position))
            .collect();

        Self {
            questions,
            by_id,
            source: Some(source),
            loaded_at: Some(loaded_at),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        let position = *self.by_id.get(id)?;
        self.questions.get(position)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

/// Splits a question document into servable questions and skipped records.
///
/// Accepts either a top-level array of records or an object holding that array
/// under `questions`. Each record is judged on its own; the first occurrence of
/// a duplicated id wins.
pub fn parse_question_document(contents: &str) -> Result<ParsedQuestions, DocumentError> {
    let document: Value = serde_json::from_str(contents)?;

    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut root) => match root.remove("questions") {
            Some(Value::Array(records)) => records,
            _ => return Err(DocumentError::UnexpectedRoot),
        },
        _ => return Err(DocumentError::UnexpectedRoot),
    };

    let mut parsed = ParsedQuestions::default();
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let Some(fields) = record.as_object() else {
            parsed.skipped.push(RecordIssue {
                index,
                id: None,
                problem: RecordProblem::NotAnObject,
            });
            continue;
        };

        let question = Question::from_record(fields);
        let id = (!question.id().is_empty()).then(|| question.id().to_string());

        if let Err(problem) = question.validate() {
            parsed.skipped.push(RecordIssue { index, id, problem });
            continue;
        }

        if let Some(&first_index) = first_seen.get(question.id()) {
            parsed.skipped.push(RecordIssue {
                index,
                id,
                problem: RecordProblem::DuplicateId { first_index },
            });
            continue;
        }

        first_seen.insert(question.id().to_string(), index);
        parsed.questions.push(question);
    }

    Ok(parsed)
}

/// Owns the question set currently being served.
///
/// The set is replaced wholesale: readers clone the current `Arc` snapshot and
/// never see a partially loaded set. A failed load leaves the previous set in
/// place.
pub struct QuestionRepository {
    current: RwLock<Arc<QuestionSet>>,
    source: RwLock<Option<PathBuf>>,
}

impl Default for QuestionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionRepository {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(QuestionSet::default())),
            source: RwLock::new(None),
        }
    }

    /// Empty repository that remembers where [`QuestionRepository::reload`]
    /// should read from.
    pub fn with_source(path: impl Into<PathBuf>) -> Self {
        let repository = Self::new();
        *repository
            .source
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(path.into());
        repository
    }

    pub fn snapshot(&self) -> Arc<QuestionSet> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn source(&self) -> Option<PathBuf> {
        self.source
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    /// Reads and validates `path`, then swaps it in as the served set.
    ///
    /// Blocks on file I/O; async callers should run it on the blocking pool.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadReport, LoadError> {
        let path = path.as_ref().to_path_buf();
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = Some(path.clone());

        let result = self.read_and_swap(path.clone());
        match &result {
            Ok(report) => {
                record_question_load("success", report.loaded);
                tracing::info!(
                    "Loaded {} questions from {} ({} skipped)",
                    report.loaded,
                    path.display(),
                    report.skipped.len()
                );
            }
            Err(err) => {
                record_question_load(err.kind(), self.count());
                tracing::error!(
                    "Question load failed, keeping {} previously loaded questions: {}",
                    self.count(),
                    err
                );
            }
        }
        result
    }

    /// Loads again from the last configured source.
    pub fn reload(&self) -> Result<LoadReport, LoadError> {
        let path = self.source().ok_or(LoadError::NoSource)?;
        self.load(path)
    }

    fn read_and_swap(&self, path: PathBuf) -> Result<LoadReport, LoadError> {
        let contents = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                LoadError::NotFound { path: path.clone() }
            } else {
                LoadError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let parsed = parse_question_document(&contents).map_err(|source| LoadError::Parse {
            path: path.clone(),
            source,
        })?;

        for issue in &parsed.skipped {
            tracing::warn!("Skipping question record in {}: {}", path.display(), issue);
        }
        QUESTION_RECORDS_SKIPPED_TOTAL.inc_by(parsed.skipped.len() as u64);

        if parsed.questions.is_empty() {
            return Err(LoadError::Empty {
                path,
                skipped: parsed.skipped.len(),
            });
        }

        let loaded_at = Utc::now();
        let set = QuestionSet::new(parsed.questions, path.clone(), loaded_at);
        let loaded = set.len();

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(set);

        Ok(LoadReport {
            source: path,
            loaded,
            skipped: parsed.skipped,
            loaded_at,
        })
    }

    /// Up to `n` distinct questions chosen uniformly at random.
    pub fn sample(&self, n: usize) -> Vec<Question> {
        self.sample_with_rng(&mut rand::rng(), n)
    }

    pub fn sample_with_rng<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Question> {
        let set = self.snapshot();
        let amount = n.min(set.len());
        if amount == 0 {
            return Vec::new();
        }

        let picked: Vec<Question> = rand::seq::index::sample(rng, set.len(), amount)
            .into_iter()
            .map(|position| set.questions[position].clone())
            .collect();

        QUESTIONS_SAMPLED_TOTAL.inc_by(picked.len() as u64);
        picked
    }

    pub fn sample_public(&self, n: usize) -> Vec<PublicQuestion> {
        self.sample(n)
            .iter()
            .map(Question::to_public_view)
            .collect()
    }

    pub fn grade(&self, id: &str, selected: i64) -> Result<bool, QuestionNotFound> {
        self.grade_with_feedback(id, selected)
            .map(|outcome| outcome.correct)
    }

    /// Grades like [`QuestionRepository::grade`] and also hands back the
    /// question's explanation, if it has one.
    pub fn grade_with_feedback(
        &self,
        id: &str,
        selected: i64,
    ) -> Result<GradeResponse, QuestionNotFound> {
        let set = self.snapshot();
        let Some(question) = set.get(id) else {
            return Err(QuestionNotFound { id: id.to_string() });
        };

        let correct = question.is_correct(selected);
        ANSWERS_GRADED_TOTAL
            .with_label_values(&[if correct { "true" } else { "false" }])
            .inc();

        Ok(GradeResponse {
            correct,
            explanation: question.explanation().map(str::to_string),
        })
    }
}
