use crate::config::Config;
use question_repository::QuestionRepository;

pub mod question_repository;

pub struct AppState {
    pub config: Config,
    pub questions: QuestionRepository,
}

impl AppState {
    /// Builds the state and performs the initial load from
    /// `config.questions_path`.
    ///
    /// A failed initial load is logged and the service starts with an empty
    /// set; `/health` reports degraded until a reload succeeds.
    pub fn new(config: Config) -> Self {
        let questions = QuestionRepository::with_source(config.questions_path.clone());

        tracing::info!("Loading questions from {}", config.questions_path.display());

        match questions.load(&config.questions_path) {
            Ok(report) => tracing::info!("Question set ready: {} questions", report.loaded),
            Err(e) => tracing::error!("Starting without questions: {}", e),
        }

        Self::with_repository(config, questions)
    }

    pub fn with_repository(config: Config, questions: QuestionRepository) -> Self {
        Self { config, questions }
    }
}
