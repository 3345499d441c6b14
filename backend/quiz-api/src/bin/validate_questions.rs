use std::{path::PathBuf, process::ExitCode};

use quiz_api::{config::Config, services::question_repository::FileCheck, QuestionRepository};

/// Checks a question file with the same rules the server applies and prints
/// the load report. Usage: `validate-questions [path]` (defaults to the
/// configured `questions_path`).
///
/// Exits 0 when every record loads, 2 when some were skipped, 1 on failure.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => match Config::load() {
            Ok(config) => config.questions_path,
            Err(e) => {
                tracing::error!("Failed to load configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let result = QuestionRepository::new().load(&path);
    let verdict = FileCheck::from_load(&result);

    match result {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!("Failed to render report: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Err(e) => tracing::error!("{} ({})", e, e.kind()),
    }

    ExitCode::from(verdict.exit_code())
}
