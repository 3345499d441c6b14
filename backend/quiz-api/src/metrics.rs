use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Question set
    pub static ref QUESTION_LOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "question_loads_total",
        "Question file loads by outcome",
        &["status"]
    )
    .unwrap();

    pub static ref QUESTIONS_LOADED: IntGauge = register_int_gauge!(
        "questions_loaded",
        "Number of questions currently served"
    )
    .unwrap();

    pub static ref QUESTION_RECORDS_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        "question_records_skipped_total",
        "Question records rejected while loading"
    )
    .unwrap();

    // Quiz traffic
    pub static ref QUESTIONS_SAMPLED_TOTAL: IntCounter = register_int_counter!(
        "questions_sampled_total",
        "Total number of questions handed out in samples"
    )
    .unwrap();

    pub static ref ANSWERS_GRADED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_graded_total",
        "Total number of answers graded",
        &["correct"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Records a load attempt and the size of the set served afterwards.
pub fn record_question_load(status: &str, served: usize) {
    QUESTION_LOADS_TOTAL.with_label_values(&[status]).inc();
    QUESTIONS_LOADED.set(i64::try_from(served).unwrap_or(i64::MAX));
}
