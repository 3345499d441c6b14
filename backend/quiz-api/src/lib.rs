use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use services::{question_repository::QuestionRepository, AppState};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    let static_dir = app_state.config.static_dir.clone();

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::admin_auth_middleware,
            )),
        )
        .nest("/api", api_routes(app_state.clone()).layer(cors))
        .with_state(app_state);

    // Pre-built front-end, if one is deployed next to the service
    let router = match static_dir {
        Some(dir) => {
            tracing::info!("Serving static files from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    };

    router
        .layer(middleware::from_fn(
            middlewares::security::security_headers_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(middlewares::trace::make_request_span))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
}

fn api_routes(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/reload", post(handlers::admin::reload_questions))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            handlers::admin_auth_middleware,
        ));

    Router::new()
        .route("/status", get(handlers::quiz::status))
        .route("/sample", get(handlers::quiz::sample))
        .route("/grade", post(handlers::quiz::grade))
        .nest("/admin", admin)
}
