pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::assessment::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Personality + resume in one submission
        .route("/api/v1/predict", post(handlers::handle_predict))
        .route("/api/v1/resume/parse", post(handlers::handle_parse_resume))
        .route("/api/v1/personality", post(handlers::handle_personality))
        .route("/api/v1/traits", get(handlers::handle_traits))
        .layer(body_limit)
        .with_state(state)
}
