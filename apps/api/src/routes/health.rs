use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus what the loaded model and extractor look like.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "persona-api",
        "model": {
            "labels": state.model.labels(),
            "training_accuracy": state.model.training_accuracy(),
            "iterations": state.model.summary().iterations,
            "converged": state.model.summary().converged,
            "objective": state.model.summary().objective,
        },
        "entity_backend": state.extractor.backend(),
    }))
}
