use std::sync::Arc;

use crate::classifier::TrainedModel;
use crate::config::Config;
use crate::resume::ResumeExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Trained once at startup; read-only afterwards.
    pub model: Arc<TrainedModel>,
    /// Holds the pluggable entity recognizer. Default: heuristic backend.
    pub extractor: ResumeExtractor,
    pub config: Config,
}
