mod assessment;
mod classifier;
mod config;
mod errors;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::classifier::TrainedModel;
use crate::config::Config;
use crate::resume::{build_recognizer, ResumeExtractor};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Persona API v{}", env!("CARGO_PKG_VERSION"));

    // Train the classifier once; the server does not start without a model.
    let dataset_path = config.dataset_path.clone();
    let model = tokio::task::spawn_blocking(move || TrainedModel::from_path(&dataset_path))
        .await
        .context("training task failed")?
        .with_context(|| format!("failed to train model from {}", config.dataset_path))?;
    info!(
        "Model ready: {} classes, {} Newton iterations",
        model.labels().len(),
        model.summary().iterations
    );

    // Loading a spaCy pipeline can take seconds; keep it off the runtime threads.
    let ner_model = config.ner_model.clone();
    let recognizer = tokio::task::spawn_blocking(move || build_recognizer(&ner_model))
        .await
        .context("entity recognizer setup failed")?;
    let extractor = ResumeExtractor::new(recognizer);
    info!("Resume extractor initialized (entities: {})", extractor.backend());

    let state = AppState {
        model: Arc::new(model),
        extractor,
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr()))?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
