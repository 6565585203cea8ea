use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use lineup_core::{FaceLocator, LabelRegistry, LinearClassifier, Pipeline};

mod config;
mod error;
mod handlers;
mod routes;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("lineupd starting");

    let config = Config::from_env();
    let pipeline = build_pipeline(&config)?;
    tracing::info!(labels = pipeline.labels().len(), "pipeline ready");

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    tracing::info!(addr = %config.listen, "lineupd listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Load all artifacts and assemble the pipeline. Any failure here is
/// fatal: the daemon must not serve requests with detectors or model
/// state missing.
fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let locator = FaceLocator::from_cascade_dir(&config.cascade_dir)
        .with_context(|| format!("loading cascades from {}", config.cascade_dir.display()))?;

    let labels = LabelRegistry::load(&config.labels_path)
        .with_context(|| format!("loading labels from {}", config.labels_path.display()))?;

    let classifier = LinearClassifier::load(&config.model_path)
        .with_context(|| format!("loading classifier from {}", config.model_path.display()))?;

    Pipeline::new(locator, Box::new(classifier), labels).context("assembling pipeline")
}
