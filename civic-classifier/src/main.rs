//! civic-classifier - Civic issue classification microservice
//!
//! Classifies citizen-submitted issue reports into one of the fixed
//! categories (Drainage, Road_Damage, Street_Light, Trash):
//! - `POST /classify-image`: local image model
//! - `POST /classify-text`: hosted zero-shot text classifier
//!
//! Default port: 5000

use anyhow::{Context, Result};
use clap::Parser;
use civic_classifier::services::{ImageClassifier, ImageScorer, ModelHub, TextClassifierClient};
use civic_classifier::{build_router, shutdown_signal, AppState};
use civic_common::config::{CliOverrides, ConfigResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Civic issue classification service
#[derive(Debug, Parser)]
#[command(name = "civic-classifier", version)]
struct Args {
    /// TOML config file (default: user config dir, then /etc/civic-classifier)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5000
    #[arg(long)]
    bind: Option<String>,

    /// Local image model file; skips the model hub download
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[cfg(feature = "onnx")]
fn load_scorer(model_path: &Path) -> Result<Arc<dyn ImageScorer>> {
    let scorer = civic_classifier::services::OnnxImageScorer::load(model_path)?;
    Ok(Arc::new(scorer))
}

#[cfg(not(feature = "onnx"))]
fn load_scorer(model_path: &Path) -> Result<Arc<dyn ImageScorer>> {
    anyhow::bail!(
        "cannot load {}: civic-classifier was built without the `onnx` feature",
        model_path.display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    // Environment from .env is visible to config resolution below
    dotenv::dotenv().ok();

    let args = Args::parse();
    let cli = CliOverrides {
        config_path: args.config,
        bind_address: args.bind,
        model_path: args.model_path,
        log_level: args.log_level,
    };

    let config = ConfigResolver::new(cli)
        .resolve()
        .context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting civic-classifier v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config.log_summary();

    let hub = ModelHub::new(
        config.text_classifier.api_token.clone(),
        config.model.download_timeout,
    )?;
    let model_path = hub
        .resolve(&config.model.source)
        .await
        .with_context(|| format!("Failed to obtain image model {}", config.model.source))?;
    info!("Image model: {}", model_path.display());

    let scorer = load_scorer(&model_path)?;
    let image_classifier = ImageClassifier::new(scorer, config.model.input_size);

    let text_client = TextClassifierClient::new(config.text_classifier.clone())?;
    info!(
        endpoint = text_client.endpoint(),
        authenticated = text_client.is_authenticated(),
        "Text classifier configured"
    );

    let state = AppState::new(image_classifier, text_client)
        .with_cors_origins(config.cors_allowed_origins.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("civic-classifier stopped");
    Ok(())
}
