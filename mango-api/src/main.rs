//! mango-api - Leaf Severity Analysis Service
//!
//! Turns mango leaf photographs plus local weather readings into a
//! disease-severity verdict and a treatment recommendation.
//!
//! Startup order matters: the severity model and the recommendation
//! table are loaded and validated before the listener binds, so a
//! missing model or an incomplete table can never serve traffic.

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use mango_api::config::ServiceConfig;
use mango_api::services::{AnalysisOrchestrator, OnnxClassifier, PlantNetGate, RecommendationTable};
use mango_api::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting mango-api (Severity Analysis) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let toml_config = mango_common::config::load_or_default()?;
    let config = ServiceConfig::resolve(&toml_config)?;

    // Model weights load once; failure aborts before the listener binds
    let classifier = OnnxClassifier::load(&config.model_path)?;
    info!("Severity model loaded from {}", config.model_path.display());

    // Recommendation table totality is a boot invariant
    let recommendations = RecommendationTable::load(config.recommendations_path.as_deref())?;
    info!(
        "Recommendation table validated ({} records)",
        recommendations.len()
    );

    if config.plantnet_api_key.is_none() {
        warn!("Pl@ntNet API key not configured; species verification requests will be rejected with a reason");
    }
    let species_gate = PlantNetGate::new(
        config.plantnet_api_key.clone(),
        config.plantnet_base_url.clone(),
    )?;

    let orchestrator = AnalysisOrchestrator::new(
        Arc::new(classifier),
        Arc::new(species_gate),
        Arc::new(recommendations),
    );
    let state = AppState::new(orchestrator);

    let cors = build_cors_layer(&config.allowed_origins)?;
    let app = mango_api::build_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS in the shape the mobile client expects: configured origins (or
/// any, when none are configured), all methods and headers
fn build_cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{}'", origin))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}
